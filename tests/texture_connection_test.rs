use scene_ngin::{
    data_structures::{
        components::{Model, NUM_TEXTURES, TextureConnection, TextureData},
        scene::Scene,
    },
    resources::loader::process_texture_connections,
};

/// Small deterministic generator so the sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    fn mix(&mut self) -> f32 {
        (self.below(400) as f32 / 100.0) - 1.5
    }
}

fn assert_consistent(model: &Model) {
    let any_bound = model.texture_names.iter().any(|name| !name.is_empty());
    assert_eq!(model.use_textures, any_bound, "{:?}", model);
    for (name, mix) in model.texture_names.iter().zip(model.texture_mix) {
        assert!((0.0..=1.0).contains(&mix), "{:?}", model);
        if name.is_empty() {
            assert_eq!(mix, 0.0);
        }
    }
}

#[test]
fn use_textures_tracks_bound_slots() {
    let names = ["", "stone", "grass", "sky"];
    let mut rng = Lcg(7);
    let mut model = Model::with_mesh("box");

    for _ in 0..500 {
        let slot = rng.below(NUM_TEXTURES as u64 + 1) as usize;
        let name = names[rng.below(names.len() as u64) as usize];
        let mix = rng.mix();
        match rng.below(5) {
            0 => model.clear_texture(slot),
            1 => model.clear_textures(),
            _ => model.set_texture(slot, name, mix),
        }
        assert_consistent(&model);
    }
}

#[test]
fn stored_mix_is_clamped() {
    let mut model = Model::with_mesh("box");
    for (submitted, stored) in [(0.25, 0.25), (1.0, 1.0), (7.5, 1.0), (1e-6, 1e-6)] {
        model.set_texture(1, "stone", submitted);
        assert_eq!(model.texture_mix[1], stored);
        assert!(model.use_textures);
    }
    model.set_texture(1, "stone", -3.0);
    assert_eq!(model.texture_mix[1], 0.0);
    assert!(!model.use_textures);
}

#[test]
fn later_connections_to_a_slot_win() {
    let mut scene = Scene::new();
    scene.add_object("box", Model::with_mesh("box")).unwrap();
    for name in ["stone", "grass"] {
        scene
            .add_object(
                name,
                TextureData {
                    is_cube: false,
                    faces: vec![format!("{name}.png")],
                },
            )
            .unwrap();
    }
    let mut rng = Lcg(99);
    let mut expected: [(String, f32); NUM_TEXTURES] = Default::default();
    for i in 0..40 {
        let slot = rng.below(NUM_TEXTURES as u64) as usize;
        let texture = ["", "stone", "grass"][rng.below(3) as usize].to_string();
        let mix = rng.mix();
        expected[slot] = if texture.is_empty() || mix <= 0.0 {
            (String::new(), 0.0)
        } else {
            (texture.clone(), mix.clamp(0.0, 1.0))
        };
        scene
            .add_object(
                &format!("c{i}"),
                TextureConnection {
                    model: "box".to_string(),
                    texture,
                    slot,
                    mix,
                },
            )
            .unwrap();
    }

    process_texture_connections(&mut scene).unwrap();

    let model = scene.get_object_by_name::<Model>("box").unwrap();
    assert_consistent(model);
    for (slot, (name, mix)) in expected.iter().enumerate() {
        assert_eq!(&model.texture_names[slot], name, "slot {slot}");
        assert_eq!(model.texture_mix[slot], *mix, "slot {slot}");
    }
}
