use crate::common::test_utils::{NullWindow, RecordingDevice, TestAssets};
use cgmath::Vector3;
use scene_ngin::{
    Engine,
    data_structures::{
        components::{Camera, Grid, Light, Model},
        transform::TransformComponent,
    },
    device::{CullFace, RenderDevice, SKYBOX_TEXTURE_UNIT, UniformValue},
    errors::LoadError,
};

mod common;

const SKY_SCENE: &str = "\
# one of everything the frame needs
camera main
    position 0 1 5
end

light sun
    type directional
    direction 0 -1 0
end

primitive box
    type cube
    size 1
end

primitive skybox
    type cube
    size 50
end

texture sky cube
    faces sky_px.png sky_nx.png sky_py.png sky_ny.png sky_pz.png sky_nz.png
end

connect sky_faces
    model skybox
    texture sky
    slot 0
    mix 1
end
";

async fn engine_for(assets: &TestAssets) -> Engine<RecordingDevice> {
    let mut engine = Engine::new(RecordingDevice::new(), assets.config());
    engine.initialize().await.expect("engine initializes");
    engine
}

fn transform_of(engine: &Engine<RecordingDevice>, name: &str) -> TransformComponent {
    let scene = engine.scene();
    let entity = scene.entity_by_name::<Model>(name).expect("model exists");
    *scene
        .get_component::<TransformComponent>(entity)
        .expect("model has a transform")
}

#[tokio::test]
async fn sky_scene_loads_and_renders() {
    let assets = TestAssets::new("sky");
    assets.write_cube_faces("sky");
    assets.write_scene("Sky", SKY_SCENE);

    let mut engine = engine_for(&assets).await;
    engine.load_scene("Sky").await.unwrap();

    let scene = engine.scene();
    assert_eq!(scene.object_count::<Camera>(), 1);
    assert_eq!(scene.object_count::<Light>(), 1);
    assert_eq!(scene.object_count::<Model>(), 2);
    assert_eq!(scene.system_count(), 4);
    let skybox = scene.get_object_by_name::<Model>("skybox").unwrap();
    assert!(skybox.use_textures);
    assert_eq!(skybox.texture_names[0], "sky");

    let stats = engine.render(16.0 / 9.0).expect("camera present");
    assert_eq!(stats.opaque, 1);
    assert_eq!(stats.skybox, 1);
    assert_eq!(stats.transparent, 0);
    assert_eq!(stats.skipped, 0);

    let device = engine.device();
    assert_eq!(device.drawn_labels(), ["box", "skybox"]);
    let sky_draw = device.draws_of("skybox")[0];
    assert_eq!(sky_draw.cull, CullFace::Front);
    assert!(!sky_draw.depth_write);
    assert_eq!(sky_draw.uniform("bIsSkybox"), Some(UniformValue::Int(1)));
    let sky = engine.textures().get_texture("sky").unwrap().handle;
    assert_eq!(sky_draw.units[SKYBOX_TEXTURE_UNIT as usize], Some(sky));

    assert_eq!(device.cull_face(), CullFace::Back);
    assert!(device.depth_write());
    assert_eq!(device.uniform("bIsSkybox"), Some(UniformValue::Int(0)));
    assert_eq!(device.uniform("lightCount"), Some(UniformValue::Int(1)));
    assert!(device.rejected.is_empty(), "{:?}", device.rejected);

    assert_eq!(transform_of(&engine, "skybox").position, Vector3::new(0.0, 1.0, 5.0));
}

#[tokio::test]
async fn grids_expand_into_positioned_instances() {
    let assets = TestAssets::new("grid");
    assets.write_scene(
        "Grid",
        "\
camera main
end

grid tiles
    type square
    count 9
    spacing 2
    size 1.5
    position 10 10 10
    rotation 0 0 45
    colour 0.2 0.4 0.6
end
",
    );

    let mut engine = engine_for(&assets).await;
    engine.load_scene("Grid").await.unwrap();

    assert_eq!(engine.scene().object_count::<Model>(), 9);
    assert_eq!(engine.meshes().len(), 1);
    assert!(engine.meshes().contains("tiles_sharedSquare"));

    for (index, expected) in [(0, [0.0, 0.0, 0.0]), (4, [2.0, 2.0, 0.0]), (8, [4.0, 4.0, 0.0])] {
        let name = Grid::instance_name("tiles", index);
        let transform = transform_of(&engine, &name);
        assert_eq!(transform.position, Vector3::from(expected), "{name}");
        assert_eq!(transform.rotation, Vector3::new(0.0, 0.0, 45.0));
        let model = engine.scene().get_object_by_name::<Model>(&name).unwrap();
        assert_eq!(model.mesh, "tiles_sharedSquare");
        assert_eq!(model.colour.x, 0.2);
    }

    let stats = engine.render(1.0).unwrap();
    assert_eq!(stats.opaque, 9);
    assert_eq!(engine.device().mesh_uploads(), 1);
}

#[tokio::test]
async fn cube_grids_tile_the_ground_plane() {
    let assets = TestAssets::new("cubegrid");
    assets.write_scene(
        "Floor",
        "camera main\nend\n\ngrid floor\n    type cube\n    count 4\n    spacing 3\nend\n",
    );

    let mut engine = engine_for(&assets).await;
    engine.load_scene("Floor").await.unwrap();

    assert!(engine.meshes().contains("floor_sharedCube"));
    assert_eq!(
        transform_of(&engine, "floor_instance_3").position,
        Vector3::new(3.0, 0.0, 3.0)
    );
}

#[tokio::test]
async fn reloading_a_scene_reuses_meshes_and_textures() {
    let assets = TestAssets::new("reload");
    assets.write_cube_obj("cube.obj");
    assets.write_png("checker.png", [200, 200, 200, 255]);
    assets.write_scene(
        "Reload",
        "\
camera main
end

model a
    mesh cube.obj
end

model b
    mesh cube.obj
    position 2 0 0
end

primitive marker
    type triangle
end

texture checker
    face checker.png
end

connect a_checker
    model a
    texture checker
    slot 1
    mix 0.5
end
",
    );

    let mut engine = engine_for(&assets).await;
    engine.load_scene("Reload").await.unwrap();
    let meshes = engine.meshes().len();
    let textures = engine.textures().len();
    let uploads = (engine.device().mesh_uploads(), engine.device().texture_uploads());
    assert_eq!(meshes, 2);
    assert_eq!(textures, 1);

    engine.load_scene("Reload").await.unwrap();

    assert_eq!(engine.meshes().len(), meshes);
    assert_eq!(engine.textures().len(), textures);
    assert_eq!(
        (engine.device().mesh_uploads(), engine.device().texture_uploads()),
        uploads
    );
    let a = engine.scene().get_object_by_name::<Model>("a").unwrap();
    assert_eq!(a.texture_mix, [0.0, 0.5, 0.0, 0.0]);
}

#[tokio::test]
async fn a_failed_load_keeps_the_current_scene() {
    let assets = TestAssets::new("keep");
    assets.write_scene("Good", "camera main\nend\n\nlight lamp\nend\n");
    assets.write_scene("Bad", "camera main\n    zoom 3\nend\n");
    assets.write_scene(
        "MissingMesh",
        "camera main\nend\n\nmodel ghost\n    mesh ghost.obj\nend\n",
    );

    let mut engine = engine_for(&assets).await;
    engine.load_scene("Good").await.unwrap();

    let error = engine.load_scene("Bad").await.unwrap_err();
    assert!(matches!(error, LoadError::Parse { line: 2, .. }), "{error}");

    let error = engine.load_scene("MissingMesh").await.unwrap_err();
    assert!(matches!(error, LoadError::Io { .. }), "{error}");

    let error = engine.load_scene("Nowhere").await.unwrap_err();
    assert!(matches!(error, LoadError::Io { .. }), "{error}");

    assert_eq!(engine.scene().object_count::<Camera>(), 1);
    assert_eq!(engine.scene().object_count::<Light>(), 1);
    assert_eq!(engine.scene().object_count::<Model>(), 0);
}

#[tokio::test]
async fn bad_connections_abort_the_load() {
    let assets = TestAssets::new("connect");
    assets.write_png("checker.png", [0, 0, 0, 255]);
    let base = "camera main\nend\n\nprimitive box\n    type cube\nend\n\ntexture checker\n    face checker.png\nend\n";
    assets.write_scene(
        "NoModel",
        &format!("{base}\nconnect c\n    model crate\n    texture checker\nend\n"),
    );
    assets.write_scene(
        "NoTexture",
        &format!("{base}\nconnect c\n    model box\n    texture marble\nend\n"),
    );
    assets.write_scene(
        "BadSlot",
        &format!("{base}\nconnect c\n    model box\n    texture checker\n    slot 4\nend\n"),
    );
    assets.write_scene(
        "Unbind",
        &format!(
            "{base}\nconnect c\n    model box\n    texture checker\n    slot 2\nend\n\nconnect d\n    model box\n    texture -\n    slot 2\nend\n"
        ),
    );

    let mut engine = engine_for(&assets).await;
    assert!(matches!(
        engine.load_scene("NoModel").await,
        Err(LoadError::ModelNotFound { .. })
    ));
    assert!(matches!(
        engine.load_scene("NoTexture").await,
        Err(LoadError::TextureNotFound { .. })
    ));
    assert!(matches!(
        engine.load_scene("BadSlot").await,
        Err(LoadError::SlotOutOfRange { slot: 4, .. })
    ));

    engine.load_scene("Unbind").await.unwrap();
    let model = engine.scene().get_object_by_name::<Model>("box").unwrap();
    assert!(!model.use_textures);
    assert!(model.texture_names[2].is_empty());
}

#[tokio::test]
async fn loading_needs_an_initialized_engine() {
    let assets = TestAssets::new("noprogram");
    assets.write_scene("Empty", "camera main\nend\n");

    let mut engine = Engine::new(RecordingDevice::new(), assets.config());
    assert!(matches!(
        engine.load_scene("Empty").await,
        Err(LoadError::NoProgram)
    ));
}

#[tokio::test]
async fn a_frame_clears_draws_and_presents() {
    let assets = TestAssets::new("frame");
    assets.write_cube_faces("sky");
    assets.write_scene("Sky", SKY_SCENE);

    let mut engine = engine_for(&assets).await;
    engine.load_scene("Sky").await.unwrap();
    let mut window = NullWindow::default();

    let stats = engine.frame(&mut window).unwrap();

    assert!(stats.is_some());
    assert_eq!(engine.device().clears, 1);
    assert_eq!(engine.device().presents, 1);
    assert_eq!(engine.device().draws.len(), 2);
}

#[tokio::test]
async fn a_frame_without_a_camera_is_cleared_and_presented() {
    let assets = TestAssets::new("nocamera");
    assets.write_scene("Dark", "primitive box\n    type cube\nend\n");

    let mut engine = engine_for(&assets).await;
    engine.load_scene("Dark").await.unwrap();
    let mut window = NullWindow::default();

    let stats = engine.frame(&mut window).unwrap();

    assert!(stats.is_none());
    assert_eq!(engine.device().clears, 1);
    assert_eq!(engine.device().presents, 1);
    assert!(engine.device().draws.is_empty());
}
