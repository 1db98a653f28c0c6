use scene_ngin::EngineConfig;

fn main() -> anyhow::Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(scene) = std::env::args().nth(1) {
        config = config.with_scene(scene);
    }
    scene_ngin::run(config)
}
