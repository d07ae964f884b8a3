//! Terrain demo
//!
//! Renders the heightmap terrain scene. Settings come from
//! `resources/terrain.toml` (or the path given as the first argument); a
//! missing file or field falls back to the built-in defaults.

use scene_engine::core::config::{ApplicationConfig, Config};
use scene_engine::foundation::logging;
use scene_engine::{Engine, EngineError, TerrainScene};

const DEFAULT_CONFIG: &str = "resources/terrain.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    log::info!("Starting terrain demo");

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = ApplicationConfig::load_or_default(&path)
        .and_then(|config| config.validate().map(|()| config))
        .map_err(|e| EngineError::ConfigError(format!("{}: {}", path, e)))
        .inspect_err(|e| log::error!("{}", e))?;

    let mut scene = TerrainScene::new();
    match Engine::run(config, &mut scene) {
        Ok(()) => {
            log::info!("Terrain demo finished");
            Ok(())
        }
        Err(e) => {
            log::error!("Terrain demo failed: {}", e);
            Err(e.into())
        }
    }
}
