//! Runs a scene description against the headless backend.
//!
//! Usage: `lumen-headless [scene.ron] [config.ron]`
//!
//! Without a scene file the built-in sample scene is used. Without a config
//! file the defaults apply.

use std::path::PathBuf;
use std::process::ExitCode;

use lumen_headless::{ConfigManager, HeadlessConfig, HeadlessScene, SceneDescription};

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumen_headless=info,lumen_scene=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let scene_path = args.next();
    let config = match args.next() {
        Some(path) => ConfigManager::load(path).into_config(),
        None => HeadlessConfig::default(),
    };

    let description = match &scene_path {
        Some(path) => match SceneDescription::load(path) {
            Ok(description) => description,
            Err(e) => {
                tracing::error!("Failed to load scene description {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::info!("No scene file given, running the built-in sample");
            SceneDescription::sample()
        }
    };

    let scene = HeadlessScene::new(config);
    match description.apply(&scene) {
        Ok(stats) => {
            tracing::info!(
                "Materials created: {}, cloned: {}, destroyed: {}, live: {}",
                stats.created,
                stats.cloned,
                stats.destroyed,
                stats.live()
            );
            let leaked = stats.cloned.saturating_sub(stats.destroyed);
            if leaked > 0 {
                tracing::warn!("{} cloned materials were not released", leaked);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Scene run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
