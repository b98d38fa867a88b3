use std::env;
use std::path::PathBuf;

use pilgrimage_engine::{resolve_app_paths, AppError, InputSource, LoopConfig, SceneCatalog, SceneRouter};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, Autopilot, LoggingPresenter, ScriptError, ScriptedInput, SharedLog};

const START_SCENE_ENV_VAR: &str = "PILGRIMAGE_START_SCENE";
const INPUT_SCRIPT_ENV_VAR: &str = "PILGRIMAGE_INPUT_SCRIPT";
const MEDIA_SECONDS_ENV_VAR: &str = "PILGRIMAGE_MEDIA_SECONDS";
const MEDIA_FAIL_ENV_VAR: &str = "PILGRIMAGE_MEDIA_FAIL";
const MAX_TICKS_ENV_VAR: &str = "PILGRIMAGE_MAX_TICKS";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) router: SceneRouter,
    pub(crate) input: Box<dyn InputSource>,
    pub(crate) presenter: LoggingPresenter,
    pub(crate) log: SharedLog,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Pilgrimage Startup ===");

    let paths = resolve_app_paths().map_err(AppError::from)?;
    info!(
        root = %paths.root.display(),
        scenes_dir = %paths.scenes_dir.display(),
        "app_paths_resolved"
    );

    let catalog = SceneCatalog::new(paths.scenes_dir.clone());
    let scene_ids = catalog.scene_ids().map_err(AppError::from)?;
    info!(scenes = ?scene_ids, "scene_packs_discovered");

    let media = gameplay::media_settings_from(
        env_value(MEDIA_SECONDS_ENV_VAR).as_deref(),
        env_value(MEDIA_FAIL_ENV_VAR).as_deref(),
    );
    let log = SharedLog::default();
    let router = gameplay::build_router(catalog, &scene_ids, &media, &log);

    let defaults = LoopConfig::default();
    let config = LoopConfig {
        max_ticks: parse_max_ticks(env_value(MAX_TICKS_ENV_VAR).as_deref(), defaults.max_ticks),
        start_scene: env_value(START_SCENE_ENV_VAR),
        ..defaults
    };

    let tick_seconds = 1.0 / config.target_tps.max(1) as f32;
    let input: Box<dyn InputSource> = match env_value(INPUT_SCRIPT_ENV_VAR) {
        Some(path) => Box::new(ScriptedInput::from_file(&PathBuf::from(path), tick_seconds)?),
        None => {
            info!("input_autopilot");
            Box::new(Autopilot::default())
        }
    };

    Ok(AppWiring {
        config,
        router,
        input,
        presenter: LoggingPresenter::default(),
        log,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn env_value(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `0` lifts the limit.
fn parse_max_ticks(raw: Option<&str>, default: Option<u64>) -> Option<u64> {
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = MAX_TICKS_ENV_VAR, value = raw, "invalid tick limit; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_ticks_parsing_falls_back_on_garbage() {
        assert_eq!(parse_max_ticks(None, Some(10)), Some(10));
        assert_eq!(parse_max_ticks(Some("250"), Some(10)), Some(250));
        assert_eq!(parse_max_ticks(Some("0"), Some(10)), None);
        assert_eq!(parse_max_ticks(Some("soon"), Some(10)), Some(10));
    }
}
