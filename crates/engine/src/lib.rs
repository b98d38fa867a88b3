use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod checkpoint;
pub mod content;
mod geometry;

pub use app::{
    filter_movement_delta, movement_intent, run_app, turn_intent, AppError, Hud, InputAction,
    InputEdge, InputSnapshot, InputSource, LoopConfig, PlayerRig, Presenter, RunEnd, RunSummary,
    Scene, SceneCommand, SceneRouter, SceneWorld, REALTIME_ENV_VAR,
};
pub use checkpoint::{
    CheckpointProgressionEngine, CheckpointSequence, CheckpointState, LifecycleEvent, MediaEvent,
    MediaPlaybackBinding, MediaRef, MediaStatus, PauseState, PlaybackId, PositionSource,
    ProgressionEvent, SceneLifecycle, SimulatedMediaPlayer, SpatialTrigger, StatusLine,
    StatusPhase, TriggerShape,
};
pub use content::{
    discover_scene_packs, ConfigError, ContentError, SceneCatalog, SceneConfig, ScenePack,
    TriggerDescriptor,
};
pub use geometry::Vec3;

pub const ROOT_ENV_VAR: &str = "PILGRIMAGE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub scenes_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "PILGRIMAGE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/pilgrimage\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(app_paths_for_root(root))
}

pub fn app_paths_for_root(root: PathBuf) -> AppPaths {
    let scenes_dir = root.join("assets").join("scenes");
    AppPaths { root, scenes_dir }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn repo_marker_accepts_assets_only_layout() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]").expect("write cargo");
        fs::create_dir_all(temp.path().join("assets")).expect("mkdir assets");

        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn scenes_dir_lives_under_assets() {
        let paths = app_paths_for_root(PathBuf::from("/srv/pilgrimage"));
        assert_eq!(
            paths.scenes_dir,
            PathBuf::from("/srv/pilgrimage").join("assets").join("scenes")
        );
    }
}
