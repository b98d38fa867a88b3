use std::path::PathBuf;

use thiserror::Error;

/// Validation failure for a trigger list. `position` is the descriptor's
/// offset in the source array, not its checkpoint index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("trigger descriptor #{position} has no shape (expected `center` or `bounds`)")]
    MissingShape { position: usize },
    #[error("trigger descriptor #{position} declares both `center` and `bounds`")]
    AmbiguousShape { position: usize },
    #[error("trigger descriptor #{position} has an invalid shape: {reason}")]
    InvalidShape { position: usize, reason: String },
    #[error("trigger index {index} is declared more than once")]
    DuplicateIndex { index: usize },
    #[error("trigger indices must be contiguous from 0: expected {expected}, found {found}")]
    NonContiguousIndex { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read directory entry in {path}: {source}")]
    ReadDirEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path} at {json_path}: {source}")]
    Json {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("scene pack not found: {scene_id} (looked in {scenes_dir})")]
    UnknownScene { scene_id: String, scenes_dir: PathBuf },
}
