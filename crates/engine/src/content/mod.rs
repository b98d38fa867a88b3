mod catalog;
mod discovery;
mod hashing;
mod manifest;
mod types;

pub use catalog::{SceneCatalog, ScenePack};
pub use discovery::{discover_scene_packs, SceneSource};
pub use manifest::{
    read_scene_config, read_trigger_descriptors, BoundsDescriptor, MediaDescriptor, PlayerConfig,
    SceneConfig, TriggerDescriptor, DEFAULT_EYE_HEIGHT, DEFAULT_TRIGGERS_FILE,
};
pub use types::{ConfigError, ContentError};
