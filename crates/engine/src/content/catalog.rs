use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::discovery::{discover_scene_packs, locate_scene_source};
use super::hashing::fingerprint_config_dir;
use super::manifest::{read_scene_config, read_trigger_descriptors, SceneConfig, TriggerDescriptor};
use super::types::ContentError;

const SCENE_CONFIG_FILE: &str = "scene.config.json";

/// Parsed configuration payload of one scene pack. Trigger descriptors are
/// kept raw; validation happens when a sequence is built from them.
///
/// The config and triggers files degrade independently: an unreadable file
/// is replaced by defaults (or no triggers) and its error is kept in
/// `load_errors`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePack {
    pub scene_id: String,
    pub base_dir: PathBuf,
    pub config: SceneConfig,
    pub triggers: Option<Vec<TriggerDescriptor>>,
    pub fingerprint: String,
    pub load_errors: Vec<String>,
}

impl ScenePack {
    /// Degenerate pack: default config, no triggers.
    pub fn fallback(scene_id: &str) -> Self {
        Self {
            scene_id: scene_id.to_string(),
            base_dir: PathBuf::new(),
            config: SceneConfig::default(),
            triggers: None,
            fingerprint: String::new(),
            load_errors: Vec::new(),
        }
    }

    pub fn media_base(&self) -> &Path {
        &self.base_dir
    }
}

#[derive(Debug)]
pub struct SceneCatalog {
    scenes_dir: PathBuf,
    cache: HashMap<String, ScenePack>,
}

impl SceneCatalog {
    pub fn new(scenes_dir: PathBuf) -> Self {
        Self {
            scenes_dir,
            cache: HashMap::new(),
        }
    }

    pub fn scenes_dir(&self) -> &Path {
        &self.scenes_dir
    }

    pub fn scene_ids(&self) -> Result<Vec<String>, ContentError> {
        Ok(discover_scene_packs(&self.scenes_dir)?
            .into_iter()
            .map(|source| source.scene_id)
            .collect())
    }

    /// Returns the cached pack while its config fingerprint is unchanged,
    /// otherwise re-reads it from disk.
    pub fn load(&mut self, scene_id: &str) -> Result<ScenePack, ContentError> {
        let source = locate_scene_source(&self.scenes_dir, scene_id).ok_or_else(|| {
            ContentError::UnknownScene {
                scene_id: scene_id.to_string(),
                scenes_dir: self.scenes_dir.clone(),
            }
        })?;
        let fingerprint = fingerprint_config_dir(&source.config_dir)?;

        if let Some(cached) = self.cache.get(scene_id) {
            if cached.fingerprint == fingerprint.hash_hex {
                debug!(scene = scene_id, fingerprint = %fingerprint.hash_hex, "scene_pack_cache_hit");
                return Ok(cached.clone());
            }
        }

        let mut load_errors = Vec::new();
        let config = match read_scene_config(&source.config_dir.join(SCENE_CONFIG_FILE)) {
            Ok(config) => config.unwrap_or_default(),
            Err(error) => {
                warn!(scene = scene_id, error = %error, "scene_config_unreadable");
                load_errors.push(error.to_string());
                SceneConfig::default()
            }
        };
        let triggers =
            match read_trigger_descriptors(&source.config_dir.join(&config.triggers_file)) {
                Ok(triggers) => triggers,
                Err(error) => {
                    warn!(scene = scene_id, error = %error, "scene_triggers_unreadable");
                    load_errors.push(error.to_string());
                    None
                }
            };
        let pack = ScenePack {
            scene_id: source.scene_id,
            base_dir: source.base_dir,
            config,
            triggers,
            fingerprint: fingerprint.hash_hex,
            load_errors,
        };
        info!(
            scene = scene_id,
            json_files = fingerprint.json_file_count,
            trigger_count = pack.triggers.as_ref().map_or(0, Vec::len),
            load_errors = pack.load_errors.len(),
            fingerprint = %pack.fingerprint,
            "scene_pack_loaded"
        );
        self.cache.insert(scene_id.to_string(), pack.clone());
        Ok(pack)
    }

    pub fn is_cached(&self, scene_id: &str) -> bool {
        self.cache.contains_key(scene_id)
    }
}
