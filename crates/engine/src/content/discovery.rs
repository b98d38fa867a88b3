use std::fs;
use std::path::{Path, PathBuf};

use super::types::ContentError;

const CONFIG_DIR_NAME: &str = "config";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSource {
    pub scene_id: String,
    pub base_dir: PathBuf,
    pub config_dir: PathBuf,
}

/// Every subdirectory of `scenes_dir` that carries a `config/` directory,
/// sorted by id. A missing `scenes_dir` yields no packs.
pub fn discover_scene_packs(scenes_dir: &Path) -> Result<Vec<SceneSource>, ContentError> {
    if !scenes_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(scenes_dir).map_err(|source| ContentError::ReadDir {
        path: scenes_dir.to_path_buf(),
        source,
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ContentError::ReadDirEntry {
            path: scenes_dir.to_path_buf(),
            source,
        })?;
        let Some(scene_id) = entry.file_name().to_str().map(ToString::to_string) else {
            continue;
        };
        if let Some(source) = locate_scene_source(scenes_dir, &scene_id) {
            sources.push(source);
        }
    }

    sources.sort_by(|a, b| a.scene_id.cmp(&b.scene_id));
    Ok(sources)
}

pub(crate) fn locate_scene_source(scenes_dir: &Path, scene_id: &str) -> Option<SceneSource> {
    if !is_valid_scene_id(scene_id) {
        return None;
    }
    let base_dir = scenes_dir.join(scene_id);
    let config_dir = base_dir.join(CONFIG_DIR_NAME);
    if !config_dir.is_dir() {
        return None;
    }
    Some(SceneSource {
        scene_id: scene_id.to_string(),
        base_dir,
        config_dir,
    })
}

fn is_valid_scene_id(scene_id: &str) -> bool {
    !scene_id.is_empty()
        && !scene_id.starts_with('.')
        && scene_id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn packs_are_sorted_and_require_config_dir() {
        let temp = TempDir::new().expect("tempdir");
        let scenes = temp.path();
        fs::create_dir_all(scenes.join("safa_marwah").join("config")).expect("mkdir");
        fs::create_dir_all(scenes.join("umrah_haram").join("config")).expect("mkdir");
        fs::create_dir_all(scenes.join("draft_without_config")).expect("mkdir");
        fs::write(scenes.join("README.txt"), "not a pack").expect("write");

        let sources = discover_scene_packs(scenes).expect("discover");
        let ids: Vec<&str> = sources.iter().map(|s| s.scene_id.as_str()).collect();
        assert_eq!(ids, vec!["safa_marwah", "umrah_haram"]);
        assert_eq!(sources[0].config_dir, scenes.join("safa_marwah").join("config"));
    }

    #[test]
    fn missing_scenes_dir_is_empty() {
        let temp = TempDir::new().expect("tempdir");
        let sources = discover_scene_packs(&temp.path().join("nope")).expect("discover");
        assert!(sources.is_empty());
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir_all(temp.path().join("config")).expect("mkdir");
        assert!(locate_scene_source(temp.path(), "..").is_none());
        assert!(locate_scene_source(temp.path(), "a/b").is_none());
        assert!(locate_scene_source(temp.path(), "").is_none());
    }
}
