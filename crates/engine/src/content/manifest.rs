use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::geometry::Vec3;

use super::types::ContentError;

pub const DEFAULT_TRIGGERS_FILE: &str = "triggers.json";
pub const DEFAULT_EYE_HEIGHT: f32 = 1.6;
const DEFAULT_MOVE_SPEED: f32 = 2.2;
const DEFAULT_TURN_SPEED: f32 = 1.8;
const DEFAULT_START_Z: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerConfig {
    pub move_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
        }
    }
}

/// Scene-wide parameters from `config/scene.config.json`. Every field is
/// optional on disk; rendering-only keys (model, lights, environment) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneConfig {
    pub title: Option<String>,
    pub ground_y: f32,
    pub camera_start: Option<Vec<f32>>,
    pub eye_height: f32,
    pub player: PlayerConfig,
    pub turn_speed: f32,
    pub always_advance_allowed: bool,
    pub next_scene: Option<String>,
    pub auto_switch_on_complete: bool,
    pub advance_cue: Option<String>,
    /// Triggers file lists playlist items rather than placed checkpoints.
    pub playlist: bool,
    /// Played after the last checkpoint; completion waits for it.
    pub closing_cue: Option<String>,
    pub triggers_file: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: None,
            ground_y: 0.0,
            camera_start: None,
            eye_height: DEFAULT_EYE_HEIGHT,
            player: PlayerConfig::default(),
            turn_speed: DEFAULT_TURN_SPEED,
            always_advance_allowed: false,
            next_scene: None,
            auto_switch_on_complete: false,
            advance_cue: None,
            playlist: false,
            closing_cue: None,
            triggers_file: DEFAULT_TRIGGERS_FILE.to_string(),
        }
    }
}

impl SceneConfig {
    /// Player spawn. Missing `cameraStart` components fall back per axis.
    pub fn spawn_position(&self) -> Vec3 {
        let start = self.camera_start.as_deref().unwrap_or(&[]);
        Vec3 {
            x: start.first().copied().unwrap_or(0.0),
            y: start.get(1).copied().unwrap_or(self.eye_level()),
            z: start.get(2).copied().unwrap_or(DEFAULT_START_Z),
        }
    }

    pub fn eye_level(&self) -> f32 {
        self.ground_y + self.eye_height
    }

    pub fn next_scene_id(&self) -> Option<&str> {
        non_blank(self.next_scene.as_deref())
    }

    pub fn advance_cue_path(&self) -> Option<&str> {
        non_blank(self.advance_cue.as_deref())
    }

    pub fn closing_cue_path(&self) -> Option<&str> {
        non_blank(self.closing_cue.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BoundsDescriptor {
    pub min: Vec3,
    pub max: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MediaDescriptor {
    pub video: Option<String>,
    pub audio: Option<String>,
}

/// One raw entry of `triggers.json`, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDescriptor {
    pub index: Option<usize>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub center: Option<Vec3>,
    pub radius: Option<f32>,
    pub half_height: Option<f32>,
    pub bounds: Option<BoundsDescriptor>,
    pub video: Option<String>,
    pub audio: Option<String>,
    pub media: Option<MediaDescriptor>,
}

impl TriggerDescriptor {
    /// Top-level `video`/`audio` win over the nested `media` block; blank
    /// strings count as absent.
    pub fn video_path(&self) -> Option<&str> {
        pick_media_path(
            self.video.as_deref(),
            self.media.as_ref().and_then(|m| m.video.as_deref()),
        )
    }

    pub fn audio_path(&self) -> Option<&str> {
        pick_media_path(
            self.audio.as_deref(),
            self.media.as_ref().and_then(|m| m.audio.as_deref()),
        )
    }
}

fn pick_media_path<'a>(top: Option<&'a str>, nested: Option<&'a str>) -> Option<&'a str> {
    top.map(str::trim)
        .filter(|path| !path.is_empty())
        .or_else(|| nested.map(str::trim).filter(|path| !path.is_empty()))
}

pub fn read_scene_config(path: &Path) -> Result<Option<SceneConfig>, ContentError> {
    read_json_file(path)
}

pub fn read_trigger_descriptors(
    path: &Path,
) -> Result<Option<Vec<TriggerDescriptor>>, ContentError> {
    read_json_file(path)
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ContentError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ContentError::ReadFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer)
        .map(Some)
        .map_err(|error| {
            let json_path = error.path().to_string();
            ContentError::Json {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let temp = TempDir::new().expect("tempdir");
        let result = read_scene_config(&temp.path().join("scene.config.json")).expect("read");
        assert!(result.is_none());
    }

    #[test]
    fn partial_scene_config_keeps_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("scene.config.json");
        fs::write(
            &path,
            r##"{ "groundY": 1.0, "cameraStart": [2.0], "environment": { "backgroundColor": "#fff" } }"##,
        )
        .expect("write");

        let config = read_scene_config(&path).expect("read").expect("present");
        assert_eq!(config.ground_y, 1.0);
        assert!(!config.always_advance_allowed);
        assert_eq!(config.triggers_file, DEFAULT_TRIGGERS_FILE);
        assert_eq!(
            config.spawn_position(),
            Vec3::new(2.0, 1.0 + DEFAULT_EYE_HEIGHT, DEFAULT_START_Z)
        );
    }

    #[test]
    fn nested_player_speed_is_read() {
        let config: SceneConfig =
            serde_json::from_str(r#"{ "player": { "moveSpeed": 4.5 } }"#).expect("config");
        assert_eq!(config.player.move_speed, 4.5);
    }

    #[test]
    fn malformed_json_reports_json_path() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("triggers.json");
        fs::write(&path, r#"[ { "center": [0, 0, 0] }, { "radius": "wide" } ]"#).expect("write");

        let error = read_trigger_descriptors(&path).expect_err("should fail");
        match error {
            ContentError::Json { json_path, .. } => assert_eq!(json_path, "[1].radius"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn top_level_media_wins_and_blank_paths_are_absent() {
        let descriptor: TriggerDescriptor = serde_json::from_str(
            r#"{
                "center": [0, 0, 0],
                "video": " ",
                "audio": "media/a.mp3",
                "media": { "video": "media/v.mp4", "audio": "media/other.mp3" }
            }"#,
        )
        .expect("descriptor");

        assert_eq!(descriptor.video_path(), Some("media/v.mp4"));
        assert_eq!(descriptor.audio_path(), Some("media/a.mp3"));
    }

    #[test]
    fn blank_next_scene_is_ignored() {
        let config = SceneConfig {
            next_scene: Some("  ".to_string()),
            ..SceneConfig::default()
        };
        assert_eq!(config.next_scene_id(), None);
    }

    #[test]
    fn playlist_flag_and_closing_cue_are_read() {
        let config: SceneConfig = serde_json::from_str(
            r#"{ "playlist": true, "closingCue": " media/audio/NextStep.mp3 ", "advanceCue": "" }"#,
        )
        .expect("config");
        assert!(config.playlist);
        assert_eq!(config.closing_cue_path(), Some("media/audio/NextStep.mp3"));
        assert_eq!(config.advance_cue_path(), None);
        assert!(!SceneConfig::default().playlist);
    }
}
