use std::path::Path;

use crate::content::{ConfigError, TriggerDescriptor};
use crate::geometry::Vec3;

use super::trigger::{resolve_media_path, MediaRef, SpatialTrigger, TriggerShape};

const DEFAULT_RADIUS: f32 = 2.0;

/// Ordered checkpoint list for one scene activation. Indices are exactly
/// `0..len`, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointSequence {
    triggers: Vec<SpatialTrigger>,
}

impl CheckpointSequence {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds from already-constructed triggers, sorting by index and
    /// rejecting duplicate or missing indices.
    pub fn new(mut triggers: Vec<SpatialTrigger>) -> Result<Self, ConfigError> {
        triggers.sort_by_key(|trigger| trigger.index);
        for (expected, trigger) in triggers.iter().enumerate() {
            if expected > 0 && triggers[expected - 1].index == trigger.index {
                return Err(ConfigError::DuplicateIndex {
                    index: trigger.index,
                });
            }
            if trigger.index != expected {
                return Err(ConfigError::NonContiguousIndex {
                    expected,
                    found: trigger.index,
                });
            }
        }
        Ok(Self { triggers })
    }

    /// `None` means the triggers file was absent and yields an empty
    /// sequence.
    pub fn load(
        descriptors: Option<&[TriggerDescriptor]>,
        media_base: &Path,
    ) -> Result<Self, ConfigError> {
        let Some(descriptors) = descriptors else {
            return Ok(Self::empty());
        };
        let triggers = descriptors
            .iter()
            .enumerate()
            .map(|(position, descriptor)| {
                let shape = shape_from_descriptor(position, descriptor)?;
                Ok(trigger_from_descriptor(position, descriptor, shape, media_base))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(triggers)
    }

    /// Playlist packs: items have no shape and are entered as soon as they
    /// become current. Same index and media rules as `load`.
    pub fn load_playlist(
        descriptors: Option<&[TriggerDescriptor]>,
        media_base: &Path,
    ) -> Result<Self, ConfigError> {
        let Some(descriptors) = descriptors else {
            return Ok(Self::empty());
        };
        let triggers = descriptors
            .iter()
            .enumerate()
            .map(|(position, descriptor)| {
                if descriptor.center.is_some() || descriptor.bounds.is_some() {
                    return Err(ConfigError::InvalidShape {
                        position,
                        reason: "playlist items take no shape".to_string(),
                    });
                }
                Ok(trigger_from_descriptor(
                    position,
                    descriptor,
                    TriggerShape::Everywhere,
                    media_base,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(triggers)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SpatialTrigger> {
        self.triggers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpatialTrigger> {
        self.triggers.iter()
    }

    /// Out-of-range indices contain nothing.
    pub fn contains(&self, index: usize, position: Vec3) -> bool {
        self.triggers
            .get(index)
            .is_some_and(|trigger| trigger.shape.contains(position))
    }

    pub fn center_of(&self, index: usize) -> Option<Vec3> {
        self.triggers
            .get(index)
            .and_then(|trigger| trigger.shape.center())
    }
}

fn trigger_from_descriptor(
    position: usize,
    descriptor: &TriggerDescriptor,
    shape: TriggerShape,
    media_base: &Path,
) -> SpatialTrigger {
    let index = descriptor.index.unwrap_or(position);
    let id = descriptor
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    let title = descriptor
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .or_else(|| id.clone())
        .unwrap_or_else(|| format!("Checkpoint {}", index.saturating_add(1)));
    let media = MediaRef::new(
        descriptor
            .video_path()
            .map(|path| resolve_media_path(media_base, path)),
        descriptor
            .audio_path()
            .map(|path| resolve_media_path(media_base, path)),
    );

    SpatialTrigger {
        index,
        id,
        title,
        shape,
        media,
    }
}

fn shape_from_descriptor(
    position: usize,
    descriptor: &TriggerDescriptor,
) -> Result<TriggerShape, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidShape {
        position,
        reason: reason.to_string(),
    };

    match (descriptor.center, descriptor.bounds) {
        (Some(_), Some(_)) => Err(ConfigError::AmbiguousShape { position }),
        (None, None) => Err(ConfigError::MissingShape { position }),
        (Some(center), None) => {
            if !center.is_finite() {
                return Err(invalid("center must be finite"));
            }
            let radius = descriptor.radius.unwrap_or(DEFAULT_RADIUS);
            if !radius.is_finite() || radius <= 0.0 {
                return Err(invalid("radius must be a positive finite number"));
            }
            if let Some(half) = descriptor.half_height {
                if !half.is_finite() || half < 0.0 {
                    return Err(invalid("halfHeight must be a non-negative finite number"));
                }
            }
            Ok(TriggerShape::Sphere {
                center,
                radius,
                half_height: descriptor.half_height,
            })
        }
        (None, Some(bounds)) => {
            if !bounds.min.is_finite() || !bounds.max.is_finite() {
                return Err(invalid("bounds must be finite"));
            }
            if bounds.min.x > bounds.max.x
                || bounds.min.y > bounds.max.y
                || bounds.min.z > bounds.max.z
            {
                return Err(invalid("bounds min must not exceed max"));
            }
            Ok(TriggerShape::Box {
                min: bounds.min,
                max: bounds.max,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn parse(json: &str) -> Vec<TriggerDescriptor> {
        serde_json::from_str(json).expect("descriptors")
    }

    fn load(json: &str) -> Result<CheckpointSequence, ConfigError> {
        let descriptors = parse(json);
        CheckpointSequence::load(Some(&descriptors), Path::new(""))
    }

    #[test]
    fn absent_descriptors_give_empty_sequence() {
        let sequence = CheckpointSequence::load(None, Path::new("")).expect("load");
        assert!(sequence.is_empty());
        assert_eq!(sequence.center_of(0), None);
        assert!(!sequence.contains(0, Vec3::ZERO));
    }

    #[test]
    fn positional_indices_and_default_radius() {
        let sequence = load(
            r#"[
                { "title": "Hajar al-Aswad", "center": [0, 0, 0] },
                { "id": "yemeni_corner", "center": [10, 0, 0], "radius": 1.5 },
                { "center": [20, 0, 0] }
            ]"#,
        )
        .expect("load");

        assert_eq!(sequence.len(), 3);
        assert!(sequence.contains(0, Vec3::new(1.9, 1.6, 0.0)));
        assert!(!sequence.contains(1, Vec3::new(11.6, 1.6, 0.0)));
        assert_eq!(sequence.get(1).map(|t| t.title.as_str()), Some("yemeni_corner"));
        assert_eq!(sequence.get(2).map(|t| t.title.as_str()), Some("Checkpoint 3"));
    }

    #[test]
    fn explicit_indices_are_sorted() {
        let sequence = load(
            r#"[
                { "index": 1, "title": "Marwah", "center": [0, 0, -30] },
                { "index": 0, "title": "Safa", "center": [0, 0, 0] }
            ]"#,
        )
        .expect("load");

        assert_eq!(sequence.get(0).map(|t| t.title.as_str()), Some("Safa"));
        assert_eq!(sequence.center_of(1), Some(Vec3::new(0.0, 0.0, -30.0)));
    }

    #[test]
    fn gaps_and_duplicates_are_rejected() {
        let gap = load(r#"[ { "index": 0, "center": [0,0,0] }, { "index": 2, "center": [1,0,0] } ]"#);
        assert_eq!(
            gap,
            Err(ConfigError::NonContiguousIndex {
                expected: 1,
                found: 2
            })
        );

        let duplicate =
            load(r#"[ { "index": 0, "center": [0,0,0] }, { "index": 0, "center": [1,0,0] } ]"#);
        assert_eq!(duplicate, Err(ConfigError::DuplicateIndex { index: 0 }));
    }

    #[test]
    fn out_of_range_index_is_a_config_error() {
        let json = format!(r#"[ {{ "index": {}, "center": [0, 0, 0] }} ]"#, usize::MAX);
        assert_eq!(
            load(&json),
            Err(ConfigError::NonContiguousIndex {
                expected: 0,
                found: usize::MAX
            })
        );
    }

    #[test]
    fn shape_errors_name_descriptor_position() {
        assert_eq!(
            load(r#"[ { "center": [0,0,0] }, { "title": "nowhere" } ]"#),
            Err(ConfigError::MissingShape { position: 1 })
        );
        assert_eq!(
            load(r#"[ { "center": [0,0,0], "bounds": { "min": [0,0,0], "max": [1,1,1] } } ]"#),
            Err(ConfigError::AmbiguousShape { position: 0 })
        );
        assert!(matches!(
            load(r#"[ { "center": [0,0,0], "radius": 0 } ]"#),
            Err(ConfigError::InvalidShape { position: 0, .. })
        ));
        assert!(matches!(
            load(r#"[ { "bounds": { "min": [2,0,0], "max": [1,1,1] } } ]"#),
            Err(ConfigError::InvalidShape { position: 0, .. })
        ));
    }

    #[test]
    fn media_paths_resolve_against_base() {
        let descriptors = parse(
            r#"[ { "bounds": { "min": [0,0,0], "max": [4,3,4] },
                   "media": { "video": "media/video/ihram.mp4", "audio": "media/audio/ihram.mp3" } },
                 { "center": [9,0,0] } ]"#,
        );
        let base = PathBuf::from("/packs/umrah_haram");
        let sequence = CheckpointSequence::load(Some(&descriptors), &base).expect("load");

        let media = sequence.get(0).and_then(|t| t.media.clone()).expect("media");
        let expected = base
            .join("media/video/ihram.mp4")
            .to_string_lossy()
            .into_owned();
        assert_eq!(media.video(), Some(expected.as_str()));
        assert!(sequence.get(1).and_then(|t| t.media.as_ref()).is_none());
        assert_eq!(sequence.center_of(0), Some(Vec3::new(2.0, 1.5, 2.0)));
    }

    #[test]
    fn playlist_items_are_everywhere_and_keep_media() {
        let descriptors = parse(
            r#"[ { "title": "Niyat", "video": "media/video/kaba.mp4", "audio": "media/audio/niyat.mp3" },
                 { "title": "Ihram", "audio": "media/audio/ihram.mp3" } ]"#,
        );
        let base = PathBuf::from("/packs/training");
        let sequence =
            CheckpointSequence::load_playlist(Some(&descriptors), &base).expect("playlist");

        assert_eq!(sequence.len(), 2);
        assert!(sequence.contains(1, Vec3::new(300.0, -4.0, 12.0)));
        assert_eq!(sequence.center_of(0), None);
        let expected = base
            .join("media/audio/ihram.mp3")
            .to_string_lossy()
            .into_owned();
        assert_eq!(
            sequence.get(1).and_then(|t| t.media.as_ref()).and_then(MediaRef::audio),
            Some(expected.as_str())
        );
    }

    #[test]
    fn playlist_rejects_shaped_items() {
        let descriptors = parse(r#"[ { "title": "Niyat" }, { "center": [0, 0, 0] } ]"#);
        assert!(matches!(
            CheckpointSequence::load_playlist(Some(&descriptors), Path::new("")),
            Err(ConfigError::InvalidShape { position: 1, .. })
        ));
    }
}
