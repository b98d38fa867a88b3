use std::path::Path;

use crate::geometry::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerShape {
    /// Tested on the horizontal plane; `half_height` adds a vertical band
    /// around `center.y` when present.
    Sphere {
        center: Vec3,
        radius: f32,
        half_height: Option<f32>,
    },
    /// Inclusive bounds on all three axes.
    Box { min: Vec3, max: Vec3 },
    /// Playlist item: the player is inside it wherever they stand.
    Everywhere,
}

impl TriggerShape {
    pub fn contains(&self, position: Vec3) -> bool {
        match *self {
            TriggerShape::Sphere {
                center,
                radius,
                half_height,
            } => {
                let in_plane = position.horizontal_distance_squared(center) <= radius * radius;
                let in_band = half_height
                    .map(|half| (position.y - center.y).abs() <= half)
                    .unwrap_or(true);
                in_plane && in_band
            }
            TriggerShape::Box { min, max } => {
                position.x >= min.x
                    && position.x <= max.x
                    && position.y >= min.y
                    && position.y <= max.y
                    && position.z >= min.z
                    && position.z <= max.z
            }
            TriggerShape::Everywhere => true,
        }
    }

    /// `None` for shapes with no place to mark.
    pub fn center(&self) -> Option<Vec3> {
        match *self {
            TriggerShape::Sphere { center, .. } => Some(center),
            TriggerShape::Box { min, max } => Some(Vec3::new(
                (min.x + max.x) * 0.5,
                (min.y + max.y) * 0.5,
                (min.z + max.z) * 0.5,
            )),
            TriggerShape::Everywhere => None,
        }
    }
}

/// Paired video + audio for one checkpoint. At least one side is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    video: Option<String>,
    audio: Option<String>,
}

impl MediaRef {
    pub fn new(video: Option<String>, audio: Option<String>) -> Option<Self> {
        if video.is_none() && audio.is_none() {
            return None;
        }
        Some(Self { video, audio })
    }

    pub fn video(&self) -> Option<&str> {
        self.video.as_deref()
    }

    pub fn audio(&self) -> Option<&str> {
        self.audio.as_deref()
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.video.as_deref().is_some_and(|path| path.contains(needle))
            || self.audio.as_deref().is_some_and(|path| path.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialTrigger {
    pub index: usize,
    pub id: Option<String>,
    pub title: String,
    pub shape: TriggerShape,
    pub media: Option<MediaRef>,
}

impl SpatialTrigger {
    pub fn new(index: usize, title: impl Into<String>, shape: TriggerShape) -> Self {
        Self {
            index,
            id: None,
            title: title.into(),
            shape,
            media: None,
        }
    }

    pub fn with_media(mut self, media: Option<MediaRef>) -> Self {
        self.media = media;
        self
    }
}

/// Relative paths hang off the scene pack directory; URLs and absolute
/// paths pass through.
pub(crate) fn resolve_media_path(media_base: &Path, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || Path::new(trimmed).is_absolute()
        || media_base.as_os_str().is_empty()
    {
        return trimmed.to_string();
    }
    let rel = trimmed.strip_prefix("./").unwrap_or(trimmed);
    media_base.join(rel).to_string_lossy().into_owned()
}
