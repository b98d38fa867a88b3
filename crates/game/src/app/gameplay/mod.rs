use std::cell::RefCell;
use std::f32::consts::{PI, TAU};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pilgrimage_engine::{
    filter_movement_delta, movement_intent, turn_intent, Hud, InputAction, InputEdge,
    InputSnapshot, InputSource, LifecycleEvent, PauseState, PlayerRig, Presenter,
    ProgressionEvent, RunEnd, RunSummary, Scene, SceneCatalog, SceneCommand, SceneLifecycle,
    ScenePack, SceneRouter, SceneWorld, SimulatedMediaPlayer, Vec3,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub(crate) const DEFAULT_MEDIA_SECONDS: f32 = 3.0;
const AUTOPILOT_ARRIVAL_EPSILON: f32 = 0.05;
const AUTOPILOT_FACING_TOLERANCE: f32 = 0.05;
const AUTOPILOT_WALK_CONE: f32 = 0.6;
const AUTOPILOT_IDLE_LIMIT: u32 = 600;

include!("types.rs");
include!("scene_impl.rs");
include!("drivers.rs");
include!("util.rs");

/// One walkthrough scene per discovered pack, built fresh on every entry.
pub(crate) fn build_router(
    catalog: SceneCatalog,
    scene_ids: &[String],
    media: &MediaSettings,
    log: &SharedLog,
) -> SceneRouter {
    let mut router = SceneRouter::new(catalog);
    for scene_id in scene_ids {
        let scene_id = scene_id.clone();
        let media = media.clone();
        let log = Rc::clone(log);
        router.register(scene_id.clone(), move || {
            Box::new(PilgrimageScene::new(&scene_id, media.clone(), Rc::clone(&log)))
                as Box<dyn Scene>
        });
    }
    router
}

pub(crate) fn media_settings_from(seconds: Option<&str>, rejected: Option<&str>) -> MediaSettings {
    let duration_seconds = match seconds.map(str::trim) {
        Some(raw) => match raw.parse::<f32>() {
            Ok(value) if value.is_finite() && value >= 0.0 => value,
            _ => {
                warn!(value = raw, "invalid media duration; using default");
                DEFAULT_MEDIA_SECONDS
            }
        },
        None => DEFAULT_MEDIA_SECONDS,
    };
    MediaSettings {
        duration_seconds,
        rejected: rejected.map(parse_csv_list).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
