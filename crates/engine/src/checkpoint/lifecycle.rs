use tracing::{info, warn};

use crate::content::{ConfigError, SceneConfig, ScenePack};
use crate::geometry::Vec3;

use super::media::{MediaPlaybackBinding, PauseState};
use super::progression::{CheckpointProgressionEngine, ProgressionEvent};
use super::sequence::CheckpointSequence;
use super::trigger::{resolve_media_path, MediaRef};

/// Where the player is this tick. The engine does not care how it was
/// derived.
pub trait PositionSource {
    fn sample_position(&self) -> Vec3;
}

impl PositionSource for Vec3 {
    fn sample_position(&self) -> Vec3 {
        *self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Progress(ProgressionEvent),
    /// Raised once, right after the engine reports completion.
    Handoff {
        next_scene: Option<String>,
        auto_switch: bool,
    },
}

/// One scene activation: the sequence built from the pack, the engine, and
/// the media binding it drives. Dropping it tears it down.
pub struct SceneLifecycle<M: MediaPlaybackBinding> {
    scene_id: String,
    config: SceneConfig,
    advance_cue: Option<String>,
    engine: CheckpointProgressionEngine,
    media: M,
    config_error: Option<ConfigError>,
    handoff_sent: bool,
    active: bool,
    outbox: Vec<LifecycleEvent>,
}

impl<M: MediaPlaybackBinding> SceneLifecycle<M> {
    /// Invalid trigger configuration degrades to an empty sequence.
    pub fn activate(pack: &ScenePack, media: M) -> Self {
        let descriptors = pack.triggers.as_deref();
        let loaded = if pack.config.playlist {
            CheckpointSequence::load_playlist(descriptors, pack.media_base())
        } else {
            CheckpointSequence::load(descriptors, pack.media_base())
        };
        let (sequence, config_error) = match loaded {
            Ok(sequence) => (sequence, None),
            Err(error) => {
                warn!(scene = %pack.scene_id, error = %error, "checkpoint_config_invalid");
                (CheckpointSequence::empty(), Some(error))
            }
        };
        let advance_cue = pack
            .config
            .advance_cue_path()
            .map(|path| resolve_media_path(pack.media_base(), path));
        let closing_cue = pack
            .config
            .closing_cue_path()
            .map(|path| resolve_media_path(pack.media_base(), path))
            .and_then(|path| MediaRef::new(None, Some(path)));

        info!(
            scene = %pack.scene_id,
            checkpoints = sequence.len(),
            playlist = pack.config.playlist,
            always_advance_allowed = pack.config.always_advance_allowed,
            "scene_lifecycle_activated"
        );
        let engine =
            CheckpointProgressionEngine::new(sequence, pack.config.always_advance_allowed)
                .with_closing_cue(closing_cue);

        let mut lifecycle = Self {
            scene_id: pack.scene_id.clone(),
            config: pack.config.clone(),
            advance_cue,
            engine,
            media,
            config_error,
            handoff_sent: false,
            active: true,
            outbox: Vec::new(),
        };
        lifecycle.collect_events();
        lifecycle
    }

    pub fn tick<P>(&mut self, dt_seconds: f32, source: &P)
    where
        P: PositionSource + ?Sized,
    {
        if !self.active {
            return;
        }
        let position = source.sample_position();
        self.engine.tick(dt_seconds, position, &mut self.media);
        self.collect_events();
    }

    pub fn advance(&mut self) -> bool {
        if !self.active {
            return false;
        }
        if self.engine.can_advance() {
            if let Some(cue) = self.advance_cue.as_deref() {
                self.media.play_cue(cue);
            }
        }
        let moved = self.engine.advance(&mut self.media);
        self.collect_events();
        moved
    }

    pub fn restart(&mut self) -> bool {
        if !self.active {
            return false;
        }
        let restarted = self.engine.restart(&mut self.media);
        self.collect_events();
        restarted
    }

    pub fn toggle_pause(&mut self) -> Option<PauseState> {
        if !self.active {
            return None;
        }
        let state = self.engine.toggle_pause(&mut self.media);
        self.collect_events();
        state
    }

    /// Stops media and detaches from the engine. Idempotent; later calls
    /// to the driving operations are no-ops.
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.engine.stop_media(&mut self.media);
        self.active = false;
        self.outbox.clear();
        info!(scene = %self.scene_id, "scene_lifecycle_torn_down");
    }

    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Scene the host should offer after completion.
    pub fn next_scene(&self) -> Option<&str> {
        if !self.engine.is_completed() {
            return None;
        }
        self.config.next_scene_id()
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn config_error(&self) -> Option<&ConfigError> {
        self.config_error.as_ref()
    }

    pub fn engine(&self) -> &CheckpointProgressionEngine {
        &self.engine
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_locked(&self) -> bool {
        self.engine.is_locked()
    }

    fn collect_events(&mut self) {
        for event in self.engine.drain_events() {
            let completed = event == ProgressionEvent::Completed;
            self.outbox.push(LifecycleEvent::Progress(event));
            if completed && !self.handoff_sent {
                self.handoff_sent = true;
                let next_scene = self.config.next_scene_id().map(str::to_string);
                info!(
                    scene = %self.scene_id,
                    next_scene = next_scene.as_deref().unwrap_or("-"),
                    auto_switch = self.config.auto_switch_on_complete,
                    "scene_checkpoints_complete"
                );
                self.outbox.push(LifecycleEvent::Handoff {
                    next_scene,
                    auto_switch: self.config.auto_switch_on_complete,
                });
            }
        }
    }
}

impl<M: MediaPlaybackBinding> Drop for SceneLifecycle<M> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::super::media::{MediaEvent, PlaybackId, SimulatedMediaPlayer};
    use super::super::progression::{CheckpointState, StatusLine};
    use super::*;
    use crate::content::TriggerDescriptor;

    fn pack(config: SceneConfig, triggers: Option<&str>) -> ScenePack {
        let triggers = triggers.map(|json| {
            serde_json::from_str::<Vec<TriggerDescriptor>>(json).expect("descriptors")
        });
        ScenePack {
            scene_id: "safa_marwah".to_string(),
            base_dir: PathBuf::from("/packs/safa_marwah"),
            config,
            triggers,
            fingerprint: String::new(),
            load_errors: Vec::new(),
        }
    }

    const TWO_STATIONS: &str = r#"[
        { "title": "Safa", "center": [0, 0, 0], "audio": "media/audio/safa.mp3" },
        { "title": "Marwah", "center": [0, 0, -30], "audio": "media/audio/marwah.mp3" }
    ]"#;

    #[derive(Debug, Default)]
    struct CountingMedia {
        stops: Rc<Cell<usize>>,
    }

    impl MediaPlaybackBinding for CountingMedia {
        fn play(&mut self, _media: &MediaRef) -> PlaybackId {
            PlaybackId(1)
        }

        fn stop(&mut self) {
            self.stops.set(self.stops.get() + 1);
        }

        fn toggle_pause(&mut self) -> Option<PauseState> {
            None
        }

        fn poll_events(&mut self, _dt_seconds: f32, _out: &mut Vec<MediaEvent>) {}
    }

    #[test]
    fn invalid_triggers_degrade_to_completed_scene() {
        let config = SceneConfig {
            next_scene: Some("umrah_haram".to_string()),
            ..SceneConfig::default()
        };
        let mut lifecycle = SceneLifecycle::activate(
            &pack(config, Some(r#"[ { "title": "no shape" } ]"#)),
            SimulatedMediaPlayer::new(1.0),
        );

        assert!(matches!(
            lifecycle.config_error(),
            Some(ConfigError::MissingShape { position: 0 })
        ));
        assert_eq!(lifecycle.engine().state(), CheckpointState::Completed);
        assert_eq!(lifecycle.next_scene(), Some("umrah_haram"));
        let events = lifecycle.drain_events();
        assert!(events.contains(&LifecycleEvent::Handoff {
            next_scene: Some("umrah_haram".to_string()),
            auto_switch: false,
        }));
    }

    #[test]
    fn walkthrough_with_simulated_media_hands_off_once() {
        let config = SceneConfig {
            next_scene: Some("umrah_haram".to_string()),
            auto_switch_on_complete: true,
            advance_cue: Some("media/audio/NextStep.mp3".to_string()),
            ..SceneConfig::default()
        };
        let mut lifecycle =
            SceneLifecycle::activate(&pack(config, Some(TWO_STATIONS)), SimulatedMediaPlayer::new(0.5));
        let dt = 0.1;

        lifecycle.tick(dt, &Vec3::new(0.0, 1.6, 0.0));
        assert!(lifecycle.is_locked());
        assert!(!lifecycle.advance());
        for _ in 0..10 {
            lifecycle.tick(dt, &Vec3::new(0.0, 1.6, 0.0));
        }
        assert_eq!(lifecycle.engine().status().to_string(), "Safa (Done)");
        assert_eq!(lifecycle.next_scene(), None);

        assert!(lifecycle.advance());
        assert_eq!(
            lifecycle.media().cues(),
            &[PathBuf::from("/packs/safa_marwah")
                .join("media/audio/NextStep.mp3")
                .to_string_lossy()
                .into_owned()]
        );
        lifecycle.tick(dt, &Vec3::new(0.0, 1.6, -29.0));
        for _ in 0..10 {
            lifecycle.tick(dt, &Vec3::new(0.0, 1.6, -29.0));
        }
        assert!(lifecycle.advance());
        assert!(!lifecycle.advance());

        let handoffs: Vec<_> = lifecycle
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, LifecycleEvent::Handoff { .. }))
            .collect();
        assert_eq!(
            handoffs,
            vec![LifecycleEvent::Handoff {
                next_scene: Some("umrah_haram".to_string()),
                auto_switch: true,
            }]
        );
        assert_eq!(lifecycle.engine().status(), &StatusLine::AllDone);
    }

    #[test]
    fn teardown_stops_media_and_freezes_engine() {
        let mut lifecycle = SceneLifecycle::activate(
            &pack(SceneConfig::default(), Some(TWO_STATIONS)),
            SimulatedMediaPlayer::new(10.0),
        );
        lifecycle.tick(0.1, &Vec3::new(0.0, 1.6, 0.0));
        assert!(lifecycle.media().active_id().is_some());

        lifecycle.teardown();
        assert_eq!(lifecycle.media().active_id(), None);
        assert!(!lifecycle.is_active());

        lifecycle.tick(0.1, &Vec3::new(0.0, 1.6, 0.0));
        assert!(!lifecycle.advance());
        assert!(!lifecycle.restart());
        assert!(lifecycle.drain_events().is_empty());
    }

    #[test]
    fn drop_tears_down_exactly_once() {
        let stops = Rc::new(Cell::new(0));
        {
            let mut lifecycle = SceneLifecycle::activate(
                &pack(SceneConfig::default(), Some(TWO_STATIONS)),
                CountingMedia {
                    stops: Rc::clone(&stops),
                },
            );
            lifecycle.teardown();
            assert_eq!(stops.get(), 1);
        }
        assert_eq!(stops.get(), 1);

        {
            let _lifecycle = SceneLifecycle::activate(
                &pack(SceneConfig::default(), None),
                CountingMedia {
                    stops: Rc::clone(&stops),
                },
            );
        }
        assert_eq!(stops.get(), 2);
    }

    #[test]
    fn missing_triggers_file_completes_without_error() {
        let lifecycle = SceneLifecycle::activate(
            &pack(SceneConfig::default(), None),
            SimulatedMediaPlayer::new(1.0),
        );
        assert!(lifecycle.config_error().is_none());
        assert_eq!(lifecycle.engine().state(), CheckpointState::Completed);
        assert_eq!(lifecycle.next_scene(), None);
    }

    #[test]
    fn playlist_pack_plays_closing_cue_before_handoff() {
        let config = SceneConfig {
            playlist: true,
            always_advance_allowed: true,
            closing_cue: Some("media/audio/NextStep.mp3".to_string()),
            next_scene: Some("safa_marwah".to_string()),
            ..SceneConfig::default()
        };
        let items = r#"[ { "title": "Niyat", "audio": "media/audio/niyat.mp3" },
                         { "title": "Talbiyah", "audio": "media/audio/talbiyah.mp3" } ]"#;
        let mut lifecycle =
            SceneLifecycle::activate(&pack(config, Some(items)), SimulatedMediaPlayer::new(0.3));
        let anywhere = Vec3::new(50.0, 1.6, -50.0);

        lifecycle.tick(0.1, &anywhere);
        assert_eq!(lifecycle.engine().state(), CheckpointState::Locked { index: 0 });
        assert!(lifecycle.advance());
        lifecycle.tick(0.1, &anywhere);
        assert_eq!(lifecycle.engine().state(), CheckpointState::Locked { index: 1 });
        assert!(lifecycle.advance());
        assert_eq!(lifecycle.engine().state(), CheckpointState::Closing);
        assert_eq!(lifecycle.next_scene(), None);
        assert!(!lifecycle
            .drain_events()
            .iter()
            .any(|event| matches!(event, LifecycleEvent::Handoff { .. })));

        for _ in 0..5 {
            lifecycle.tick(0.1, &anywhere);
        }
        assert_eq!(lifecycle.engine().state(), CheckpointState::Completed);
        assert_eq!(lifecycle.next_scene(), Some("safa_marwah"));
        assert!(lifecycle.drain_events().contains(&LifecycleEvent::Handoff {
            next_scene: Some("safa_marwah".to_string()),
            auto_switch: false,
        }));
    }

    #[test]
    fn playlist_pack_with_shaped_items_degrades() {
        let config = SceneConfig {
            playlist: true,
            ..SceneConfig::default()
        };
        let lifecycle = SceneLifecycle::activate(
            &pack(config, Some(TWO_STATIONS)),
            SimulatedMediaPlayer::new(1.0),
        );
        assert!(matches!(
            lifecycle.config_error(),
            Some(ConfigError::InvalidShape { position: 0, .. })
        ));
        assert_eq!(lifecycle.engine().state(), CheckpointState::Completed);
    }
}
