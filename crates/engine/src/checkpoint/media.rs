use tracing::{debug, warn};

use super::trigger::MediaRef;

/// Identity of one `play`/`restart` request. Events carry it so a consumer
/// can tell a live pairing from a superseded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    Started(PlaybackId),
    Ended(PlaybackId),
    Failed { id: PlaybackId, reason: String },
}

impl MediaEvent {
    pub fn id(&self) -> PlaybackId {
        match self {
            MediaEvent::Started(id) | MediaEvent::Ended(id) => *id,
            MediaEvent::Failed { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Playing,
    Paused,
}

/// Paired video/audio playback driven by the progression engine.
///
/// Contract:
/// - `play` stops any previous pairing first; at most one is active.
/// - `stop` is idempotent. A stopped pairing never reports `Ended`.
/// - Start is asynchronous: `Started` or `Failed` arrives through
///   `poll_events` on a later tick. A failed start behaves like `stop`.
/// - `Ended` is reported at most once per id.
pub trait MediaPlaybackBinding {
    fn play(&mut self, media: &MediaRef) -> PlaybackId;

    fn stop(&mut self);

    fn restart(&mut self, media: &MediaRef) -> PlaybackId {
        self.play(media)
    }

    /// `None` when nothing is active.
    fn toggle_pause(&mut self) -> Option<PauseState>;

    fn poll_events(&mut self, dt_seconds: f32, out: &mut Vec<MediaEvent>);

    fn play_cue(&mut self, _path: &str) {}
}

impl<T: MediaPlaybackBinding + ?Sized> MediaPlaybackBinding for Box<T> {
    fn play(&mut self, media: &MediaRef) -> PlaybackId {
        (**self).play(media)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn restart(&mut self, media: &MediaRef) -> PlaybackId {
        (**self).restart(media)
    }

    fn toggle_pause(&mut self) -> Option<PauseState> {
        (**self).toggle_pause()
    }

    fn poll_events(&mut self, dt_seconds: f32, out: &mut Vec<MediaEvent>) {
        (**self).poll_events(dt_seconds, out)
    }

    fn play_cue(&mut self, path: &str) {
        (**self).play_cue(path)
    }
}

#[derive(Debug, Clone)]
struct ActivePlayback {
    id: PlaybackId,
    media: MediaRef,
    started: bool,
    paused: bool,
    elapsed_seconds: f32,
}

/// Clock-driven stand-in for a real player. Every pairing lasts
/// `duration_seconds`; pairings whose paths contain a rejected substring
/// fail to start.
#[derive(Debug, Clone)]
pub struct SimulatedMediaPlayer {
    duration_seconds: f32,
    rejected: Vec<String>,
    next_id: u64,
    active: Option<ActivePlayback>,
    cues: Vec<String>,
    play_requests: usize,
    stop_calls: usize,
}

impl SimulatedMediaPlayer {
    pub fn new(duration_seconds: f32) -> Self {
        Self {
            duration_seconds: duration_seconds.max(0.0),
            rejected: Vec::new(),
            next_id: 1,
            active: None,
            cues: Vec::new(),
            play_requests: 0,
            stop_calls: 0,
        }
    }

    pub fn with_rejected<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejected.extend(
            patterns
                .into_iter()
                .map(Into::into)
                .filter(|pattern: &String| !pattern.is_empty()),
        );
        self
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration_seconds
    }

    pub fn active_id(&self) -> Option<PlaybackId> {
        self.active.as_ref().map(|playback| playback.id)
    }

    pub fn active_media(&self) -> Option<&MediaRef> {
        self.active.as_ref().map(|playback| &playback.media)
    }

    pub fn is_paused(&self) -> bool {
        self.active.as_ref().is_some_and(|playback| playback.paused)
    }

    pub fn cues(&self) -> &[String] {
        &self.cues
    }

    pub fn play_requests(&self) -> usize {
        self.play_requests
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls
    }

    fn is_rejected(&self, media: &MediaRef) -> bool {
        self.rejected.iter().any(|pattern| media.mentions(pattern))
    }
}

impl MediaPlaybackBinding for SimulatedMediaPlayer {
    fn play(&mut self, media: &MediaRef) -> PlaybackId {
        self.stop();
        let id = PlaybackId(self.next_id);
        self.next_id += 1;
        self.play_requests += 1;
        debug!(
            playback = id.0,
            video = media.video().unwrap_or("-"),
            audio = media.audio().unwrap_or("-"),
            "media_play_requested"
        );
        self.active = Some(ActivePlayback {
            id,
            media: media.clone(),
            started: false,
            paused: false,
            elapsed_seconds: 0.0,
        });
        id
    }

    fn stop(&mut self) {
        self.stop_calls += 1;
        if let Some(playback) = self.active.take() {
            debug!(playback = playback.id.0, "media_stopped");
        }
    }

    fn toggle_pause(&mut self) -> Option<PauseState> {
        let playback = self.active.as_mut()?;
        playback.paused = !playback.paused;
        Some(if playback.paused {
            PauseState::Paused
        } else {
            PauseState::Playing
        })
    }

    fn poll_events(&mut self, dt_seconds: f32, out: &mut Vec<MediaEvent>) {
        let rejected = self
            .active
            .as_ref()
            .is_some_and(|playback| !playback.started && self.is_rejected(&playback.media));
        if rejected {
            if let Some(playback) = self.active.take() {
                warn!(playback = playback.id.0, "media_start_rejected");
                out.push(MediaEvent::Failed {
                    id: playback.id,
                    reason: "playback start rejected".to_string(),
                });
            }
            return;
        }

        let duration = self.duration_seconds;
        let Some(playback) = self.active.as_mut() else {
            return;
        };
        if !playback.started {
            playback.started = true;
            out.push(MediaEvent::Started(playback.id));
            return;
        }
        if playback.paused {
            return;
        }
        playback.elapsed_seconds += dt_seconds.max(0.0);
        if playback.elapsed_seconds >= duration {
            let id = playback.id;
            self.active = None;
            out.push(MediaEvent::Ended(id));
        }
    }

    fn play_cue(&mut self, path: &str) {
        debug!(cue = path, "media_cue_played");
        self.cues.push(path.to_string());
    }
}
