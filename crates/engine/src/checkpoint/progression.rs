use std::fmt;
use std::mem;

use tracing::{debug, info, warn};

use crate::geometry::Vec3;

use super::media::{MediaEvent, MediaPlaybackBinding, PauseState, PlaybackId};
use super::sequence::CheckpointSequence;
use super::trigger::{MediaRef, SpatialTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointState {
    Idle { index: usize },
    Locked { index: usize },
    /// Past the last checkpoint, waiting on the closing cue.
    Closing,
    Completed,
}

/// Media lifecycle of the current checkpoint, as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStatus {
    Inactive,
    Requested(PlaybackId),
    Playing(PlaybackId),
    Ended,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    Reach,
    Reached,
    Playing,
    Done,
}

impl StatusPhase {
    pub fn label(self) -> &'static str {
        match self {
            StatusPhase::Reach => "Reach",
            StatusPhase::Reached => "Reached",
            StatusPhase::Playing => "Playing",
            StatusPhase::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Checkpoint { title: String, phase: StatusPhase },
    Closing,
    AllDone,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLine::Checkpoint { title, phase } => write!(f, "{title} ({})", phase.label()),
            StatusLine::Closing => f.write_str("Next step"),
            StatusLine::AllDone => f.write_str("All done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionEvent {
    Status(StatusLine),
    MovementLock(bool),
    Entered { index: usize },
    MediaStarted { index: usize },
    MediaEnded { index: usize },
    MediaFailed { index: usize, reason: String },
    /// Moved on to `index`, which is now the current checkpoint.
    Advanced { index: usize },
    /// The closing cue started; completion follows when it finishes.
    Closing,
    Completed,
}

/// Checkpoint state machine for one scene activation.
///
/// The engine owns its index/lock/completion state; callers only drive it
/// through `tick`, `advance`, `restart` and `toggle_pause`. Media is
/// borrowed per call so the owner decides the binding's lifetime.
/// Notifications accumulate in an outbox read with `drain_events`.
#[derive(Debug)]
pub struct CheckpointProgressionEngine {
    sequence: CheckpointSequence,
    always_advance_allowed: bool,
    current_index: usize,
    locked: bool,
    completed: bool,
    entered: bool,
    media: MediaStatus,
    pause: Option<PauseState>,
    status: StatusLine,
    closing_cue: Option<MediaRef>,
    closing: Option<PlaybackId>,
    events: Vec<ProgressionEvent>,
    media_scratch: Vec<MediaEvent>,
}

impl CheckpointProgressionEngine {
    /// An empty sequence starts out completed.
    pub fn new(sequence: CheckpointSequence, always_advance_allowed: bool) -> Self {
        let mut engine = Self {
            sequence,
            always_advance_allowed,
            current_index: 0,
            locked: false,
            completed: false,
            entered: false,
            media: MediaStatus::Inactive,
            pause: None,
            status: StatusLine::AllDone,
            closing_cue: None,
            closing: None,
            events: Vec::new(),
            media_scratch: Vec::new(),
        };

        if engine.sequence.is_empty() {
            engine.complete();
        } else {
            let line = engine.status_for(StatusPhase::Reach);
            engine.status = line.clone();
            engine.events.push(ProgressionEvent::Status(line));
        }
        engine
    }

    /// Media played once the last checkpoint is passed. Completion is held
    /// back until it ends or fails.
    pub fn with_closing_cue(mut self, cue: Option<MediaRef>) -> Self {
        self.closing_cue = cue;
        self
    }

    pub fn tick<M>(&mut self, dt_seconds: f32, position: Vec3, media: &mut M)
    where
        M: MediaPlaybackBinding + ?Sized,
    {
        let mut incoming = mem::take(&mut self.media_scratch);
        media.poll_events(dt_seconds, &mut incoming);
        for event in incoming.drain(..) {
            self.handle_media_event(event);
        }
        self.media_scratch = incoming;

        if self.completed || self.closing.is_some() || self.locked || self.entered {
            return;
        }
        if self.sequence.contains(self.current_index, position) {
            self.enter(media);
        }
    }

    pub fn can_advance(&self) -> bool {
        if self.completed || self.closing.is_some() || self.sequence.is_empty() {
            return false;
        }
        if self.always_advance_allowed || !self.locked {
            return true;
        }
        matches!(
            self.media,
            MediaStatus::Inactive | MediaStatus::Ended | MediaStatus::Failed
        )
    }

    /// Returns whether the index moved.
    pub fn advance<M>(&mut self, media: &mut M) -> bool
    where
        M: MediaPlaybackBinding + ?Sized,
    {
        if !self.can_advance() {
            debug!(
                index = self.current_index,
                locked = self.locked,
                completed = self.completed,
                media = ?self.media,
                "advance_ignored"
            );
            return false;
        }

        media.stop();
        self.media = MediaStatus::Inactive;
        self.pause = None;
        self.entered = false;
        if self.locked {
            self.locked = false;
            self.events.push(ProgressionEvent::MovementLock(false));
        }

        let from = self.current_index;
        self.current_index += 1;
        if self.current_index >= self.sequence.len() {
            info!(from, "checkpoint_advanced");
            match self.closing_cue.clone() {
                Some(cue) => self.begin_closing(&cue, media),
                None => self.complete(),
            }
        } else {
            info!(from, to = self.current_index, "checkpoint_advanced");
            self.events.push(ProgressionEvent::Advanced {
                index: self.current_index,
            });
            self.set_status(StatusPhase::Reach);
        }
        true
    }

    /// Replays the current checkpoint's media. Only meaningful while locked
    /// on a checkpoint that has media.
    pub fn restart<M>(&mut self, media: &mut M) -> bool
    where
        M: MediaPlaybackBinding + ?Sized,
    {
        if self.completed || !self.locked {
            debug!(index = self.current_index, "restart_ignored");
            return false;
        }
        let Some(media_ref) = self.current_trigger().and_then(|t| t.media.clone()) else {
            debug!(index = self.current_index, "restart_ignored_no_media");
            return false;
        };

        let id = media.restart(&media_ref);
        self.media = MediaStatus::Requested(id);
        self.pause = None;
        self.set_status(StatusPhase::Reached);
        info!(index = self.current_index, playback = id.0, "checkpoint_media_restarted");
        true
    }

    pub fn toggle_pause<M>(&mut self, media: &mut M) -> Option<PauseState>
    where
        M: MediaPlaybackBinding + ?Sized,
    {
        if self.completed || self.active_playback().is_none() {
            debug!(index = self.current_index, "toggle_pause_ignored");
            return None;
        }
        let state = media.toggle_pause();
        if let Some(state) = state {
            self.pause = Some(state);
            info!(index = self.current_index, state = ?state, "checkpoint_media_pause_toggled");
        }
        state
    }

    /// Stops whatever the binding is playing and forgets the active id so
    /// nothing it reports later is applied.
    pub fn stop_media<M>(&mut self, media: &mut M)
    where
        M: MediaPlaybackBinding + ?Sized,
    {
        media.stop();
        if self.active_playback().is_some() {
            self.media = MediaStatus::Inactive;
        }
        self.pause = None;
    }

    pub fn state(&self) -> CheckpointState {
        if self.completed {
            CheckpointState::Completed
        } else if self.closing.is_some() {
            CheckpointState::Closing
        } else if self.locked {
            CheckpointState::Locked {
                index: self.current_index,
            }
        } else {
            CheckpointState::Idle {
                index: self.current_index,
            }
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// The current checkpoint was entered; stays true after a failed start
    /// releases the lock.
    pub fn has_entered_current(&self) -> bool {
        self.entered
    }

    pub fn is_media_busy(&self) -> bool {
        self.active_playback().is_some()
    }

    pub fn media_status(&self) -> MediaStatus {
        self.media
    }

    pub fn pause_state(&self) -> Option<PauseState> {
        self.pause
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn sequence(&self) -> &CheckpointSequence {
        &self.sequence
    }

    pub fn always_advance_allowed(&self) -> bool {
        self.always_advance_allowed
    }

    pub fn current_trigger(&self) -> Option<&SpatialTrigger> {
        if self.completed {
            return None;
        }
        self.sequence.get(self.current_index)
    }

    /// Hidden (None) once completed.
    pub fn marker_position(&self) -> Option<Vec3> {
        if self.completed {
            return None;
        }
        self.sequence.center_of(self.current_index)
    }

    pub fn drain_events(&mut self) -> Vec<ProgressionEvent> {
        mem::take(&mut self.events)
    }

    fn enter<M>(&mut self, media: &mut M)
    where
        M: MediaPlaybackBinding + ?Sized,
    {
        let index = self.current_index;
        self.locked = true;
        self.entered = true;
        self.events.push(ProgressionEvent::Entered { index });
        self.events.push(ProgressionEvent::MovementLock(true));

        match self.current_trigger().and_then(|t| t.media.clone()) {
            Some(media_ref) => {
                let id = media.play(&media_ref);
                self.media = MediaStatus::Requested(id);
                info!(index, playback = id.0, "checkpoint_entered");
            }
            None => {
                self.media = MediaStatus::Inactive;
                info!(index, "checkpoint_entered_without_media");
            }
        }
        self.set_status(StatusPhase::Reached);
    }

    fn begin_closing<M>(&mut self, cue: &MediaRef, media: &mut M)
    where
        M: MediaPlaybackBinding + ?Sized,
    {
        let id = media.play(cue);
        self.closing = Some(id);
        self.media = MediaStatus::Requested(id);
        self.status = StatusLine::Closing;
        self.events.push(ProgressionEvent::Status(StatusLine::Closing));
        self.events.push(ProgressionEvent::Closing);
        info!(playback = id.0, "closing_cue_started");
    }

    fn handle_media_event(&mut self, event: MediaEvent) {
        if self.completed || self.active_playback() != Some(event.id()) {
            debug!(playback = event.id().0, "stale_media_event_ignored");
            return;
        }
        if self.closing.is_some() {
            self.handle_closing_event(event);
            return;
        }

        let index = self.current_index;
        match event {
            MediaEvent::Started(id) => {
                self.media = MediaStatus::Playing(id);
                self.events.push(ProgressionEvent::MediaStarted { index });
                self.set_status(StatusPhase::Playing);
                debug!(index, playback = id.0, "checkpoint_media_started");
            }
            MediaEvent::Ended(id) => {
                self.media = MediaStatus::Ended;
                self.pause = None;
                self.events.push(ProgressionEvent::MediaEnded { index });
                self.set_status(StatusPhase::Done);
                info!(index, playback = id.0, "checkpoint_media_ended");
            }
            MediaEvent::Failed { id, reason } => {
                warn!(index, playback = id.0, reason = %reason, "checkpoint_media_failed");
                self.media = MediaStatus::Failed;
                self.pause = None;
                if self.locked {
                    self.locked = false;
                    self.events.push(ProgressionEvent::MovementLock(false));
                }
                self.events.push(ProgressionEvent::MediaFailed { index, reason });
                self.set_status(StatusPhase::Reached);
            }
        }
    }

    fn handle_closing_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Started(id) => {
                self.media = MediaStatus::Playing(id);
                debug!(playback = id.0, "closing_cue_playing");
            }
            MediaEvent::Ended(id) => {
                info!(playback = id.0, "closing_cue_ended");
                self.complete();
            }
            MediaEvent::Failed { id, reason } => {
                warn!(playback = id.0, reason = %reason, "closing_cue_failed");
                self.complete();
            }
        }
    }

    fn complete(&mut self) {
        self.completed = true;
        self.closing = None;
        self.locked = false;
        self.current_index = self.sequence.len();
        self.media = MediaStatus::Inactive;
        self.pause = None;
        self.status = StatusLine::AllDone;
        self.events.push(ProgressionEvent::Status(StatusLine::AllDone));
        self.events.push(ProgressionEvent::Completed);
        info!(checkpoints = self.sequence.len(), "checkpoints_completed");
    }

    fn active_playback(&self) -> Option<PlaybackId> {
        match self.media {
            MediaStatus::Requested(id) | MediaStatus::Playing(id) => Some(id),
            _ => None,
        }
    }

    fn status_for(&self, phase: StatusPhase) -> StatusLine {
        match self.sequence.get(self.current_index) {
            Some(trigger) => StatusLine::Checkpoint {
                title: trigger.title.clone(),
                phase,
            },
            None => StatusLine::AllDone,
        }
    }

    fn set_status(&mut self, phase: StatusPhase) {
        let line = self.status_for(phase);
        if line != self.status {
            self.status = line.clone();
            self.events.push(ProgressionEvent::Status(line));
        }
    }
}
