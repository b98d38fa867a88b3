//! Checkpoint progression: trigger zones, their ordered sequence, the
//! media binding contract, the state machine, and per-activation wiring.

mod lifecycle;
mod media;
mod progression;
mod sequence;
mod trigger;

pub use lifecycle::{LifecycleEvent, PositionSource, SceneLifecycle};
pub use media::{MediaEvent, MediaPlaybackBinding, PauseState, PlaybackId, SimulatedMediaPlayer};
pub use progression::{
    CheckpointProgressionEngine, CheckpointState, MediaStatus, ProgressionEvent, StatusLine,
    StatusPhase,
};
pub use sequence::CheckpointSequence;
pub use trigger::{MediaRef, SpatialTrigger, TriggerShape};
