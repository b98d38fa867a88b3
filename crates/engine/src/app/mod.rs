mod input;
mod loop_runner;
mod movement;
mod scene;

pub use input::{InputAction, InputEdge};
pub use loop_runner::{
    run_app, AppError, InputSource, LoopConfig, Presenter, RunEnd, RunSummary, REALTIME_ENV_VAR,
};
pub use movement::{filter_movement_delta, movement_intent, turn_intent};
pub use scene::{Hud, InputSnapshot, PlayerRig, Scene, SceneCommand, SceneRouter, SceneWorld};
