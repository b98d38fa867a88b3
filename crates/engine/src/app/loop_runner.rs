use std::env;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::content::ContentError;
use crate::StartupError;

use super::scene::{InputSnapshot, SceneRouter, SceneWorld};

pub const REALTIME_ENV_VAR: &str = "PILGRIMAGE_REALTIME";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    /// Pace ticks to the wall clock instead of running as fast as possible.
    pub realtime: bool,
    pub max_ticks: Option<u64>,
    /// Defaults to the first registered scene.
    pub start_scene: Option<String>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            realtime: false,
            max_ticks: Some(36_000),
            start_scene: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("no scenes are registered")]
    NoScenes,
    #[error("start scene `{scene_id}` is not registered")]
    UnknownStartScene { scene_id: String },
}

/// Produces the input for one fixed tick. Edge presses must be reported
/// for a single tick only.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, world: &SceneWorld) -> InputSnapshot;
}

/// Receives the world once per frame, after that frame's ticks.
pub trait Presenter {
    fn present(&mut self, tick: u64, scene_id: Option<&str>, world: &SceneWorld);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Quit,
    Menu,
    TickLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub end: RunEnd,
    pub ticks: u64,
    pub frames: u64,
    pub scenes_entered: Vec<String>,
    pub final_scene: Option<String>,
    pub dropped_backlog: Duration,
}

pub fn run_app(
    config: LoopConfig,
    router: &mut SceneRouter,
    input: &mut dyn InputSource,
    presenter: &mut dyn Presenter,
) -> Result<RunSummary, AppError> {
    let start_scene = match &config.start_scene {
        Some(scene_id) if router.is_registered(scene_id) => scene_id.clone(),
        Some(scene_id) => {
            return Err(AppError::UnknownStartScene {
                scene_id: scene_id.clone(),
            })
        }
        None => router
            .registered_ids()
            .next()
            .map(str::to_string)
            .ok_or(AppError::NoScenes)?,
    };

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let realtime = resolve_realtime(config.realtime);
    let max_ticks = config.max_ticks.filter(|max| *max > 0);
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        realtime,
        max_ticks = max_ticks.unwrap_or(0),
        start_scene = start_scene.as_str(),
        "loop_config"
    );

    let mut scenes_entered = Vec::new();
    if router.enter(&start_scene) {
        scenes_entered.push(start_scene);
    }

    let mut accumulator = Duration::ZERO;
    let mut dropped_total = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut ticks = 0u64;
    let mut frames = 0u64;

    let end = 'frames: loop {
        if router.is_at_menu() {
            break 'frames RunEnd::Menu;
        }

        let frame_dt = if realtime {
            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            dt
        } else {
            fixed_dt
        };
        accumulator = accumulator.saturating_add(clamp_frame_delta(frame_dt, max_frame_delta));

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            let snapshot = input.snapshot_for_tick(router.world());
            if snapshot.quit_requested() {
                info!(reason = "quit_input", "shutdown_requested");
                break 'frames RunEnd::Quit;
            }
            let command = router.update_active(fixed_dt_seconds, &snapshot);
            if router.apply(command) {
                if let Some(scene_id) = router.active_id() {
                    scenes_entered.push(scene_id.to_string());
                }
            }
            ticks += 1;

            if router.is_at_menu() {
                break 'frames RunEnd::Menu;
            }
            if max_ticks.is_some_and(|max| ticks >= max) {
                info!(ticks, reason = "tick_limit", "shutdown_requested");
                break 'frames RunEnd::TickLimit;
            }
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            dropped_total = dropped_total.saturating_add(step_plan.dropped_backlog);
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        presenter.present(ticks, router.active_id(), router.world());
        frames += 1;

        if realtime {
            let elapsed = Instant::now().saturating_duration_since(last_frame_instant);
            let sleep = compute_cap_sleep(elapsed, Some(fixed_dt));
            if sleep > Duration::ZERO {
                thread::sleep(sleep);
            }
        }
    };

    presenter.present(ticks, router.active_id(), router.world());
    let final_scene = router.active_id().map(str::to_string);
    router.shutdown();
    info!(ticks, frames, end = ?end, "shutdown");

    Ok(RunSummary {
        end,
        ticks,
        frames,
        scenes_entered,
        final_scene,
        dropped_backlog: dropped_total,
    })
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn resolve_realtime(config_realtime: bool) -> bool {
    match env::var(REALTIME_ENV_VAR) {
        Ok(value) => match parse_flag(&value) {
            Some(flag) => flag,
            None => {
                warn!(
                    env_var = REALTIME_ENV_VAR,
                    value = value.as_str(),
                    "invalid realtime env var value; falling back to config"
                );
                config_realtime
            }
        },
        Err(env::VarError::NotPresent) => config_realtime,
        Err(err) => {
            warn!(
                env_var = REALTIME_ENV_VAR,
                error = %err,
                "unable to read realtime env var; falling back to config"
            );
            config_realtime
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::super::input::InputEdge;
    use super::super::scene::{Scene, SceneCommand};
    use super::*;
    use crate::content::SceneCatalog;

    struct CountingScene {
        exit_after: Option<u32>,
        switch_after: Option<(u32, &'static str)>,
        ticks: u32,
    }

    impl Scene for CountingScene {
        fn load(&mut self, _world: &mut SceneWorld) {}

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            self.ticks += 1;
            world.hud_mut().hint = format!("tick {}", self.ticks);
            if self.exit_after.is_some_and(|after| self.ticks >= after) {
                return SceneCommand::ExitToMenu;
            }
            match self.switch_after {
                Some((after, target)) if self.ticks >= after => {
                    SceneCommand::SwitchTo(target.to_string())
                }
                _ => SceneCommand::None,
            }
        }

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    struct QuitAfter {
        remaining: u32,
    }

    impl InputSource for QuitAfter {
        fn snapshot_for_tick(&mut self, _world: &SceneWorld) -> InputSnapshot {
            if self.remaining == 0 {
                return InputSnapshot::empty().with_pressed(InputEdge::Quit, true);
            }
            self.remaining -= 1;
            InputSnapshot::empty()
        }
    }

    #[derive(Default)]
    struct CollectingPresenter {
        hints: Vec<String>,
    }

    impl Presenter for CollectingPresenter {
        fn present(&mut self, _tick: u64, _scene_id: Option<&str>, world: &SceneWorld) {
            self.hints.push(world.hud().hint.clone());
        }
    }

    fn router() -> SceneRouter {
        let mut router = SceneRouter::new(SceneCatalog::new(PathBuf::from(
            "definitely/not/a/scenes/dir",
        )));
        router.register("safa_marwah", || {
            Box::new(CountingScene {
                exit_after: None,
                switch_after: Some((3, "umrah_haram")),
                ticks: 0,
            }) as Box<dyn Scene>
        });
        router.register("umrah_haram", || {
            Box::new(CountingScene {
                exit_after: Some(4),
                switch_after: None,
                ticks: 0,
            }) as Box<dyn Scene>
        });
        router
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn compute_cap_sleep_only_when_under_budget() {
        let target = Some(Duration::from_millis(16));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(20), target),
            Duration::ZERO
        );
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(10), target),
            Duration::from_millis(6)
        );
        assert_eq!(compute_cap_sleep(Duration::ZERO, None), Duration::ZERO);
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" On "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn run_follows_switch_then_exits_to_menu() {
        let mut router = router();
        let mut input = QuitAfter { remaining: 100 };
        let mut presenter = CollectingPresenter::default();

        let summary = run_app(
            LoopConfig::default(),
            &mut router,
            &mut input,
            &mut presenter,
        )
        .expect("run");

        assert_eq!(summary.end, RunEnd::Menu);
        assert_eq!(summary.ticks, 7);
        assert_eq!(
            summary.scenes_entered,
            vec!["safa_marwah".to_string(), "umrah_haram".to_string()]
        );
        assert_eq!(summary.final_scene, None);
        assert_eq!(presenter.hints.first().map(String::as_str), Some("tick 1"));
    }

    #[test]
    fn quit_input_stops_the_loop() {
        let mut router = router();
        let mut input = QuitAfter { remaining: 2 };
        let mut presenter = CollectingPresenter::default();

        let summary = run_app(
            LoopConfig::default(),
            &mut router,
            &mut input,
            &mut presenter,
        )
        .expect("run");

        assert_eq!(summary.end, RunEnd::Quit);
        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.final_scene.as_deref(), Some("safa_marwah"));
        assert!(router.is_at_menu());
    }

    #[test]
    fn tick_limit_ends_run() {
        let mut router = router();
        let mut input = QuitAfter { remaining: 100 };
        let mut presenter = CollectingPresenter::default();
        let config = LoopConfig {
            max_ticks: Some(2),
            start_scene: Some("umrah_haram".to_string()),
            ..LoopConfig::default()
        };

        let summary = run_app(config, &mut router, &mut input, &mut presenter).expect("run");
        assert_eq!(summary.end, RunEnd::TickLimit);
        assert_eq!(summary.ticks, 2);
    }

    #[test]
    fn unknown_start_scene_is_an_error() {
        let mut router = router();
        let config = LoopConfig {
            start_scene: Some("jamarat".to_string()),
            ..LoopConfig::default()
        };

        let result = run_app(
            config,
            &mut router,
            &mut QuitAfter { remaining: 0 },
            &mut CollectingPresenter::default(),
        );
        assert!(matches!(result, Err(AppError::UnknownStartScene { .. })));
    }

    #[test]
    fn empty_router_is_an_error() {
        let mut router = SceneRouter::new(SceneCatalog::new(PathBuf::from("nowhere")));
        let result = run_app(
            LoopConfig::default(),
            &mut router,
            &mut QuitAfter { remaining: 0 },
            &mut CollectingPresenter::default(),
        );
        assert!(matches!(result, Err(AppError::NoScenes)));
    }
}
