/// Walks the tour unattended: face the marker, walk into it, wait for the
/// checkpoint to become advanceable, advance, then take the next scene.
/// With nothing to steer at and nothing playing it gives up after
/// `AUTOPILOT_IDLE_LIMIT` ticks.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    idle_ticks: u32,
}

impl InputSource for Autopilot {
    fn snapshot_for_tick(&mut self, world: &SceneWorld) -> InputSnapshot {
        let hud = world.hud();
        if hud.completed {
            if hud.next_scene_enabled {
                return InputSnapshot::empty().with_pressed(InputEdge::NextScene, true);
            }
            return InputSnapshot::empty().with_pressed(InputEdge::Quit, true);
        }

        if hud.reached {
            self.idle_ticks = 0;
            if hud.advance_enabled && !hud.media_busy {
                return InputSnapshot::empty().with_pressed(InputEdge::Advance, true);
            }
            return InputSnapshot::empty();
        }
        if hud.media_busy {
            self.idle_ticks = 0;
            return InputSnapshot::empty();
        }

        let Some(marker) = world.marker() else {
            self.idle_ticks += 1;
            if self.idle_ticks > AUTOPILOT_IDLE_LIMIT {
                return InputSnapshot::empty().with_pressed(InputEdge::Quit, true);
            }
            return InputSnapshot::empty();
        };
        self.idle_ticks = 0;
        steer_towards(world.player(), marker)
    }
}

fn steer_towards(rig: &PlayerRig, target: Vec3) -> InputSnapshot {
    let dx = target.x - rig.position.x;
    let dz = target.z - rig.position.z;
    if dx * dx + dz * dz <= AUTOPILOT_ARRIVAL_EPSILON * AUTOPILOT_ARRIVAL_EPSILON {
        return InputSnapshot::empty();
    }

    let diff = wrap_angle(yaw_towards(dx, dz) - rig.yaw);
    let mut input = InputSnapshot::empty();
    if diff.abs() > AUTOPILOT_FACING_TOLERANCE {
        let action = if diff > 0.0 {
            InputAction::TurnLeft
        } else {
            InputAction::TurnRight
        };
        input = input.with_action_down(action, true);
    }
    if diff.abs() < AUTOPILOT_WALK_CONE {
        input = input.with_action_down(InputAction::MoveForward, true);
    }
    input
}

/// Replays a line script. Runs out into a quit request.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedInput {
    steps: Vec<ScriptStep>,
    cursor: usize,
    ticks_into_step: u32,
}

impl ScriptedInput {
    pub(crate) fn from_file(path: &Path, tick_seconds: f32) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let steps = parse_script(&raw, tick_seconds)?;
        info!(path = %path.display(), steps = steps.len(), "input_script_loaded");
        Ok(Self::new(steps))
    }

    pub(crate) fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            cursor: 0,
            ticks_into_step: 0,
        }
    }
}

impl InputSource for ScriptedInput {
    fn snapshot_for_tick(&mut self, _world: &SceneWorld) -> InputSnapshot {
        let Some(step) = self.steps.get(self.cursor).copied() else {
            return InputSnapshot::empty().with_pressed(InputEdge::Quit, true);
        };

        let (snapshot, step_ticks) = match step {
            ScriptStep::Hold { input, ticks } => (input, ticks),
            ScriptStep::Press(edge) => (InputSnapshot::empty().with_pressed(edge, true), 1),
            ScriptStep::Wait { ticks } => (InputSnapshot::empty(), ticks),
        };

        self.ticks_into_step += 1;
        if self.ticks_into_step >= step_ticks {
            self.cursor += 1;
            self.ticks_into_step = 0;
        }
        snapshot
    }
}

/// Logs what a UI would show, only when it changes.
#[derive(Debug, Default)]
pub(crate) struct LoggingPresenter {
    last_scene: Option<String>,
    last_hud: Hud,
}

impl Presenter for LoggingPresenter {
    fn present(&mut self, tick: u64, scene_id: Option<&str>, world: &SceneWorld) {
        if self.last_scene.as_deref() != scene_id {
            info!(tick, scene = scene_id.unwrap_or("menu"), "present_scene");
            self.last_scene = scene_id.map(str::to_string);
        }

        let hud = world.hud();
        if hud.hint != self.last_hud.hint {
            info!(tick, hint = %hud.hint, "present_hint");
        }
        if hud.media_title != self.last_hud.media_title
            || hud.overlay_visible != self.last_hud.overlay_visible
        {
            info!(
                tick,
                overlay_visible = hud.overlay_visible,
                media_title = hud.media_title.as_deref().unwrap_or("-"),
                "present_media_overlay"
            );
        }
        if hud.paused != self.last_hud.paused {
            info!(tick, paused = hud.paused, "present_pause");
        }
        if hud.next_scene_enabled && !self.last_hud.next_scene_enabled {
            info!(tick, "present_next_scene_enabled");
        }
        if let Some(marker) = world.marker() {
            debug!(tick, x = marker.x, z = marker.z, "present_marker");
        }
        self.last_hud = hud.clone();
    }
}
