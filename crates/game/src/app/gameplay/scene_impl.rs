struct PilgrimageScene {
    scene_id: String,
    media: MediaSettings,
    log: SharedLog,
    lifecycle: Option<SceneLifecycle<SimulatedMediaPlayer>>,
    title: String,
    move_speed: f32,
    turn_speed: f32,
    eye_level: f32,
    pending_switch: Option<String>,
}

impl PilgrimageScene {
    fn new(scene_id: &str, media: MediaSettings, log: SharedLog) -> Self {
        Self {
            scene_id: scene_id.to_string(),
            media,
            log,
            lifecycle: None,
            title: scene_id.to_string(),
            move_speed: 0.0,
            turn_speed: 0.0,
            eye_level: 0.0,
            pending_switch: None,
        }
    }

    fn apply_lifecycle_events(&mut self, world: &mut SceneWorld) {
        let Some(lifecycle) = self.lifecycle.as_mut() else {
            return;
        };
        let events = lifecycle.drain_events();
        let mut log = self.log.borrow_mut();
        let Some(record) = log.scenes.last_mut() else {
            return;
        };

        for event in events {
            match event {
                LifecycleEvent::Progress(ProgressionEvent::Status(line)) => {
                    world.hud_mut().hint = line.to_string();
                }
                LifecycleEvent::Progress(ProgressionEvent::MovementLock(locked)) => {
                    debug!(scene = %self.scene_id, locked, "movement_lock_changed");
                }
                LifecycleEvent::Progress(ProgressionEvent::Entered { index }) => {
                    let trigger = lifecycle.engine().sequence().get(index);
                    let title = trigger.map_or_else(String::new, |t| t.title.clone());
                    let has_media = trigger.is_some_and(|t| t.media.is_some());
                    if has_media {
                        let hud = world.hud_mut();
                        hud.overlay_visible = true;
                        hud.media_title = Some(format!("{} - {}", self.title, title));
                    }
                    record.checkpoints.push(CheckpointRecord {
                        index,
                        title,
                        media: if has_media {
                            MediaOutcome::Requested
                        } else {
                            MediaOutcome::None
                        },
                        restarts: 0,
                    });
                }
                LifecycleEvent::Progress(ProgressionEvent::MediaStarted { index }) => {
                    set_outcome(record, index, MediaOutcome::Started);
                }
                LifecycleEvent::Progress(ProgressionEvent::MediaEnded { index }) => {
                    set_outcome(record, index, MediaOutcome::Ended);
                }
                LifecycleEvent::Progress(ProgressionEvent::MediaFailed { index, .. }) => {
                    set_outcome(record, index, MediaOutcome::Failed);
                    hide_overlay(world);
                }
                LifecycleEvent::Progress(ProgressionEvent::Advanced { .. }) => {
                    hide_overlay(world);
                }
                LifecycleEvent::Progress(ProgressionEvent::Closing) => {
                    hide_overlay(world);
                }
                LifecycleEvent::Progress(ProgressionEvent::Completed) => {
                    record.completed = true;
                    hide_overlay(world);
                }
                LifecycleEvent::Handoff {
                    next_scene,
                    auto_switch,
                } => {
                    record.next_scene = next_scene.clone();
                    world.hud_mut().next_scene_enabled = next_scene.is_some();
                    if auto_switch {
                        self.pending_switch = next_scene;
                    }
                }
            }
        }
    }

    fn sync_hud(&self, world: &mut SceneWorld) {
        let Some(lifecycle) = self.lifecycle.as_ref() else {
            return;
        };
        let engine = lifecycle.engine();
        world.set_marker(engine.marker_position());
        let hud = world.hud_mut();
        hud.reached = engine.has_entered_current();
        hud.media_busy = engine.is_media_busy();
        hud.paused = engine.pause_state() == Some(PauseState::Paused);
        hud.advance_enabled = engine.can_advance();
        hud.completed = engine.is_completed();
    }

    fn note_restart(&self) {
        let Some(index) = self
            .lifecycle
            .as_ref()
            .map(|lifecycle| lifecycle.engine().current_index())
        else {
            return;
        };
        let mut log = self.log.borrow_mut();
        if let Some(checkpoint) = log
            .scenes
            .last_mut()
            .and_then(|record| record.checkpoints.iter_mut().rev().find(|c| c.index == index))
        {
            checkpoint.restarts += 1;
            checkpoint.media = MediaOutcome::Requested;
        }
    }
}

impl Scene for PilgrimageScene {
    fn load(&mut self, world: &mut SceneWorld) {
        let pack = world
            .pack()
            .cloned()
            .unwrap_or_else(|| ScenePack::fallback(&self.scene_id));
        let config = &pack.config;
        self.title = config
            .title
            .clone()
            .unwrap_or_else(|| self.scene_id.clone());
        self.move_speed = config.player.move_speed.max(0.0);
        self.turn_speed = config.turn_speed.max(0.0);
        self.eye_level = config.eye_level();
        self.pending_switch = None;
        *world.player_mut() = PlayerRig {
            position: config.spawn_position(),
            yaw: 0.0,
        };
        *world.hud_mut() = Hud::default();

        let lifecycle = SceneLifecycle::activate(&pack, self.media.player());
        self.log.borrow_mut().scenes.push(SceneRecord {
            scene_id: self.scene_id.clone(),
            checkpoints_total: lifecycle.engine().sequence().len(),
            config_error: lifecycle.config_error().map(ToString::to_string),
            content_errors: pack.load_errors.clone(),
            ..SceneRecord::default()
        });
        info!(
            scene = %self.scene_id,
            title = %self.title,
            checkpoints = lifecycle.engine().sequence().len(),
            spawn = ?world.player().position,
            "scene_loaded"
        );
        self.lifecycle = Some(lifecycle);
        self.apply_lifecycle_events(world);
        self.sync_hud(world);
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.pressed(InputEdge::ExitScene) {
            info!(scene = %self.scene_id, "scene_exit_requested");
            return SceneCommand::ExitToMenu;
        }
        let Some(lifecycle) = self.lifecycle.as_mut() else {
            return SceneCommand::None;
        };

        if input.pressed(InputEdge::Advance) {
            lifecycle.advance();
        }
        let restarted = input.pressed(InputEdge::Restart) && lifecycle.restart();
        if input.pressed(InputEdge::TogglePause) {
            lifecycle.toggle_pause();
        }

        let rig = world.player_mut();
        rig.yaw = wrap_angle(rig.yaw + turn_intent(input) * self.turn_speed * fixed_dt_seconds);
        let intent = movement_intent(input, rig.yaw) * (self.move_speed * fixed_dt_seconds);
        rig.position += filter_movement_delta(intent, lifecycle.is_locked());
        rig.position.y = self.eye_level;
        let position = rig.position;

        lifecycle.tick(fixed_dt_seconds, &position);
        if restarted {
            self.note_restart();
        }
        self.apply_lifecycle_events(world);
        self.sync_hud(world);

        if let Some(next) = self.pending_switch.take() {
            info!(scene = %self.scene_id, next = %next, "scene_auto_switch");
            return SceneCommand::SwitchTo(next);
        }
        if input.pressed(InputEdge::NextScene) {
            match self.lifecycle.as_ref().and_then(|l| l.next_scene()) {
                Some(next) => return SceneCommand::SwitchTo(next.to_string()),
                None => debug!(scene = %self.scene_id, "next_scene_unavailable"),
            }
        }
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        if let Some(mut lifecycle) = self.lifecycle.take() {
            lifecycle.teardown();
            info!(
                scene = %self.scene_id,
                index = lifecycle.engine().current_index(),
                completed = lifecycle.engine().is_completed(),
                "scene_unloaded"
            );
        }
        world.set_marker(None);
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        Some(format!("{} | {}", self.title, world.hud().hint))
    }
}

fn set_outcome(record: &mut SceneRecord, index: usize, outcome: MediaOutcome) {
    if let Some(checkpoint) = record
        .checkpoints
        .iter_mut()
        .rev()
        .find(|checkpoint| checkpoint.index == index)
    {
        checkpoint.media = outcome;
    }
}

fn hide_overlay(world: &mut SceneWorld) {
    let hud = world.hud_mut();
    hud.overlay_visible = false;
    hud.media_title = None;
}
