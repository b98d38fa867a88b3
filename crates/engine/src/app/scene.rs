use tracing::{info, warn};

use super::input::{ActionStates, EdgeStates, InputAction, InputEdge};
use crate::content::{SceneCatalog, ScenePack};
use crate::geometry::Vec3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(String),
    ExitToMenu,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: ActionStates,
    edges: EdgeStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn pressed(&self, edge: InputEdge) -> bool {
        self.edges.is_pressed(edge)
    }

    pub fn quit_requested(&self) -> bool {
        self.edges.is_pressed(InputEdge::Quit)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_pressed(mut self, edge: InputEdge, pressed: bool) -> Self {
        self.edges.set(edge, pressed);
        self
    }
}

/// First-person player: eye position plus heading around the vertical
/// axis. Yaw 0 looks down -Z.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerRig {
    pub position: Vec3,
    pub yaw: f32,
}

impl PlayerRig {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }
}

/// What the UI layer would show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hud {
    pub hint: String,
    pub media_title: Option<String>,
    pub overlay_visible: bool,
    /// Current checkpoint has been entered.
    pub reached: bool,
    /// Media requested or playing for the current checkpoint.
    pub media_busy: bool,
    pub paused: bool,
    pub advance_enabled: bool,
    pub completed: bool,
    pub next_scene_enabled: bool,
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    player: PlayerRig,
    hud: Hud,
    marker: Option<Vec3>,
    pack: Option<ScenePack>,
}

impl SceneWorld {
    pub fn player(&self) -> &PlayerRig {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerRig {
        &mut self.player
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut Hud {
        &mut self.hud
    }

    pub fn marker(&self) -> Option<Vec3> {
        self.marker
    }

    pub fn set_marker(&mut self, marker: Option<Vec3>) {
        self.marker = marker;
    }

    pub fn pack(&self) -> Option<&ScenePack> {
        self.pack.as_ref()
    }

    pub fn set_pack(&mut self, pack: ScenePack) {
        self.pack = Some(pack);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

type SceneFactory = Box<dyn Fn() -> Box<dyn Scene>>;

struct ActiveScene {
    id: String,
    scene: Box<dyn Scene>,
}

/// Owns the registered scene factories and at most one live scene. With no
/// live scene the router is "at the menu".
pub struct SceneRouter {
    catalog: SceneCatalog,
    factories: Vec<(String, SceneFactory)>,
    active: Option<ActiveScene>,
    world: SceneWorld,
}

impl SceneRouter {
    pub fn new(catalog: SceneCatalog) -> Self {
        Self {
            catalog,
            factories: Vec::new(),
            active: None,
            world: SceneWorld::default(),
        }
    }

    /// Re-registering an id replaces its factory.
    pub fn register<F>(&mut self, scene_id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Scene> + 'static,
    {
        let scene_id = scene_id.into();
        self.factories.retain(|(id, _)| *id != scene_id);
        self.factories.push((scene_id, Box::new(factory)));
    }

    pub fn registered_ids(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(id, _)| id.as_str())
    }

    pub fn is_registered(&self, scene_id: &str) -> bool {
        self.factories.iter().any(|(id, _)| id == scene_id)
    }

    /// Tears down the live scene, then builds `scene_id` fresh. Unknown ids
    /// leave the router at the menu. A pack that fails to load is replaced
    /// by an empty fallback so the scene is still enterable and exitable.
    pub fn enter(&mut self, scene_id: &str) -> bool {
        let Some(factory) = self
            .factories
            .iter()
            .find(|(id, _)| id == scene_id)
            .map(|(_, factory)| factory)
        else {
            warn!(scene = scene_id, "scene_unknown");
            self.exit();
            return false;
        };
        let mut scene = factory();

        self.exit();
        let pack = match self.catalog.load(scene_id) {
            Ok(pack) => pack,
            Err(error) => {
                warn!(scene = scene_id, error = %error, "scene_pack_load_failed");
                ScenePack::fallback(scene_id)
            }
        };
        self.world.set_pack(pack);
        scene.load(&mut self.world);
        info!(scene = scene_id, "scene_entered");
        self.active = Some(ActiveScene {
            id: scene_id.to_string(),
            scene,
        });
        true
    }

    pub fn exit(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.scene.unload(&mut self.world);
            info!(scene = %active.id, "scene_exited");
        }
        self.world.clear();
    }

    pub fn update_active(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        match self.active.as_mut() {
            Some(active) => active.scene.update(fixed_dt_seconds, input, &mut self.world),
            None => SceneCommand::None,
        }
    }

    /// Returns true when the live scene changed.
    pub fn apply(&mut self, command: SceneCommand) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::SwitchTo(next) => {
                let from = self.active_id().map(str::to_string);
                let entered = self.enter(&next);
                if entered {
                    info!(
                        from = from.as_deref().unwrap_or("-"),
                        to = next.as_str(),
                        "scene_switched"
                    );
                }
                true
            }
            SceneCommand::ExitToMenu => {
                let had_scene = self.active.is_some();
                self.exit();
                had_scene
            }
        }
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.id.as_str())
    }

    pub fn is_at_menu(&self) -> bool {
        self.active.is_none()
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub fn debug_title_active(&self) -> Option<String> {
        self.active
            .as_ref()
            .and_then(|active| active.scene.debug_title(&self.world))
    }

    pub fn shutdown(&mut self) {
        self.exit();
    }
}
