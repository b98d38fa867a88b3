/// Held actions: true for every tick the key is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    TurnLeft,
    TurnRight,
}

/// Edge-triggered presses: true for exactly one tick per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEdge {
    Advance,
    Restart,
    TogglePause,
    NextScene,
    ExitScene,
    Quit,
}

const ACTION_COUNT: usize = 6;
const EDGE_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EdgeStates {
    pressed: [bool; EDGE_COUNT],
}

impl EdgeStates {
    pub(crate) fn set(&mut self, edge: InputEdge, pressed: bool) {
        self.pressed[edge.index()] = pressed;
    }

    pub(crate) fn is_pressed(&self, edge: InputEdge) -> bool {
        self.pressed[edge.index()]
    }
}

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveForward,
        InputAction::MoveBack,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::TurnLeft,
        InputAction::TurnRight,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "forward" => Some(InputAction::MoveForward),
            "back" => Some(InputAction::MoveBack),
            "left" => Some(InputAction::MoveLeft),
            "right" => Some(InputAction::MoveRight),
            "turn_left" => Some(InputAction::TurnLeft),
            "turn_right" => Some(InputAction::TurnRight),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::TurnLeft => 4,
            InputAction::TurnRight => 5,
        }
    }
}

impl InputEdge {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "advance" | "next" => Some(InputEdge::Advance),
            "restart" => Some(InputEdge::Restart),
            "pause" => Some(InputEdge::TogglePause),
            "next_scene" => Some(InputEdge::NextScene),
            "exit" => Some(InputEdge::ExitScene),
            "quit" => Some(InputEdge::Quit),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            InputEdge::Advance => 0,
            InputEdge::Restart => 1,
            InputEdge::TogglePause => 2,
            InputEdge::NextScene => 3,
            InputEdge::ExitScene => 4,
            InputEdge::Quit => 5,
        }
    }
}
