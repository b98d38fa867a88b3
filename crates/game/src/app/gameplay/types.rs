/// Simulated media backend settings shared by every scene activation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MediaSettings {
    pub(crate) duration_seconds: f32,
    pub(crate) rejected: Vec<String>,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_MEDIA_SECONDS,
            rejected: Vec::new(),
        }
    }
}

impl MediaSettings {
    fn player(&self) -> SimulatedMediaPlayer {
        SimulatedMediaPlayer::new(self.duration_seconds).with_rejected(self.rejected.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MediaOutcome {
    None,
    Requested,
    Started,
    Ended,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CheckpointRecord {
    pub(crate) index: usize,
    pub(crate) title: String,
    pub(crate) media: MediaOutcome,
    pub(crate) restarts: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct SceneRecord {
    pub(crate) scene_id: String,
    pub(crate) checkpoints_total: usize,
    pub(crate) checkpoints: Vec<CheckpointRecord>,
    pub(crate) completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) config_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) content_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) next_scene: Option<String>,
}

/// Everything the scenes observed during one run, in activation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct WalkthroughLog {
    pub(crate) scenes: Vec<SceneRecord>,
}

pub(crate) type SharedLog = Rc<RefCell<WalkthroughLog>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct WalkthroughReport {
    pub(crate) end: String,
    pub(crate) ticks: u64,
    pub(crate) final_scene: Option<String>,
    pub(crate) scenes_entered: Vec<String>,
    pub(crate) scenes: Vec<SceneRecord>,
}

impl WalkthroughReport {
    pub(crate) fn new(summary: &RunSummary, log: &WalkthroughLog) -> Self {
        let end = match summary.end {
            RunEnd::Quit => "quit",
            RunEnd::Menu => "menu",
            RunEnd::TickLimit => "tick_limit",
        };
        Self {
            end: end.to_string(),
            ticks: summary.ticks,
            final_scene: summary.final_scene.clone(),
            scenes_entered: summary.scenes_entered.clone(),
            scenes: log.scenes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScriptStep {
    /// `input` carries every action held for the step.
    Hold { input: InputSnapshot, ticks: u32 },
    Press(InputEdge),
    Wait { ticks: u32 },
}

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read input script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input script line {line}: {message}")]
    Parse { line: usize, message: String },
}
