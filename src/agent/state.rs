use crate::page::PageSessionId;
use crate::planner::Decision;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifecycle of the agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Idle,
    Running,
    Finished,
    Errored,
}

impl Mode {
    /// Whether a new task may be started from this mode
    pub fn accepts_start(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One executed decision and when it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub decision: Decision,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u128,
}

impl HistoryEntry {
    pub fn now(decision: Decision) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self { decision, timestamp_ms }
    }
}

/// The controller's view of the current task
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    pub mode: Mode,
    pub goal: String,
    pub api_key: String,
    pub history: Vec<HistoryEntry>,
    pub budget: usize,
    pub page_session_id: Option<PageSessionId>,
}

impl AgentState {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            ..Default::default()
        }
    }

    /// Enter `Running` for a fresh task, dropping the previous history
    pub fn begin(&mut self, goal: impl Into<String>, api_key: impl Into<String>, session: PageSessionId) {
        self.mode = Mode::Running;
        self.goal = goal.into();
        self.api_key = api_key.into();
        self.history.clear();
        self.page_session_id = Some(session);
    }

    pub fn is_running(&self) -> bool {
        self.mode == Mode::Running
    }

    /// Budget left before the next observation
    pub fn has_budget(&self) -> bool {
        self.history.len() < self.budget
    }

    pub fn record(&mut self, decision: Decision) {
        self.history.push(HistoryEntry::now(decision));
    }

    /// Whether `session` is the page this task is bound to
    pub fn is_bound_to(&self, session: &PageSessionId) -> bool {
        self.page_session_id.as_ref() == Some(session)
    }

    pub fn finish(&mut self) {
        self.mode = Mode::Finished;
    }

    pub fn fail(&mut self) {
        self.mode = Mode::Errored;
    }

    pub fn cancel(&mut self) {
        self.mode = Mode::Idle;
    }
}
