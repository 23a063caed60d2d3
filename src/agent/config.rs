use crate::planner::GenerationConfig;
use std::time::Duration;

/// Default cap on non-FINISH actions per task
pub const DEFAULT_BUDGET: usize = 20;

/// Default Gemini API base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Controller settings
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Maximum number of non-FINISH actions per task
    pub budget: usize,

    /// Pause after a completed action before observing again
    pub action_settle: Duration,

    /// Pause after a failed action before observing again
    pub error_settle: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            action_settle: Duration::from_millis(1000),
            error_settle: Duration::from_millis(2000),
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the action budget
    pub fn budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Builder method: set both settle periods
    pub fn settle(mut self, action: Duration, error: Duration) -> Self {
        self.action_settle = action;
        self.error_settle = error;
        self
    }
}

/// Executor pacing
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorTimings {
    /// How long the "thinking" highlight shows before acting
    pub thinking: Duration,
    pub click_settle: Duration,
    pub type_settle: Duration,
    /// Delay between typed characters
    pub keystroke: Duration,
    /// Wait for a smooth scroll to finish before measuring it
    pub scroll_settle: Duration,
    /// Minimum vertical movement for a scroll to count, in pixels
    pub min_scroll_progress: f64,
    /// Fraction of the viewport height scrolled per SCROLL
    pub scroll_fraction: f64,
}

impl Default for ExecutorTimings {
    fn default() -> Self {
        Self {
            thinking: Duration::from_millis(500),
            click_settle: Duration::from_millis(800),
            type_settle: Duration::from_millis(300),
            keystroke: Duration::from_millis(50),
            scroll_settle: Duration::from_millis(1500),
            min_scroll_progress: 50.0,
            scroll_fraction: 0.8,
        }
    }
}

impl ExecutorTimings {
    /// All pauses zeroed; thresholds kept
    pub fn instant() -> Self {
        Self {
            thinking: Duration::ZERO,
            click_settle: Duration::ZERO,
            type_settle: Duration::ZERO,
            keystroke: Duration::ZERO,
            scroll_settle: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// LLM endpoint settings
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Base URL, without the `/models/...` suffix
    pub endpoint: String,
    pub model: String,
    pub generation: GenerationConfig,
    /// Transport timeout for one request
    pub timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generation: GenerationConfig::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl PlannerConfig {
    /// Builder method: set the base URL
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builder method: set the model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder method: set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
