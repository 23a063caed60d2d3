use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced anywhere in the agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// The referenced agent-id is not in the current binding table
    #[error("no live element bound to {0}")]
    StaleBinding(String),

    /// Every click strategy failed for the target
    #[error("could not click {0}: no click strategy succeeded")]
    ClickUnavailable(String),

    /// A scroll moved the viewport by less than the required distance
    #[error("scroll {direction} moved {moved}px")]
    ScrollNoProgress { direction: String, moved: f64 },

    /// The LLM endpoint returned a non-2xx status or the transport failed
    #[error("planner request failed: {0}")]
    PlannerHttp(String),

    /// The LLM response carried no text
    #[error("planner returned no text")]
    PlannerEmpty,

    /// The LLM text did not contain a valid decision
    #[error("planner response rejected: {0}")]
    PlannerProtocol(String),

    /// The page-side probe could not be installed or could not observe
    #[error("page injection failed: {0}")]
    InjectionFailed(String),

    /// A page-side call failed for a reason other than a stale binding
    #[error("page script failed: {0}")]
    PageScript(String),

    /// Browser launch, connection or tab handling failed
    #[error("browser operation failed: {0}")]
    Browser(String),

    /// A message could not be delivered over the fabric
    #[error("fabric delivery failed: {0}")]
    Fabric(String),

    /// Credential store I/O failed
    #[error("store operation failed: {0}")]
    Store(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AgentError>;

/// Wire-level taxonomy of agent errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    StaleBinding,
    ClickUnavailable,
    ScrollNoProgress,
    PlannerHttp,
    PlannerEmpty,
    PlannerProtocol,
    InjectionFailed,
    BudgetExhausted,
    TaskBusy,
    PageScript,
    Browser,
}

impl ErrorKind {
    /// The code carried in `ACTION_ERROR` and `AGENT_ERROR` payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaleBinding => "stale-binding",
            Self::ClickUnavailable => "click-unavailable",
            Self::ScrollNoProgress => "scroll-no-progress",
            Self::PlannerHttp => "planner-http",
            Self::PlannerEmpty => "planner-empty",
            Self::PlannerProtocol => "planner-protocol",
            Self::InjectionFailed => "injection-failed",
            Self::BudgetExhausted => "budget-exhausted",
            Self::TaskBusy => "task-busy",
            Self::PageScript => "page-script",
            Self::Browser => "browser",
        }
    }

    /// Parse a wire code back into a kind
    pub fn from_code(code: &str) -> Option<Self> {
        const ALL: [ErrorKind; 11] = [
            ErrorKind::StaleBinding,
            ErrorKind::ClickUnavailable,
            ErrorKind::ScrollNoProgress,
            ErrorKind::PlannerHttp,
            ErrorKind::PlannerEmpty,
            ErrorKind::PlannerProtocol,
            ErrorKind::InjectionFailed,
            ErrorKind::BudgetExhausted,
            ErrorKind::TaskBusy,
            ErrorKind::PageScript,
            ErrorKind::Browser,
        ];
        ALL.into_iter().find(|kind| kind.as_str() == code)
    }

    /// Whether this kind ends the current task
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PlannerHttp | Self::PlannerEmpty | Self::PlannerProtocol | Self::InjectionFailed | Self::Browser
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StaleBinding(_) => ErrorKind::StaleBinding,
            Self::ClickUnavailable(_) => ErrorKind::ClickUnavailable,
            Self::ScrollNoProgress { .. } => ErrorKind::ScrollNoProgress,
            Self::PlannerHttp(_) => ErrorKind::PlannerHttp,
            Self::PlannerEmpty => ErrorKind::PlannerEmpty,
            Self::PlannerProtocol(_) => ErrorKind::PlannerProtocol,
            Self::InjectionFailed(_) | Self::Fabric(_) => ErrorKind::InjectionFailed,
            Self::PageScript(_) => ErrorKind::PageScript,
            Self::Browser(_) | Self::Store(_) => ErrorKind::Browser,
        }
    }
}
