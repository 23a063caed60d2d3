use crate::agent::{TASK_BUSY_STATUS, TASK_CANCELLED_STATUS};
use crate::dom::Catalog;
use crate::error::AgentError;
use crate::planner::Decision;
use serde::{Deserialize, Serialize};

/// Severity of a status line shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    #[default]
    Info,
    Success,
    Error,
    Action,
}

/// The three parties on the fabric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Ui,
    Controller,
    Page,
}

/// Every message exchanged between the UI, the controller and the page task
///
/// On the wire each message is `{"type": "...", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    StartTask {
        goal: String,
        #[serde(rename = "apiKey", default)]
        api_key: String,
    },
    CancelTask,
    Observe,
    DomObservation(Catalog),
    ExecuteAction(Decision),
    ActionCompleted {
        message: String,
    },
    ActionError {
        /// Error-kind code, e.g. `stale-binding`
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    AgentStatusUpdate {
        status: String,
        #[serde(default)]
        level: StatusLevel,
    },
    AgentAction {
        action: String,
    },
    AgentFinished {
        answer: String,
    },
    AgentError {
        error: String,
    },
}

/// Wire names of every known message type
pub const KNOWN_TYPES: [&str; 11] = [
    "START_TASK",
    "CANCEL_TASK",
    "OBSERVE",
    "DOM_OBSERVATION",
    "EXECUTE_ACTION",
    "ACTION_COMPLETED",
    "ACTION_ERROR",
    "AGENT_STATUS_UPDATE",
    "AGENT_ACTION",
    "AGENT_FINISHED",
    "AGENT_ERROR",
];

impl Message {
    /// The wire `type` of this message
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartTask { .. } => "START_TASK",
            Self::CancelTask => "CANCEL_TASK",
            Self::Observe => "OBSERVE",
            Self::DomObservation(_) => "DOM_OBSERVATION",
            Self::ExecuteAction(_) => "EXECUTE_ACTION",
            Self::ActionCompleted { .. } => "ACTION_COMPLETED",
            Self::ActionError { .. } => "ACTION_ERROR",
            Self::AgentStatusUpdate { .. } => "AGENT_STATUS_UPDATE",
            Self::AgentAction { .. } => "AGENT_ACTION",
            Self::AgentFinished { .. } => "AGENT_FINISHED",
            Self::AgentError { .. } => "AGENT_ERROR",
        }
    }

    /// Sender and receiver this message kind travels between
    pub fn direction(&self) -> (Endpoint, Endpoint) {
        use Endpoint::*;
        match self {
            Self::StartTask { .. } | Self::CancelTask => (Ui, Controller),
            Self::Observe | Self::ExecuteAction(_) => (Controller, Page),
            Self::DomObservation(_) | Self::ActionCompleted { .. } | Self::ActionError { .. } => (Page, Controller),
            Self::AgentStatusUpdate { .. } | Self::AgentAction { .. } | Self::AgentFinished { .. } | Self::AgentError { .. } => {
                (Controller, Ui)
            }
        }
    }

    pub fn status(status: impl Into<String>, level: StatusLevel) -> Self {
        Self::AgentStatusUpdate {
            status: status.into(),
            level,
        }
    }

    /// Whether this UI message is the last one a START_TASK produces
    ///
    /// Every START_TASK ends in exactly one of: rejection as busy, cancellation,
    /// AGENT_FINISHED or AGENT_ERROR.
    pub fn ends_task(&self) -> bool {
        match self {
            Self::AgentFinished { .. } | Self::AgentError { .. } => true,
            Self::AgentStatusUpdate { status, .. } => status == TASK_BUSY_STATUS || status == TASK_CANCELLED_STATUS,
            _ => false,
        }
    }

    /// `ACTION_ERROR` carrying the error's kind code and its message as detail
    pub fn action_error(error: &AgentError) -> Self {
        Self::ActionError {
            error: error.kind().as_str().to_string(),
            detail: Some(error.to_string()),
        }
    }

    /// Decode one JSON message; unknown or malformed messages are logged and dropped
    pub fn decode(text: &str) -> Option<Self> {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Discarding malformed message: {}", e);
                return None;
            }
        };

        let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
            log::warn!("Discarding message without a type field");
            return None;
        };

        if !KNOWN_TYPES.contains(&kind) {
            log::warn!("Discarding message of unknown type {}", kind);
            return None;
        }

        match serde_json::from_value(value.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                log::warn!("Discarding {} message with invalid payload: {}", kind, e);
                None
            }
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
