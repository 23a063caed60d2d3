use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default WAIT duration in milliseconds
pub const DEFAULT_WAIT_MS: u64 = 2000;

/// Answer used when FINISH carries none
pub const DEFAULT_ANSWER: &str = "Task completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Click,
    Type,
    Scroll,
    Wait,
    Finish,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "CLICK",
            Self::Type => "TYPE",
            Self::Scroll => "SCROLL",
            Self::Wait => "WAIT",
            Self::Finish => "FINISH",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// +1 for down, -1 for up
    pub fn sign(&self) -> f64 {
        match self {
            Self::Up => -1.0,
            Self::Down => 1.0,
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        })
    }
}

/// The planner's choice for one step, in its wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(default)]
    pub thought: String,
    pub command: Command,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_direction: Option<ScrollDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// A validated decision with its command-specific arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click { target: String },
    Type { target: String, text: String },
    Scroll { direction: ScrollDirection },
    Wait { duration_ms: u64 },
    Finish { answer: String },
}

impl Decision {
    pub fn new(command: Command, thought: impl Into<String>) -> Self {
        Self {
            thought: thought.into(),
            command,
            target_id: None,
            text: None,
            scroll_direction: None,
            duration: None,
            answer: None,
        }
    }

    pub fn click(target: impl Into<String>) -> Self {
        Self::new(Command::Click, "").with_target(target)
    }

    pub fn type_text(target: impl Into<String>, text: impl Into<String>) -> Self {
        let mut decision = Self::new(Command::Type, "").with_target(target);
        decision.text = Some(text.into());
        decision
    }

    pub fn scroll(direction: ScrollDirection) -> Self {
        let mut decision = Self::new(Command::Scroll, "");
        decision.scroll_direction = Some(direction);
        decision
    }

    pub fn wait(duration_ms: Option<u64>) -> Self {
        let mut decision = Self::new(Command::Wait, "");
        decision.duration = duration_ms;
        decision
    }

    pub fn finish(answer: impl Into<String>) -> Self {
        let mut decision = Self::new(Command::Finish, "");
        decision.answer = Some(answer.into());
        decision
    }

    /// Builder method: set target agent-id
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_id = Some(target.into());
        self
    }

    /// Builder method: set thought
    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = thought.into();
        self
    }

    /// Check the per-command required fields and resolve defaults
    pub fn action(&self) -> Result<Action> {
        let target = || {
            self.target_id
                .clone()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| AgentError::PlannerProtocol(format!("{} requires targetId", self.command)))
        };

        match self.command {
            Command::Click => Ok(Action::Click { target: target()? }),
            Command::Type => {
                let target = target()?;
                let text = self
                    .text
                    .clone()
                    .ok_or_else(|| AgentError::PlannerProtocol("TYPE requires text".to_string()))?;
                Ok(Action::Type { target, text })
            }
            Command::Scroll => self
                .scroll_direction
                .map(|direction| Action::Scroll { direction })
                .ok_or_else(|| AgentError::PlannerProtocol("SCROLL requires scrollDirection UP or DOWN".to_string())),
            Command::Wait => Ok(Action::Wait {
                duration_ms: self.duration.unwrap_or(DEFAULT_WAIT_MS),
            }),
            Command::Finish => Ok(Action::Finish {
                answer: self
                    .answer
                    .clone()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ANSWER.to_string()),
            }),
        }
    }

    /// One-line summary shown to the user
    pub fn summary(&self) -> String {
        format!("{}: {}", self.command, self.thought)
    }
}
