//! Planner client
//!
//! Builds the prompt, calls the model and turns its free-form answer into a
//! validated [`Decision`]. The [`Planner`] trait is the seam the controller calls;
//! [`GeminiPlanner`] is the HTTP implementation.

pub mod decision;
pub mod gemini;
pub mod parse;
pub mod prompt;

pub use decision::{Action, Command, Decision, ScrollDirection};
pub use gemini::{GeminiPlanner, GenerationConfig};
pub use parse::parse_decision;
pub use prompt::build_prompt;

use crate::agent::state::HistoryEntry;
use crate::dom::Catalog;
use crate::error::Result;
use async_trait::async_trait;

/// Everything the planner sees for one step
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub goal: &'a str,
    pub api_key: &'a str,
    pub catalog: &'a Catalog,
    pub history: &'a [HistoryEntry],
}

/// Chooses the next step from the goal, history and current observation
///
/// Implementations fail with `PlannerHttp`, `PlannerEmpty` or `PlannerProtocol`.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn decide(&self, request: PlanRequest<'_>) -> Result<Decision>;
}
