//! Agent controller
//!
//! Owns the task state machine: observe, ask the planner, then finish or act and
//! observe again, within a fixed action budget.

pub mod config;
pub mod controller;
pub mod state;

pub use config::{AgentConfig, ExecutorTimings, PlannerConfig};
pub use controller::{Controller, Pending, BUDGET_EXHAUSTED_ANSWER, TASK_BUSY_STATUS, TASK_CANCELLED_STATUS};
pub use state::{AgentState, HistoryEntry, Mode};
