//! # page-pilot
//!
//! An autonomous web agent for Chrome/Chromium. Given a goal in natural language it
//! repeatedly observes the live page, asks an LLM for the next step and performs it,
//! until the model answers or the action budget runs out.
//!
//! ## Features
//!
//! - **Element Catalog**: Visible, usable elements are indexed as `agent-id-<n>` so the model can target them without selectors
//! - **Agent Loop**: A controller task with an action budget, history and typed status updates
//! - **Action Executor**: CLICK / TYPE / SCROLL / WAIT with click fallbacks and scroll-progress checks
//! - **Browser Session Management**: Launch or connect to Chrome/Chromium instances
//!
//! ## Command Line
//!
//! ```bash
//! # Headless run against a start page
//! GEMINI_API_KEY=... cargo run -- --url example.com --goal "What is this page about?"
//!
//! # Drive the agent with JSON messages on stdin
//! cargo run -- --headed --jsonl
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use page_pilot::{AgentConfig, AgentRuntime, BrowserSession, ExecutorTimings, GeminiPlanner, LaunchOptions, Outcome, PlannerConfig};
//!
//! # async fn run() -> page_pilot::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://example.com")?;
//!
//! let planner = GeminiPlanner::new(PlannerConfig::default())?;
//! let mut runtime = AgentRuntime::start(session.active_page()?, planner, AgentConfig::default(), ExecutorTimings::default());
//!
//! runtime.start_task("Find the contact email", "GEMINI_API_KEY")?;
//! if let Outcome::Finished(answer) = runtime.wait_for_outcome(|message| println!("{:?}", message)).await? {
//!     println!("{}", answer);
//! }
//! runtime.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`agent`]: Controller state machine, agent state and configuration
//! - [`planner`]: Prompt construction, decision parsing and the Gemini client
//! - [`dom`]: Element catalog, agent-id bindings and the observation policy
//! - [`executor`]: Command execution on a bound element
//! - [`page`]: The `PageDriver` seam, the Chrome driver and the page task
//! - [`fabric`]: Typed messages between the UI, controller and page task
//! - [`browser`]: Browser session management and configuration
//! - [`store`]: Namespaced credential and profile store
//! - [`error`]: Error types and result aliases

pub mod agent;
pub mod browser;
pub mod dom;
pub mod error;
pub mod executor;
pub mod fabric;
pub mod page;
pub mod planner;
pub mod runtime;
pub mod store;

pub use agent::{AgentConfig, Controller, ExecutorTimings, Mode, PlannerConfig};
pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use dom::{BindingTable, Catalog, ElementRecord, PageContext};
pub use error::{AgentError, ErrorKind, Result};
pub use fabric::{Message, StatusLevel};
pub use page::{ChromePage, PageAgent, PageDriver, PageSessionId};
pub use planner::{Decision, GeminiPlanner, Planner};
pub use runtime::{AgentRuntime, Outcome};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
