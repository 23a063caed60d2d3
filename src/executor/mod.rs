//! Action executor
//!
//! Binds agent-ids back to live nodes and performs one command on the page:
//! - click: native click, then synthetic click, then form submission
//! - type_text: focus, clear and type character by character
//! - scroll: move the document by a fraction of the viewport and check it moved
//! - wait: sleep
//!
//! Targeted commands show a highlight on the element while they run.

pub mod click;
pub mod highlight;
pub mod scroll;
pub mod type_text;
pub mod wait;

use crate::agent::config::ExecutorTimings;
use crate::dom::BindingTable;
use crate::error::{AgentError, Result};
use crate::page::{Highlight, NodeRef, PageDriver};
use crate::planner::{Action, Decision};

/// Everything an action needs from the page task
pub struct ActionContext<'a> {
    pub driver: &'a dyn PageDriver,
    pub bindings: &'a BindingTable,
    pub timings: &'a ExecutorTimings,
}

impl<'a> ActionContext<'a> {
    pub fn new(driver: &'a dyn PageDriver, bindings: &'a BindingTable, timings: &'a ExecutorTimings) -> Self {
        Self {
            driver,
            bindings,
            timings,
        }
    }

    /// Resolve a target, bring it into view and run the highlight lead-in
    pub async fn prepare_target(&self, agent_id: &str) -> Result<NodeRef> {
        let node = self.bindings.resolve(agent_id)?;
        self.driver.scroll_into_view(node).await?;

        highlight::show(self.driver, node, Highlight::Thinking).await;
        tokio::time::sleep(self.timings.thinking).await;
        highlight::show(self.driver, node, Highlight::Acting).await;

        Ok(node)
    }
}

/// Execute one decision and return the completion message
///
/// FINISH never reaches the page; receiving one is a protocol error.
pub async fn execute(ctx: &ActionContext<'_>, decision: &Decision) -> Result<String> {
    let action = decision.action()?;
    log::debug!("Executing {}", decision.summary());

    let result = match &action {
        Action::Click { target } => click::execute(ctx, target).await,
        Action::Type { target, text } => type_text::execute(ctx, target, text).await,
        Action::Scroll { direction } => scroll::execute(ctx, *direction).await,
        Action::Wait { duration_ms } => wait::execute(*duration_ms).await,
        Action::Finish { .. } => Err(AgentError::PlannerProtocol(
            "FINISH is not executable on the page".to_string(),
        )),
    };

    highlight::clear(ctx.driver).await;

    result.map(|()| format!("{} completed successfully", decision.command))
}
