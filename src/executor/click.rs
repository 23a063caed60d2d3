use crate::error::{AgentError, Result};
use crate::executor::ActionContext;
use crate::page::ClickStrategy;

/// Click the element bound to `target`, falling back through every click strategy
pub async fn execute(ctx: &ActionContext<'_>, target: &str) -> Result<()> {
    let node = ctx.prepare_target(target).await?;

    let mut clicked = false;
    for strategy in ClickStrategy::ORDER {
        if ctx.driver.click(node, strategy).await? {
            log::debug!("Clicked {} via {:?}", target, strategy);
            clicked = true;
            break;
        }
    }

    if !clicked {
        return Err(AgentError::ClickUnavailable(target.to_string()));
    }

    tokio::time::sleep(ctx.timings.click_settle).await;
    Ok(())
}
