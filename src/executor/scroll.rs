use crate::error::{AgentError, Result};
use crate::executor::ActionContext;
use crate::planner::ScrollDirection;

/// Scroll the document by a fraction of the viewport height and verify it moved
pub async fn execute(ctx: &ActionContext<'_>, direction: ScrollDirection) -> Result<()> {
    let driver = ctx.driver;
    let viewport_height = driver.page_context().await?.viewport.h;
    let before = driver.scroll_offset().await?;

    driver
        .scroll_by(direction.sign() * ctx.timings.scroll_fraction * viewport_height)
        .await?;
    tokio::time::sleep(ctx.timings.scroll_settle).await;

    let after = driver.scroll_offset().await?;
    let moved = (after.top - before.top).abs();
    if moved < ctx.timings.min_scroll_progress {
        return Err(AgentError::ScrollNoProgress {
            direction: direction.to_string(),
            moved,
        });
    }

    Ok(())
}
