use crate::page::{Highlight, NodeRef, PageDriver};

/// Show a highlight; failures are logged and otherwise ignored
pub async fn show(driver: &dyn PageDriver, node: NodeRef, state: Highlight) {
    if let Err(e) = driver.highlight(node, state).await {
        log::debug!("Highlight {:?} failed: {}", state, e);
    }
}

/// Remove the highlight; failures are logged and otherwise ignored
pub async fn clear(driver: &dyn PageDriver) {
    if let Err(e) = driver.clear_highlight().await {
        log::debug!("Clearing highlight failed: {}", e);
    }
}
