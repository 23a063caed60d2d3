use crate::error::Result;
use std::time::Duration;

pub async fn execute(duration_ms: u64) -> Result<()> {
    tokio::time::sleep(Duration::from_millis(duration_ms)).await;
    Ok(())
}
