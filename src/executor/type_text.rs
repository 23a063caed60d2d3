use crate::error::Result;
use crate::executor::ActionContext;
use crate::page::DomEvent;

/// Type `text` into the element bound to `target`
///
/// The field is cleared, then every prefix of `text` is assigned in turn with a
/// bubbling `input` event, so listeners see one event per character.
pub async fn execute(ctx: &ActionContext<'_>, target: &str, text: &str) -> Result<()> {
    let node = ctx.prepare_target(target).await?;
    let driver = ctx.driver;

    driver.focus(node).await?;
    driver.set_value(node, "").await?;

    let mut typed = String::with_capacity(text.len());
    for (i, ch) in text.chars().enumerate() {
        if i > 0 {
            tokio::time::sleep(ctx.timings.keystroke).await;
        }
        typed.push(ch);
        driver.set_value(node, &typed).await?;
        driver.dispatch(node, DomEvent::Input).await?;
    }

    driver.dispatch(node, DomEvent::Change).await?;
    driver.dispatch(node, DomEvent::Blur).await?;

    tokio::time::sleep(ctx.timings.type_settle).await;
    Ok(())
}
