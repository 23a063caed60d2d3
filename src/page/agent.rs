use crate::agent::config::ExecutorTimings;
use crate::dom::{self, BindingTable};
use crate::error::{ErrorKind, Result};
use crate::executor::{self, ActionContext};
use crate::fabric::{Inbox, Message, Outbox, Peer};
use crate::page::PageDriver;

/// The page task: answers OBSERVE and EXECUTE_ACTION one at a time
///
/// Owns the binding table, so agent-ids handed out by an observation stay valid
/// exactly until the next one.
pub struct PageAgent<D> {
    driver: D,
    bindings: BindingTable,
    timings: ExecutorTimings,
}

impl<D: PageDriver> PageAgent<D> {
    pub fn new(driver: D, timings: ExecutorTimings) -> Self {
        Self {
            driver,
            bindings: BindingTable::new(),
            timings,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Handle one controller request and produce the reply, if any
    pub async fn handle(&mut self, message: Message) -> Option<Message> {
        match message {
            Message::Observe => Some(self.observe().await),
            Message::ExecuteAction(decision) => {
                let ctx = ActionContext::new(&self.driver, &self.bindings, &self.timings);
                Some(match executor::execute(&ctx, &decision).await {
                    Ok(message) => Message::ActionCompleted { message },
                    Err(e) => {
                        log::warn!("{} failed: {}", decision.command, e);
                        Message::action_error(&e)
                    }
                })
            }
            other => {
                log::warn!("Page task ignoring {}", other.kind());
                None
            }
        }
    }

    async fn observe(&mut self) -> Message {
        match dom::observe(&self.driver, &mut self.bindings).await {
            Ok(catalog) => Message::DomObservation(catalog),
            Err(e) => {
                log::warn!("Observation failed: {}", e);
                Message::ActionError {
                    error: ErrorKind::InjectionFailed.as_str().to_string(),
                    detail: Some(e.to_string()),
                }
            }
        }
    }

    /// Serve requests until the controller goes away
    pub async fn run(mut self, mut inbox: Inbox, to_controller: Outbox) -> Result<()> {
        log::debug!("Page task started for {}", self.driver.session_id());

        while let Some(envelope) = inbox.recv().await {
            if envelope.from != Peer::Controller {
                log::warn!("Page task dropping {} from {:?}", envelope.message.kind(), envelope.from);
                continue;
            }

            if let Some(reply) = self.handle(envelope.message).await {
                if let Err(e) = to_controller.send(reply) {
                    log::debug!("Page task stopping: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }
}
