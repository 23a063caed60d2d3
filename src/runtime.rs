use crate::agent::{AgentConfig, Controller, ExecutorTimings};
use crate::error::{AgentError, Result};
use crate::fabric::{self, Inbox, Message, Outbox};
use crate::page::{PageAgent, PageDriver};
use crate::planner::Planner;
use tokio::task::JoinHandle;

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// AGENT_FINISHED with its answer
    Finished(String),
    /// AGENT_ERROR with its `code: detail` text
    Failed(String),
}

/// A running agent: controller task, page task and the UI's end of the fabric
pub struct AgentRuntime {
    to_controller: Outbox,
    inbox: Inbox,
    controller: JoinHandle<Result<()>>,
    page: JoinHandle<Result<()>>,
}

impl AgentRuntime {
    /// Spawn the controller and page tasks for `driver`'s page
    pub fn start<D, P>(driver: D, planner: P, config: AgentConfig, timings: ExecutorTimings) -> Self
    where
        D: PageDriver + 'static,
        P: Planner + 'static,
    {
        let session = driver.session_id();
        let wiring = fabric::wire(session.clone());

        let controller = Controller::new(
            planner,
            config,
            session,
            wiring.controller.to_ui,
            wiring.controller.to_page,
        );
        let page = PageAgent::new(driver, timings);

        let controller = tokio::spawn(controller.run(wiring.controller.inbox));
        let page = tokio::spawn(page.run(wiring.page.inbox, wiring.page.to_controller));

        Self {
            to_controller: wiring.ui.to_controller,
            inbox: wiring.ui.inbox,
            controller,
            page,
        }
    }

    /// Send a UI message to the controller
    pub fn send(&self, message: Message) -> Result<()> {
        self.to_controller.send(message)
    }

    /// Another UI sender, for feeding the controller from a separate task
    pub fn sender(&self) -> Outbox {
        self.to_controller.clone()
    }

    pub fn start_task(&self, goal: impl Into<String>, api_key: impl Into<String>) -> Result<()> {
        self.send(Message::StartTask {
            goal: goal.into(),
            api_key: api_key.into(),
        })
    }

    pub fn cancel(&self) -> Result<()> {
        self.send(Message::CancelTask)
    }

    /// Next message addressed to the UI
    pub async fn next(&mut self) -> Option<Message> {
        self.inbox.recv().await.map(|envelope| envelope.message)
    }

    /// Wait until the current task finishes or fails, passing every UI message to `on_message`
    pub async fn wait_for_outcome<F>(&mut self, mut on_message: F) -> Result<Outcome>
    where
        F: FnMut(&Message),
    {
        while let Some(message) = self.next().await {
            on_message(&message);
            match message {
                Message::AgentFinished { answer } => return Ok(Outcome::Finished(answer)),
                Message::AgentError { error } => return Ok(Outcome::Failed(error)),
                _ => {}
            }
        }
        Err(AgentError::Fabric("controller stopped before the task ended".to_string()))
    }

    /// Stop the controller and wait for the page task to drain
    ///
    /// The two tasks hold each other's inbox open, so the controller is aborted;
    /// dropping it closes the page inbox and the page task ends after its current request.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            to_controller,
            inbox,
            controller,
            page,
        } = self;
        drop(to_controller);
        drop(inbox);

        controller.abort();
        match controller.await {
            Ok(result) => result?,
            Err(e) if e.is_cancelled() => {}
            Err(e) => return Err(AgentError::Fabric(format!("controller task failed: {}", e))),
        }

        page.await
            .map_err(|e| AgentError::Fabric(format!("page task failed: {}", e)))?
    }
}
