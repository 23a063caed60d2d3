use crate::agent::config::AgentConfig;
use crate::agent::state::{AgentState, Mode};
use crate::dom::Catalog;
use crate::error::{AgentError, ErrorKind, Result};
use crate::fabric::{Envelope, Inbox, Message, Outbox, Peer, StatusLevel};
use crate::page::PageSessionId;
use crate::planner::{Action, PlanRequest, Planner};
use tokio::time::Instant;

/// Answer given when the action budget runs out
pub const BUDGET_EXHAUSTED_ANSWER: &str = "Maximum actions reached. Task may be too complex or impossible to complete.";

/// Status sent when START_TASK arrives while a task is running
pub const TASK_BUSY_STATUS: &str = "Task already running. Please wait for completion.";

/// Status sent when a running task is cancelled
pub const TASK_CANCELLED_STATUS: &str = "Task cancelled.";

/// Which page reply the controller is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Nothing,
    Observation,
    ActionResult,
}

/// The agent loop state machine
///
/// Handles one message at a time. Settle pauses are kept as a deadline rather
/// than a sleep, so CANCEL_TASK is still served while the loop waits.
///
/// The page task answers requests in order. A request abandoned by CANCEL_TASK
/// is still answered, so its reply is counted in `abandoned` and dropped, and a
/// new task holds back its first OBSERVE until those replies are drained.
pub struct Controller<P> {
    state: AgentState,
    config: AgentConfig,
    planner: P,
    page: PageSessionId,
    pending: Pending,
    abandoned: usize,
    observe_deferred: bool,
    next_observation: Option<Instant>,
    to_ui: Outbox,
    to_page: Outbox,
}

enum Wakeup {
    Message(Option<Envelope>),
    Settled,
}

impl<P: Planner> Controller<P> {
    pub fn new(planner: P, config: AgentConfig, page: PageSessionId, to_ui: Outbox, to_page: Outbox) -> Self {
        Self {
            state: AgentState::new(config.budget),
            config,
            planner,
            page,
            pending: Pending::Nothing,
            abandoned: 0,
            observe_deferred: false,
            next_observation: None,
            to_ui,
            to_page,
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// Replies still owed for requests of abandoned tasks
    pub fn abandoned_replies(&self) -> usize {
        self.abandoned
    }

    /// When the next observation is due, if one is waiting on a settle
    pub fn next_observation(&self) -> Option<Instant> {
        self.next_observation
    }

    fn notify(&self, message: Message) {
        if let Err(e) = self.to_ui.send(message) {
            log::debug!("UI not listening: {}", e);
        }
    }

    fn status(&self, status: impl Into<String>, level: StatusLevel) {
        self.notify(Message::status(status, level));
    }

    /// Begin a new task bound to the active page
    pub fn start_task(&mut self, goal: String, api_key: String) {
        if !self.state.mode.accepts_start() {
            log::info!("Rejecting new task: {}", ErrorKind::TaskBusy);
            self.status(TASK_BUSY_STATUS, StatusLevel::Error);
            return;
        }

        log::info!("Starting task on {}: {}", self.page, goal);
        self.state.begin(goal, api_key, self.page.clone());
        self.pending = Pending::Nothing;
        self.next_observation = None;

        self.status("Starting agentic browsing...", StatusLevel::Info);
        self.status(format!("Goal: {}", self.state.goal), StatusLevel::Info);
        self.schedule_observation();
    }

    /// Request the next observation, or finish if the budget is spent
    pub fn schedule_observation(&mut self) {
        self.next_observation = None;
        if !self.state.is_running() {
            return;
        }

        if !self.state.has_budget() {
            log::info!("{} after {} actions", ErrorKind::BudgetExhausted, self.state.history.len());
            self.finish_task(BUDGET_EXHAUSTED_ANSWER.to_string());
            return;
        }

        self.status(
            format!(
                "Observing page (action {}/{})...",
                self.state.history.len() + 1,
                self.state.budget
            ),
            StatusLevel::Info,
        );

        self.pending = Pending::Observation;
        if self.abandoned > 0 {
            log::debug!("Holding OBSERVE until {} abandoned replies arrive", self.abandoned);
            self.observe_deferred = true;
            return;
        }
        self.send_observe();
    }

    fn send_observe(&mut self) {
        self.observe_deferred = false;
        if let Err(e) = self.to_page.send(Message::Observe) {
            self.fail(ErrorKind::InjectionFailed, e.to_string());
        }
    }

    /// Ask the planner about a fresh observation and act on its decision
    pub async fn on_observation(&mut self, catalog: Catalog) {
        if !self.accept_reply(Pending::Observation, "DOM_OBSERVATION") {
            return;
        }
        self.pending = Pending::Nothing;

        self.status("Thinking about next action...", StatusLevel::Info);

        let result = self
            .planner
            .decide(PlanRequest {
                goal: &self.state.goal,
                api_key: &self.state.api_key,
                catalog: &catalog,
                history: &self.state.history,
            })
            .await
            .and_then(|decision| decision.action().map(|action| (decision, action)));

        let (decision, action) = match result {
            Ok(pair) => pair,
            Err(e) => {
                self.fail_with(&e);
                return;
            }
        };

        self.status(format!("AI decision: {}", decision.thought), StatusLevel::Info);

        if let Action::Finish { answer } = action {
            self.finish_task(answer);
            return;
        }

        self.notify(Message::AgentAction {
            action: decision.summary(),
        });
        self.state.record(decision.clone());

        match self.to_page.send(Message::ExecuteAction(decision)) {
            Ok(()) => self.pending = Pending::ActionResult,
            Err(e) => self.fail(ErrorKind::InjectionFailed, e.to_string()),
        }
    }

    /// The page finished an action; observe again after the settle
    pub fn on_action_completed(&mut self, message: String) {
        if !self.accept_reply(Pending::ActionResult, "ACTION_COMPLETED") {
            return;
        }
        self.pending = Pending::Nothing;

        let message = if message.is_empty() { "Success".to_string() } else { message };
        self.status(format!("Action completed: {}", message), StatusLevel::Success);
        self.next_observation = Some(Instant::now() + self.config.action_settle);
    }

    /// The page reported an error
    ///
    /// While waiting on an observation this ends the task; after an action the
    /// loop goes on after the error settle.
    pub fn on_action_error(&mut self, error: String, detail: Option<String>) {
        if self.drop_abandoned_reply("ACTION_ERROR") {
            return;
        }
        if !self.state.is_running() {
            log::debug!("Ignoring ACTION_ERROR while {:?}", self.state.mode);
            return;
        }

        match self.pending {
            Pending::Observation => {
                self.pending = Pending::Nothing;
                self.fail(ErrorKind::InjectionFailed, detail.unwrap_or(error));
            }
            Pending::ActionResult => {
                self.pending = Pending::Nothing;
                let status = match detail {
                    Some(detail) => format!("Action failed: {} ({})", error, detail),
                    None => format!("Action failed: {}", error),
                };
                self.status(status, StatusLevel::Error);
                self.next_observation = Some(Instant::now() + self.config.error_settle);
            }
            Pending::Nothing => log::debug!("Ignoring unexpected ACTION_ERROR {}", error),
        }
    }

    /// Abandon the current task; late page events are ignored
    pub fn cancel(&mut self) {
        let was_running = self.state.is_running();
        self.state.cancel();
        if self.pending != Pending::Nothing && !self.observe_deferred {
            self.abandoned += 1;
        }
        self.observe_deferred = false;
        self.pending = Pending::Nothing;
        self.next_observation = None;

        if was_running {
            log::info!("Task cancelled");
            self.status(TASK_CANCELLED_STATUS, StatusLevel::Info);
        }
    }

    /// Consume a reply owed to an abandoned task, sending a held-back OBSERVE once none are left
    fn drop_abandoned_reply(&mut self, kind: &str) -> bool {
        if self.abandoned == 0 {
            return false;
        }
        self.abandoned -= 1;
        log::debug!("Dropping {} for an abandoned request", kind);

        if self.abandoned == 0 && self.observe_deferred && self.state.is_running() {
            self.send_observe();
        }
        true
    }

    fn accept_reply(&mut self, pending: Pending, kind: &str) -> bool {
        if self.drop_abandoned_reply(kind) {
            return false;
        }
        if !self.state.is_running() {
            log::debug!("Ignoring {} while {:?}", kind, self.state.mode);
            return false;
        }
        if self.pending != pending {
            log::debug!("Ignoring {} while waiting for {:?}", kind, self.pending);
            return false;
        }
        true
    }

    fn finish_task(&mut self, answer: String) {
        log::info!("Task finished: {}", answer);
        self.state.finish();
        self.pending = Pending::Nothing;
        self.observe_deferred = false;
        self.next_observation = None;
        self.notify(Message::AgentFinished { answer });
    }

    fn fail_with(&mut self, error: &AgentError) {
        self.fail(error.kind(), error.to_string());
    }

    fn fail(&mut self, kind: ErrorKind, detail: String) {
        log::warn!("Task failed with {}: {}", kind, detail);
        self.state.fail();
        self.pending = Pending::Nothing;
        self.observe_deferred = false;
        self.next_observation = None;
        self.notify(Message::AgentError {
            error: format!("{}: {}", kind, detail),
        });
    }

    /// Dispatch one message from the fabric
    pub async fn handle(&mut self, envelope: Envelope) {
        let Envelope { from, message } = envelope;

        if let Peer::Page(session) = &from {
            if !self.state.is_bound_to(session) {
                log::debug!("Ignoring {} from unbound page {}", message.kind(), session);
                return;
            }
        }

        match message {
            Message::StartTask { goal, api_key } => self.start_task(goal, api_key),
            Message::CancelTask => self.cancel(),
            Message::DomObservation(catalog) => self.on_observation(catalog).await,
            Message::ActionCompleted { message } => self.on_action_completed(message),
            Message::ActionError { error, detail } => self.on_action_error(error, detail),
            other => log::warn!("Controller ignoring {} from {:?}", other.kind(), from),
        }
    }

    /// Serve the inbox until every sender is gone
    pub async fn run(mut self, mut inbox: Inbox) -> Result<()> {
        loop {
            let wakeup = match self.next_observation {
                Some(deadline) => tokio::select! {
                    envelope = inbox.recv() => Wakeup::Message(envelope),
                    _ = tokio::time::sleep_until(deadline) => Wakeup::Settled,
                },
                None => Wakeup::Message(inbox.recv().await),
            };

            match wakeup {
                Wakeup::Settled => self.schedule_observation(),
                Wakeup::Message(Some(envelope)) => self.handle(envelope).await,
                Wakeup::Message(None) => break,
            }
        }

        log::debug!("Controller stopped");
        Ok(())
    }
}
