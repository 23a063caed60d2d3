use crate::error::{AgentError, Result};
use crate::fabric::message::{Endpoint, Message};
use crate::page::PageSessionId;
use tokio::sync::mpsc;

/// Identity of a message sender
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Peer {
    Ui,
    Controller,
    /// A page task, tagged with the page it serves
    Page(PageSessionId),
}

impl Peer {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Ui => Endpoint::Ui,
            Self::Controller => Endpoint::Controller,
            Self::Page(_) => Endpoint::Page,
        }
    }
}

/// A message together with who sent it
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: Peer,
    pub message: Message,
}

pub type Inbox = mpsc::UnboundedReceiver<Envelope>;

/// Sending half bound to one sender identity and one destination
///
/// Messages whose kind does not travel on this route are rejected.
#[derive(Debug, Clone)]
pub struct Outbox {
    from: Peer,
    to: Endpoint,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl Outbox {
    pub fn new(from: Peer, to: Endpoint, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { from, to, tx }
    }

    pub fn peer(&self) -> &Peer {
        &self.from
    }

    pub fn send(&self, message: Message) -> Result<()> {
        let expected = (self.from.endpoint(), self.to);
        if message.direction() != expected {
            return Err(AgentError::Fabric(format!(
                "{} cannot travel {:?} -> {:?}",
                message.kind(),
                expected.0,
                expected.1
            )));
        }

        let kind = message.kind();
        self.tx
            .send(Envelope {
                from: self.from.clone(),
                message,
            })
            .map_err(|_| AgentError::Fabric(format!("{:?} disconnected before {}", self.to, kind)))
    }
}

/// The UI side: talks to the controller and hears from it
#[derive(Debug)]
pub struct UiPorts {
    pub to_controller: Outbox,
    pub inbox: Inbox,
}

/// The controller side: one inbox shared by the UI and the page task
#[derive(Debug)]
pub struct ControllerPorts {
    pub to_ui: Outbox,
    pub to_page: Outbox,
    pub inbox: Inbox,
}

/// The page side
#[derive(Debug)]
pub struct PagePorts {
    pub to_controller: Outbox,
    pub inbox: Inbox,
}

/// Fully wired fabric for one page session
#[derive(Debug)]
pub struct Wiring {
    pub ui: UiPorts,
    pub controller: ControllerPorts,
    pub page: PagePorts,
}

/// Create the channels between the UI, the controller and the page task for `session`
pub fn wire(session: PageSessionId) -> Wiring {
    let (controller_tx, controller_rx) = mpsc::unbounded_channel();
    let (page_tx, page_rx) = mpsc::unbounded_channel();
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();

    Wiring {
        ui: UiPorts {
            to_controller: Outbox::new(Peer::Ui, Endpoint::Controller, controller_tx.clone()),
            inbox: ui_rx,
        },
        controller: ControllerPorts {
            to_ui: Outbox::new(Peer::Controller, Endpoint::Ui, ui_tx),
            to_page: Outbox::new(Peer::Controller, Endpoint::Page, page_tx),
            inbox: controller_rx,
        },
        page: PagePorts {
            to_controller: Outbox::new(Peer::Page(session), Endpoint::Controller, controller_tx),
            inbox: page_rx,
        },
    }
}
