//! Messaging fabric
//!
//! Typed messages between the UI, the controller task and the page task. Each
//! sender holds an [`Outbox`] bound to its identity and destination, so a page
//! event always arrives tagged with the page session it came from.

pub mod channel;
pub mod message;

pub use channel::{wire, ControllerPorts, Envelope, Inbox, Outbox, PagePorts, Peer, UiPorts, Wiring};
pub use message::{Endpoint, Message, StatusLevel, KNOWN_TYPES};
