//! DOM abstraction
//!
//! This module turns a live page into the element catalog the planner reads. It includes:
//! - ElementRecord / Catalog: the observation sent to the planner
//! - BindingTable: agent-id to live element mapping, valid until the next observation
//! - abstractor: the selection, usability and text policy

pub mod abstractor;
pub mod binding;
pub mod element;

pub use abstractor::observe;
pub use binding::{BindingTable, AGENT_ID_ATTRIBUTE};
pub use element::{Catalog, ElementRecord, PageContext, Position, SelectOption, Viewport};
