//! Access to a live page
//!
//! The page task never touches the browser directly. Everything it needs from the
//! page goes through [`PageDriver`]:
//! - probing elements for the abstractor
//! - stamping and clearing agent-id attributes
//! - the primitive DOM operations the executor composes into commands
//!
//! [`ChromePage`] implements the trait on top of a `headless_chrome` tab by injecting
//! a small probe script into the top frame.

pub mod agent;
pub mod chrome;

pub use agent::PageAgent;
pub use chrome::ChromePage;

use crate::dom::element::{PageContext, SelectOption};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifies the page (tab) a task is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSessionId(pub String);

impl fmt::Display for PageSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a live element held by the page-side probe
///
/// Handles are only meaningful until the next [`PageDriver::clear_stamps`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub u64);

/// Bounding client rectangle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self { top, left, width, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Check if the rectangle has non-zero dimensions
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Whether the rectangle overlaps a `width` x `height` viewport grown by `margin` on every side
    pub fn intersects_viewport(&self, width: f64, height: f64, margin: f64) -> bool {
        self.bottom() > -margin && self.top < height + margin && self.right() > -margin && self.left < width + margin
    }
}

/// The computed style properties the usability predicate looks at
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
        }
    }
}

/// An element as reported by the page-side probe, before any policy is applied
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    pub node: NodeRef,
    /// Lowercase tag name
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub hidden: bool,
    /// `offsetParent` is non-null
    #[serde(default)]
    pub has_layout_parent: bool,
    /// Text of the element's own text nodes, descendants excluded
    #[serde(default)]
    pub direct_text: String,
    /// Full `textContent`, bounded by the probe
    #[serde(default)]
    pub full_text: String,
    /// Live `value` property for form controls
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    /// Number of controls for `<form>` elements
    #[serde(default)]
    pub input_count: Option<u32>,
}

impl RawElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Whether this is a control whose text lives in `value`
    pub fn is_form_field(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }
}

/// Current document scroll offsets
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

/// Visual highlight states shown on the target element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Thinking,
    Acting,
}

/// Click strategies, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickStrategy {
    /// `element.click()`
    Native,
    /// A bubbling synthetic `MouseEvent('click')`
    Synthetic,
    /// Submit the owning form of a submit input
    FormSubmit,
}

impl ClickStrategy {
    pub const ORDER: [ClickStrategy; 3] = [Self::Native, Self::Synthetic, Self::FormSubmit];
}

/// Bubbling events the executor dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
    Blur,
}

impl DomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
            Self::Blur => "blur",
        }
    }
}

/// Primitive operations on one live page
///
/// Node-scoped operations fail with [`crate::AgentError::StaleBinding`] when the node
/// is no longer attached to the document.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// The page this driver is attached to
    fn session_id(&self) -> PageSessionId;

    /// Install the page-side probe into the top frame if it is missing
    async fn inject(&self) -> Result<()>;

    /// Title, URL, viewport and form facts
    async fn page_context(&self) -> Result<PageContext>;

    /// Remove agent-id stamps and forget every node handle
    async fn clear_stamps(&self) -> Result<()>;

    /// Elements matching a CSS selector, in document order
    async fn query(&self, selector: &str) -> Result<Vec<RawElement>>;

    /// Write the agent-id data attribute on a node
    async fn stamp(&self, node: NodeRef, agent_id: &str) -> Result<()>;

    /// Scroll a node to the vertical center of the viewport
    async fn scroll_into_view(&self, node: NodeRef) -> Result<()>;

    /// Show a highlight on a node, replacing any previous one
    async fn highlight(&self, node: NodeRef, state: Highlight) -> Result<()>;

    /// Remove the current highlight, if any
    async fn clear_highlight(&self) -> Result<()>;

    /// Attempt one click strategy; `Ok(false)` means the strategy did not apply or threw
    async fn click(&self, node: NodeRef, strategy: ClickStrategy) -> Result<bool>;

    async fn focus(&self, node: NodeRef) -> Result<()>;

    /// Assign the `value` property
    async fn set_value(&self, node: NodeRef, value: &str) -> Result<()>;

    /// Dispatch a bubbling event on a node
    async fn dispatch(&self, node: NodeRef, event: DomEvent) -> Result<()>;

    async fn scroll_offset(&self) -> Result<ScrollOffset>;

    /// Smoothly scroll the document by `dy` pixels
    async fn scroll_by(&self, dy: f64) -> Result<()>;
}
