use serde::{Deserialize, Serialize};

/// Maximum number of records in one catalog
pub const MAX_ELEMENTS: usize = 60;

/// Maximum length of an element's `text` field, in characters
pub const MAX_TEXT_CHARS: usize = 150;

/// Maximum length of an element's `className` field, in characters
pub const MAX_CLASS_CHARS: usize = 50;

/// One entry of the element catalog sent to the planner
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Observation-scoped identifier; present iff the element is actionable
    #[serde(rename = "agent-id", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Lowercase tag name
    pub tag: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,

    // links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    // inputs
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    // selects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,

    // forms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    /// Marks headings, alerts and live regions included only for context
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_context: bool,
}

/// An `<option>` of a select element
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

/// Element position relative to the viewport
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    /// Whether the element intersects the (uninflated) viewport
    pub visible: bool,
}

/// Viewport size and scroll offsets
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub w: f64,
    pub h: f64,
    pub scroll_top: f64,
    pub scroll_left: f64,
}

/// Page-level facts sent alongside the element records
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub title: String,
    pub url: String,
    pub domain: String,
    pub viewport: Viewport,
    pub has_scrollbar: bool,
    pub form_count: u32,
}

/// One complete observation of the page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub page_context: PageContext,
    pub elements: Vec<ElementRecord>,
}

impl ElementRecord {
    /// Create a record for the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder method: set agent-id
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Builder method: set text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder method: mark as context element
    pub fn as_context(mut self) -> Self {
        self.is_context = true;
        self.agent_id = None;
        self
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Whether the planner may target this element
    pub fn is_actionable(&self) -> bool {
        self.agent_id.is_some()
    }
}

impl Catalog {
    /// All agent-ids advertised in this catalog, in order
    pub fn agent_ids(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| e.agent_id.as_deref())
    }

    /// Count actionable records
    pub fn count_actionable(&self) -> usize {
        self.agent_ids().count()
    }

    /// Find a record by agent-id
    pub fn find(&self, agent_id: &str) -> Option<&ElementRecord> {
        self.elements.iter().find(|e| e.agent_id.as_deref() == Some(agent_id))
    }

    /// Convert the catalog to pretty JSON, as embedded in the planner prompt
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Truncate to at most `max` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
