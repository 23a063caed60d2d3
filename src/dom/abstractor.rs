use crate::dom::binding::BindingTable;
use crate::dom::element::{
    truncate_chars, Catalog, ElementRecord, PageContext, Position, Viewport, MAX_CLASS_CHARS, MAX_ELEMENTS,
    MAX_TEXT_CHARS,
};
use crate::error::{AgentError, Result};
use crate::page::{NodeRef, PageDriver, RawElement};

/// Elements the planner may act on
pub const ACTIONABLE_SELECTORS: &[&str] = &[
    "a[href]:not([href=''])",
    "button:not([disabled])",
    "input:not([disabled]):not([type='hidden'])",
    "textarea:not([disabled])",
    "select:not([disabled])",
    "[onclick]",
    "[role='button']",
    "[role='link']",
    "[role='tab']",
    "[role='menuitem']",
    "[role='option']",
    ".btn",
    ".button",
    "[data-testid]",
    "[data-action]",
    "[tabindex]:not([tabindex='0']):not([tabindex^='-'])",
    "summary",
    "nav",
    "[role='navigation']",
];

/// Elements included only to give the planner context
pub const CONTEXT_SELECTORS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "[role='heading']",
    ".title",
    ".heading",
    "main p:first-of-type",
    "[role='alert']",
    ".error",
    ".alert",
    "[aria-live]",
];

/// Pixels added to every side of the viewport when testing intersection
pub const VIEWPORT_MARGIN: f64 = 100.0;

/// Maximum number of context records per observation
pub const MAX_CONTEXT_ELEMENTS: usize = 10;

/// Context text must be strictly longer than this many characters
pub const MIN_CONTEXT_TEXT_CHARS: usize = 10;

/// Options reported per select element
pub const MAX_SELECT_OPTIONS: usize = 10;

/// Result of applying the observation policy to probed elements
#[derive(Debug, Clone)]
pub struct Observation {
    pub catalog: Catalog,
    /// Nodes to stamp, in assignment order
    pub stamps: Vec<(NodeRef, String)>,
}

/// Whether an element is rendered: positive size, not hidden by style, near the viewport
pub fn is_visible(raw: &RawElement, viewport: &Viewport) -> bool {
    raw.rect.has_area()
        && raw.style.display != "none"
        && raw.style.visibility != "hidden"
        && !is_zero_opacity(&raw.style.opacity)
        && raw.rect.intersects_viewport(viewport.w, viewport.h, VIEWPORT_MARGIN)
}

/// The usability predicate for actionable elements
pub fn is_usable(raw: &RawElement, viewport: &Viewport) -> bool {
    is_visible(raw, viewport) && !raw.disabled && !raw.readonly && !raw.hidden && raw.has_layout_parent
}

fn is_zero_opacity(opacity: &str) -> bool {
    opacity.trim().parse::<f64>().map(|o| o == 0.0).unwrap_or(false)
}

/// Collapse runs of whitespace and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pick the text the planner sees for an element
pub fn extract_text(raw: &RawElement) -> Option<String> {
    let labelled = ["aria-label", "alt", "title", "placeholder"]
        .iter()
        .find_map(|name| raw.attr(name).map(clean_text).filter(|t| !t.is_empty()));

    let text = labelled
        .or_else(|| {
            if raw.is_form_field() {
                None
            } else {
                raw.attr("value").map(clean_text).filter(|t| !t.is_empty())
            }
        })
        .unwrap_or_else(|| clean_text(&raw.direct_text));

    if text.is_empty() {
        None
    } else {
        Some(truncate_chars(&text, MAX_TEXT_CHARS))
    }
}

fn attr_string(raw: &RawElement, name: &str) -> Option<String> {
    raw.attr(name).map(str::to_string)
}

/// Build the catalog record for a probed element
pub fn to_record(raw: &RawElement, viewport: &Viewport) -> ElementRecord {
    let mut record = ElementRecord::new(raw.tag.clone());

    record.text = extract_text(raw);
    record.role = attr_string(raw, "role");
    record.id = attr_string(raw, "id");
    record.class_name = raw.attr("class").map(|c| truncate_chars(c.trim(), MAX_CLASS_CHARS));
    record.test_id = attr_string(raw, "data-testid");
    record.title = attr_string(raw, "title");
    record.aria_label = attr_string(raw, "aria-label");

    match raw.tag.as_str() {
        "a" => {
            record.href = attr_string(raw, "href");
            record.target = attr_string(raw, "target");
        }
        "input" | "textarea" => {
            let default_type = if raw.tag == "input" { Some("text".to_string()) } else { None };
            record.input_type = attr_string(raw, "type").or(default_type);
            record.placeholder = attr_string(raw, "placeholder");
            record.value = raw.value.clone().filter(|v| !v.is_empty());
            record.name = attr_string(raw, "name");
            record.required = raw.attributes.contains_key("required").then_some(true);
            record.min = attr_string(raw, "min");
            record.max = attr_string(raw, "max");
            if matches!(record.input_type.as_deref(), Some("checkbox") | Some("radio")) {
                record.checked = raw.checked;
            }
        }
        "button" => {
            record.input_type = attr_string(raw, "type").or_else(|| Some("submit".to_string()));
        }
        "select" => {
            record.name = attr_string(raw, "name");
            record.value = raw.value.clone().filter(|v| !v.is_empty());
            record.required = raw.attributes.contains_key("required").then_some(true);
            record.options = raw.options.iter().take(MAX_SELECT_OPTIONS).cloned().collect();
        }
        "form" => {
            record.action = attr_string(raw, "action");
            record.method = attr_string(raw, "method").map(|m| m.to_ascii_uppercase());
            record.input_count = raw.input_count;
        }
        _ => {}
    }

    record.position = Some(Position {
        top: raw.rect.top,
        left: raw.rect.left,
        width: raw.rect.width,
        height: raw.rect.height,
        visible: raw.rect.intersects_viewport(viewport.w, viewport.h, 0.0),
    });

    record
}

/// Apply the observation policy: bind usable actionable elements, then add context
///
/// `bindings` is cleared first, so agent-ids restart at 1 on every call.
pub fn assemble(
    page_context: PageContext,
    actionable: &[RawElement],
    context: &[RawElement],
    bindings: &mut BindingTable,
) -> Observation {
    bindings.clear();
    let viewport = page_context.viewport;
    let mut elements = Vec::new();
    let mut stamps = Vec::new();

    for raw in actionable {
        if elements.len() >= MAX_ELEMENTS {
            break;
        }
        if !is_usable(raw, &viewport) || bindings.is_bound(raw.node) {
            continue;
        }

        let agent_id = bindings.register(raw.node, raw.tag.clone());
        elements.push(to_record(raw, &viewport).with_agent_id(agent_id.clone()));
        stamps.push((raw.node, agent_id));
    }

    let room = MAX_CONTEXT_ELEMENTS.min(MAX_ELEMENTS - elements.len());
    let context_records: Vec<ElementRecord> = context
        .iter()
        .filter(|raw| !bindings.is_bound(raw.node) && is_visible(raw, &viewport))
        .filter_map(|raw| {
            let mut record = to_record(raw, &viewport).as_context();
            // short direct text means the words live in child nodes
            let text = record
                .text
                .take()
                .filter(|t| t.chars().count() > MIN_CONTEXT_TEXT_CHARS)
                .unwrap_or_else(|| truncate_chars(&clean_text(&raw.full_text), MAX_TEXT_CHARS));
            if text.chars().count() > MIN_CONTEXT_TEXT_CHARS {
                record.text = Some(text);
                Some(record)
            } else {
                None
            }
        })
        .take(room)
        .collect();

    elements.extend(context_records);

    Observation {
        catalog: Catalog { page_context, elements },
        stamps,
    }
}

/// Observe the page behind `driver`, rebuilding `bindings`
pub async fn observe<D>(driver: &D, bindings: &mut BindingTable) -> Result<Catalog>
where
    D: PageDriver + ?Sized,
{
    bindings.clear();
    driver
        .inject()
        .await
        .map_err(|e| AgentError::InjectionFailed(e.to_string()))?;
    driver.clear_stamps().await?;

    let page_context = driver.page_context().await?;
    let actionable = driver.query(&ACTIONABLE_SELECTORS.join(", ")).await?;
    let context = driver.query(&CONTEXT_SELECTORS.join(", ")).await?;

    let observation = assemble(page_context, &actionable, &context, bindings);
    for (node, agent_id) in &observation.stamps {
        driver.stamp(*node, agent_id).await?;
    }

    log::debug!(
        "Observed {} elements ({} actionable)",
        observation.catalog.elements.len(),
        observation.stamps.len()
    );

    Ok(observation.catalog)
}
