#![allow(dead_code)]

use async_trait::async_trait;
use page_pilot::dom::abstractor::ACTIONABLE_SELECTORS;
use page_pilot::dom::{Catalog, PageContext, Viewport};
use page_pilot::error::{AgentError, Result};
use page_pilot::page::{
    ClickStrategy, ComputedStyle, DomEvent, Highlight, NodeRef, PageDriver, PageSessionId, RawElement, Rect,
    ScrollOffset,
};
use page_pilot::planner::{Decision, PlanRequest, Planner};
use page_pilot::{AgentRuntime, Message};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

pub const SESSION: &str = "fake-tab";

/// An element on the fake page
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub raw: RawElement,
    /// Matched by the actionable selector union
    pub actionable: bool,
    /// Matched by the context selector union
    pub context: bool,
}

impl FakeElement {
    fn base(node: u64, tag: &str) -> RawElement {
        RawElement {
            node: NodeRef(node),
            tag: tag.to_string(),
            attributes: HashMap::new(),
            rect: Rect::new(20.0 + node as f64 * 40.0, 10.0, 200.0, 30.0),
            style: ComputedStyle::default(),
            has_layout_parent: true,
            ..Default::default()
        }
    }

    pub fn button(node: u64, text: &str) -> Self {
        let mut raw = Self::base(node, "button");
        raw.direct_text = text.to_string();
        raw.full_text = text.to_string();
        Self { raw, actionable: true, context: false }
    }

    pub fn link(node: u64, text: &str, href: &str) -> Self {
        let mut raw = Self::base(node, "a");
        raw.attributes.insert("href".to_string(), href.to_string());
        raw.direct_text = text.to_string();
        raw.full_text = text.to_string();
        Self { raw, actionable: true, context: false }
    }

    pub fn input(node: u64, name: &str) -> Self {
        let mut raw = Self::base(node, "input");
        raw.attributes.insert("name".to_string(), name.to_string());
        raw.attributes.insert("type".to_string(), "text".to_string());
        raw.value = Some(String::new());
        Self { raw, actionable: true, context: false }
    }

    pub fn submit(node: u64, value: &str) -> Self {
        let mut raw = Self::base(node, "input");
        raw.attributes.insert("type".to_string(), "submit".to_string());
        raw.attributes.insert("value".to_string(), value.to_string());
        raw.value = Some(value.to_string());
        Self { raw, actionable: true, context: false }
    }

    pub fn heading(node: u64, text: &str) -> Self {
        let mut raw = Self::base(node, "h1");
        raw.direct_text = text.to_string();
        raw.full_text = text.to_string();
        Self { raw, actionable: false, context: true }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.raw.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn at(mut self, top: f64) -> Self {
        self.raw.rect.top = top;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.raw.disabled = true;
        self
    }
}

/// Observable state of the fake page
#[derive(Debug, Default)]
pub struct PageState {
    pub context: PageContext,
    pub elements: Vec<FakeElement>,
    pub detached: HashSet<u64>,
    pub stamps: HashMap<u64, String>,
    pub values: HashMap<u64, String>,
    pub focused: Option<u64>,
    pub events: Vec<(u64, DomEvent)>,
    pub clicks: Vec<(u64, ClickStrategy)>,
    pub highlight: Option<(u64, Highlight)>,
    pub highlight_log: Vec<(u64, Highlight)>,
    pub scroll_top: f64,
    pub max_scroll: f64,
    pub scrolled_into_view: Vec<u64>,
    /// Clicking the key node replaces the page with the value
    pub navigations: HashMap<u64, Vec<FakeElement>>,
    pub refuse_clicks: bool,
    /// Click strategies that report failure
    pub refused_strategies: Vec<ClickStrategy>,
    pub fail_injection: bool,
    pub observations: usize,
}

/// In-memory [`PageDriver`]
#[derive(Clone)]
pub struct FakePage {
    session: PageSessionId,
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new(elements: Vec<FakeElement>) -> Self {
        let state = PageState {
            context: PageContext {
                title: "Fake page".to_string(),
                url: "https://shop.example/".to_string(),
                domain: "shop.example".to_string(),
                viewport: Viewport { w: 1280.0, h: 800.0, scroll_top: 0.0, scroll_left: 0.0 },
                has_scrollbar: true,
                form_count: 0,
            },
            elements,
            max_scroll: 5000.0,
            ..Default::default()
        };

        Self {
            session: PageSessionId(SESSION.to_string()),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }

    pub fn on_click_navigate(&self, node: u64, elements: Vec<FakeElement>) {
        self.state().navigations.insert(node, elements);
    }

    pub fn value(&self, node: u64) -> Option<String> {
        self.state().values.get(&node).cloned()
    }

    pub fn events(&self, node: u64) -> Vec<DomEvent> {
        self.state().events.iter().filter(|(n, _)| *n == node).map(|(_, e)| *e).collect()
    }

    fn attached(state: &PageState, node: NodeRef) -> Result<()> {
        let present = state.elements.iter().any(|e| e.raw.node == node);
        if present && !state.detached.contains(&node.0) {
            Ok(())
        } else {
            Err(AgentError::StaleBinding(format!("node {} is no longer attached", node.0)))
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    fn session_id(&self) -> PageSessionId {
        self.session.clone()
    }

    async fn inject(&self) -> Result<()> {
        if self.state().fail_injection {
            return Err(AgentError::PageScript("script blocked by page policy".to_string()));
        }
        Ok(())
    }

    async fn page_context(&self) -> Result<PageContext> {
        let state = self.state();
        let mut context = state.context.clone();
        context.viewport.scroll_top = state.scroll_top;
        Ok(context)
    }

    async fn clear_stamps(&self) -> Result<()> {
        let mut state = self.state();
        state.stamps.clear();
        state.highlight = None;
        state.observations += 1;
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<RawElement>> {
        let state = self.state();
        let actionable = selector == ACTIONABLE_SELECTORS.join(", ");
        Ok(state
            .elements
            .iter()
            .filter(|e| if actionable { e.actionable } else { e.context })
            .map(|e| {
                let mut raw = e.raw.clone();
                if let Some(value) = state.values.get(&raw.node.0) {
                    raw.value = Some(value.clone());
                }
                raw
            })
            .collect())
    }

    async fn stamp(&self, node: NodeRef, agent_id: &str) -> Result<()> {
        let mut state = self.state();
        Self::attached(&state, node)?;
        state.stamps.insert(node.0, agent_id.to_string());
        Ok(())
    }

    async fn scroll_into_view(&self, node: NodeRef) -> Result<()> {
        let mut state = self.state();
        Self::attached(&state, node)?;
        state.scrolled_into_view.push(node.0);
        Ok(())
    }

    async fn highlight(&self, node: NodeRef, highlight: Highlight) -> Result<()> {
        let mut state = self.state();
        Self::attached(&state, node)?;
        state.highlight = Some((node.0, highlight));
        state.highlight_log.push((node.0, highlight));
        Ok(())
    }

    async fn clear_highlight(&self) -> Result<()> {
        self.state().highlight = None;
        Ok(())
    }

    async fn click(&self, node: NodeRef, strategy: ClickStrategy) -> Result<bool> {
        let mut state = self.state();
        Self::attached(&state, node)?;
        if state.refuse_clicks || state.refused_strategies.contains(&strategy) {
            return Ok(false);
        }
        state.clicks.push((node.0, strategy));
        if let Some(next) = state.navigations.remove(&node.0) {
            state.elements = next;
            state.values.clear();
            state.scroll_top = 0.0;
        }
        Ok(true)
    }

    async fn focus(&self, node: NodeRef) -> Result<()> {
        let mut state = self.state();
        Self::attached(&state, node)?;
        state.focused = Some(node.0);
        Ok(())
    }

    async fn set_value(&self, node: NodeRef, value: &str) -> Result<()> {
        let mut state = self.state();
        Self::attached(&state, node)?;
        state.values.insert(node.0, value.to_string());
        Ok(())
    }

    async fn dispatch(&self, node: NodeRef, event: DomEvent) -> Result<()> {
        let mut state = self.state();
        Self::attached(&state, node)?;
        state.events.push((node.0, event));
        Ok(())
    }

    async fn scroll_offset(&self) -> Result<ScrollOffset> {
        Ok(ScrollOffset { top: self.state().scroll_top, left: 0.0 })
    }

    async fn scroll_by(&self, dy: f64) -> Result<()> {
        let mut state = self.state();
        state.scroll_top = (state.scroll_top + dy).clamp(0.0, state.max_scroll);
        Ok(())
    }
}

/// What the planner was shown on one call
#[derive(Debug, Clone)]
pub struct Seen {
    pub goal: String,
    pub api_key: String,
    pub catalog: Catalog,
    pub history: Vec<String>,
    pub decision: Option<Decision>,
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Result<Decision>>,
    repeat: Option<Decision>,
    seen: Vec<Seen>,
}

/// Planner that replays a fixed list of decisions and records every request
#[derive(Clone, Default)]
pub struct ScriptedPlanner {
    script: Arc<Mutex<Script>>,
}

impl ScriptedPlanner {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self::with_results(decisions.into_iter().map(Ok).collect())
    }

    pub fn with_results(steps: Vec<Result<Decision>>) -> Self {
        let script = Script {
            steps: steps.into(),
            ..Default::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    /// Answer every request with `decision`
    pub fn repeating(decision: Decision) -> Self {
        let script = Script {
            repeat: Some(decision),
            ..Default::default()
        };
        Self {
            script: Arc::new(Mutex::new(script)),
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.script.lock().unwrap().seen.clone()
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().seen.len()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn decide(&self, request: PlanRequest<'_>) -> Result<Decision> {
        let mut script = self.script.lock().unwrap();
        let result = match script.steps.pop_front() {
            Some(step) => step,
            None => Ok(script
                .repeat
                .clone()
                .unwrap_or_else(|| Decision::finish("script exhausted"))),
        };

        script.seen.push(Seen {
            goal: request.goal.to_string(),
            api_key: request.api_key.to_string(),
            catalog: request.catalog.clone(),
            history: request.history.iter().map(|h| h.decision.summary()).collect(),
            decision: result.as_ref().ok().cloned(),
        });

        result
    }
}

/// Collect UI messages until the task finishes or fails
pub async fn run_to_end(runtime: &mut AgentRuntime) -> Vec<Message> {
    let mut messages = Vec::new();
    runtime
        .wait_for_outcome(|message| messages.push(message.clone()))
        .await
        .expect("controller stopped");
    messages
}

pub fn statuses(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::AgentStatusUpdate { status, .. } => Some(status.clone()),
            _ => None,
        })
        .collect()
}

pub fn actions(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::AgentAction { action } => Some(action.clone()),
            _ => None,
        })
        .collect()
}
