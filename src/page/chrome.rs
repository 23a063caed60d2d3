use crate::dom::element::PageContext;
use crate::error::{AgentError, Result};
use crate::page::{ClickStrategy, DomEvent, Highlight, NodeRef, PageDriver, PageSessionId, RawElement, ScrollOffset};
use async_trait::async_trait;
use headless_chrome::Tab;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Page-side probe installed as `window.__pagePilot`
const PROBE_JS: &str = include_str!("probe.js");

const PROBE_GLOBAL: &str = "__pagePilot";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReplyStatus {
    Ok,
    Stale,
    Error,
    Missing,
}

#[derive(Debug, Deserialize)]
struct ProbeReply {
    status: ReplyStatus,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

/// [`PageDriver`] backed by a `headless_chrome` tab
///
/// Every call evaluates a short expression against the injected probe on a
/// blocking thread. If the document was replaced and the probe is gone, it is
/// reinstalled and the call retried once; node handles from the old document
/// then report as stale.
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
    session: PageSessionId,
}

impl ChromePage {
    pub fn new(tab: Arc<Tab>) -> Self {
        let session = PageSessionId(tab.get_target_id().to_string());
        Self { tab, session }
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Evaluate `expression` and return its string result
    async fn evaluate(&self, expression: String) -> Result<String> {
        let tab = self.tab.clone();
        let result = tokio::task::spawn_blocking(move || tab.evaluate(&expression, false))
            .await
            .map_err(|e| AgentError::PageScript(format!("evaluation task failed: {}", e)))?
            .map_err(|e| AgentError::PageScript(format!("Failed to evaluate probe call: {}", e)))?;

        let value = result
            .value
            .ok_or_else(|| AgentError::PageScript("No value returned from probe".to_string()))?;

        serde_json::from_value(value).map_err(|e| AgentError::PageScript(format!("Failed to get JSON string: {}", e)))
    }

    async fn call_once(&self, method: &str, args: &[Value]) -> Result<ProbeReply> {
        let expression = format!(
            "(() => {{ const probe = window.{global}; \
             if (!probe) return JSON.stringify({{status: 'missing'}}); \
             return JSON.stringify(probe.call({method}, {args})); }})()",
            global = PROBE_GLOBAL,
            method = Value::String(method.to_string()),
            args = Value::Array(args.to_vec()),
        );

        let text = self.evaluate(expression).await?;
        serde_json::from_str(&text).map_err(|e| AgentError::PageScript(format!("Failed to parse probe reply: {}", e)))
    }

    async fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        let mut reply = self.call_once(method, args).await?;
        if matches!(reply.status, ReplyStatus::Missing) {
            log::debug!("Probe missing before {}, reinstalling", method);
            self.install().await?;
            reply = self.call_once(method, args).await?;
        }

        let error = reply.error.unwrap_or_default();
        match reply.status {
            ReplyStatus::Ok => Ok(reply.value),
            ReplyStatus::Stale => Err(AgentError::StaleBinding(error)),
            ReplyStatus::Error => Err(AgentError::PageScript(format!("{}: {}", method, error))),
            ReplyStatus::Missing => Err(AgentError::InjectionFailed("probe did not install".to_string())),
        }
    }

    async fn call_typed<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> Result<T> {
        let value = self.call(method, args).await?;
        serde_json::from_value(value).map_err(|e| AgentError::PageScript(format!("Unexpected {} result: {}", method, e)))
    }

    async fn install(&self) -> Result<()> {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || tab.evaluate(PROBE_JS, false))
            .await
            .map_err(|e| AgentError::InjectionFailed(e.to_string()))?
            .map_err(|e| AgentError::InjectionFailed(format!("Failed to install probe: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    fn session_id(&self) -> PageSessionId {
        self.session.clone()
    }

    async fn inject(&self) -> Result<()> {
        self.install().await
    }

    async fn page_context(&self) -> Result<PageContext> {
        self.call_typed("pageContext", &[]).await
    }

    async fn clear_stamps(&self) -> Result<()> {
        self.call("clearStamps", &[]).await.map(|_| ())
    }

    async fn query(&self, selector: &str) -> Result<Vec<RawElement>> {
        self.call_typed("query", &[json!(selector)]).await
    }

    async fn stamp(&self, node: NodeRef, agent_id: &str) -> Result<()> {
        self.call("stamp", &[json!(node.0), json!(agent_id)]).await.map(|_| ())
    }

    async fn scroll_into_view(&self, node: NodeRef) -> Result<()> {
        self.call("scrollIntoView", &[json!(node.0)]).await.map(|_| ())
    }

    async fn highlight(&self, node: NodeRef, state: Highlight) -> Result<()> {
        self.call("highlight", &[json!(node.0), json!(state)]).await.map(|_| ())
    }

    async fn clear_highlight(&self) -> Result<()> {
        self.call("clearHighlight", &[]).await.map(|_| ())
    }

    async fn click(&self, node: NodeRef, strategy: ClickStrategy) -> Result<bool> {
        self.call_typed("click", &[json!(node.0), json!(strategy)]).await
    }

    async fn focus(&self, node: NodeRef) -> Result<()> {
        self.call("focus", &[json!(node.0)]).await.map(|_| ())
    }

    async fn set_value(&self, node: NodeRef, value: &str) -> Result<()> {
        self.call("setValue", &[json!(node.0), json!(value)]).await.map(|_| ())
    }

    async fn dispatch(&self, node: NodeRef, event: DomEvent) -> Result<()> {
        self.call("dispatch", &[json!(node.0), json!(event.name())]).await.map(|_| ())
    }

    async fn scroll_offset(&self) -> Result<ScrollOffset> {
        self.call_typed("scrollOffset", &[]).await
    }

    async fn scroll_by(&self, dy: f64) -> Result<()> {
        self.call("scrollBy", &[json!(dy)]).await.map(|_| ())
    }
}
