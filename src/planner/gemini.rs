use crate::agent::config::PlannerConfig;
use crate::error::{AgentError, Result};
use crate::planner::decision::Decision;
use crate::planner::parse::parse_decision;
use crate::planner::prompt::build_prompt;
use crate::planner::{PlanRequest, Planner};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Decoding parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_k: 1,
            top_p: 1.0,
            max_output_tokens: 1000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Planner backed by the Gemini `generateContent` endpoint
pub struct GeminiPlanner {
    client: Client,
    config: PlannerConfig,
}

impl GeminiPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::PlannerHttp(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// URL of the generate endpoint for the configured model
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Send one prompt and return the raw model text
    pub async fn generate(&self, prompt: &str, api_key: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            generation_config: self.config.generation,
        };

        let response = self
            .client
            .post(self.endpoint_url())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::PlannerHttp(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::PlannerHttp(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            log::warn!("Unreadable planner response: {}", e);
            AgentError::PlannerEmpty
        })?;

        parsed.text().map(str::to_string).ok_or(AgentError::PlannerEmpty)
    }
}

#[async_trait]
impl Planner for GeminiPlanner {
    async fn decide(&self, request: PlanRequest<'_>) -> Result<Decision> {
        let prompt = build_prompt(request.goal, request.catalog, request.history);
        let text = self.generate(&prompt, request.api_key).await?;
        log::debug!("Planner says: {}", text);
        parse_decision(&text)
    }
}
