use crate::agent::state::HistoryEntry;
use crate::dom::Catalog;

const PREAMBLE: &str = "You are an expert web automation agent driving a live web page. \
Your goal is to achieve the user's objective by navigating a website.";

const RESPONSE_FORMAT: &str = r#"Provide your response as a JSON object with this exact structure:
{
  "thought": "Your brief reasoning for the chosen command",
  "command": "CLICK|TYPE|SCROLL|WAIT|FINISH",
  "targetId": "agent-id of element (required for CLICK/TYPE)",
  "text": "text to type (required for TYPE)",
  "scrollDirection": "UP|DOWN (required for SCROLL)",
  "duration": "milliseconds to wait (optional for WAIT)",
  "answer": "final answer to user's goal (required for FINISH)"
}

Rules:
1. Only use the 'agent-id' values from the provided elements
2. If you have enough information to answer the user's goal, use FINISH
3. Be methodical and take one action at a time
4. If you can't find what you need, try scrolling or looking for navigation elements
5. Elements marked isContext are for reading only and cannot be targeted
6. Always wrap your JSON in ```json code blocks

Respond with only the JSON object wrapped in code blocks."#;

/// Render history as `- <command>: <thought>` lines
pub fn render_history(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| format!("- {}", entry.decision.summary()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the single text prompt sent to the model
pub fn build_prompt(goal: &str, catalog: &Catalog, history: &[HistoryEntry]) -> String {
    let observation = catalog
        .to_json()
        .unwrap_or_else(|e| format!("{{\"error\": \"observation could not be rendered: {}\"}}", e));

    let history_text = if history.is_empty() {
        String::new()
    } else {
        format!("\n\nPrevious actions taken:\n{}", render_history(history))
    };

    format!(
        "{PREAMBLE}\n\nUSER'S GOAL: {goal}\n\nCURRENT PAGE ELEMENTS (JSON):\n{observation}{history_text}\n\n{RESPONSE_FORMAT}"
    )
}
