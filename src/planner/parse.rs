use crate::error::{AgentError, Result};
use crate::planner::decision::Decision;
use serde_json::Value;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Body of the first ```json fenced block, if it holds an object
fn fenced_object(text: &str) -> Option<&str> {
    let start = text.find(FENCE_OPEN)? + FENCE_OPEN.len();
    let rest = &text[start..];
    let end = rest.find(FENCE_CLOSE)?;
    let body = rest[..end].trim();
    (body.starts_with('{') && body.ends_with('}')).then_some(body)
}

/// The first balanced `{...}` substring, ignoring braces inside JSON strings
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate the JSON object in a free-form model response
pub fn extract_json(text: &str) -> Option<&str> {
    fenced_object(text).or_else(|| balanced_object(text))
}

/// Uppercase enum-valued fields so `"click"` and `"down"` are accepted
fn normalize(mut value: Value) -> Value {
    if let Some(object) = value.as_object_mut() {
        for key in ["command", "scrollDirection"] {
            if let Some(Value::String(s)) = object.get_mut(key) {
                *s = s.trim().to_ascii_uppercase();
            }
        }
        if let Some(Value::String(duration)) = object.get("duration") {
            if let Ok(ms) = duration.trim().parse::<u64>() {
                object.insert("duration".to_string(), Value::from(ms));
            }
        }
    }
    value
}

/// Extract, deserialize and validate a decision from model output
pub fn parse_decision(text: &str) -> Result<Decision> {
    let json = extract_json(text)
        .ok_or_else(|| AgentError::PlannerProtocol("no JSON object in response".to_string()))?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| AgentError::PlannerProtocol(format!("invalid JSON: {}", e)))?;

    let decision: Decision = serde_json::from_value(normalize(value))
        .map_err(|e| AgentError::PlannerProtocol(format!("invalid decision: {}", e)))?;

    decision.action()?;
    Ok(decision)
}
