use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::preference::PREFERENCE_FIELDS;
use crate::services::candidate::Candidate;

pub const SYSTEM_PROMPT: &str = r#"You are a restaurant recommendation assistant.

You will be given:
- a user preference object
- a list of candidate restaurants (bounded top-K)

Rules:
- ONLY recommend restaurants from the provided candidates.
- Output MUST be valid JSON only (no markdown, no prose).
- Keep explanations short (1-2 sentences).
- Do not hallucinate attributes that aren't in the candidate list.

Output format (JSON array):
[
  {
    "rank": 1,
    "restaurant_name": "Exact Candidate Name",
    "explanation": "Short reason based on preferences and candidate fields"
  }
]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Reduce any serializable preference (struct or map) to its known, non-empty fields.
///
/// Unrecognized keys are ignored rather than rejected; strict checking
/// happens earlier in validation.
pub fn preference_fields<P>(preference: &P) -> serde_json::Result<Map<String, Value>>
where
    P: Serialize + ?Sized,
{
    let raw = match serde_json::to_value(preference)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Ok(PREFERENCE_FIELDS
        .iter()
        .filter_map(|&key| {
            let value = raw.get(key)?;
            let empty = match value {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                _ => false,
            };
            (!empty).then(|| (key.to_string(), value.clone()))
        })
        .collect())
}

/// Build the system + user message pair for the ranking request.
pub fn build_messages<P>(
    preference: &P,
    candidates: &[Candidate],
    desired_results: usize,
) -> serde_json::Result<Vec<ChatMessage>>
where
    P: Serialize + ?Sized,
{
    let payload = json!({
        "preferences": preference_fields(preference)?,
        "desired_results": desired_results,
        "candidates": candidates.iter().map(Candidate::to_prompt_value).collect::<Vec<_>>(),
    });

    Ok(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(serde_json::to_string(&payload)?),
    ])
}
