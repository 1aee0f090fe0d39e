use serde_json::{Map, Value};

use crate::error::ParseError;

/// Keys checked, in order, for the restaurant name of a completion item.
const NAME_KEYS: [&str; 3] = ["restaurant_name", "name", "restaurant"];

/// One ranked entry recovered from a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    /// Model-supplied rank, or the 1-based array position when missing or not an integer.
    pub rank: i64,
    pub restaurant_name: String,
    pub explanation: Option<String>,
    pub attributes: Option<Map<String, Value>>,
}

/// Items recovered from a completion plus the non-fatal problems seen on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCompletion {
    pub items: Vec<ParsedItem>,
    pub warnings: Vec<String>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse the whole text as JSON, falling back to the span between the first
/// `[` and the last `]`.
fn extract_json(text: &str) -> Result<Value, ParseError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) else {
        return Err(ParseError::NoArray);
    };
    if end <= start {
        return Err(ParseError::NoArray);
    }

    serde_json::from_str(&trimmed[start..=end]).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

fn extract_name(item: &Map<String, Value>) -> Option<String> {
    NAME_KEYS.iter().find_map(|key| {
        item.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

fn parse_item(position: usize, value: &Value, warnings: &mut Vec<String>) -> Option<ParsedItem> {
    let Some(item) = value.as_object() else {
        warnings.push(format!("Item {} is not an object; skipped", position));
        return None;
    };

    let Some(restaurant_name) = extract_name(item) else {
        warnings.push(format!("Item {} missing restaurant_name; skipped", position));
        return None;
    };

    let rank = match item.get("rank") {
        Some(Value::Null) | None => position as i64,
        Some(rank) => rank.as_i64().unwrap_or_else(|| {
            warnings.push(format!("Item {} rank is not an integer; using position", position));
            position as i64
        }),
    };

    let explanation = match item.get("explanation") {
        Some(Value::String(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Some(Value::Null) | None => None,
        Some(other) => {
            warnings.push(format!(
                "Item {} explanation is {}, not a string; dropped",
                position,
                json_kind(other)
            ));
            None
        }
    };

    let attributes = match item.get("attributes") {
        Some(Value::Object(map)) => Some(map.clone()),
        Some(Value::Null) | None => None,
        Some(other) => {
            warnings.push(format!(
                "Item {} attributes is {}, not an object; dropped",
                position,
                json_kind(other)
            ));
            None
        }
    };

    Some(ParsedItem {
        rank,
        restaurant_name,
        explanation,
        attributes,
    })
}

/// Parse raw completion text into ranked items.
///
/// Fails when no JSON array can be recovered, or when every element of the
/// array had to be skipped.
pub fn parse_recommendations(text: &str) -> Result<ParsedCompletion, ParseError> {
    let elements = match extract_json(text)? {
        Value::Array(elements) => elements,
        other => return Err(ParseError::NotAnArray(json_kind(&other))),
    };

    let mut warnings = Vec::new();
    let items: Vec<ParsedItem> = elements
        .iter()
        .enumerate()
        .filter_map(|(index, element)| parse_item(index + 1, element, &mut warnings))
        .collect();

    if items.is_empty() {
        return Err(ParseError::NoValidItems {
            warnings: warnings.len(),
        });
    }

    Ok(ParsedCompletion { items, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parser_accepts_json_array() {
        let raw = json!([
            {"rank": 1, "restaurant_name": "A", "explanation": "Because."},
            {"rank": 2, "restaurant_name": "B", "explanation": "Also because."}
        ])
        .to_string();

        let parsed = parse_recommendations(&raw).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].restaurant_name, "A");
        assert_eq!(parsed.items[1].explanation.as_deref(), Some("Also because."));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_parser_extracts_array_from_wrapped_text() {
        let wrapped = format!(
            "Sure, here you go:\n{}\nThanks!",
            json!([{"restaurant_name": "A", "explanation": "X"}])
        );
        let parsed = parse_recommendations(&wrapped).unwrap();
        assert_eq!(parsed.items[0].restaurant_name, "A");
        assert_eq!(parsed.items[0].rank, 1);
    }

    #[test]
    fn test_structural_failures() {
        assert_eq!(parse_recommendations("not json"), Err(ParseError::NoArray));
        assert_eq!(parse_recommendations("] backwards ["), Err(ParseError::NoArray));
        assert!(matches!(
            parse_recommendations("here: [ {\"name\": \"A\", ]"),
            Err(ParseError::InvalidJson(_))
        ));
        assert_eq!(
            parse_recommendations(r#"{"restaurant_name": "A"}"#),
            Err(ParseError::NotAnArray("object"))
        );
    }

    #[test]
    fn test_name_fallback_keys_and_skips() {
        let raw = json!([
            "just a string",
            {"name": "  Onesta  "},
            {"restaurant": "Spice Elephant"},
            {"restaurant_name": "", "name": "Fallback Name"},
            {"restaurant_name": 42},
            {"explanation": "no name here"}
        ])
        .to_string();

        let parsed = parse_recommendations(&raw).unwrap();
        let names: Vec<_> = parsed.items.iter().map(|i| i.restaurant_name.as_str()).collect();
        assert_eq!(names, vec!["Onesta", "Spice Elephant", "Fallback Name"]);
        assert_eq!(parsed.warnings.len(), 3);
        assert!(parsed.warnings[0].starts_with("Item 1 is not an object"));
    }

    #[test]
    fn test_rank_falls_back_to_position() {
        let raw = json!([
            {"restaurant_name": "A", "rank": "first"},
            {"restaurant_name": "B"},
            {"restaurant_name": "C", "rank": 1.5},
            {"restaurant_name": "D", "rank": 7}
        ])
        .to_string();

        let parsed = parse_recommendations(&raw).unwrap();
        let ranks: Vec<i64> = parsed.items.iter().map(|i| i.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 7]);
        // Absent rank is silent; non-integer ranks are reported.
        assert_eq!(parsed.warnings.len(), 2);
    }

    #[test]
    fn test_bad_explanation_and_attributes_are_dropped() {
        let raw = json!([
            {"restaurant_name": "A", "explanation": 5, "attributes": ["x"]},
            {"restaurant_name": "B", "explanation": "ok", "attributes": {"cuisines": "Thai"}}
        ])
        .to_string();

        let parsed = parse_recommendations(&raw).unwrap();
        assert_eq!(parsed.items[0].explanation, None);
        assert_eq!(parsed.items[0].attributes, None);
        assert_eq!(parsed.items[1].attributes.as_ref().unwrap()["cuisines"], "Thai");
        assert_eq!(parsed.warnings.len(), 2);
    }

    #[test]
    fn test_only_garbage_items_is_a_failure() {
        let raw = json!([1, "two", {"rank": 3}]).to_string();
        assert_eq!(
            parse_recommendations(&raw),
            Err(ParseError::NoValidItems { warnings: 3 })
        );
        assert_eq!(
            parse_recommendations("[]"),
            Err(ParseError::NoValidItems { warnings: 0 })
        );
    }
}
