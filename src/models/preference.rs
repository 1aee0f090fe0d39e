use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PreferenceValidationError;

/// Fields accepted in a raw preference payload.
pub const PREFERENCE_FIELDS: [&str; 7] = [
    "city",
    "location",
    "price_min",
    "price_max",
    "min_rating",
    "cuisine",
    "max_results",
];

pub const MAX_RESULTS_LIMIT: i64 = 100;

/// Attribute constraints applied by the retrieval layer.
///
/// Every field is optional; `None` places no constraint on that attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    /// Substring of the listing city.
    pub city: Option<String>,
    /// Substring of the neighbourhood.
    pub location: Option<String>,
    /// Minimum approximate cost for two.
    pub price_min: Option<i64>,
    /// Maximum approximate cost for two.
    pub price_max: Option<i64>,
    pub min_rating: Option<f64>,
    /// Substring of the comma-joined cuisines.
    pub cuisine: Option<String>,
}

/// Normalized, type-checked preference produced by [`validate_preference`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPreference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl From<&ValidatedPreference> for Preference {
    fn from(validated: &ValidatedPreference) -> Self {
        Self {
            city: validated.city.clone(),
            location: validated.location.clone(),
            price_min: validated.price_min,
            price_max: validated.price_max,
            min_rating: validated.min_rating,
            cuisine: validated.cuisine.clone(),
        }
    }
}

fn as_trimmed_string(field: &str, value: Option<&Value>, errors: &mut Vec<String>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => {
            errors.push(format!("{} must be a string", field));
            return None;
        }
    };
    (!text.is_empty()).then_some(text)
}

fn parse_int(
    field: &str,
    value: Option<&Value>,
    errors: &mut Vec<String>,
    minimum: Option<i64>,
) -> Option<i64> {
    let parsed = match value? {
        Value::Null => return None,
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let Some(parsed) = parsed else {
        errors.push(format!("{} must be an integer", field));
        return None;
    };

    if let Some(minimum) = minimum {
        if parsed < minimum {
            errors.push(format!("{} must be >= {}", field, minimum));
        }
    }
    Some(parsed)
}

fn parse_float(
    field: &str,
    value: Option<&Value>,
    errors: &mut Vec<String>,
    range: (f64, f64),
) -> Option<f64> {
    let parsed = match value? {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite());

    let Some(parsed) = parsed else {
        errors.push(format!("{} must be a number", field));
        return None;
    };

    let (minimum, maximum) = range;
    if parsed < minimum {
        errors.push(format!("{} must be >= {}", field, minimum));
    }
    if parsed > maximum {
        errors.push(format!("{} must be <= {}", field, maximum));
    }
    Some(parsed)
}

/// Validate a raw preference object and normalize it.
///
/// All problems are collected before failing, so the caller sees every
/// offending field at once. Unknown keys are rejected.
pub fn validate_preference(
    raw: &Map<String, Value>,
) -> Result<ValidatedPreference, PreferenceValidationError> {
    let mut errors = Vec::new();

    let mut unknown: Vec<&str> = raw
        .keys()
        .map(String::as_str)
        .filter(|key| !PREFERENCE_FIELDS.contains(key))
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        errors.push(format!("Unknown fields: {}", unknown.join(", ")));
    }

    let city = as_trimmed_string("city", raw.get("city"), &mut errors);
    let location = as_trimmed_string("location", raw.get("location"), &mut errors);
    let cuisine = as_trimmed_string("cuisine", raw.get("cuisine"), &mut errors);

    let price_min = parse_int("price_min", raw.get("price_min"), &mut errors, Some(0));
    let price_max = parse_int("price_max", raw.get("price_max"), &mut errors, Some(0));
    let min_rating = parse_float("min_rating", raw.get("min_rating"), &mut errors, (0.0, 5.0));

    let max_results = parse_int("max_results", raw.get("max_results"), &mut errors, Some(1));
    if matches!(max_results, Some(n) if n > MAX_RESULTS_LIMIT) {
        errors.push(format!("max_results must be <= {}", MAX_RESULTS_LIMIT));
    }

    if let (Some(min), Some(max)) = (price_min, price_max) {
        if min > max {
            errors.push("price_min must be less than or equal to price_max".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(PreferenceValidationError::new(errors));
    }

    Ok(ValidatedPreference {
        city,
        location,
        price_min,
        price_max,
        min_rating,
        cuisine,
        // Range-checked above.
        max_results: max_results.map(|n| n as usize),
    })
}
