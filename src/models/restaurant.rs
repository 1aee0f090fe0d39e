use serde::{Deserialize, Deserializer, Serialize};

/// Accepts votes as a JSON integer or as a string with thousands separators.
fn deserialize_optional_votes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Int(i64),
        String(String),
        Null,
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Int(i) => Ok(Some(i)),
        StringOrInt::String(s) => Ok(parse_count(&s)),
        StringOrInt::Null => Ok(None),
    }
}

/// Parse an "X/5" style rating, keeping only the part before the slash.
///
/// `"4.1/5"` parses to `4.1`; placeholders such as `"NEW"` or `"-"` yield `None`.
pub fn parse_rating(raw: &str) -> Option<f64> {
    let head = raw.trim().split('/').next()?.trim();
    if head.is_empty() {
        return None;
    }
    head.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse a cost-for-two string, ignoring thousands separators (`"1,000"` is `1000`).
pub fn parse_cost(raw: &str) -> Option<i64> {
    parse_count(raw)
}

pub(crate) fn parse_count(raw: &str) -> Option<i64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Canonical restaurant record as held by the dataset store.
///
/// Numeric rating and cost are kept as the raw dataset strings and parsed on
/// demand; records are never mutated once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "listed_in(city)")]
    pub listed_in_city: Option<String>,
    #[serde(default)]
    pub cuisines: Option<String>,
    #[serde(default, alias = "approx_cost(for two people)")]
    pub approx_cost: Option<String>,
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_votes")]
    pub votes: Option<i64>,
    #[serde(default)]
    pub rest_type: Option<String>,
    #[serde(default)]
    pub dish_liked: Option<String>,
    #[serde(default)]
    pub online_order: Option<String>,
    #[serde(default)]
    pub book_table: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RestaurantRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn rating_numeric(&self) -> Option<f64> {
        self.rate.as_deref().and_then(parse_rating)
    }

    pub fn cost_numeric(&self) -> Option<i64> {
        self.approx_cost.as_deref().and_then(parse_cost)
    }
}
