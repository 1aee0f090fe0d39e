use serde_json::{Map, Value};

use crate::error::DataError;
use crate::models::{parse_cost, parse_rating, RestaurantRecord};

/// Lowercase, trim and collapse internal whitespace for name matching.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Anything that has a name and optionally some restaurant attributes.
///
/// Only [`name`](RestaurantLike::name) is required; the remaining accessors
/// default to "absent" so loose sources only implement what they carry.
pub trait RestaurantLike {
    fn name(&self) -> Option<&str>;

    fn address(&self) -> Option<&str> {
        None
    }
    fn location(&self) -> Option<&str> {
        None
    }
    fn city(&self) -> Option<&str> {
        None
    }
    fn cuisines(&self) -> Option<&str> {
        None
    }
    fn approx_cost(&self) -> Option<&str> {
        None
    }
    fn rate(&self) -> Option<&str> {
        None
    }
    fn votes(&self) -> Option<i64> {
        None
    }
    fn rest_type(&self) -> Option<&str> {
        None
    }
    fn dish_liked(&self) -> Option<&str> {
        None
    }
    fn online_order(&self) -> Option<&str> {
        None
    }
    fn book_table(&self) -> Option<&str> {
        None
    }
}

impl<T: RestaurantLike + ?Sized> RestaurantLike for &T {
    fn name(&self) -> Option<&str> {
        (**self).name()
    }
    fn address(&self) -> Option<&str> {
        (**self).address()
    }
    fn location(&self) -> Option<&str> {
        (**self).location()
    }
    fn city(&self) -> Option<&str> {
        (**self).city()
    }
    fn cuisines(&self) -> Option<&str> {
        (**self).cuisines()
    }
    fn approx_cost(&self) -> Option<&str> {
        (**self).approx_cost()
    }
    fn rate(&self) -> Option<&str> {
        (**self).rate()
    }
    fn votes(&self) -> Option<i64> {
        (**self).votes()
    }
    fn rest_type(&self) -> Option<&str> {
        (**self).rest_type()
    }
    fn dish_liked(&self) -> Option<&str> {
        (**self).dish_liked()
    }
    fn online_order(&self) -> Option<&str> {
        (**self).online_order()
    }
    fn book_table(&self) -> Option<&str> {
        (**self).book_table()
    }
}

impl RestaurantLike for RestaurantRecord {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
    fn city(&self) -> Option<&str> {
        self.listed_in_city.as_deref()
    }
    fn cuisines(&self) -> Option<&str> {
        self.cuisines.as_deref()
    }
    fn approx_cost(&self) -> Option<&str> {
        self.approx_cost.as_deref()
    }
    fn rate(&self) -> Option<&str> {
        self.rate.as_deref()
    }
    fn votes(&self) -> Option<i64> {
        self.votes
    }
    fn rest_type(&self) -> Option<&str> {
        self.rest_type.as_deref()
    }
    fn dish_liked(&self) -> Option<&str> {
        self.dish_liked.as_deref()
    }
    fn online_order(&self) -> Option<&str> {
        self.online_order.as_deref()
    }
    fn book_table(&self) -> Option<&str> {
        self.book_table.as_deref()
    }
}

/// Loose JSON objects; non-string values for text fields count as absent.
impl RestaurantLike for Map<String, Value> {
    fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }
    fn address(&self) -> Option<&str> {
        self.get("address").and_then(Value::as_str)
    }
    fn location(&self) -> Option<&str> {
        self.get("location").and_then(Value::as_str)
    }
    fn city(&self) -> Option<&str> {
        self.get("listed_in_city")
            .or_else(|| self.get("city"))
            .and_then(Value::as_str)
    }
    fn cuisines(&self) -> Option<&str> {
        self.get("cuisines").and_then(Value::as_str)
    }
    fn approx_cost(&self) -> Option<&str> {
        self.get("approx_cost").and_then(Value::as_str)
    }
    fn rate(&self) -> Option<&str> {
        self.get("rate").and_then(Value::as_str)
    }
    fn votes(&self) -> Option<i64> {
        self.get("votes").and_then(Value::as_i64)
    }
    fn rest_type(&self) -> Option<&str> {
        self.get("rest_type").and_then(Value::as_str)
    }
    fn dish_liked(&self) -> Option<&str> {
        self.get("dish_liked").and_then(Value::as_str)
    }
    fn online_order(&self) -> Option<&str> {
        self.get("online_order").and_then(Value::as_str)
    }
    fn book_table(&self) -> Option<&str> {
        self.get("book_table").and_then(Value::as_str)
    }
}

/// A restaurant eligible for ranking in one request.
///
/// Numeric rating and cost are derived once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    name: String,
    address: Option<String>,
    location: Option<String>,
    city: Option<String>,
    cuisines: Option<String>,
    approx_cost: Option<String>,
    rate: Option<String>,
    votes: Option<i64>,
    rest_type: Option<String>,
    dish_liked: Option<String>,
    online_order: Option<String>,
    book_table: Option<String>,
    rating_numeric: Option<f64>,
    cost_numeric: Option<i64>,
}

impl Candidate {
    /// Normalize a single source; `None` when it has no usable name.
    ///
    /// The name is kept verbatim; only blank names are rejected.
    pub fn from_source<T: RestaurantLike + ?Sized>(source: &T) -> Option<Self> {
        let name = source.name().filter(|n| !n.trim().is_empty())?;
        let owned = |value: Option<&str>| value.map(str::to_string);

        Some(Self {
            name: name.to_string(),
            address: owned(source.address()),
            location: owned(source.location()),
            city: owned(source.city()),
            cuisines: owned(source.cuisines()),
            approx_cost: owned(source.approx_cost()),
            rate: owned(source.rate()),
            votes: source.votes(),
            rest_type: owned(source.rest_type()),
            dish_liked: owned(source.dish_liked()),
            online_order: owned(source.online_order()),
            book_table: owned(source.book_table()),
            rating_numeric: source.rate().and_then(parse_rating),
            cost_numeric: source.approx_cost().and_then(parse_cost),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn location(&self) -> Option<&str> {
        non_empty(&self.location)
    }

    pub fn city(&self) -> Option<&str> {
        non_empty(&self.city)
    }

    pub fn cuisines(&self) -> Option<&str> {
        non_empty(&self.cuisines)
    }

    pub fn approx_cost(&self) -> Option<&str> {
        non_empty(&self.approx_cost)
    }

    pub fn rate(&self) -> Option<&str> {
        non_empty(&self.rate)
    }

    pub fn votes(&self) -> Option<i64> {
        self.votes
    }

    pub fn rating_numeric(&self) -> Option<f64> {
        self.rating_numeric
    }

    pub fn cost_numeric(&self) -> Option<i64> {
        self.cost_numeric
    }

    /// Numeric rating when parseable, otherwise the raw string.
    pub fn rating_value(&self) -> Option<Value> {
        match self.rating_numeric {
            Some(rating) => Some(Value::from(rating)),
            None => self.rate().map(Value::from),
        }
    }

    /// Numeric cost when parseable, otherwise the raw string.
    pub fn cost_value(&self) -> Option<Value> {
        match self.cost_numeric {
            Some(cost) => Some(Value::from(cost)),
            None => self.approx_cost().map(Value::from),
        }
    }

    /// Projection sent to the text-generation model. Absent or empty fields are dropped.
    pub fn to_prompt_value(&self) -> Value {
        let fields: [(&str, Option<Value>); 11] = [
            ("name", Some(Value::from(self.name.as_str()))),
            ("city", self.city().map(Value::from)),
            ("location", self.location().map(Value::from)),
            ("cuisines", self.cuisines().map(Value::from)),
            ("approx_cost_for_two", self.cost_value()),
            ("rating", self.rating_value()),
            ("votes", self.votes.map(Value::from)),
            ("rest_type", non_empty(&self.rest_type).map(Value::from)),
            ("dish_liked", non_empty(&self.dish_liked).map(Value::from)),
            ("online_order", non_empty(&self.online_order).map(Value::from)),
            ("book_table", non_empty(&self.book_table).map(Value::from)),
        ];

        let projection: Map<String, Value> = fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();
        Value::Object(projection)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl RestaurantLike for Candidate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
    fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }
    fn cuisines(&self) -> Option<&str> {
        self.cuisines.as_deref()
    }
    fn approx_cost(&self) -> Option<&str> {
        self.approx_cost.as_deref()
    }
    fn rate(&self) -> Option<&str> {
        self.rate.as_deref()
    }
    fn votes(&self) -> Option<i64> {
        self.votes
    }
    fn rest_type(&self) -> Option<&str> {
        self.rest_type.as_deref()
    }
    fn dish_liked(&self) -> Option<&str> {
        self.dish_liked.as_deref()
    }
    fn online_order(&self) -> Option<&str> {
        self.online_order.as_deref()
    }
    fn book_table(&self) -> Option<&str> {
        self.book_table.as_deref()
    }
}

/// Normalize a batch of restaurant-like sources into candidates.
///
/// A source without a name fails the whole batch: it points at a corrupt
/// upstream feed rather than a per-request condition.
pub fn coerce_candidates<I>(items: I) -> Result<Vec<Candidate>, DataError>
where
    I: IntoIterator,
    I::Item: RestaurantLike,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| Candidate::from_source(&item).ok_or(DataError::MissingName { index }))
        .collect()
}
