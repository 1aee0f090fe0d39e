use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::models::{Preference, RestaurantRecord};
use crate::services::candidate::normalize_name;
use crate::services::data_store::RestaurantDataStore;

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| !h.is_empty() && h.to_lowercase().contains(&needle.to_lowercase()))
}

/// True when the record satisfies every constraint present in `preference`.
///
/// Numeric constraints compare against the derived value; a record whose raw
/// cost or rating cannot be parsed never matches a numeric constraint.
pub fn matches_preference(record: &RestaurantRecord, preference: &Preference) -> bool {
    if let Some(city) = &preference.city {
        if !contains_ignore_case(record.listed_in_city.as_deref(), city) {
            return false;
        }
    }
    if let Some(location) = &preference.location {
        if !contains_ignore_case(record.location.as_deref(), location) {
            return false;
        }
    }

    let cost = record.cost_numeric();
    if let Some(min) = preference.price_min {
        if !cost.is_some_and(|c| c >= min) {
            return false;
        }
    }
    if let Some(max) = preference.price_max {
        if !cost.is_some_and(|c| c <= max) {
            return false;
        }
    }

    if let Some(min_rating) = preference.min_rating {
        if !record.rating_numeric().is_some_and(|r| r >= min_rating) {
            return false;
        }
    }

    if let Some(cuisine) = &preference.cuisine {
        if !contains_ignore_case(record.cuisines.as_deref(), cuisine) {
            return false;
        }
    }

    true
}

/// Filter records against a preference, keeping the pool's order.
pub fn filter_records<'a, I>(records: I, preference: &Preference) -> Vec<RestaurantRecord>
where
    I: IntoIterator<Item = &'a RestaurantRecord>,
{
    records
        .into_iter()
        .filter(|record| matches_preference(record, preference))
        .cloned()
        .collect()
}

/// Descending by rating (unparseable ratings count as 0.0), ties broken by votes.
fn compare_by_rating(a: &RestaurantRecord, b: &RestaurantRecord) -> Ordering {
    let a_rating = a.rating_numeric().unwrap_or(0.0);
    let b_rating = b.rating_numeric().unwrap_or(0.0);

    b_rating
        .partial_cmp(&a_rating)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.votes.unwrap_or(0).cmp(&a.votes.unwrap_or(0)))
}

/// Stable in-place sort by rating then votes, both descending.
pub fn sort_by_rating(records: &mut [RestaurantRecord]) {
    records.sort_by(compare_by_rating);
}

/// Query the store, optionally rank by rating, and truncate to `top_k`.
///
/// A `top_k` of `None` or `Some(0)` means no limit.
pub fn retrieve(
    store: &RestaurantDataStore,
    preference: &Preference,
    rank_by_rating: bool,
    top_k: Option<usize>,
) -> Vec<RestaurantRecord> {
    let mut candidates = store.query(preference);
    if rank_by_rating {
        sort_by_rating(&mut candidates);
    }
    if let Some(limit) = top_k.filter(|&k| k > 0) {
        candidates.truncate(limit);
    }

    debug!(
        "Retrieved {} candidates from a pool of {}",
        candidates.len(),
        store.len()
    );
    candidates
}

/// Drop records whose normalized name was already seen, keeping the first.
///
/// Run after ranking so the surviving record is the highest rated one.
pub fn dedupe_by_name(records: Vec<RestaurantRecord>) -> Vec<RestaurantRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(normalize_name(&record.name)))
        .collect()
}
