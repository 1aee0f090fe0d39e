//! Matches ranked completion items back to canonical candidates.
//!
//! Both the model-ranked path and the fallback path finish through the same
//! fill routine, so the output contract does not depend on which one ran:
//! contiguous ranks from 1, unique names, a non-empty explanation each, and at
//! most `desired` entries.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{GenerationError, ParseError};
use crate::models::Recommendation;
use crate::services::candidate::{normalize_name, Candidate};
use crate::services::parser::ParsedCompletion;

pub const GENERIC_EXPLANATION: &str = "Matches your preferences.";

const MAX_TEMPLATE_CLAUSES: usize = 4;

/// Why the ranked list could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RankingFailure {
    Prompt(String),
    Generation(GenerationError),
    Parse(ParseError),
}

impl fmt::Display for RankingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingFailure::Prompt(reason) => write!(f, "prompt construction failed: {}", reason),
            RankingFailure::Generation(err) => write!(f, "generation failed: {}", err),
            RankingFailure::Parse(err) => write!(f, "completion parse failed: {}", err),
        }
    }
}

/// Result of the generate-and-parse stage.
#[derive(Debug, Clone, PartialEq)]
pub enum RankingOutcome {
    Ranked(ParsedCompletion),
    Failed(RankingFailure),
}

impl From<GenerationError> for RankingOutcome {
    fn from(err: GenerationError) -> Self {
        RankingOutcome::Failed(RankingFailure::Generation(err))
    }
}

impl From<ParseError> for RankingOutcome {
    fn from(err: ParseError) -> Self {
        RankingOutcome::Failed(RankingFailure::Parse(err))
    }
}

/// Compose a short sentence from whatever attributes the candidate has.
pub fn template_explanation(candidate: &Candidate) -> String {
    let mut clauses = Vec::with_capacity(MAX_TEMPLATE_CLAUSES);

    if let Some(rating) = candidate.rating_numeric() {
        clauses.push(format!("Rated {:.1}", rating));
    } else if let Some(raw) = candidate.rate() {
        clauses.push(format!("Rated {}", raw));
    }

    if let Some(cuisines) = candidate.cuisines() {
        clauses.push(format!("serves {}", cuisines));
    }

    if let Some(cost) = candidate.cost_numeric() {
        clauses.push(format!("approx. cost {} for two", cost));
    } else if let Some(raw) = candidate.approx_cost() {
        clauses.push(format!("approx. cost {} for two", raw));
    }

    let place: Vec<&str> = [candidate.location(), candidate.city()]
        .into_iter()
        .flatten()
        .collect();
    if !place.is_empty() {
        clauses.push(format!("in {}", place.join(", ")));
    }

    if clauses.is_empty() {
        return GENERIC_EXPLANATION.to_string();
    }
    clauses.truncate(MAX_TEMPLATE_CLAUSES);
    format!("{}.", clauses.join(", "))
}

/// Fill `cuisines`, `rating`, `approx_cost` and `location` from the candidate
/// where known and not already present.
///
/// Rating is numeric when it parses; cost stays the raw dataset string.
pub fn default_attributes(candidate: &Candidate, mut attributes: Map<String, Value>) -> Map<String, Value> {
    let defaults = [
        ("cuisines", candidate.cuisines().map(Value::from)),
        ("rating", candidate.rating_value()),
        ("approx_cost", candidate.approx_cost().map(Value::from)),
        ("location", candidate.location().map(Value::from)),
    ];

    for (key, value) in defaults {
        if let Some(value) = value {
            attributes.entry(key).or_insert(value);
        }
    }
    attributes
}

fn fallback_recommendation(rank: usize, candidate: &Candidate) -> Recommendation {
    Recommendation {
        rank,
        restaurant_name: candidate.name().to_string(),
        explanation: template_explanation(candidate),
        attributes: default_attributes(candidate, Map::new()),
    }
}

/// Append template recommendations from `candidates`, in order, skipping
/// names already consumed, until `desired` entries exist.
fn fill_from_candidates(
    out: &mut Vec<Recommendation>,
    consumed: &mut HashSet<String>,
    candidates: &[Candidate],
    desired: usize,
) {
    for candidate in candidates {
        if out.len() >= desired {
            break;
        }
        if !consumed.insert(candidate.normalized_name()) {
            continue;
        }
        out.push(fallback_recommendation(out.len() + 1, candidate));
    }
}

fn accept_ranked(
    out: &mut Vec<Recommendation>,
    consumed: &mut HashSet<String>,
    candidates: &[Candidate],
    parsed: ParsedCompletion,
    desired: usize,
) {
    // Built in reverse so the earliest candidate wins a name collision.
    let by_name: HashMap<String, &Candidate> = candidates
        .iter()
        .rev()
        .map(|candidate| (candidate.normalized_name(), candidate))
        .collect();

    let mut items = parsed.items;
    items.sort_by_key(|item| item.rank);

    for item in items {
        if out.len() >= desired {
            break;
        }

        let key = normalize_name(&item.restaurant_name);
        let Some(&candidate) = by_name.get(&key) else {
            debug!("Dropping unknown restaurant from completion: {:?}", item.restaurant_name);
            continue;
        };
        if !consumed.insert(key) {
            debug!("Dropping duplicate restaurant from completion: {:?}", item.restaurant_name);
            continue;
        }

        let explanation = item
            .explanation
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| template_explanation(candidate));

        out.push(Recommendation {
            rank: out.len() + 1,
            restaurant_name: candidate.name().to_string(),
            explanation,
            attributes: default_attributes(candidate, item.attributes.unwrap_or_default()),
        });
    }
}

/// Produce the final recommendation list for one request.
///
/// `desired` is clamped to `[1, candidates.len()]`; an empty candidate slice
/// yields an empty list.
pub fn reconcile(candidates: &[Candidate], outcome: RankingOutcome, desired: usize) -> Vec<Recommendation> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let desired = desired.clamp(1, candidates.len());

    let mut out = Vec::with_capacity(desired);
    let mut consumed = HashSet::with_capacity(desired);

    match outcome {
        RankingOutcome::Ranked(parsed) => {
            if !parsed.warnings.is_empty() {
                debug!("Completion parsed with warnings: {:?}", parsed.warnings);
            }
            accept_ranked(&mut out, &mut consumed, candidates, parsed, desired);
            if out.len() < desired {
                debug!(
                    "Model ranked {} of {} requested restaurants; filling from retrieval order",
                    out.len(),
                    desired
                );
            }
        }
        RankingOutcome::Failed(reason) => {
            warn!("Falling back to retrieval order: {}", reason);
        }
    }

    fill_from_candidates(&mut out, &mut consumed, candidates, desired);
    out
}
