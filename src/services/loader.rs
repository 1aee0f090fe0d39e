//! Dataset ingestion: raw rows from a local JSON dump or the Hugging Face
//! datasets-server, cleaned into `RestaurantRecord`s.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::models::RestaurantRecord;

const DATASETS_SERVER_ROWS_URL: &str = "https://datasets-server.huggingface.co/rows";
/// The rows endpoint refuses pages longer than this.
const MAX_PAGE_SIZE: usize = 100;
const MAX_MOJIBAKE_PASSES: usize = 10;
const FETCH_RETRIES: u32 = 3;
const FETCH_BASE_DELAY_MS: u64 = 500;

type Row = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct RowsPage {
    #[serde(default)]
    rows: Vec<RowEntry>,
    #[serde(default)]
    num_rows_total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: Row,
}

/// Undo UTF-8 text that was decoded as Latin-1, e.g. `SantÃ©` back to `Santé`.
///
/// Repeats for text corrupted more than once, stopping as soon as a pass
/// fails or stops shrinking the string.
pub fn fix_mojibake(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_MOJIBAKE_PASSES {
        let Some(bytes) = current
            .chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect::<Option<Vec<u8>>>()
        else {
            break;
        };
        let Ok(fixed) = String::from_utf8(bytes) else {
            break;
        };
        if fixed == current || fixed.chars().count() >= current.chars().count() {
            break;
        }
        current = fixed;
    }
    current
}

fn safe_str(value: Option<&Value>) -> Option<String> {
    let raw = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!raw.is_empty()).then(|| fix_mojibake(&raw))
}

fn safe_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let digits = s.replace(',', "");
            let digits = digits.trim();
            if digits.is_empty() {
                None
            } else {
                digits.parse().ok()
            }
        }
        _ => None,
    }
}

/// Map one raw dataset row onto the canonical record.
pub fn row_to_record(row: &Row) -> RestaurantRecord {
    let field = |key: &str| safe_str(row.get(key));
    RestaurantRecord {
        name: field("name").unwrap_or_else(|| "Unknown".to_string()),
        address: field("address"),
        location: field("location"),
        listed_in_city: field("listed_in(city)"),
        cuisines: field("cuisines"),
        approx_cost: field("approx_cost(for two people)"),
        rate: field("rate"),
        votes: safe_int(row.get("votes")),
        rest_type: field("rest_type"),
        dish_liked: field("dish_liked"),
        online_order: field("online_order"),
        book_table: field("book_table"),
        url: field("url"),
        phone: field("phone"),
    }
}

/// Rows from a JSON document: a bare array of rows, or a datasets-server page.
fn rows_from_json(document: Value) -> Result<Vec<Row>> {
    match document {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect()),
        page @ Value::Object(_) => {
            let page: RowsPage =
                serde_json::from_value(page).context("JSON object is not a rows page")?;
            Ok(page.rows.into_iter().map(|entry| entry.row).collect())
        }
        _ => anyhow::bail!("expected a JSON array of rows or a rows page"),
    }
}

/// Parse a JSON dump already in memory.
pub fn records_from_str(contents: &str) -> Result<Vec<RestaurantRecord>> {
    let document: Value = serde_json::from_str(contents).context("dataset is not valid JSON")?;
    Ok(rows_from_json(document)?.iter().map(row_to_record).collect())
}

/// Load records from a local JSON file.
pub async fn load_from_file(path: &Path) -> Result<Vec<RestaurantRecord>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read dataset file {}", path.display()))?;
    let records = records_from_str(&contents)
        .with_context(|| format!("failed to parse dataset file {}", path.display()))?;
    info!("Loaded {} restaurants from {}", records.len(), path.display());
    Ok(records)
}

async fn fetch_page(
    client: &Client,
    dataset_id: &str,
    split: &str,
    offset: usize,
    length: usize,
) -> Result<RowsPage> {
    let offset = offset.to_string();
    let length = length.to_string();
    let response = client
        .get(DATASETS_SERVER_ROWS_URL)
        .query(&[
            ("dataset", dataset_id),
            ("config", "default"),
            ("split", split),
            ("offset", offset.as_str()),
            ("length", length.as_str()),
        ])
        .send()
        .await
        .context("datasets-server request failed")?
        .error_for_status()
        .context("datasets-server returned an error status")?;

    response
        .json::<RowsPage>()
        .await
        .context("datasets-server returned an unexpected body")
}

async fn fetch_page_with_retry(
    client: &Client,
    dataset_id: &str,
    split: &str,
    offset: usize,
    length: usize,
) -> Result<RowsPage> {
    let mut attempt = 0;
    loop {
        match fetch_page(client, dataset_id, split, offset, length).await {
            Ok(page) => return Ok(page),
            Err(e) => {
                attempt += 1;
                if attempt >= FETCH_RETRIES {
                    return Err(e.context(format!(
                        "page at offset {} failed after {} attempts",
                        offset, FETCH_RETRIES
                    )));
                }
                let delay = FETCH_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                error!("Attempt {} failed, retrying in {}ms: {:#}", attempt, delay, e);
                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// Page through the datasets-server rows endpoint.
pub async fn fetch_from_hub(
    client: &Client,
    dataset_id: &str,
    split: &str,
    page_size: usize,
    max_rows: Option<usize>,
) -> Result<Vec<RestaurantRecord>> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut records: Vec<RestaurantRecord> = Vec::new();
    let mut total = max_rows;

    loop {
        let offset = records.len();
        let remaining = total.map_or(page_size, |t| t.saturating_sub(offset));
        if remaining == 0 {
            break;
        }

        let page = fetch_page_with_retry(client, dataset_id, split, offset, remaining.min(page_size)).await?;
        if page.rows.is_empty() {
            break;
        }
        if let Some(reported) = page.num_rows_total {
            total = Some(total.map_or(reported, |cap| cap.min(reported)));
        }
        records.extend(page.rows.iter().map(|entry| row_to_record(&entry.row)));

        debug!("Fetched {} rows from {}", records.len(), dataset_id);
    }

    info!("Loaded {} restaurants from {} ({})", records.len(), dataset_id, split);
    Ok(records)
}

/// Load the configured dataset: the local file when set, otherwise the hub.
pub async fn load_dataset(config: &Config) -> Result<Vec<RestaurantRecord>> {
    let records = match config.dataset_path.as_deref() {
        Some(path) => load_from_file(Path::new(path)).await?,
        None => {
            let client = Client::new();
            fetch_from_hub(
                &client,
                &config.dataset_id,
                &config.dataset_split,
                config.dataset_page_size,
                config.dataset_max_rows,
            )
            .await?
        }
    };

    if records.is_empty() {
        warn!("Dataset loaded with no records");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_fix_mojibake() {
        assert_eq!(fix_mojibake("SantÃ©"), "Santé");
        // Corrupted twice.
        assert_eq!(fix_mojibake("Sant\u{c3}\u{83}\u{c2}\u{a9}"), "Santé");
        assert_eq!(fix_mojibake("Café"), "Café");
        assert_eq!(fix_mojibake("plain"), "plain");
        assert_eq!(fix_mojibake("Ünïcödé ✓"), "Ünïcödé ✓");
    }

    #[test]
    fn test_row_to_record_maps_dataset_keys() {
        let record = row_to_record(&row(json!({
            "name": "  Jalsa ",
            "location": "Banashankari",
            "listed_in(city)": "Banashankari",
            "cuisines": "North Indian, Mughlai, Chinese",
            "approx_cost(for two people)": "800",
            "rate": "4.1/5",
            "votes": "1,775",
            "online_order": "Yes",
            "phone": "",
            "dish_liked": null
        })));

        assert_eq!(record.name, "Jalsa");
        assert_eq!(record.listed_in_city.as_deref(), Some("Banashankari"));
        assert_eq!(record.approx_cost.as_deref(), Some("800"));
        assert_eq!(record.votes, Some(1775));
        assert_eq!(record.phone, None);
        assert_eq!(record.dish_liked, None);
        assert_eq!(record.rating_numeric(), Some(4.1));
    }

    #[test]
    fn test_row_defaults() {
        let record = row_to_record(&row(json!({"votes": 12, "rate": "NEW"})));
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.votes, Some(12));
        assert_eq!(record.rating_numeric(), None);

        let record = row_to_record(&row(json!({"name": "X", "votes": "n/a"})));
        assert_eq!(record.votes, None);
    }

    #[test]
    fn test_records_from_array_and_rows_page() {
        let array = json!([{"name": "A"}, "skip me", {"name": "B"}]).to_string();
        let names: Vec<_> = records_from_str(&array).unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A", "B"]);

        let page = json!({
            "rows": [
                {"row_idx": 0, "row": {"name": "Onesta"}, "truncated_cells": []},
                {"row_idx": 1, "row": {"name": "Truffles"}, "truncated_cells": []}
            ],
            "num_rows_total": 2
        })
        .to_string();
        let names: Vec<_> = records_from_str(&page).unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Onesta", "Truffles"]);

        assert!(records_from_str("42").is_err());
        assert!(records_from_str("{oops").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("restaurants-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, json!([{"name": "Meghana Foods"}]).to_string())
            .await
            .unwrap();

        let records = load_from_file(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Meghana Foods");

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(load_from_file(&path).await.is_err());
    }
}
