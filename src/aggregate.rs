// src/aggregate.rs

use anyhow::{bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::{stream, StreamExt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::HubError;
use crate::fetch::Fetcher;
use crate::registry::{self, Filters, IndexEntry};
use crate::schema::{find_date_col, numeric_cols};
use crate::table::Table;

/// A series that loaded, with the columns picked for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesData {
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
    pub title: String,
    pub headers: Vec<String>,
    pub date_col: usize,
    pub value_cols: Vec<usize>,
    pub rows: Vec<Vec<String>>,
}

impl SeriesData {
    /// Title, or the key when the registry left it blank.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.key
        } else {
            &self.title
        }
    }
}

/// A series whose fetch or parse failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFailure {
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
    pub title: String,
    pub error: String,
}

/// Per-entry outcome; serialized without a tag so each variant keeps its
/// own flat JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesDescriptor {
    Loaded(SeriesData),
    Failed(SeriesFailure),
}

impl SeriesDescriptor {
    /// Pick the date and value columns of `table` for `entry`.
    pub fn from_table(entry: IndexEntry, table: Table) -> Self {
        let date_col = find_date_col(&table.headers);
        let value_cols = numeric_cols(&table.headers);
        SeriesDescriptor::Loaded(SeriesData {
            kind: entry.kind,
            key: entry.key,
            title: entry.title,
            headers: table.headers,
            date_col,
            value_cols,
            rows: table.rows,
        })
    }

    pub fn failed(entry: IndexEntry, error: impl Into<String>) -> Self {
        SeriesDescriptor::Failed(SeriesFailure {
            kind: entry.kind,
            key: entry.key,
            title: entry.title,
            error: error.into(),
        })
    }

    pub fn key(&self) -> &str {
        match self {
            SeriesDescriptor::Loaded(s) => &s.key,
            SeriesDescriptor::Failed(f) => &f.key,
        }
    }

    pub fn as_loaded(&self) -> Option<&SeriesData> {
        match self {
            SeriesDescriptor::Loaded(s) => Some(s),
            SeriesDescriptor::Failed(_) => None,
        }
    }
}

/// Everything one request produced, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    #[serde(serialize_with = "iso_millis", deserialize_with = "from_iso")]
    pub updated_at: DateTime<Utc>,
    pub items: Vec<SeriesDescriptor>,
}

impl AggregationResult {
    pub fn loaded(&self) -> impl Iterator<Item = &SeriesData> {
        self.items.iter().filter_map(SeriesDescriptor::as_loaded)
    }

    pub fn failures(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, SeriesDescriptor::Failed(_)))
            .count()
    }
}

fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn from_iso<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

/// Reject an HTML page served in place of CSV, such as the sign-in wall in
/// front of an unpublished sheet. An empty body is still CSV with no rows.
fn ensure_csv(text: &str) -> Result<()> {
    let head = text.trim_start_matches('\u{FEFF}').trim_start();
    let lower: String = head.chars().take(16).collect::<String>().to_lowercase();
    if lower.starts_with("<!doctype") || lower.starts_with("<html") {
        bail!("expected CSV but received HTML");
    }
    Ok(())
}

/// Loads a registry and every series it lists.
#[derive(Debug, Clone)]
pub struct Aggregator {
    fetcher: Fetcher,
    concurrency: usize,
}

impl Aggregator {
    pub fn new(fetcher: Fetcher, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch the registry at `registry_url`, then every selected series.
    ///
    /// Only a missing URL, an unreachable registry or a registry without the
    /// required headers fail the call; a bad series becomes a
    /// [`SeriesDescriptor::Failed`] in its slot.
    #[instrument(level = "info", skip(self, filters))]
    pub async fn aggregate(
        &self,
        registry_url: Option<&str>,
        filters: &Filters,
    ) -> Result<AggregationResult, HubError> {
        let start = Instant::now();
        let url = registry_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(HubError::MissingRegistryUrl)?;

        let text = self
            .fetcher
            .fetch_text(url)
            .await
            .map_err(|e| HubError::RegistryFetch(format!("{:#}", e)))?;
        let registry = Table::from_csv(&text);
        let selected: Vec<IndexEntry> = registry::entries(&registry)?
            .into_iter()
            .filter(|e| filters.matches(e))
            .collect();
        info!(entries = selected.len(), "registry loaded");

        // `buffered` yields in input order whatever order the fetches finish in.
        let items: Vec<SeriesDescriptor> = stream::iter(selected)
            .map(|entry| self.load_series(entry, filters.limit))
            .buffered(self.concurrency)
            .collect()
            .await;

        let result = AggregationResult {
            updated_at: Utc::now(),
            items,
        };
        info!(
            items = result.items.len(),
            failed = result.failures(),
            elapsed = ?start.elapsed(),
            "aggregation finished"
        );
        Ok(result)
    }

    async fn load_series(&self, entry: IndexEntry, limit: Option<usize>) -> SeriesDescriptor {
        match self.fetch_table(&entry.url).await {
            Ok(mut table) => {
                if table.is_empty() {
                    debug!(key = %entry.key, "series body has no rows");
                }
                if let Some(n) = limit {
                    table.keep_last(n);
                }
                SeriesDescriptor::from_table(entry, table)
            }
            Err(e) => {
                warn!(key = %entry.key, url = %entry.url, error = %e, "series failed");
                SeriesDescriptor::failed(entry, format!("{:#}", e))
            }
        }
    }

    async fn fetch_table(&self, url: &str) -> Result<Table> {
        let text = self.fetcher.fetch_text(url).await?;
        ensure_csv(&text)?;
        Ok(Table::from_csv(&text))
    }
}
