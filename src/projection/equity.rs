// src/projection/equity.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::HashMap, str::FromStr};

use super::{project, Point, ProjectionOptions};
use crate::aggregate::SeriesData;
use crate::schema::{ColumnStrategy, Keywords};

const CLOSE: Keywords = Keywords(&["close", "price", "adj close", "value"]);
const VOLUME: Keywords = Keywords(&["volume", "거래"]);
const RSI: Keywords = Keywords(&["rsi", "rsi14"]);
const RSI_COMPANION: Keywords = Keywords(&["rsi", "rsi14", "value", "close"]);

static RSI_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_rsi$").expect("rsi suffix regex should parse"));

/// Which measure of an equity to chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EquityMode {
    #[default]
    Close,
    Volume,
    Rsi,
}

impl FromStr for EquityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "close" => Ok(EquityMode::Close),
            "volume" => Ok(EquityMode::Volume),
            "rsi" => Ok(EquityMode::Rsi),
            other => Err(anyhow::anyhow!("unknown equity mode {:?}", other)),
        }
    }
}

/// A labelled, chart-ready series.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityView {
    pub label: String,
    pub points: Vec<Point>,
}

/// Series that carry RSI for another key: `<key>_RSI` maps to `<key>`, and a
/// series whose title mentions RSI maps to its own key.
pub fn rsi_companions<'a, I>(items: I) -> HashMap<String, &'a SeriesData>
where
    I: IntoIterator<Item = &'a SeriesData>,
{
    let mut map = HashMap::new();
    for it in items {
        if RSI_SUFFIX.is_match(&it.key) || it.title.to_lowercase().contains("rsi") {
            map.insert(RSI_SUFFIX.replace(&it.key, "").into_owned(), it);
        }
    }
    map
}

fn column(series: &SeriesData, keywords: Keywords) -> Option<usize> {
    keywords.pick(&series.headers, &series.rows)
}

/// Chart `item` in `mode`. RSI comes from the series itself, then from a
/// companion, and otherwise falls back to the close view marked `(Close*)`.
pub fn equity_view(
    item: &SeriesData,
    mode: EquityMode,
    companions: &HashMap<String, &SeriesData>,
    opts: &ProjectionOptions,
) -> EquityView {
    let name = item.label();

    match mode {
        EquityMode::Volume => EquityView {
            label: format!("{} (Volume)", name),
            points: project(item, column(item, VOLUME), opts),
        },
        EquityMode::Rsi => {
            if let Some(col) = column(item, RSI) {
                return EquityView {
                    label: format!("{} (RSI)", name),
                    points: project(item, Some(col), opts),
                };
            }
            if let Some(alt) = companions.get(&item.key) {
                return EquityView {
                    label: format!("{} (RSI)", name),
                    points: project(alt, column(alt, RSI_COMPANION), opts),
                };
            }
            EquityView {
                label: format!("{} (Close*)", name),
                points: project(item, None, opts),
            }
        }
        EquityMode::Close => EquityView {
            label: name.to_string(),
            points: project(item, column(item, CLOSE), opts),
        },
    }
}
