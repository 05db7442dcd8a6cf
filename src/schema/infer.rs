// src/schema/infer.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use super::strategy::{pick_column, ColumnStrategy, HeaderPattern};
use crate::table::normalize;

/// Header fragments that mark a column as a chartable value.
pub const VALUE_KEYWORDS: &[&str] = &[
    "value",
    "close",
    "adj close",
    "price",
    "volume",
    "rsi",
    "rsi14",
    "open",
    "high",
    "low",
];

/// Rows looked at per column when scoring numeric density.
pub const DENSITY_SAMPLE_LIMIT: usize = 400;

static DATE_HEADER: Lazy<HeaderPattern> = Lazy::new(|| {
    HeaderPattern::new(Regex::new(r"(?i)date|time").expect("date header regex should parse"))
});

static NON_VALUE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)date|time|realtime").expect("non-value regex should parse"));

/// Parse a cell as a number: drop thousands separators, require a finite result.
/// Blank cells are not numbers.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|&c| c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First header that mentions `date` or `time`, else column 0.
pub fn find_date_col(headers: &[String]) -> usize {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();
    let strategies: [&dyn ColumnStrategy; 1] = [&*DATE_HEADER];
    pick_column(&strategies, &normalized, &[], 0)
}

/// Every header containing one of [`VALUE_KEYWORDS`]; if none do, every
/// column but the first.
pub fn numeric_cols(headers: &[String]) -> Vec<usize> {
    let idxs: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            let lower = h.to_lowercase();
            VALUE_KEYWORDS.iter().any(|w| lower.contains(w))
        })
        .map(|(i, _)| i)
        .collect();

    if idxs.is_empty() {
        trace!(headers = headers.len(), "no value keywords, using all but column 0");
        (1..headers.len()).collect()
    } else {
        idxs
    }
}

/// First header containing any of `keywords` (case-insensitive).
pub fn find_col(headers: &[String], keywords: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let lower = h.to_lowercase();
        keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
    })
}

/// Column with the most parseable numbers in the first
/// [`DENSITY_SAMPLE_LIMIT`] rows, skipping `date_col` and date-like headers.
/// Ties go to the lower index. `None` when nothing parses.
pub fn pick_value_col(headers: &[String], rows: &[Vec<String>], date_col: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;

    for (idx, name) in headers.iter().enumerate() {
        if idx == date_col || NON_VALUE_HEADER.is_match(name) {
            continue;
        }

        let hits = rows
            .iter()
            .take(DENSITY_SAMPLE_LIMIT)
            .filter(|r| r.get(idx).and_then(|c| parse_number(c)).is_some())
            .count();
        trace!(column = %name, hits, "density score");

        if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
            best = Some((idx, hits));
        }
    }

    match best {
        Some((idx, hits)) => {
            debug!(column = idx, hits, "picked densest value column");
            Some(idx)
        }
        None => {
            debug!("no numeric column found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("-0.5e2"), Some(-50.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("  "), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("-Infinity"), None);
    }

    #[test]
    fn date_column() {
        assert_eq!(find_date_col(&strings(&["Open", "Date", "Close"])), 1);
        assert_eq!(find_date_col(&strings(&["Open", "Close"])), 0);
        assert_eq!(find_date_col(&strings(&["Symbol", "Time Stamp"])), 1);
        assert_eq!(find_date_col(&[]), 0);
    }

    #[test]
    fn value_columns_by_keyword() {
        assert_eq!(numeric_cols(&strings(&["Date", "Close", "Volume"])), vec![1, 2]);
        assert_eq!(
            numeric_cols(&strings(&["Date", "Open", "High", "Low", "Adj Close", "Ticker"])),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn value_columns_fallback() {
        assert_eq!(numeric_cols(&strings(&["Date", "Foo", "Bar"])), vec![1, 2]);
        assert!(numeric_cols(&strings(&["Date"])).is_empty());
        assert!(numeric_cols(&[]).is_empty());
    }

    #[test]
    fn keyword_lookup() {
        let h = strings(&["날짜", "종가", "거래량", "Volume"]);
        assert_eq!(find_col(&h, &["volume", "거래"]), Some(2));
        assert_eq!(find_col(&h, &["rsi"]), None);
    }

    #[test]
    fn density_prefers_numeric_column() {
        let headers = strings(&["Date", "Name", "Price"]);
        let rows = vec![
            strings(&["2024-01-02", "Acme", "1,200.50"]),
            strings(&["2024-01-03", "Acme", "1,210.00"]),
            strings(&["2024-01-04", "Acme", "1,190.25"]),
        ];
        assert_eq!(pick_value_col(&headers, &rows, 0), Some(2));
    }

    #[test]
    fn density_skips_time_headers_and_breaks_ties_low() {
        let headers = strings(&["Label", "RealTime", "A", "B"]);
        let rows = vec![
            strings(&["x", "1", "1", "1"]),
            strings(&["y", "2", "", "2"]),
            strings(&["z", "3", "3", ""]),
        ];
        assert_eq!(pick_value_col(&headers, &rows, 0), Some(2));
    }

    #[test]
    fn density_with_no_numbers() {
        let headers = strings(&["Date", "Name"]);
        let rows = vec![strings(&["2024-01-02", "Acme"])];
        assert_eq!(pick_value_col(&headers, &rows, 0), None);
        assert_eq!(pick_value_col(&headers, &[], 0), None);
    }

    #[test]
    fn density_only_samples_leading_rows() {
        let headers = strings(&["Date", "Early", "Late"]);
        let mut rows = Vec::new();
        for i in 0..DENSITY_SAMPLE_LIMIT {
            rows.push(vec![i.to_string(), "1".into(), "-".into()]);
        }
        for i in 0..DENSITY_SAMPLE_LIMIT * 2 {
            rows.push(vec![i.to_string(), "-".into(), "2".into()]);
        }
        assert_eq!(pick_value_col(&headers, &rows, 0), Some(1));
    }
}
