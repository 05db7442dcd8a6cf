// src/table/mod.rs

pub mod header;
pub mod parser;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

pub use header::normalize;
pub use parser::parse_csv;

/// A header row plus data rows, as read from a CSV export.
///
/// Rows are positional and may be shorter or longer than `headers`; nothing
/// is padded or truncated. Duplicate header names are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV text: first row becomes the (BOM-stripped, trimmed) headers,
    /// the rest are data rows minus any row that is blank in every field.
    pub fn from_csv(text: &str) -> Self {
        let mut parsed = parse_csv(text).into_iter();
        let headers = match parsed.next() {
            Some(first) => first.iter().map(|h| header::clean(h)).collect(),
            None => return Self::default(),
        };
        let rows = parsed
            .filter(|r| r.iter().any(|f| !f.trim().is_empty()))
            .collect();
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Cell at (`row`, `col`); missing rows or cells past a short row read as "".
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Index of the first header whose normalized form equals `name`'s.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize(name);
        self.headers.iter().position(|h| normalize(h) == wanted)
    }

    /// Keep only the last `n` data rows.
    pub fn keep_last(&mut self, n: usize) {
        if self.rows.len() > n {
            self.rows.drain(..self.rows.len() - n);
        }
    }

    /// Serialize back to CSV, quoting only the fields that need it.
    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = WriterBuilder::new().flexible(true).from_writer(Vec::new());
        wtr.write_record(&self.headers)
            .context("writing header record")?;
        for (idx, row) in self.rows.iter().enumerate() {
            wtr.write_record(row)
                .with_context(|| format!("writing record {}", idx))?;
        }
        let bytes = wtr.into_inner().context("flushing CSV writer")?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }
}

/// Shorthand for [`Table::from_csv`].
pub fn csv_to_table(text: &str) -> Table {
    Table::from_csv(text)
}
