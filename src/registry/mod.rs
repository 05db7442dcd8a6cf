// src/registry/mod.rs

pub mod filters;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HubError;
use crate::table::Table;

pub use filters::Filters;

/// Columns every registry must carry, matched loosely (see
/// [`Table::column_index`]).
pub const REQUIRED_COLUMNS: [&str; 4] = ["type", "key", "title", "csv_url"];

/// One registry row pointing at a series CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub key: String,
    pub title: String,
    pub url: String,
}

/// Positions of the required columns in a registry header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryColumns {
    pub kind: usize,
    pub key: usize,
    pub title: usize,
    pub url: usize,
}

impl RegistryColumns {
    pub fn resolve(table: &Table) -> Result<Self, HubError> {
        let headers = &table.headers;
        let found: Vec<Option<usize>> = REQUIRED_COLUMNS
            .iter()
            .map(|n| table.column_index(n))
            .collect();

        match found[..] {
            [Some(kind), Some(key), Some(title), Some(url)] => Ok(Self {
                kind,
                key,
                title,
                url,
            }),
            _ => {
                let missing: Vec<String> = REQUIRED_COLUMNS
                    .iter()
                    .zip(&found)
                    .filter(|(_, pos)| pos.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect();
                warn!(?missing, received = ?headers, "registry is missing required headers");
                Err(HubError::MissingHeaders {
                    missing,
                    received: headers.to_vec(),
                })
            }
        }
    }
}

/// Read every usable entry from a parsed registry, in row order.
///
/// Rows whose `type`, `key` or url is blank after trimming are skipped
/// silently; a blank title is fine.
pub fn entries(table: &Table) -> Result<Vec<IndexEntry>, HubError> {
    let cols = RegistryColumns::resolve(table)?;

    let mut out = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let field = |col: usize| table.cell(row, col).trim().to_string();
        let entry = IndexEntry {
            kind: field(cols.kind),
            key: field(cols.key),
            title: field(cols.title),
            url: field(cols.url),
        };
        if entry.kind.is_empty() || entry.key.is_empty() || entry.url.is_empty() {
            debug!(row, "skipping incomplete registry row");
            continue;
        }
        out.push(entry);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::csv_to_table;

    #[test]
    fn resolves_loose_headers() -> Result<(), HubError> {
        let t = csv_to_table("\u{FEFF}Type, KEY ,Title,CSV URL\n");
        let cols = RegistryColumns::resolve(&t)?;
        assert_eq!(
            cols,
            RegistryColumns {
                kind: 0,
                key: 1,
                title: 2,
                url: 3
            }
        );
        Ok(())
    }

    #[test]
    fn reports_missing_headers_with_what_was_received() {
        let t = csv_to_table("type,key,name,csv-url\n");
        let err = RegistryColumns::resolve(&t).unwrap_err();
        match &err {
            HubError::MissingHeaders { missing, received } => {
                assert_eq!(missing, &vec!["title".to_string(), "csv_url".to_string()]);
                assert_eq!(received, &t.headers);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("type,key,title,csv_url"));
    }

    #[test]
    fn entries_skip_incomplete_rows() -> Result<(), HubError> {
        let text = "type,key,title,csv_url\n\
                    metric,CPI, Consumer prices ,https://x/cpi.csv\n\
                    metric,,No key,https://x/none.csv\n\
                    equity,005930,,https://x/ss.csv\n\
                    equity,AAPL,Apple,   \n\
                    ,BAD,No type,https://x/bad.csv\n\
                    equity,PLTR\n";
        let got = entries(&csv_to_table(text))?;
        let keys: Vec<&str> = got.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["CPI", "005930"]);
        assert_eq!(got[0].title, "Consumer prices");
        assert_eq!(got[1].title, "");
        Ok(())
    }

    #[test]
    fn columns_may_be_in_any_order() -> Result<(), HubError> {
        let text = "csv_url,title,key,type\nhttps://x/a.csv,A,a,metric\n";
        let got = entries(&csv_to_table(text))?;
        assert_eq!(
            got,
            vec![IndexEntry {
                kind: "metric".into(),
                key: "a".into(),
                title: "A".into(),
                url: "https://x/a.csv".into(),
            }]
        );
        Ok(())
    }
}
