// src/registry/filters.rs

use std::collections::{HashMap, HashSet};

use super::IndexEntry;

/// Caller-supplied selection over registry entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Lowercased but not trimmed; compared case-insensitively against the
    /// entry type. An empty parameter means no filter.
    pub type_filter: Option<String>,
    /// Exact key membership.
    pub keys: Option<HashSet<String>>,
    /// Keep only the last `limit` rows of each series.
    pub limit: Option<usize>,
}

impl Filters {
    pub fn new(type_param: Option<&str>, keys_param: Option<&str>, limit_param: Option<&str>) -> Self {
        let type_filter = type_param
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        let keys = keys_param.filter(|k| !k.is_empty()).map(|k| {
            k.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        });
        let limit = limit_param
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|&n| n > 0);
        Self {
            type_filter,
            keys,
            limit,
        }
    }

    /// From query-string parameters `type`, `keys` and `limit`.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        Self::new(
            params.get("type").map(String::as_str),
            params.get("keys").map(String::as_str),
            params.get("limit").map(String::as_str),
        )
    }

    pub fn matches(&self, entry: &IndexEntry) -> bool {
        if let Some(t) = &self.type_filter {
            if entry.kind.to_lowercase() != *t {
                return false;
            }
        }
        if let Some(keys) = &self.keys {
            if !keys.contains(&entry.key) {
                return false;
            }
        }
        true
    }
}
