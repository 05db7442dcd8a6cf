// src/table/header.rs

const BOM: char = '\u{FEFF}';

/// Canonical form of a header for loose matching: BOMs removed anywhere,
/// lowercased, whitespace and underscores dropped.
///
/// Hyphens and dots are kept, so `Csv-Url` does not match `csv_url`.
pub fn normalize(header: &str) -> String {
    header
        .chars()
        .filter(|&c| c != BOM)
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}

/// Strip one leading BOM and surrounding whitespace.
pub fn clean(header: &str) -> String {
    header.strip_prefix(BOM).unwrap_or(header).trim().to_string()
}
