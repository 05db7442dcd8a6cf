// src/schema/strategy.rs

use regex::Regex;

use super::infer::{find_col, pick_value_col};

/// One way of locating a column. Strategies are tried in order and the
/// first `Some` wins.
pub trait ColumnStrategy {
    fn pick(&self, headers: &[String], rows: &[Vec<String>]) -> Option<usize>;
}

/// First header matching a regex.
#[derive(Debug, Clone)]
pub struct HeaderPattern(Regex);

impl HeaderPattern {
    pub fn new(re: Regex) -> Self {
        Self(re)
    }
}

impl ColumnStrategy for HeaderPattern {
    fn pick(&self, headers: &[String], _rows: &[Vec<String>]) -> Option<usize> {
        headers.iter().position(|h| self.0.is_match(h))
    }
}

/// First header containing any keyword, case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct Keywords(pub &'static [&'static str]);

impl ColumnStrategy for Keywords {
    fn pick(&self, headers: &[String], _rows: &[Vec<String>]) -> Option<usize> {
        find_col(headers, self.0)
    }
}

/// Densest numeric column, never the date column.
#[derive(Debug, Clone, Copy)]
pub struct Density {
    pub date_col: usize,
}

impl ColumnStrategy for Density {
    fn pick(&self, headers: &[String], rows: &[Vec<String>]) -> Option<usize> {
        pick_value_col(headers, rows, self.date_col)
    }
}

/// A column index fixed up front; `None` means "no opinion".
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub Option<usize>);

impl ColumnStrategy for Fixed {
    fn pick(&self, _headers: &[String], _rows: &[Vec<String>]) -> Option<usize> {
        self.0
    }
}

/// Run `strategies` in order; fall back to `default`.
pub fn pick_column(
    strategies: &[&dyn ColumnStrategy],
    headers: &[String],
    rows: &[Vec<String>],
    default: usize,
) -> usize {
    strategies
        .iter()
        .find_map(|s| s.pick(headers, rows))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_success_wins() {
        let headers = strings(&["Date", "Ticker", "Close", "Volume"]);
        let rows = vec![strings(&["2024-01-02", "X", "10", "1000"])];
        let vol = Keywords(&["volume"]);
        let close = Keywords(&["close"]);
        let chain: [&dyn ColumnStrategy; 2] = [&vol, &close];
        assert_eq!(pick_column(&chain, &headers, &rows, 1), 3);
    }

    #[test]
    fn falls_through_to_default() {
        let headers = strings(&["a", "b"]);
        let none = Keywords(&["rsi"]);
        let unset = Fixed(None);
        let chain: [&dyn ColumnStrategy; 2] = [&unset, &none];
        assert_eq!(pick_column(&chain, &headers, &[], 1), 1);
        assert_eq!(pick_column(&[], &headers, &[], 0), 0);
    }

    #[test]
    fn density_strategy_uses_rows() {
        let headers = strings(&["Date", "Name", "Price"]);
        let rows = vec![strings(&["2024-01-02", "Acme", "3.5"])];
        let chain: [&dyn ColumnStrategy; 2] = [&Keywords(&["rsi"]), &Density { date_col: 0 }];
        assert_eq!(pick_column(&chain, &headers, &rows, 1), 2);
    }

    #[test]
    fn pattern_strategy() {
        let p = HeaderPattern::new(Regex::new("(?i)^adj").unwrap());
        assert_eq!(p.pick(&strings(&["Close", "Adj Close"]), &[]), Some(1));
    }
}
