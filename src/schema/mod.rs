pub mod infer;
pub mod strategy;

pub use infer::{
    find_col, find_date_col, numeric_cols, parse_number, pick_value_col, DENSITY_SAMPLE_LIMIT,
    VALUE_KEYWORDS,
};
pub use strategy::{pick_column, ColumnStrategy, Density, Fixed, HeaderPattern, Keywords};
