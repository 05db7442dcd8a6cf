pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod projection;
pub mod registry;
pub mod schema;
pub mod table;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use aggregate::{AggregationResult, Aggregator, SeriesData, SeriesDescriptor, SeriesFailure};
pub use config::Config;
pub use error::HubError;
pub use registry::{Filters, IndexEntry};
pub use table::{csv_to_table, Table};
