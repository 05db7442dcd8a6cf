// src/error.rs

use thiserror::Error;

/// Failures that abort a whole aggregation request.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Missing INDEX_CSV env var.")]
    MissingRegistryUrl,

    #[error("failed to fetch registry: {0}")]
    RegistryFetch(String),

    #[error("INDEX CSV must have headers: type,key,title,csv_url (missing: {})", .missing.join(","))]
    MissingHeaders {
        missing: Vec<String>,
        received: Vec<String>,
    },
}

impl HubError {
    /// Headers the registry actually had, for schema mismatches.
    pub fn received_headers(&self) -> Option<&[String]> {
        match self {
            HubError::MissingHeaders { received, .. } => Some(received.as_slice()),
            _ => None,
        }
    }
}
