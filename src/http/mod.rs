// src/http/mod.rs

use anyhow::Result;
use serde::Serialize;
use std::{collections::HashMap, convert::Infallible, sync::Arc};
use tracing::{error, info, warn};
use warp::{
    http::{
        header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE},
        StatusCode,
    },
    reply::Response,
    Filter, Rejection, Reply,
};

use crate::aggregate::Aggregator;
use crate::config::Config;
use crate::error::HubError;
use crate::fetch::Fetcher;
use crate::registry::Filters;

/// Shared, read-only service state.
pub struct AppState {
    pub registry_url: Option<String>,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let fetcher = Fetcher::from_config(cfg)?;
        Ok(Self {
            registry_url: cfg.index_csv.clone(),
            aggregator: Aggregator::new(fetcher, cfg.fetch_concurrency),
        })
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(rename = "receivedHeaders", skip_serializing_if = "Option::is_none")]
    received_headers: Option<Vec<String>>,
}

/// `GET /health` and `GET /api/series` (also served at the legacy
/// `/.netlify/functions/sheets-hub` path).
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let series = warp::path!("api" / "series")
        .or(warp::path!(".netlify" / "functions" / "sheets-hub"))
        .unify()
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state))
        .and_then(list_series);

    health.or(series)
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

async fn health_check() -> Result<Response, Infallible> {
    Ok(json_response(
        &serde_json::json!({
            "status": "healthy",
            "service": "sheetshub"
        }),
        StatusCode::OK,
    ))
}

async fn list_series(
    params: HashMap<String, String>,
    state: Arc<AppState>,
) -> Result<Response, Infallible> {
    let filters = Filters::from_query(&params);
    info!(?filters, "series request");

    match state
        .aggregator
        .aggregate(state.registry_url.as_deref(), &filters)
        .await
    {
        Ok(result) => Ok(json_response(&result, StatusCode::OK)),
        Err(e) => {
            warn!(error = %e, "aggregation failed");
            Ok(error_response(&e))
        }
    }
}

/// Status and body for a request-level failure.
pub fn error_response(err: &HubError) -> Response {
    let status = match err {
        HubError::MissingHeaders { .. } => StatusCode::BAD_REQUEST,
        HubError::MissingRegistryUrl | HubError::RegistryFetch(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let body = ErrorResponse {
        error: err.to_string(),
        received_headers: err.received_headers().map(<[String]>::to_vec),
    };
    json_response(&body, status)
}

/// Pretty JSON with permissive CORS.
fn json_response<T: Serialize>(body: &T, status: StatusCode) -> Response {
    let (text, status) = match serde_json::to_string_pretty(body) {
        Ok(text) => (text, status),
        Err(e) => {
            error!(error = %e, "serializing response");
            (
                r#"{"error":"failed to serialize response"}"#.to_string(),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    };

    let mut resp = Response::new(text.into());
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}
