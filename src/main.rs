use anyhow::Result;
use sheetshub::{http, telemetry::init_tracing, Config};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config + logging ─────────────────────────────────────────
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    if config.index_csv.is_none() {
        warn!("INDEX_CSV is not set; /api/series will answer with an error");
    }

    // ─── 2) routes ───────────────────────────────────────────────────
    let state = Arc::new(http::AppState::from_config(&config)?);
    let routes = http::routes(state);

    info!("Server starting on port {}", config.port);
    info!("Health check: http://localhost:{}/health", config.port);
    info!("Series endpoint: GET http://localhost:{}/api/series", config.port);

    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
