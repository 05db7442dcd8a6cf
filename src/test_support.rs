// src/test_support.rs

use once_cell::sync::OnceCell;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::time::sleep;
use warp::{http::StatusCode, Filter};

/// Serve `(name, body)` pairs at `GET /csv/<name>` on an ephemeral port and
/// return the base URL. `{base}` inside a body is replaced with that URL so
/// a registry fixture can point at its sibling series.
pub(crate) async fn serve_fixtures(fixtures: &[(&str, &str)]) -> String {
    let delayed: Vec<(&str, &str, u64)> = fixtures
        .iter()
        .map(|&(name, body)| (name, body, 0))
        .collect();
    serve_delayed_fixtures(&delayed).await
}

/// Like [`serve_fixtures`], but each `(name, body, delay_ms)` answers only
/// after its delay.
pub(crate) async fn serve_delayed_fixtures(fixtures: &[(&str, &str, u64)]) -> String {
    let bodies: Arc<HashMap<String, (String, u64)>> = Arc::new(
        fixtures
            .iter()
            .map(|&(name, body, delay_ms)| (name.to_string(), (body.to_string(), delay_ms)))
            .collect(),
    );
    let base: Arc<OnceCell<String>> = Arc::new(OnceCell::new());

    let route = {
        let base = Arc::clone(&base);
        warp::path!("csv" / String).then(move |name: String| {
            let bodies = Arc::clone(&bodies);
            let base = Arc::clone(&base);
            async move {
                match bodies.get(&name) {
                    Some((body, delay_ms)) => {
                        if *delay_ms > 0 {
                            sleep(Duration::from_millis(*delay_ms)).await;
                        }
                        let root = base.get().map(String::as_str).unwrap_or("");
                        warp::reply::with_status(body.replace("{base}", root), StatusCode::OK)
                    }
                    None => {
                        warp::reply::with_status("not found".to_string(), StatusCode::NOT_FOUND)
                    }
                }
            }
        })
    };

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let url = format!("http://{}", addr);
    let _ = base.set(url.clone());
    url
}
