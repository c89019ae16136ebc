mod api;
mod config;
mod error;
mod seed;
mod storage;

use std::path::Path;

use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use api::AppState;
use config::Config;

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(state: AppState, config: &Config) -> Router {
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new()
        .nest(
            "/static",
            cached_static_router(&config.assets_dir, CACHE_1DAY),
        )
        .nest(
            "/dist",
            cached_static_router(&config.dist_dir, CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    api::router()
        .route("/", get(serve_index))
        .route("/plot/{id}", get(serve_index))
        .with_state(state)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {}", e));

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create database directory");
    }
    let storage = storage::Storage::open(&config.db_path).unwrap_or_else(|e| {
        panic!("Failed to open database at {}: {}", config.db_path.display(), e)
    });

    match seed::run(&storage, &config.seed) {
        Ok(inserted) if inserted > 0 => tracing::info!(inserted, "seeding complete"),
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "seeding failed"),
    }

    let state = AppState {
        storage,
        dist_dir: config.dist_dir.clone(),
    };
    let app = build_app(state, &config);

    let addr = config.server_address();
    tracing::info!("Plot registry listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", addr, e));
    axum::serve(listener, app).await.expect("Server error");
}

async fn serve_index(State(state): State<AppState>) -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match std::fs::read_to_string(state.dist_dir.join("index.html")) {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Land Plot Registry</title></head>
<body>
<h1>Land Plot Registry</h1>
<p>Frontend not built yet. The API is available under <a href="/api/plots">/api/plots</a>.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}
