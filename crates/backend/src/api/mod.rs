mod imports;
mod orders;
mod plots;
mod system;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub dist_dir: PathBuf,
}

/// REST routes of the plot registry.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/stats", get(system::stats))
        .route("/api/plots", get(plots::list))
        .route("/api/plots/search", get(plots::search))
        .route("/api/plots/{id}", get(plots::get_one))
        .route("/api/plots/{id}/order", post(orders::create))
        .route("/api/orders", get(orders::list))
        .route("/api/orders/{id}/status", put(orders::update_status))
        .route("/api/imports", get(imports::list))
        .route("/api/imports/{dataset_name}", get(imports::get_one))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, Response};
    use plotmap_shared::sample::sample_plots;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::*;

    /// Router over a fresh store holding the sample plots.
    pub fn app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("api.redb")).unwrap();
        storage.insert_plots(&sample_plots()).unwrap();
        let state = AppState {
            storage,
            dist_dir: dir.path().to_path_buf(),
        };
        (dir, router().with_state(state))
    }

    pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
        app.clone().oneshot(req).await.unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn read_json<T: DeserializeOwned>(resp: Response<Body>) -> T {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
