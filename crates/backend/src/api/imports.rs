use axum::extract::{Path, State};
use axum::Json;
use plotmap_shared::models::{DatasetImport, ImportList};

use super::AppState;
use crate::error::{AppError, Result};

pub async fn list(State(state): State<AppState>) -> Result<Json<ImportList>> {
    let imports = state.storage.list_imports()?;
    Ok(Json(ImportList { imports }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(dataset_name): Path<String>,
) -> Result<Json<DatasetImport>> {
    let record = state
        .storage
        .get_import(&dataset_name)?
        .ok_or_else(|| AppError::NotFound("Dataset not found".to_string()))?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::Router;
    use chrono::{Duration, Utc};
    use plotmap_shared::models::{DatasetImport, ErrorBody, Geometry, ImportList};
    use plotmap_shared::sample::sample_plots;

    use crate::api::test_support::{get, read_json, send};
    use crate::api::{router, AppState};
    use crate::seed::import_record;
    use crate::storage::Storage;

    fn app_with_imports() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("imports.redb")).unwrap();
        let plots = sample_plots();
        let t0 = Utc::now();
        storage
            .record_import(&import_record("test_mbuyuni", std::path::Path::new("mbuyuni.geojson"), &plots, t0))
            .unwrap();
        storage
            .record_import(&DatasetImport {
                dataset_name: "ihombwe".into(),
                source_file: None,
                attribute_schema: Default::default(),
                feature_count: 0,
                imported_at: t0 + Duration::seconds(30),
                bbox: None,
            })
            .unwrap();
        let state = AppState {
            storage,
            dist_dir: dir.path().to_path_buf(),
        };
        (dir, router().with_state(state))
    }

    #[tokio::test]
    async fn test_list_imports_newest_first() {
        let (_dir, app) = app_with_imports();
        let resp = send(&app, get("/api/imports")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let list: ImportList = read_json(resp).await;
        let names: Vec<_> = list.imports.iter().map(|i| i.dataset_name.as_str()).collect();
        assert_eq!(names, ["ihombwe", "test_mbuyuni"]);
    }

    #[tokio::test]
    async fn test_get_import_by_name() {
        let (_dir, app) = app_with_imports();
        let resp = send(&app, get("/api/imports/test_mbuyuni")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let record: DatasetImport = read_json(resp).await;
        assert_eq!(record.feature_count, 5);
        assert_eq!(record.source_file.as_deref(), Some("mbuyuni.geojson"));
        assert!(matches!(record.bbox, Some(Geometry::Polygon { .. })));
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_404() {
        let (_dir, app) = app_with_imports();
        let resp = send(&app, get("/api/imports/nowhere")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let err: ErrorBody = read_json(resp).await;
        assert_eq!(err.detail, "Dataset not found");
    }
}
