use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use plotmap_shared::geojson::{Feature, FeatureCollection};
use plotmap_shared::geometry::Bounds;
use plotmap_shared::models::PlotStatus;
use serde::Deserialize;

use super::AppState;
use crate::error::{AppError, Result};
use crate::storage::PlotQuery;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    district: Option<String>,
    ward: Option<String>,
    village: Option<String>,
    status: Option<String>,
    min_area: Option<f64>,
    max_area: Option<f64>,
    bbox: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SearchParams {
    fn into_query(self) -> Result<PlotQuery> {
        let status = match non_blank(self.status) {
            Some(s) => match s.parse::<PlotStatus>() {
                Ok(PlotStatus::Unknown) | Err(_) => {
                    return Err(AppError::Validation(format!("Invalid plot status: {}", s)))
                }
                Ok(status) => Some(status),
            },
            None => None,
        };
        for area in [self.min_area, self.max_area].into_iter().flatten() {
            if area < 0.0 {
                return Err(AppError::Validation("Area filters must be non-negative".to_string()));
            }
        }
        // A malformed box is ignored rather than failing the search
        let bbox = non_blank(self.bbox).and_then(|raw| {
            let parsed = Bounds::parse_bbox(&raw);
            if parsed.is_none() {
                tracing::warn!(bbox = %raw, "ignoring invalid bbox");
            }
            parsed
        });
        Ok(PlotQuery {
            district: non_blank(self.district),
            ward: non_blank(self.ward),
            village: non_blank(self.village),
            status,
            min_area: self.min_area,
            max_area: self.max_area,
            bbox,
        })
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<FeatureCollection>> {
    let plots = state.storage.list_plots()?;
    tracing::info!(count = plots.len(), "returning plot features");
    Ok(Json(FeatureCollection::from_plots(&plots)))
}

pub async fn search(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<FeatureCollection>> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let query = params.into_query()?;
    let plots = state.storage.search_plots(&query)?;
    Ok(Json(FeatureCollection::from_plots(&plots)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Feature>> {
    let plot = state
        .storage
        .get_plot(&id)?
        .ok_or_else(|| AppError::NotFound("Plot not found".to_string()))?;
    Ok(Json(Feature::from(&plot)))
}
