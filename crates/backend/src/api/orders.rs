use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use plotmap_shared::models::{OrderData, OrderList, OrderStatus, OrderStatusUpdate, PlotOrder};
use serde::Deserialize;

use super::AppState;
use crate::error::{AppError, Result};
use crate::storage::OrderQuery;

const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
    plot_id: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl ListParams {
    fn into_query(self) -> Result<OrderQuery> {
        let defaults = OrderQuery::default();
        let status = match self.status.filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(
                OrderStatus::parse(&s)
                    .ok_or_else(|| AppError::Validation(format!("Invalid order status: {}", s)))?,
            ),
            None => None,
        };
        let limit = self.limit.unwrap_or(defaults.limit);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        Ok(OrderQuery {
            status,
            plot_id: self.plot_id.filter(|s| !s.trim().is_empty()),
            limit,
            offset: self.offset.unwrap_or(defaults.offset),
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    Path(plot_id): Path<String>,
    body: std::result::Result<Json<OrderData>, JsonRejection>,
) -> Result<Json<PlotOrder>> {
    let Json(data) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let data = data
        .validated()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let order = state.storage.create_order(&plot_id, data, Utc::now())?;
    Ok(Json(order))
}

pub async fn list(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<OrderList>> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let query = params.into_query()?;
    Ok(Json(state.storage.list_orders(&query)?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    body: std::result::Result<Json<OrderStatusUpdate>, JsonRejection>,
) -> Result<Json<PlotOrder>> {
    let Json(update) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let order = state.storage.update_order_status(&order_id, update, Utc::now())?;
    Ok(Json(order))
}
