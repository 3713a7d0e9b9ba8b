//! Handlers for per-shipment history (Postgres deployments only).

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use greendelivery_db::models::alert::AlertRow;
use greendelivery_db::models::telemetry::TelemetryRow;
use greendelivery_db::repositories::{AlertRepo, TelemetryRepo};
use greendelivery_db::DbPool;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

impl HistoryParams {
    /// Resolve the requested page size from the raw query extraction.
    fn resolve(query: Result<Query<Self>, QueryRejection>) -> AppResult<i64> {
        let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
        params.limit()
    }

    fn limit(&self) -> AppResult<i64> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n),
            Some(n) => Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {n}"
            ))),
        }
    }
}

fn require_pool(state: &AppState) -> AppResult<&DbPool> {
    state.pool.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "Shipment history requires the postgres storage backend".to_string(),
        )
    })
}

/// GET /api/v1/shipments/{shipment_id}/readings
///
/// Most recent readings first.
pub async fn list_readings(
    State(state): State<AppState>,
    Path(shipment_id): Path<String>,
    query: Result<Query<HistoryParams>, QueryRejection>,
) -> AppResult<Json<DataResponse<Vec<TelemetryRow>>>> {
    let limit = HistoryParams::resolve(query)?;
    let pool = require_pool(&state)?;
    let rows = TelemetryRepo::list_for_shipment(pool, &shipment_id, limit).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/shipments/{shipment_id}/alerts
///
/// Most recent alerts first.
pub async fn list_alerts(
    State(state): State<AppState>,
    Path(shipment_id): Path<String>,
    query: Result<Query<HistoryParams>, QueryRejection>,
) -> AppResult<Json<DataResponse<Vec<AlertRow>>>> {
    let limit = HistoryParams::resolve(query)?;
    let pool = require_pool(&state)?;
    let rows = AlertRepo::list_for_shipment(pool, &shipment_id, limit).await?;
    Ok(Json(DataResponse { data: rows }))
}
