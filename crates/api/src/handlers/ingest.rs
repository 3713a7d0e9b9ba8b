//! Handlers for device-facing reading ingestion.
//!
//! In direct mode each reading runs through the [`IngestPipeline`]; in queue
//! mode it is validated, evaluated for the response, and published through the
//! [`Forwarder`] instead. Either way the caller sees the same response shape.
//!
//! [`IngestPipeline`]: greendelivery_core::pipeline::IngestPipeline
//! [`Forwarder`]: greendelivery_core::pipeline::Forwarder

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use futures::stream::{self, StreamExt};
use greendelivery_core::alert::AlertReason;
use greendelivery_core::pipeline::{IngestError, IngestOutcome};
use greendelivery_core::reading::RawReading;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Largest array accepted by the batch endpoint.
pub const MAX_BATCH_SIZE: usize = 500;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Response for a single accepted reading.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ok: bool,
    /// Human-readable reason per threshold the reading breached, in rule order.
    pub alert_reasons: Vec<String>,
    /// Queue message id, present in queue mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// One entry of the batch response, in input order.
#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub ok: bool,
    pub alert_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    /// Whether resending this reading could succeed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub accepted: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

fn messages(reasons: &[AlertReason]) -> Vec<String> {
    reasons.iter().map(|r| r.message.clone()).collect()
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            ok: true,
            alert_reasons: outcome.reason_messages(),
            message_id: None,
        }
    }
}

impl BatchItemResult {
    fn from_result(result: Result<IngestResponse, IngestError>) -> Self {
        match result {
            Ok(resp) => Self {
                ok: true,
                alert_reasons: resp.alert_reasons,
                error: None,
                code: None,
                retryable: false,
            },
            Err(IngestError::Rejected(e)) => Self {
                ok: false,
                alert_reasons: Vec::new(),
                error: Some(e.to_string()),
                code: Some("VALIDATION_ERROR"),
                retryable: false,
            },
            Err(IngestError::Store(e)) => Self {
                ok: false,
                alert_reasons: Vec::new(),
                error: Some(e.to_string()),
                code: Some("STORE_UNAVAILABLE"),
                retryable: true,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Run one reading through whichever path this instance is configured for.
async fn ingest_one(state: &AppState, raw: &RawReading) -> Result<IngestResponse, IngestError> {
    match &state.forwarder {
        Some(forwarder) => {
            let outcome = forwarder.forward(raw).await?;
            Ok(IngestResponse {
                ok: true,
                alert_reasons: messages(&outcome.reasons),
                message_id: Some(outcome.message_id),
            })
        }
        None => state.pipeline.ingest(raw).await.map(IngestResponse::from),
    }
}

/// POST /api/v1/ingest
///
/// 200 with the alert reasons, 400 when the reading is invalid, 503 when it
/// could not be stored (or published, in queue mode).
pub async fn ingest_reading(
    State(state): State<AppState>,
    payload: Result<Json<RawReading>, JsonRejection>,
) -> AppResult<Json<IngestResponse>> {
    let Json(raw) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = ingest_one(&state, &raw).await?;
    Ok(Json(response))
}

/// POST /api/v1/ingest/batch
///
/// Processes up to [`MAX_BATCH_SIZE`] readings concurrently and reports one
/// result per reading. Individual failures never fail the request.
pub async fn ingest_batch(
    State(state): State<AppState>,
    payload: Result<Json<Vec<RawReading>>, JsonRejection>,
) -> AppResult<Json<BatchResponse>> {
    let Json(raws) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if raws.len() > MAX_BATCH_SIZE {
        return Err(AppError::BadRequest(format!(
            "Batch of {} readings exceeds the limit of {MAX_BATCH_SIZE}",
            raws.len()
        )));
    }

    let concurrency = state.config.batch_concurrency;
    let results: Vec<BatchItemResult> = match &state.forwarder {
        Some(_) => {
            stream::iter(&raws)
                .map(|raw| ingest_one(&state, raw))
                .buffered(concurrency.max(1))
                .boxed()
                .map(BatchItemResult::from_result)
                .collect()
                .await
        }
        None => state
            .pipeline
            .ingest_batch(&raws, concurrency)
            .await
            .into_iter()
            .map(|r| BatchItemResult::from_result(r.map(IngestResponse::from)))
            .collect(),
    };

    let accepted = results.iter().filter(|r| r.ok).count();
    tracing::info!(total = results.len(), accepted, "Batch ingested");

    Ok(Json(BatchResponse {
        accepted,
        failed: results.len() - accepted,
        results,
    }))
}
