//! Handler for the queue push subscription.
//!
//! The queue redelivers anything not answered with 2xx, so only failures that
//! a redelivery could fix (the reading store) produce a non-2xx status.
//! Malformed envelopes and invalid readings are acknowledged and dropped.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use greendelivery_core::envelope::decode_push;
use greendelivery_core::pipeline::IngestError;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// What happened to a pushed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushDisposition {
    Processed,
    /// The envelope or its payload could not be decoded.
    Undecodable,
    /// The reading failed validation.
    Rejected,
}

#[derive(Debug, Serialize)]
pub struct PushAck {
    pub ok: bool,
    pub disposition: PushDisposition,
    pub alert_reasons: Vec<String>,
}

impl PushAck {
    fn dropped(disposition: PushDisposition) -> Self {
        Self {
            ok: false,
            disposition,
            alert_reasons: Vec::new(),
        }
    }
}

/// POST /api/v1/queue/push
pub async fn receive_push(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<PushAck>> {
    let message = match decode_push(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(
                error = %e,
                bytes = body.len(),
                "Dropping undecodable push message"
            );
            return Ok(Json(PushAck::dropped(PushDisposition::Undecodable)));
        }
    };

    let message_id = message.message_id.as_deref().unwrap_or("");
    match state.pipeline.ingest(&message.reading).await {
        Ok(outcome) => {
            tracing::debug!(
                message_id,
                shipment_id = outcome.reading.shipment_id(),
                alerts = outcome.reasons.len(),
                "Push message processed"
            );
            Ok(Json(PushAck {
                ok: true,
                disposition: PushDisposition::Processed,
                alert_reasons: outcome.reason_messages(),
            }))
        }
        Err(IngestError::Rejected(e)) => {
            tracing::warn!(
                message_id,
                field = e.field(),
                error = %e,
                "Dropping invalid reading from queue"
            );
            Ok(Json(PushAck::dropped(PushDisposition::Rejected)))
        }
        // Not acknowledged: the queue will redeliver.
        Err(e @ IngestError::Store(_)) => Err(AppError::Ingest(e)),
    }
}
