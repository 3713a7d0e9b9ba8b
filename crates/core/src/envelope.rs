//! Queue push envelopes.
//!
//! The queue delivers each message as an HTTP POST whose JSON body wraps the
//! base64-encoded reading:
//!
//! ```json
//! {
//!   "message": { "data": "eyJzaGlw...", "messageId": "123", "attributes": {} },
//!   "subscription": "projects/p/subscriptions/s"
//! }
//! ```

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::reading::{RawReading, Reading};

/// A malformed transport envelope. Acknowledged without retry so a poison
/// message cannot loop forever.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("envelope is not valid JSON: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("message data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("message data is not a JSON reading: {0}")]
    Payload(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushMessage {
    /// Base64-encoded JSON reading.
    pub data: String,
    /// Push deliveries carry both `messageId` and `message_id`; only the
    /// camel-case key is read so the duplicate does not clash.
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// A reading extracted from a push envelope.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub message_id: Option<String>,
    pub subscription: Option<String>,
    pub reading: RawReading,
}

/// Decode a raw push request body into the reading it carries.
pub fn decode_push(body: &[u8]) -> Result<DecodedMessage, DecodeError> {
    let envelope: PushEnvelope = serde_json::from_slice(body).map_err(DecodeError::Envelope)?;
    let data = BASE64.decode(envelope.message.data.trim())?;
    let reading: RawReading = serde_json::from_slice(&data).map_err(DecodeError::Payload)?;
    Ok(DecodedMessage {
        message_id: envelope.message.message_id,
        subscription: envelope.subscription,
        reading,
    })
}

/// Encode a validated reading as queue message data (base64 JSON).
pub fn encode_data(reading: &Reading) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(reading)?;
    Ok(BASE64.encode(json))
}
