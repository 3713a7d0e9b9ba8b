//! GreenDelivery telemetry core.
//!
//! Pure domain logic for cold-chain shipment telemetry: reading validation,
//! threshold rule evaluation, the alert model, and the ingest pipeline that
//! drives the injected persistence sink and notification dispatcher.
//! Nothing in this crate talks to a database or the network directly.

pub mod alert;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod reading;
pub mod rules;
pub mod sink;
pub mod types;
