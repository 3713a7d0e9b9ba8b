//! Row models for the telemetry tables.

pub mod alert;
pub mod telemetry;
