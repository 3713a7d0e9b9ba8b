//! Alert notification channels.

pub mod log;
pub mod retry;
pub mod webhook;
