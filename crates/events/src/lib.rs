//! Outbound delivery for GreenDelivery telemetry.
//!
//! - [`delivery`]: alert notification channels implementing
//!   [`Notifier`](greendelivery_core::sink::Notifier) (chat webhook, log-only,
//!   and a retry wrapper).
//! - [`publish`]: queue publisher implementing
//!   [`ReadingPublisher`](greendelivery_core::sink::ReadingPublisher) for the
//!   forwarding ingest mode.

pub mod delivery;
pub mod publish;

pub use delivery::log::LogNotifier;
pub use delivery::retry::RetryNotifier;
pub use delivery::webhook::WebhookNotifier;
pub use publish::{PubSubConfig, PubSubPublisher};
