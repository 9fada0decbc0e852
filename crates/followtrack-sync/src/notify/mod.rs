//! Notification gateways the binaries can wire into the engine.
//!
//! [`LogNotifier`] only emits tracing events and is the development default.
//! [`WebhookNotifier`] posts one JSON document per detected change.

mod logger;
mod webhook;

pub use logger::LogNotifier;
pub use webhook::{ChangeEvent, WebhookNotifier};
