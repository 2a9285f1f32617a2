//! Simulated wearable heart-rate telemetry.
//!
//! A [`TelemetrySession`] produces a fixed batch of [`Sample`]s, raises an
//! [`AlertMessage`] through an [`AlertDispatcher`] whenever a reading leaves the
//! safe physiological range, and paces emission into a [`SampleSink`]. Nothing
//! here knows about gRPC; the transport lives in `wearable-cli`.

#![warn(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo
)]
#![deny(clippy::unwrap_in_result, clippy::panic_in_result_fn)]

pub mod alert;
pub mod reading;
pub mod session;

pub use alert::{
    AlertCooldown, AlertDispatcher, AlertMessage, DEFAULT_ALERT_TEXT, NotificationDeliveryError,
};
pub use reading::{
    ANOMALY_HIGH, ANOMALY_LOW, HEART_RATE_MAX, HEART_RATE_MIN, ReadingSource, RngReadingSource,
    is_anomalous,
};
pub use session::{
    BATCH_SIZE, PACING_INTERVAL, ReadingMode, Sample, SampleSink, SessionError, SessionSummary,
    SinkClosed, TelemetrySession,
};
