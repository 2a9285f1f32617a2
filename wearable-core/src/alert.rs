//! Out-of-band alerts raised for anomalous readings.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

/// Text carried by every anomaly alert.
pub const DEFAULT_ALERT_TEXT: &str = "Something is going wrong!";

/// A single notification destined for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Recipient identifier understood by the notification service.
    pub target_id: String,
    /// Human-readable alert body.
    pub text: String,
}

impl AlertMessage {
    /// Build an alert for `target_id`.
    pub fn new(target_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            text: text.into(),
        }
    }
}

/// The notification call failed in transport or on the remote side.
#[derive(Debug, Error)]
#[error("deliver alert to {target_id}: {source}")]
pub struct NotificationDeliveryError {
    /// Recipient the alert was addressed to.
    pub target_id: String,
    source: Box<dyn StdError + Send + Sync>,
}

impl NotificationDeliveryError {
    /// Wrap the underlying cause of a failed delivery.
    pub fn new(target_id: impl Into<String>, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            target_id: target_id.into(),
            source: source.into(),
        }
    }
}

/// Delivers alerts to an external notification service.
///
/// Implementations are shared by every running session and must tolerate
/// concurrent calls. A dispatcher keeps no state between calls.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Perform one delivery and wait for it to complete.
    async fn dispatch(&self, alert: &AlertMessage) -> Result<(), NotificationDeliveryError>;
}

#[async_trait]
impl<D: AlertDispatcher + ?Sized> AlertDispatcher for Arc<D> {
    async fn dispatch(&self, alert: &AlertMessage) -> Result<(), NotificationDeliveryError> {
        (**self).dispatch(alert).await
    }
}

/// Minimum spacing between alerts within one session.
///
/// Off by default; without it every anomalous reading is dispatched.
#[derive(Debug, Clone)]
pub struct AlertCooldown {
    interval: Duration,
    last_sent: Option<Instant>,
}

impl AlertCooldown {
    /// Cooldown that admits at most one alert per `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
        }
    }

    /// Configured spacing.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true and starts a new window if an alert may be sent at `now`.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last_sent {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_sent = Some(now);
                true
            }
        }
    }
}
