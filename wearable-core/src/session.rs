//! One streaming session: a bounded, paced batch of heart-rate samples.
//!
//! Lifecycle is strictly linear. A session is `Running` until it has emitted
//! [`BATCH_SIZE`] samples (`Ok`, completed) or hits a fatal error (`Err`,
//! failed). Within a session, classification, dispatch, emission and pacing
//! never overlap, and sample indices are emitted in order without gaps.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::alert::{
    AlertCooldown, AlertDispatcher, AlertMessage, DEFAULT_ALERT_TEXT, NotificationDeliveryError,
};
use crate::reading::{ReadingSource, is_anomalous};

/// Samples emitted by every successful session.
pub const BATCH_SIZE: u32 = 100;

/// Pause between consecutive samples.
pub const PACING_INTERVAL: Duration = Duration::from_millis(300);

/// One heart-rate reading and its position in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Beats per minute, within `[30, 160)`.
    pub value: u32,
    /// Zero-based position within the session.
    pub sequence_index: u32,
}

impl Sample {
    /// Build a sample.
    #[must_use]
    pub const fn new(value: u32, sequence_index: u32) -> Self {
        Self {
            value,
            sequence_index,
        }
    }
}

/// Which reading ends up in the emitted sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingMode {
    /// Classify one draw, emit a second independent draw.
    #[default]
    Independent,
    /// Emit the same reading that was classified.
    Shared,
}

/// The consumer of a sample stream has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sample receiver closed")]
pub struct SinkClosed;

/// Downstream half of a session's output channel.
#[async_trait]
pub trait SampleSink: Send {
    /// Deliver one sample, failing if the receiver is gone.
    async fn emit(&mut self, sample: Sample) -> Result<(), SinkClosed>;

    /// Resolves once the receiver has been dropped.
    async fn closed(&self);
}

#[async_trait]
impl SampleSink for mpsc::Sender<Sample> {
    async fn emit(&mut self, sample: Sample) -> Result<(), SinkClosed> {
        self.send(sample).await.map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        mpsc::Sender::closed(self).await;
    }
}

/// Why a session terminated early.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Alert delivery failed; the stream is aborted at this index.
    #[error("notify: {source}")]
    Notification {
        /// Index of the sample whose reading triggered the alert.
        sequence_index: u32,
        /// Underlying delivery failure.
        #[source]
        source: NotificationDeliveryError,
    },
    /// The receiver disconnected before the batch completed.
    #[error("sample stream closed after {emitted} samples")]
    StreamClosed {
        /// Samples delivered before the receiver went away.
        emitted: u32,
    },
}

/// Counters for a session that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Samples delivered to the sink.
    pub emitted: u32,
    /// Alerts handed to the dispatcher.
    pub alerts_dispatched: u32,
    /// Alerts withheld by the cooldown.
    pub alerts_suppressed: u32,
}

/// Drives one streaming call from first sample to stream close.
pub struct TelemetrySession {
    source: Box<dyn ReadingSource>,
    dispatcher: Arc<dyn AlertDispatcher>,
    target_id: String,
    alert_text: String,
    mode: ReadingMode,
    cooldown: Option<AlertCooldown>,
    summary: SessionSummary,
}

impl TelemetrySession {
    /// New session alerting `target_id` through `dispatcher`.
    pub fn new(
        source: impl ReadingSource + 'static,
        dispatcher: Arc<dyn AlertDispatcher>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            source: Box::new(source),
            dispatcher,
            target_id: target_id.into(),
            alert_text: DEFAULT_ALERT_TEXT.to_string(),
            mode: ReadingMode::default(),
            cooldown: None,
            summary: SessionSummary::default(),
        }
    }

    /// Override the alert body.
    #[must_use]
    pub fn with_alert_text(mut self, text: impl Into<String>) -> Self {
        self.alert_text = text.into();
        self
    }

    /// Choose which reading is emitted.
    #[must_use]
    pub const fn with_reading_mode(mut self, mode: ReadingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Limit alerts to one per `interval`.
    #[must_use]
    pub const fn with_cooldown(mut self, interval: Duration) -> Self {
        self.cooldown = Some(AlertCooldown::new(interval));
        self
    }

    /// Run the full batch into `sink`.
    ///
    /// # Errors
    /// Returns [`SessionError::Notification`] as soon as an alert cannot be
    /// delivered, and [`SessionError::StreamClosed`] if the receiver goes away.
    /// No sample is emitted after either.
    pub async fn run<S: SampleSink>(mut self, mut sink: S) -> Result<SessionSummary, SessionError> {
        debug!(target_id = %self.target_id, mode = ?self.mode, "telemetry session started");

        let result = self.drive(&mut sink).await;
        match &result {
            Ok(summary) => info!(
                emitted = summary.emitted,
                alerts = summary.alerts_dispatched,
                suppressed = summary.alerts_suppressed,
                "telemetry session completed"
            ),
            Err(SessionError::StreamClosed { emitted }) => {
                info!(emitted, "telemetry session ended by receiver");
            }
            Err(err) => error!(error = %err, "telemetry session failed"),
        }
        result
    }

    async fn drive<S: SampleSink>(&mut self, sink: &mut S) -> Result<SessionSummary, SessionError> {
        for sequence_index in 0..BATCH_SIZE {
            let heart_rate = self.source.next_reading();

            if is_anomalous(heart_rate) {
                self.raise_alert(sequence_index, heart_rate).await?;
            }

            let value = match self.mode {
                ReadingMode::Independent => self.source.next_reading(),
                ReadingMode::Shared => heart_rate,
            };

            sink.emit(Sample::new(value, sequence_index))
                .await
                .map_err(|SinkClosed| SessionError::StreamClosed {
                    emitted: self.summary.emitted,
                })?;
            self.summary.emitted += 1;
            debug!(sequence_index, value, "sample emitted");

            if sequence_index + 1 < BATCH_SIZE {
                tokio::select! {
                    () = tokio::time::sleep(PACING_INTERVAL) => {}
                    () = sink.closed() => {
                        return Err(SessionError::StreamClosed {
                            emitted: self.summary.emitted,
                        });
                    }
                }
            }
        }

        Ok(self.summary)
    }

    async fn raise_alert(&mut self, sequence_index: u32, heart_rate: u32) -> Result<(), SessionError> {
        if let Some(cooldown) = self.cooldown.as_mut()
            && !cooldown.try_acquire(Instant::now())
        {
            self.summary.alerts_suppressed += 1;
            debug!(sequence_index, heart_rate, "alert suppressed by cooldown");
            return Ok(());
        }

        warn!(
            sequence_index,
            heart_rate,
            target_id = %self.target_id,
            "anomalous heart rate, dispatching alert"
        );

        let alert = AlertMessage::new(self.target_id.clone(), self.alert_text.clone());
        self.dispatcher
            .dispatch(&alert)
            .await
            .map_err(|source| SessionError::Notification {
                sequence_index,
                source,
            })?;
        self.summary.alerts_dispatched += 1;
        Ok(())
    }
}

impl std::fmt::Debug for TelemetrySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySession")
            .field("target_id", &self.target_id)
            .field("mode", &self.mode)
            .field("cooldown", &self.cooldown)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}
