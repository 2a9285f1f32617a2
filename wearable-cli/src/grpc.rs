//! gRPC service implementation for the wearable telemetry stream.
//!
//! Each `BeatsPerMinute` call runs its own [`TelemetrySession`] on a spawned
//! task and forwards samples to the caller through a bounded channel. The only
//! state shared between calls is the alert dispatcher.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{Instrument, debug, info, info_span, warn};
use wearable_core::{
    AlertDispatcher, ReadingMode, ReadingSource, RngReadingSource, Sample, SampleSink,
    SessionError, SinkClosed, TelemetrySession,
};
use wearable_proto::wearable::wearable_service_server::{WearableService, WearableServiceServer};
use wearable_proto::{BeatsPerMinuteRequest, BeatsPerMinuteResponse};

use crate::config::WearableConfig;

/// Responses buffered per stream before the session waits on the client.
const STREAM_BUFFER: usize = 32;

/// Creates the reading source for each new session.
pub type ReadingSourceFactory = Arc<dyn Fn() -> Box<dyn ReadingSource> + Send + Sync>;

/// Per-session parameters shared by every call.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Recipient attached to every alert.
    pub target_id: String,
    /// Alert body.
    pub alert_text: String,
    /// Which draw is emitted.
    pub reading_mode: ReadingMode,
    /// Minimum spacing between alerts within one stream.
    pub alert_cooldown: Option<Duration>,
    /// Fixed seed for every session's generator; entropy when unset.
    pub seed: Option<u64>,
}

impl SessionSettings {
    /// Settings from the notifier and telemetry sections.
    #[must_use]
    pub fn from_config(config: &WearableConfig) -> Self {
        Self {
            target_id: config.notifier.target_id.clone(),
            alert_text: config.notifier.message.clone(),
            reading_mode: config.telemetry.reading_mode,
            alert_cooldown: config.telemetry.alert_cooldown(),
            seed: config.telemetry.seed,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&WearableConfig::default())
    }
}

/// Server side of `wearable.v1.WearableService`.
pub struct WearableGrpcService {
    dispatcher: Arc<dyn AlertDispatcher>,
    settings: SessionSettings,
    readings: ReadingSourceFactory,
}

impl WearableGrpcService {
    /// Service alerting through `dispatcher`, with a fresh RNG per call.
    pub fn new(dispatcher: Arc<dyn AlertDispatcher>, settings: SessionSettings) -> Self {
        let seed = settings.seed;
        let readings: ReadingSourceFactory = Arc::new(move || -> Box<dyn ReadingSource> {
            match seed {
                Some(seed) => Box::new(RngReadingSource::seeded(seed)),
                None => Box::new(RngReadingSource::from_entropy()),
            }
        });
        Self {
            dispatcher,
            settings,
            readings,
        }
    }

    /// Replace how each session obtains its readings.
    #[must_use]
    pub fn with_reading_source(mut self, readings: ReadingSourceFactory) -> Self {
        self.readings = readings;
        self
    }

    fn new_session(&self) -> TelemetrySession {
        let session = TelemetrySession::new(
            (self.readings)(),
            Arc::clone(&self.dispatcher),
            self.settings.target_id.clone(),
        )
        .with_alert_text(self.settings.alert_text.clone())
        .with_reading_mode(self.settings.reading_mode);

        match self.settings.alert_cooldown {
            Some(interval) => session.with_cooldown(interval),
            None => session,
        }
    }

    /// Wrap in the generated tonic server.
    #[must_use]
    pub fn into_server(self) -> WearableServiceServer<Self> {
        WearableServiceServer::new(self)
    }

    /// Serve on `addr` until the process exits.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind or crashes.
    pub async fn serve(self, addr: SocketAddr) -> Result<(), tonic::transport::Error> {
        info!(%addr, "wearable gRPC service listening");

        Server::builder()
            .add_service(self.into_server())
            .serve(addr)
            .await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns an error if the transport fails.
    pub async fn serve_with_shutdown<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), tonic::transport::Error>
    where
        F: Future<Output = ()> + Send,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "wearable gRPC service listening");
        }

        Server::builder()
            .add_service(self.into_server())
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await
    }
}

/// Forwards samples into the tonic response channel.
struct ResponseSink {
    tx: mpsc::Sender<Result<BeatsPerMinuteResponse, Status>>,
}

#[tonic::async_trait]
impl SampleSink for ResponseSink {
    async fn emit(&mut self, sample: Sample) -> Result<(), SinkClosed> {
        self.tx.send(Ok(sample.into())).await.map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await;
    }
}

#[tonic::async_trait]
impl WearableService for WearableGrpcService {
    type BeatsPerMinuteStream =
        Pin<Box<dyn Stream<Item = Result<BeatsPerMinuteResponse, Status>> + Send>>;

    /// Streams one batch of heart-rate readings.
    ///
    /// The request body is accepted but not consulted. A failed alert ends the
    /// stream with `INTERNAL`; a client that goes away ends the session quietly.
    async fn beats_per_minute(
        &self,
        request: Request<BeatsPerMinuteRequest>,
    ) -> Result<Response<Self::BeatsPerMinuteStream>, Status> {
        let peer = request.remote_addr();
        let device = request.into_inner().uuid;
        debug!(?peer, device = %device, "beats-per-minute stream opened");

        let session = self.new_session();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let span = info_span!("beats_per_minute", ?peer, device = %device);

        tokio::spawn(
            async move {
                let sink = ResponseSink { tx: tx.clone() };
                match session.run(sink).await {
                    Ok(_) => {}
                    Err(err @ SessionError::Notification { .. }) => {
                        // Receiver may already be gone; nothing else to do then
                        let _ = tx.send(Err(Status::internal(err.to_string()))).await;
                    }
                    Err(SessionError::StreamClosed { emitted }) => {
                        warn!(emitted, "client left before the stream completed");
                    }
                }
            }
            .instrument(span),
        );

        let stream = ReceiverStream::new(rx);
        Ok(Response::new(Box::pin(stream)))
    }
}
