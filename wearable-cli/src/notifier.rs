//! Alert delivery through the push-sender gRPC service.

use std::time::Duration;

use tonic::{Request, Status};
use tonic::transport::{Channel, Endpoint};
use tracing::debug;
use wearable_core::{AlertDispatcher, AlertMessage, NotificationDeliveryError};
use wearable_proto::NotifyRequest;
use wearable_proto::push_sender::push_sender_client::PushSenderClient;

use crate::config::NotifierConfig;

/// Sends each alert as one unary `Notify` call.
///
/// The underlying channel is opened once and multiplexes concurrent calls,
/// so a single dispatcher is shared by every streaming session.
#[derive(Debug, Clone)]
pub struct PushSenderDispatcher {
    client: PushSenderClient<Channel>,
    timeout: Option<Duration>,
}

impl PushSenderDispatcher {
    /// Wrap an existing channel.
    ///
    /// `timeout` bounds each call, including connection setup on a lazy channel.
    #[must_use]
    pub fn new(channel: Channel, timeout: Option<Duration>) -> Self {
        Self {
            client: PushSenderClient::new(channel),
            timeout,
        }
    }

    /// Build a dispatcher for the configured endpoint without dialing it yet.
    ///
    /// The connection is established on first use and re-established by the
    /// channel if it drops.
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a valid URI.
    pub fn connect_lazy(config: &NotifierConfig) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.endpoint_uri())?.connect_lazy();
        Ok(Self::new(channel, config.request_timeout()))
    }
}

#[tonic::async_trait]
impl AlertDispatcher for PushSenderDispatcher {
    async fn dispatch(&self, alert: &AlertMessage) -> Result<(), NotificationDeliveryError> {
        let request = Request::new(NotifyRequest::from(alert));
        let mut client = self.client.clone();

        let outcome = match self.timeout {
            Some(timeout) => {
                tokio::time::timeout(timeout, client.notify(request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(Status::deadline_exceeded(format!(
                            "no response from push sender within {timeout:?}"
                        )))
                    })
            }
            None => client.notify(request).await,
        };
        outcome.map_err(|status| NotificationDeliveryError::new(alert.target_id.clone(), status))?;

        debug!(target_id = %alert.target_id, "alert delivered");
        Ok(())
    }
}
