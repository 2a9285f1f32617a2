//! Protocol buffer definitions for the wearable telemetry service and the
//! push-sender notification service it calls out to.
//!
//! Generated types are re-exported per package; the conversions below bridge
//! them to the transport-independent types in `wearable-core`.

use wearable_core::{AlertMessage, Sample};

/// `wearable.v1`: the server-streaming heart-rate endpoint.
pub mod wearable {
    tonic::include_proto!("wearable.v1");
}

/// `push_sender.v1`: the external notification service.
pub mod push_sender {
    tonic::include_proto!("push_sender.v1");
}

/// Encoded file descriptor set for both packages, for reflection services.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("wearable_descriptor");

pub use push_sender::{NotifyRequest, NotifyResponse};
pub use wearable::{BeatsPerMinuteRequest, BeatsPerMinuteResponse};

impl From<Sample> for BeatsPerMinuteResponse {
    fn from(sample: Sample) -> Self {
        Self {
            value: sample.value,
            minute: sample.sequence_index,
        }
    }
}

impl From<&AlertMessage> for NotifyRequest {
    fn from(alert: &AlertMessage) -> Self {
        Self {
            uuid: alert.target_id.clone(),
            message: alert.text.clone(),
        }
    }
}

impl BeatsPerMinuteRequest {
    /// Create a request for the given wearable.
    pub fn for_device(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}
