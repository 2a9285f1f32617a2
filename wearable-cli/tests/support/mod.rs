//! In-process push-sender used by the network tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tonic::transport::Server;
use tonic::{Request, Response, Status};
use wearable_proto::push_sender::push_sender_server::{PushSender, PushSenderServer};
use wearable_proto::{NotifyRequest, NotifyResponse};

/// Records every notification; optionally rejects or delays them all.
#[derive(Clone, Default)]
pub struct FakePushSender {
    pub received: Arc<Mutex<Vec<NotifyRequest>>>,
    pub reject: bool,
    pub delay: Option<Duration>,
}

#[tonic::async_trait]
impl PushSender for FakePushSender {
    async fn notify(
        &self,
        request: Request<NotifyRequest>,
    ) -> Result<Response<NotifyResponse>, Status> {
        self.received.lock().unwrap().push(request.into_inner());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject {
            return Err(Status::unavailable("push provider offline"));
        }
        Ok(Response::new(NotifyResponse {}))
    }
}

impl FakePushSender {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<NotifyRequest> {
        self.received.lock().unwrap().clone()
    }

    /// Serve on a free local port and return its address.
    pub async fn spawn(&self) -> String {
        let port = portpicker::pick_unused_port().expect("No available ports");
        let addr = format!("127.0.0.1:{port}").parse().expect("socket addr");
        let service = PushSenderServer::new(self.clone());

        tokio::spawn(async move {
            Server::builder().add_service(service).serve(addr).await.ok();
        });

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        format!("http://127.0.0.1:{port}")
    }
}
