//! Wearable telemetry server and client.

pub mod cli;
pub mod config;
pub mod grpc;
pub mod logging;
pub mod notifier;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::config::WearableConfig;
use crate::grpc::{SessionSettings, WearableGrpcService};
use crate::notifier::PushSenderDispatcher;

/// Build the service described by `config`, with one shared push-sender channel.
///
/// # Errors
/// Returns an error if the notifier endpoint is not a valid URI.
pub fn build_service(config: &WearableConfig) -> Result<WearableGrpcService> {
    let dispatcher = PushSenderDispatcher::connect_lazy(&config.notifier).with_context(|| {
        format!(
            "create push sender client for {}",
            config.notifier.endpoint_uri()
        )
    })?;

    Ok(WearableGrpcService::new(
        Arc::new(dispatcher),
        SessionSettings::from_config(config),
    ))
}

/// Bind the configured listen address.
///
/// # Errors
/// Returns an error if the address is malformed or already in use.
pub async fn bind(config: &WearableConfig) -> Result<TcpListener> {
    let addr = &config.server.listen_addr;
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}
