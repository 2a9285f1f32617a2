//! Client side of the heart-rate stream.

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::warn;
use wearable_core::is_anomalous;
use wearable_proto::BeatsPerMinuteRequest;
use wearable_proto::wearable::wearable_service_client::WearableServiceClient;

/// Open a stream against `addr` and write each reading to `out`.
///
/// Returns the number of readings received.
///
/// # Errors
/// Returns an error if the server cannot be reached or ends the stream with
/// an error status.
pub async fn stream_readings<W: Write>(
    addr: &str,
    uuid: &str,
    json_output: bool,
    out: &mut W,
) -> Result<u32> {
    let mut client = WearableServiceClient::connect(addr.to_string())
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;

    let mut stream = client
        .beats_per_minute(BeatsPerMinuteRequest::for_device(uuid))
        .await
        .context("beats-per-minute call rejected")?
        .into_inner();

    let mut received = 0;
    while let Some(item) = stream.next().await {
        let reading = match item {
            Ok(reading) => reading,
            Err(status) => {
                warn!(code = ?status.code(), received, "stream ended with error");
                return Err(status).context(format!("stream failed after {received} readings"));
            }
        };
        received += 1;

        let flagged = is_anomalous(reading.value);
        if json_output {
            writeln!(
                out,
                "{}",
                json!({ "minute": reading.minute, "value": reading.value, "anomalous": flagged })
            )?;
        } else {
            let marker = if flagged { "  !" } else { "" };
            writeln!(out, "{:>3}  {:>3} bpm{marker}", reading.minute, reading.value)?;
        }
    }

    Ok(received)
}

/// [`stream_readings`] onto the process stdout.
///
/// The stdout lock is taken per line, never across an await, so log output
/// from other worker threads cannot stall the stream.
///
/// # Errors
/// See [`stream_readings`].
pub async fn stream_to_stdout(addr: &str, uuid: &str, json_output: bool) -> Result<u32> {
    let mut stdout = std::io::stdout();
    stream_readings(addr, uuid, json_output, &mut stdout).await
}
