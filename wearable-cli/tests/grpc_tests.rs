//! End-to-end tests: client → wearable gRPC server → push sender.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use support::FakePushSender;
use tokio_stream::StreamExt;
use wearable_cli::cli::stream_readings;
use wearable_cli::config::WearableConfig;
use wearable_cli::grpc::ReadingSourceFactory;
use wearable_core::{BATCH_SIZE, ReadingSource};
use wearable_proto::BeatsPerMinuteRequest;
use wearable_proto::wearable::wearable_service_client::WearableServiceClient;

struct Script {
    readings: VecDeque<u32>,
    fallback: u32,
}

impl ReadingSource for Script {
    fn next_reading(&mut self) -> u32 {
        self.readings.pop_front().unwrap_or(self.fallback)
    }
}

fn script(readings: &'static [u32], fallback: u32) -> ReadingSourceFactory {
    Arc::new(move || -> Box<dyn ReadingSource> {
        Box::new(Script {
            readings: readings.iter().copied().collect(),
            fallback,
        })
    })
}

/// Start a wearable server wired to `push_sender_addr` and return its URI.
async fn start_wearable_server(
    push_sender_addr: String,
    target_id: &str,
    readings: Option<ReadingSourceFactory>,
) -> String {
    let mut config = WearableConfig::default();
    config.notifier.endpoint = push_sender_addr;
    config.notifier.target_id = target_id.to_string();

    let mut service = wearable_cli::build_service(&config).expect("service builds");
    if let Some(readings) = readings {
        service = service.with_reading_source(readings);
    }

    let port = portpicker::pick_unused_port().expect("No available ports");
    let addr = format!("127.0.0.1:{port}").parse().expect("socket addr");
    tokio::spawn(async move {
        service.serve(addr).await.ok();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn anomaly_is_pushed_before_its_sample_arrives() {
    let push_sender = FakePushSender::default();
    let push_addr = push_sender.spawn().await;
    let addr = start_wearable_server(
        push_addr,
        "patient-1",
        Some(script(&[80, 80, 150, 90, 80, 91], 80)),
    )
    .await;

    let mut client = WearableServiceClient::connect(addr).await.unwrap();
    let mut stream = client
        .beats_per_minute(BeatsPerMinuteRequest::for_device("watch"))
        .await
        .unwrap()
        .into_inner();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!((first.minute, first.value), (0, 80));
    assert!(push_sender.calls().is_empty());

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!((second.minute, second.value), (1, 90));
    let calls = push_sender.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].uuid, "patient-1");
    assert_eq!(calls[0].message, "Something is going wrong!");

    let third = stream.next().await.unwrap().unwrap();
    assert_eq!((third.minute, third.value), (2, 91));
}

#[tokio::test]
async fn rejected_alert_fails_the_stream() {
    let push_sender = FakePushSender::rejecting();
    let push_addr = push_sender.spawn().await;
    let addr = start_wearable_server(push_addr, "some_uuid", Some(script(&[], 35))).await;

    let mut client = WearableServiceClient::connect(addr).await.unwrap();
    let mut stream = client
        .beats_per_minute(BeatsPerMinuteRequest::default())
        .await
        .unwrap()
        .into_inner();

    let status = stream.next().await.unwrap().expect_err("no samples before failure");
    assert_eq!(status.code(), tonic::Code::Internal);
    assert!(status.message().starts_with("notify: "));
    assert!(stream.next().await.is_none());
    assert_eq!(push_sender.calls().len(), 1);
}

#[tokio::test]
async fn unreachable_push_sender_fails_the_stream() {
    let dead_port = portpicker::pick_unused_port().expect("No available ports");
    let addr = start_wearable_server(
        format!("127.0.0.1:{dead_port}"),
        "some_uuid",
        Some(script(&[90, 100, 90, 101, 39], 90)),
    )
    .await;

    let mut output = Vec::new();
    let err = stream_readings(&addr, "", false, &mut output)
        .await
        .expect_err("stream fails at the third reading");

    assert!(err.to_string().contains("after 2 readings"));
    let printed = String::from_utf8(output).unwrap();
    assert_eq!(printed.lines().count(), 2);
    assert!(printed.lines().next().unwrap().contains("100 bpm"));
}

#[tokio::test]
async fn client_disconnect_stops_the_session() {
    let push_sender = FakePushSender::default();
    let push_addr = push_sender.spawn().await;
    // iteration 5 would raise an alert if the session kept running
    let addr = start_wearable_server(
        push_addr,
        "some_uuid",
        Some(script(&[80, 80, 80, 80, 80, 80, 80, 80, 80, 80, 150], 80)),
    )
    .await;

    let mut client = WearableServiceClient::connect(addr).await.unwrap();
    let mut stream = client
        .beats_per_minute(BeatsPerMinuteRequest::default())
        .await
        .unwrap()
        .into_inner();
    for _ in 0..2 {
        stream.next().await.unwrap().unwrap();
    }
    drop(stream);
    drop(client);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(push_sender.calls().is_empty());
}

#[tokio::test]
#[ignore] // Slow: a full batch takes ~30s of pacing
async fn full_batch_over_the_wire() {
    let push_sender = FakePushSender::default();
    let push_addr = push_sender.spawn().await;
    let addr = start_wearable_server(push_addr, "some_uuid", None).await;

    let mut output = Vec::new();
    let received = stream_readings(&addr, "watch", true, &mut output)
        .await
        .expect("stream completes");

    assert_eq!(received, BATCH_SIZE);
    let printed = String::from_utf8(output).unwrap();
    for (minute, line) in printed.lines().enumerate() {
        let reading: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(reading["minute"], minute);
        let value = reading["value"].as_u64().unwrap();
        assert!((30..160).contains(&value));
    }
}
