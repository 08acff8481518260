//! End-to-end tests: CLI options → emitter → mock HTTP endpoint and local
//! archive, driven by the emulator over in-memory tables.

use axum::{body::Bytes, extract::State, http::StatusCode, http::Uri, response::IntoResponse};
use clap::Parser;
use posting_emulator::config::{SamplerOpts, SinkOpts};
use posting_emulator::{
    Emulator, LoopMode, MemoryRowFetcher, Record, SampleKey, Sampler, Source,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    sampler: SamplerOpts,
    #[command(flatten)]
    sinks: SinkOpts,
}

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    fail_path: Option<String>,
}

impl Captured {
    fn paths(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    fn body(&self, path: &str) -> Option<serde_json::Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, b)| b.clone())
    }
}

async fn capture(State(state): State<Captured>, uri: Uri, body: Bytes) -> impl IntoResponse {
    let path = uri.path().to_string();
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.requests.lock().unwrap().push((path.clone(), body));
    match &state.fail_path {
        Some(fail) if path.contains(fail.as_str()) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    }
}

async fn serve(state: Captured) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().fallback(capture).with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// 50-row tables whose row 42 carries the values the assertions look for.
fn fetcher() -> MemoryRowFetcher {
    let table = |special: Record| {
        (0..50i64)
            .map(|i| {
                if i == 42 {
                    special.clone()
                } else {
                    Record::empty().with_field("index", i)
                }
            })
            .collect::<Vec<_>>()
    };
    MemoryRowFetcher::new()
        .with_rows(
            Source::Pin,
            table(Record::empty().with_field("index", 42i64).with_field("category", "art")),
        )
        .with_rows(
            Source::Geo,
            table(Record::empty().with_field("index", 42i64).with_field("country", "US")),
        )
        .with_rows(
            Source::User,
            table(Record::empty().with_field("index", 42i64).with_field("age", 29i64)),
        )
}

fn options(args: &[&str]) -> TestCli {
    let mut argv = vec!["test", "--max-delay", "0s", "--seed", "1"];
    argv.extend_from_slice(args);
    TestCli::parse_from(argv)
}

#[tokio::test]
async fn test_full_iteration_reaches_topics_streams_and_archive() {
    let state = Captured::default();
    let base = serve(state.clone()).await;
    let archive = tempfile::tempdir().unwrap();
    let archive_path = archive.path().to_str().unwrap();

    let cli = options(&[
        "--topic-base-url",
        &base,
        "--stream-base-url",
        &base,
        "--archive",
        archive_path,
    ]);
    let emitter = cli.sinks.build_emitter().await.unwrap();
    let mut emulator = Emulator::new(cli.sampler.build_sampler(), fetcher(), emitter);

    let report = emulator.emit_key(SampleKey(42)).await.unwrap();
    assert!(report.all_delivered());
    assert_eq!(report.delivered(), 6);
    assert_eq!(report.archive_failures(), 0);

    assert_eq!(
        state.body("/topics/0affe012670f.pin"),
        Some(json!({"records": [{"value": {"index": 42, "category": "art"}}]}))
    );
    assert_eq!(
        state.body("/topics/0affe012670f.user"),
        Some(json!({"records": [{"value": {"index": 42, "age": 29}}]}))
    );
    assert_eq!(
        state.body("/streams/streaming-0affe012670f-geo/record"),
        Some(json!({
            "StreamName": "streaming-0affe012670f-geo",
            "Data": {"index": 42, "country": "US"},
            "PartitionKey": "partition-1"
        }))
    );

    for (name, expected) in [
        ("pin_data/42.json", json!({"index": 42, "category": "art"})),
        ("geo_data/42.json", json!({"index": 42, "country": "US"})),
        ("user_data/42.json", json!({"index": 42, "age": 29})),
    ] {
        let bytes = std::fs::read(archive.path().join(name)).unwrap();
        let stored: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stored, expected, "{name}");
    }
}

#[tokio::test]
async fn test_failing_geo_topic_does_not_stop_the_others() {
    let state = Captured {
        fail_path: Some(".geo".to_string()),
        ..Captured::default()
    };
    let base = serve(state.clone()).await;

    let cli = options(&["--topic-base-url", &base]);
    let emitter = cli.sinks.build_emitter().await.unwrap();
    let mut emulator = Emulator::new(cli.sampler.build_sampler(), fetcher(), emitter);

    let report = emulator.emit_key(SampleKey(42)).await.unwrap();
    assert_eq!(report.delivered(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        state.paths(),
        vec![
            "/topics/0affe012670f.pin",
            "/topics/0affe012670f.geo",
            "/topics/0affe012670f.user",
        ]
    );
    assert_eq!(emulator.stats().failed, 1);
    assert_eq!(emulator.stats().delivered, 2);
}

#[tokio::test]
async fn test_continuous_run_sends_every_iteration() {
    let state = Captured::default();
    let base = serve(state.clone()).await;

    let cli = options(&["--topic-base-url", &base, "--table-size", "50"]);
    let emitter = cli.sinks.build_emitter().await.unwrap();
    let mut emulator = Emulator::new(cli.sampler.build_sampler(), fetcher(), emitter);

    let (_tx, rx) = broadcast::channel(1);
    let stats = emulator
        .run(LoopMode::Continuous { max_iterations: Some(4) }, rx)
        .await
        .unwrap();

    assert_eq!(stats.iterations, 4);
    assert_eq!(stats.delivered, 12);
    assert_eq!(state.paths().len(), 12);
}

#[tokio::test]
async fn test_offset_past_the_end_emits_empty_records() {
    let state = Captured::default();
    let base = serve(state.clone()).await;

    let cli = options(&["--topic-base-url", &base]);
    let emitter = cli.sinks.build_emitter().await.unwrap();
    let mut emulator = Emulator::new(cli.sampler.build_sampler(), fetcher(), emitter);

    let report = emulator.emit_key(SampleKey(10_000)).await.unwrap();
    assert!(report.all_delivered());
    assert_eq!(
        state.body("/topics/0affe012670f.pin"),
        Some(json!({"records": [{"value": {}}]}))
    );
    assert_eq!(emulator.stats().empty_records, 3);
}

#[tokio::test]
async fn test_unavailable_source_sends_nothing() {
    let state = Captured::default();
    let base = serve(state.clone()).await;

    let cli = options(&["--topic-base-url", &base]);
    let emitter = cli.sinks.build_emitter().await.unwrap();
    let mut emulator = Emulator::new(
        Sampler::seeded(10, Duration::ZERO, 1),
        MemoryRowFetcher::unavailable("connection refused"),
        emitter,
    );

    let (_tx, rx) = broadcast::channel(1);
    let err = emulator.run(LoopMode::Once, rx).await.unwrap_err();
    assert!(format!("{err:#}").contains("connection refused"));
    assert!(state.paths().is_empty());
}
