mod common;

use std::io::Cursor;
use std::net::TcpListener;
use std::sync::Arc;

use common::{Chunk, GZIP_TEXT, JSON_BODY, LARGE_BODY_LEN, Recording, TestServer};
use courier_client::http::RequestBody;
use courier_client::progress::{CancellationFlag, DirectSink};
use courier_client::{
    ClientConfig, ClientStats, JsonConsumer, RequestExecutor, RequestMethod, RequestSpec,
    ResponseConsumer, SyncDriver, default_user_agent,
};
use serde_json::json;

fn get(server: &TestServer, path: &str) -> Recording {
    SyncDriver::new().execute(
        RequestSpec::new(RequestMethod::Get, server.url(path)),
        Recording::new(),
    )
}

fn assert_ordered(consumer: &Recording, events: &[&str]) {
    let positions: Vec<usize> = events
        .iter()
        .map(|event| {
            consumer
                .position(event)
                .unwrap_or_else(|| panic!("missing {event} in {:?}", consumer.events))
        })
        .collect();
    assert!(
        positions.windows(2).all(|pair| pair[0] < pair[1]),
        "out of order: {:?}",
        consumer.events
    );
}

fn assert_monotonic(progress: &[(u64, Option<u64>)]) {
    assert!(progress.windows(2).all(|pair| pair[0].0 <= pair[1].0), "{progress:?}");
}

#[test]
fn json_exchange_runs_full_lifecycle() {
    let server = TestServer::start();
    let consumer = get(&server, "/json");

    assert_eq!(consumer.info().response_code, 200);
    assert_eq!(consumer.text(), Some(JSON_BODY));
    assert_eq!(
        consumer.received.last(),
        Some(&Chunk {
            data: None,
            chunk_length: 16,
            total_processed: 16,
            total_length: Some(16),
        })
    );
    assert_eq!(consumer.received_processed.last(), Some(&(16, Some(16))));
    assert_ordered(
        &consumer,
        &[
            "send",
            "received",
            "received_end",
            "generate",
            "before_success",
            "success",
            "before_finish",
            "finish",
        ],
    );
    for once in ["send", "received_end", "generate", "success", "before_finish", "finish"] {
        assert_eq!(consumer.count(once), 1, "{once}");
    }
    assert_eq!(consumer.count("failure"), 0);

    let info = consumer.info();
    assert_eq!(info.response_length, Some(16));
    assert_eq!(info.request_method, Some(RequestMethod::Get));
    assert_eq!(info.connection_url.as_ref(), Some(&server.url("/json")));
    assert!(info.connection_time.unwrap() <= info.response_time.unwrap());
    assert_eq!(
        info.response_headers
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert!(!info.served_from_cache);
}

#[test]
fn json_consumer_parses_while_streaming() {
    let server = TestServer::start();
    let consumer = SyncDriver::new().execute(
        RequestSpec::new(RequestMethod::Get, server.url("/json")),
        JsonConsumer::<serde_json::Value>::new(),
    );
    assert_eq!(consumer.connection_info().response_code, 200);
    assert_eq!(consumer.connection_info().response_length, Some(16));
    assert_eq!(consumer.into_content(), Some(json!({"key": "value"})));
}

#[test]
fn error_status_routes_to_failure() {
    let server = TestServer::start();
    let consumer = get(&server, "/status/404");

    assert_eq!(consumer.info().response_code, 404);
    assert_eq!(consumer.count("failure"), 1);
    assert_eq!(consumer.count("success"), 0);
    assert_eq!(consumer.count("generate"), 1);
    assert_ordered(&consumer, &["send", "received_end", "generate", "failure", "finish"]);
}

#[test]
fn empty_success_body_still_completes() {
    let server = TestServer::start();
    let consumer = get(&server, "/status/204");

    assert_eq!(consumer.info().response_code, 204);
    assert_eq!(consumer.count("success"), 1);
    assert_eq!(consumer.text(), Some(""));
    assert_eq!(
        consumer.received,
        vec![Chunk {
            data: None,
            chunk_length: 0,
            total_processed: 0,
            total_length: Some(0),
        }]
    );
}

#[test]
fn refused_connection_reports_code_zero() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{port}/json").parse().unwrap();
    let consumer = SyncDriver::new().execute(
        RequestSpec::new(RequestMethod::Get, url),
        Recording::new(),
    );

    assert_eq!(consumer.info().response_code, 0);
    assert_eq!(
        consumer.events,
        vec!["send", "failure", "before_finish", "finish"]
    );
    assert!(consumer.info().response_time.is_some());
}

#[test]
fn chunked_body_reports_discovered_total() {
    let server = TestServer::start();
    let consumer = get(&server, "/chunked");

    assert_eq!(consumer.text(), Some("hello chunked world"));
    let (end, data) = consumer.received.split_last().unwrap();
    assert!(data.iter().all(|chunk| chunk.total_length.is_none()));
    assert_eq!(end.total_length, Some(19));
    assert_eq!(end.total_processed, 19);
    assert_eq!(consumer.received_processed.last(), Some(&(19, Some(19))));
    assert_monotonic(&consumer.received_processed);
}

#[test]
fn gzip_body_is_decoded_before_callbacks() {
    let server = TestServer::start();
    let consumer = get(&server, "/gzip");

    assert_eq!(consumer.info().response_code, 200);
    assert_eq!(consumer.text(), Some(GZIP_TEXT));
    let end = consumer.received.last().unwrap();
    assert_eq!(end.total_processed, GZIP_TEXT.len() as u64);
    assert_eq!(end.total_length, Some(GZIP_TEXT.len() as u64));
}

#[test]
fn large_download_uses_bounded_chunks() {
    let server = TestServer::start();
    let consumer = get(&server, "/large");

    let total = LARGE_BODY_LEN as u64;
    let data: Vec<&Chunk> = consumer.received.iter().filter(|c| c.data.is_some()).collect();
    assert!(data.len() >= LARGE_BODY_LEN / 8192);
    assert!(data.iter().all(|chunk| chunk.chunk_length <= 8192));
    assert!(data.iter().all(|chunk| chunk.total_length == Some(total)));
    assert_monotonic(&consumer.received_processed);
    assert_eq!(consumer.received_processed.last(), Some(&(total, Some(total))));
    assert_eq!(consumer.text().map(str::len), Some(LARGE_BODY_LEN));
}

#[test]
fn outbound_headers_force_connection_close() {
    let server = TestServer::start();
    let spec = RequestSpec::new(RequestMethod::Get, server.url("/headers"))
        .try_header("Connection", "keep-alive")
        .unwrap()
        .try_header("X-Custom", "yes")
        .unwrap()
        .user_agent(default_user_agent());
    let consumer = SyncDriver::new().execute(spec, Recording::new());

    let text = consumer.text().unwrap();
    assert!(text.contains("connection: close"), "{text}");
    assert!(!text.contains("keep-alive"), "{text}");
    assert!(text.contains("x-custom: yes"), "{text}");
    assert!(text.contains("accept-encoding: gzip"), "{text}");
    assert!(text.contains(&format!("user-agent: {}", default_user_agent())), "{text}");
}

#[test]
fn caller_user_agent_replaces_default() {
    let server = TestServer::start();
    let spec = ClientConfig::default()
        .request(RequestMethod::Get, server.url("/headers"))
        .try_header("User-Agent", "custom-agent/1")
        .unwrap();
    let consumer = SyncDriver::new().execute(spec, Recording::new());

    let text = consumer.text().unwrap();
    assert!(text.contains("user-agent: custom-agent/1"), "{text}");
    assert!(!text.contains("courier/"), "{text}");
}

#[test]
fn upload_reports_every_chunk() {
    let server = TestServer::start();
    let payload = vec![b'u'; 20_000];
    let spec = RequestSpec::new(RequestMethod::Post, server.url("/upload")).body(payload);
    let consumer = SyncDriver::new().execute(spec, Recording::new());

    assert_eq!(consumer.text(), Some("20000"));
    assert_eq!(consumer.info().connection_length, Some(20_000));
    let totals: Vec<u64> = consumer.sent.iter().map(|c| c.total_processed).collect();
    assert_eq!(totals, vec![8192, 16384, 20_000]);
    assert!(consumer.sent.iter().all(|c| c.total_length == Some(20_000)));
    assert_eq!(consumer.sent_processed.last(), Some(&(20_000, Some(20_000))));
    assert_ordered(&consumer, &["send", "sent", "sent_processed", "received", "success"]);
}

#[test]
fn streaming_upload_of_unknown_length_is_chunked() {
    let server = TestServer::start();
    let body = RequestBody::reader(Cursor::new(vec![b's'; 10_000]), None);
    let spec = RequestSpec::new(RequestMethod::Put, server.url("/echo-method")).body(body);
    let consumer = SyncDriver::new().execute(spec, Recording::new());

    assert_eq!(consumer.info().response_code, 200);
    assert_eq!(consumer.info().connection_length, None);
    assert_eq!(consumer.text().map(str::len), Some("PUT:".len() + 10_000));
    assert_eq!(consumer.sent.last().map(|c| c.total_processed), Some(10_000));
    assert!(consumer.sent.iter().all(|c| c.total_length.is_none()));
}

#[test]
fn head_request_has_no_body() {
    let server = TestServer::start();
    let consumer = SyncDriver::new().execute(
        RequestSpec::new(RequestMethod::Head, server.url("/json")),
        Recording::new(),
    );
    assert_eq!(consumer.info().response_code, 200);
    assert_eq!(consumer.text(), Some(""));
    assert_eq!(consumer.count("received"), 0);
}

#[test]
fn head_of_gzip_resource_still_completes() {
    let server = TestServer::start();
    let consumer = SyncDriver::new().execute(
        RequestSpec::new(RequestMethod::Head, server.url("/gzip")),
        Recording::new(),
    );

    assert_eq!(consumer.info().response_code, 200);
    assert_eq!(consumer.text(), Some(""));
    assert_eq!(consumer.count("received"), 0);
    assert_ordered(
        &consumer,
        &["send", "received_end", "generate", "before_success", "success", "finish"],
    );
    assert_eq!(consumer.count("received_end"), 1);
    assert_eq!(consumer.count("generate"), 1);
}

#[test]
fn explicit_timeout_on_caller_thread_completes() {
    let server = TestServer::start();
    let consumer = std::thread::spawn(move || {
        SyncDriver::new().execute(
            RequestSpec::new(RequestMethod::Get, server.url("/json"))
                .timeout(std::time::Duration::from_secs(5)),
            Recording::new(),
        )
    })
    .join()
    .expect("driver thread");

    assert_eq!(consumer.info().response_code, 200);
    assert_eq!(consumer.text(), Some(JSON_BODY));
    assert_eq!(consumer.count("success"), 1);
}

#[test]
fn executor_updates_shared_stats() {
    let server = TestServer::start();
    let stats = Arc::new(ClientStats::new());
    let executor = RequestExecutor::with_stats(Arc::clone(&stats));

    for path in ["/json", "/status/500"] {
        let mut consumer = Recording::new();
        executor.execute(
            RequestSpec::new(RequestMethod::Get, server.url(path)),
            &mut consumer,
            &CancellationFlag::new(),
            &DirectSink,
        );
        assert_eq!(consumer.count("finish"), 0);
        assert_eq!(consumer.count("before_finish"), 1);
    }

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.requests_total, 2);
    assert_eq!(snapshot.requests_successful, 1);
    assert_eq!(snapshot.requests_failed, 1);
    assert_eq!(snapshot.bytes_received, 16);
    assert_eq!(snapshot.connections_total, 2);
}
