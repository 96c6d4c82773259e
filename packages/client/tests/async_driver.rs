mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{JSON_BODY, Recording, TestServer};
use courier_client::{
    AsyncDriver, ProgressListener, RequestExecutor, RequestMethod, RequestSpec, WorkerPool,
};

#[derive(Default)]
struct ProgressLog {
    sent: Vec<(u64, Option<u64>)>,
    received: Vec<(u64, Option<u64>)>,
}

impl ProgressListener for ProgressLog {
    fn on_byte_chunk_sent_processed(&mut self, total_processed: u64, total_length: Option<u64>) {
        self.sent.push((total_processed, total_length));
    }

    fn on_byte_chunk_received_processed(&mut self, total_processed: u64, total_length: Option<u64>) {
        self.received.push((total_processed, total_length));
    }
}

#[test]
fn exchange_completes_on_worker() {
    let server = TestServer::start();
    let mut driver = AsyncDriver::new().unwrap();
    let exchange = driver.execute(
        RequestSpec::new(RequestMethod::Get, server.url("/json")),
        Recording::new(),
    );

    let mut progress = ProgressLog::default();
    let consumer = exchange.wait(&mut progress).unwrap();

    assert_eq!(consumer.info().response_code, 200);
    assert_eq!(consumer.text(), Some(JSON_BODY));
    assert_eq!(consumer.count("success"), 1);
    assert_eq!(consumer.count("finish"), 1);
    // Processed callbacks go to the owner-side listener, not the worker-side consumer.
    assert!(consumer.received_processed.is_empty());
    assert_eq!(progress.received.last(), Some(&(16, Some(16))));
}

#[test]
fn upload_progress_reaches_owner_in_order() {
    let server = TestServer::start();
    let mut driver = AsyncDriver::new().unwrap();
    let exchange = driver.execute(
        RequestSpec::new(RequestMethod::Post, server.url("/upload")).body(vec![0u8; 30_000]),
        Recording::new(),
    );

    let mut progress = ProgressLog::default();
    let consumer = exchange.wait(&mut progress).unwrap();

    assert_eq!(consumer.text(), Some("30000"));
    let totals: Vec<u64> = progress.sent.iter().map(|(n, _)| *n).collect();
    assert_eq!(totals, vec![8192, 16384, 24576, 30_000]);
}

#[test]
fn pump_delivers_finish_without_blocking() {
    let server = TestServer::start();
    let mut driver = AsyncDriver::new().unwrap();
    let mut exchange = driver.execute(
        RequestSpec::new(RequestMethod::Get, server.url("/large")),
        Recording::new(),
    );

    let mut progress = ProgressLog::default();
    let deadline = Instant::now() + Duration::from_secs(10);
    let consumer = loop {
        if let Some(consumer) = exchange.pump(&mut progress).unwrap() {
            break consumer;
        }
        assert!(Instant::now() < deadline, "exchange did not finish");
        std::thread::sleep(Duration::from_millis(5));
    };

    assert_eq!(consumer.count("finish"), 1);
    assert!(progress.received.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    assert_eq!(progress.received.last().map(|(n, _)| *n), Some(256 * 1024));
}

#[test]
fn new_exchange_supersedes_in_flight_one() {
    let server = TestServer::start();
    let mut driver = AsyncDriver::new().unwrap();

    let first = driver.execute(
        RequestSpec::new(RequestMethod::Get, server.url("/slow")),
        Recording::new(),
    );
    let second = driver.execute(
        RequestSpec::new(RequestMethod::Get, server.url("/json")),
        Recording::new(),
    );
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());

    let second = second.wait(&mut ()).unwrap();
    assert_eq!(second.info().response_code, 200);

    let first = first.wait(&mut ()).unwrap();
    assert_eq!(first.count("success"), 0);
    assert_eq!(first.count("failure"), 0);
    assert_eq!(first.count("before_finish"), 1);
    assert_eq!(first.count("finish"), 1);
}

#[test]
fn drivers_share_a_pool() {
    let server = TestServer::start();
    let pool = Arc::new(WorkerPool::with_threads(2).unwrap());
    let executor = Arc::new(RequestExecutor::new());
    let mut a = AsyncDriver::with_pool(Arc::clone(&executor), Arc::clone(&pool));
    let mut b = AsyncDriver::with_pool(Arc::clone(&executor), Arc::clone(&pool));

    let first = a.execute(
        RequestSpec::new(RequestMethod::Get, server.url("/json")),
        Recording::new(),
    );
    let second = b.execute(
        RequestSpec::new(RequestMethod::Get, server.url("/chunked")),
        Recording::new(),
    );

    assert_eq!(first.wait(&mut ()).unwrap().text(), Some(JSON_BODY));
    assert_eq!(second.wait(&mut ()).unwrap().text(), Some("hello chunked world"));
    assert_eq!(executor.stats().snapshot().requests_successful, 2);
}

#[test]
fn explicit_cancel_still_finishes() {
    let server = TestServer::start();
    let mut driver = AsyncDriver::new().unwrap();
    let exchange = driver.execute(
        RequestSpec::new(RequestMethod::Get, server.url("/slow")),
        Recording::new(),
    );
    driver.cancel();

    let consumer = exchange.wait(&mut ()).unwrap();
    assert_eq!(consumer.count("success"), 0);
    assert_eq!(consumer.count("finish"), 1);
}
