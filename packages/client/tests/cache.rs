mod common;

use std::sync::Arc;

use common::{Recording, TestServer};
use courier_client::cache::DiskCache;
use courier_client::{RequestMethod, RequestSpec, SyncDriver};

const MAX_CACHE_SIZE: u64 = 10 * 1024 * 1024;

fn open_cache(dir: &tempfile::TempDir) -> Arc<DiskCache> {
    Arc::new(DiskCache::open(dir.path(), MAX_CACHE_SIZE).unwrap())
}

fn get(server: &TestServer, path: &str, cache: Option<&Arc<DiskCache>>) -> Recording {
    let mut spec = RequestSpec::new(RequestMethod::Get, server.url(path));
    if let Some(cache) = cache {
        spec = spec.cache(Arc::clone(cache));
    }
    SyncDriver::new().execute(spec, Recording::new())
}

#[test]
fn fresh_entry_is_served_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir);
    let server = TestServer::start();

    let first = get(&server, "/cache/60", Some(&cache));
    let second = get(&server, "/cache/60", Some(&cache));

    assert_eq!(first.info().response_code, 200);
    assert_eq!(second.info().response_code, 200);
    assert_eq!(first.text(), second.text());
    assert!(!first.info().served_from_cache);
    assert!(second.info().served_from_cache);
    assert_eq!(cache.request_count(), 2);
    assert_eq!(cache.network_count(), 1);
    assert_eq!(cache.hit_count(), 1);
    assert_eq!(server.hits(), 1);
    assert_eq!(second.count("received_end"), 1);
    assert_eq!(second.count("success"), 1);
}

#[test]
fn without_cache_every_request_hits_network() {
    let server = TestServer::start();
    let first = get(&server, "/cache/60", None);
    let second = get(&server, "/cache/60", None);

    assert_ne!(first.text(), second.text());
    assert_eq!(server.hits(), 2);
}

#[test]
fn cached_headers_do_not_leak_later_request_headers() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir);
    let server = TestServer::start();

    let request = |value: &str| {
        RequestSpec::new(RequestMethod::Get, server.url("/cache/60"))
            .try_header("Request", value)
            .unwrap()
            .cache(Arc::clone(&cache))
    };
    let first = SyncDriver::new().execute(request("1"), Recording::new());
    let second = SyncDriver::new().execute(request("2"), Recording::new());

    let header = |consumer: &Recording| {
        consumer
            .info()
            .response_headers
            .get("request")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    assert_eq!(header(&first).as_deref(), Some("1"));
    assert!(second.info().served_from_cache);
    assert_eq!(header(&second).as_deref(), Some("1"));
    assert_eq!(cache.network_count(), 1);
}

#[test]
fn stale_entry_is_revalidated() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir);
    let server = TestServer::start();

    let first = get(&server, "/etag", Some(&cache));
    let second = get(&server, "/etag", Some(&cache));

    assert_eq!(first.text(), Some("etag body"));
    assert_eq!(second.info().response_code, 200);
    assert_eq!(second.text(), Some("etag body"));
    assert!(second.info().served_from_cache);
    assert_eq!(server.hits(), 2);
    assert_eq!(cache.network_count(), 2);
    assert_eq!(cache.hit_count(), 1);
}

#[test]
fn only_if_cached_without_entry_is_gateway_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir);
    let server = TestServer::start();

    let spec = RequestSpec::new(RequestMethod::Get, server.url("/cache/60"))
        .try_header("Cache-Control", "only-if-cached")
        .unwrap()
        .cache(Arc::clone(&cache));
    let consumer = SyncDriver::new().execute(spec, Recording::new());

    assert_eq!(consumer.info().response_code, 504);
    assert_eq!(consumer.count("failure"), 1);
    assert_eq!(server.hits(), 0);
    assert_eq!(cache.request_count(), 1);
    assert_eq!(cache.network_count(), 0);
}

#[test]
fn no_cache_request_goes_to_network() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir);
    let server = TestServer::start();

    let first = get(&server, "/cache/60", Some(&cache));
    let spec = RequestSpec::new(RequestMethod::Get, server.url("/cache/60"))
        .try_header("Cache-Control", "no-cache")
        .unwrap()
        .cache(Arc::clone(&cache));
    let second = SyncDriver::new().execute(spec, Recording::new());

    assert_ne!(first.text(), second.text());
    assert_eq!(server.hits(), 2);
}

#[test]
fn unsafe_method_invalidates_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir);
    let server = TestServer::start();

    let first = get(&server, "/cache/60", Some(&cache));
    let post = RequestSpec::new(RequestMethod::Post, server.url("/cache/60"))
        .body("update")
        .cache(Arc::clone(&cache));
    let posted = SyncDriver::new().execute(post, Recording::new());
    let third = get(&server, "/cache/60", Some(&cache));

    assert_eq!(posted.text(), Some("update"));
    assert_ne!(first.text(), third.text());
    assert!(!third.info().served_from_cache);
    assert_eq!(server.hits(), 3);
}

#[test]
fn entries_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start();

    let first = get(&server, "/cache/60", Some(&open_cache(&dir)));
    let reopened = open_cache(&dir);
    let second = get(&server, "/cache/60", Some(&reopened));

    assert_eq!(first.text(), second.text());
    assert!(second.info().served_from_cache);
    assert_eq!(server.hits(), 1);
    assert_eq!(reopened.stats().entry_count, 1);
}

#[test]
fn concurrent_requests_keep_counts_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(&dir);
    let server = TestServer::start();
    get(&server, "/cache/60", Some(&cache));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let consumer = get(&server, "/cache/60", Some(&cache));
                assert!(consumer.info().served_from_cache);
            });
        }
    });

    assert_eq!(cache.request_count(), 9);
    assert_eq!(cache.network_count(), 1);
    assert_eq!(cache.hit_count(), 8);
}
