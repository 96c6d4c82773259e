//! In-process test server and a consumer that records its lifecycle.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Path, Request, State};
use axum::http::header::{
    CACHE_CONTROL, CONTENT_ENCODING, CONTENT_TYPE, ETAG, IF_NONE_MATCH, LOCATION,
};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use courier_client::consumer::ConnectionInfo;
use courier_client::http::compression::gzip_bytes;
use courier_client::progress::CancellationFlag;
use courier_client::{ProgressListener, ResponseConsumer, StringConsumer, Url};
use tokio::runtime::Runtime;

pub const JSON_BODY: &str = "{\"key\":\"value\"}\n";
pub const GZIP_TEXT: &str = "gzip payload gzip payload gzip payload";
pub const LARGE_BODY_LEN: usize = 256 * 1024;

#[derive(Clone, Default)]
struct AppState {
    nonce: Arc<AtomicUsize>,
}

/// An axum server on its own runtime, bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    _runtime: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("server runtime");
        let hits = Arc::new(AtomicUsize::new(0));
        let app = routes()
            .layer(middleware::from_fn_with_state(hits.clone(), count_hits))
            .with_state(AppState::default());

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        runtime.spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            hits,
            _runtime: runtime,
        }
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, path)).expect("test url")
    }

    /// Requests that reached the server.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// The test routes without hit counting, for servers started elsewhere.
pub fn app() -> Router {
    routes().with_state(AppState::default())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/json", get(json))
        .route("/status/:code", get(status))
        .route("/redirect", get(redirect))
        .route("/chain/:remaining", get(chain))
        .route("/redirect-to/:code", any(redirect_to))
        .route("/echo-method", any(echo_method))
        .route("/gzip", get(gzip))
        .route("/chunked", get(chunked))
        .route("/cache/:secs", get(cached).post(echo))
        .route("/etag", get(etag))
        .route("/echo", post(echo))
        .route("/upload", post(upload))
        .route("/headers", get(echo_headers))
        .route("/slow", get(slow))
        .route("/slow-body", get(slow_body))
        .route("/large", get(large))
}

async fn count_hits(State(hits): State<Arc<AtomicUsize>>, request: Request, next: Next) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

async fn json() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/json")], JSON_BODY)
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(LOCATION, "/json")])
}

async fn chain(Path(remaining): Path<u32>) -> Response {
    if remaining == 0 {
        return json().await.into_response();
    }
    (StatusCode::FOUND, [(LOCATION, format!("/chain/{}", remaining - 1))]).into_response()
}

async fn redirect_to(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, [(LOCATION, "/echo-method")]).into_response()
}

async fn echo_method(method: Method, body: Bytes) -> String {
    format!("{method}:{}", String::from_utf8_lossy(&body))
}

async fn gzip() -> Response {
    let body = gzip_bytes(GZIP_TEXT.as_bytes()).expect("gzip");
    ([(CONTENT_ENCODING, "gzip")], body).into_response()
}

async fn chunked() -> Response {
    let parts: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"hello ")),
        Ok(Bytes::from_static(b"chunked ")),
        Ok(Bytes::from_static(b"world")),
    ];
    Body::from_stream(futures::stream::iter(parts)).into_response()
}

async fn cached(State(state): State<AppState>, Path(secs): Path<u64>, headers: HeaderMap) -> Response {
    let nonce = state.nonce.fetch_add(1, Ordering::SeqCst);
    let mut response = (
        [(CACHE_CONTROL, format!("max-age={secs}"))],
        format!("nonce-{nonce}"),
    )
        .into_response();
    if let Some(value) = headers.get("request") {
        response.headers_mut().insert("request", value.clone());
    }
    response
}

async fn etag(headers: HeaderMap) -> Response {
    let validators = [(ETAG, "\"v1\""), (CACHE_CONTROL, "max-age=0")];
    if headers.get(IF_NONE_MATCH).is_some_and(|value| value == "\"v1\"") {
        return (StatusCode::NOT_MODIFIED, validators).into_response();
    }
    (validators, "etag body").into_response()
}

async fn echo(body: Bytes) -> Bytes {
    body
}

async fn upload(body: Bytes) -> String {
    body.len().to_string()
}

async fn echo_headers(headers: HeaderMap) -> String {
    let mut lines: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("{name}: {}", value.to_str().unwrap_or("")))
        .collect();
    lines.sort();
    lines.join("\n")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}

async fn slow_body() -> Response {
    let stream = futures::stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((Ok::<_, std::io::Error>(Bytes::from_static(b"first")), 1)),
            1 => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Some((Ok(Bytes::from_static(b"late")), 2))
            }
            _ => None,
        }
    });
    Body::from_stream(stream).into_response()
}

async fn large() -> Vec<u8> {
    vec![b'x'; LARGE_BODY_LEN]
}

/// Chunk callback as observed by [`Recording`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Option<usize>,
    pub chunk_length: u64,
    pub total_processed: u64,
    pub total_length: Option<u64>,
}

/// A `StringConsumer` wrapper that logs every callback it sees.
#[derive(Default)]
pub struct Recording {
    pub inner: StringConsumer,
    pub events: Vec<&'static str>,
    pub sent: Vec<Chunk>,
    pub received: Vec<Chunk>,
    pub sent_processed: Vec<(u64, Option<u64>)>,
    pub received_processed: Vec<(u64, Option<u64>)>,
    /// Set on the first received chunk.
    pub cancel_on_first_chunk: Option<CancellationFlag>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling(flag: CancellationFlag) -> Self {
        Self {
            cancel_on_first_chunk: Some(flag),
            ..Self::default()
        }
    }

    pub fn info(&self) -> &ConnectionInfo {
        self.inner.connection_info()
    }

    pub fn text(&self) -> Option<&str> {
        self.inner.content().map(String::as_str)
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.iter().position(|e| *e == event)
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl ProgressListener for Recording {
    fn on_byte_chunk_sent_processed(&mut self, total_processed: u64, total_length: Option<u64>) {
        self.events.push("sent_processed");
        self.sent_processed.push((total_processed, total_length));
    }

    fn on_byte_chunk_received_processed(&mut self, total_processed: u64, total_length: Option<u64>) {
        self.events.push("received_processed");
        self.received_processed.push((total_processed, total_length));
    }
}

impl ResponseConsumer for Recording {
    type Content = String;

    fn connection_info(&self) -> &ConnectionInfo {
        self.inner.connection_info()
    }

    fn connection_info_mut(&mut self) -> &mut ConnectionInfo {
        self.inner.connection_info_mut()
    }

    fn on_send(&mut self) {
        self.events.push("send");
    }

    fn on_byte_chunk_sent(
        &mut self,
        chunk: &[u8],
        chunk_length: u64,
        total_processed: u64,
        total_length: Option<u64>,
    ) {
        self.events.push("sent");
        self.sent.push(Chunk {
            data: Some(chunk.len()),
            chunk_length,
            total_processed,
            total_length,
        });
    }

    fn on_byte_chunk_received(
        &mut self,
        chunk: Option<&[u8]>,
        chunk_length: u64,
        total_processed: u64,
        total_length: Option<u64>,
    ) {
        self.events.push(if chunk.is_some() { "received" } else { "received_end" });
        self.received.push(Chunk {
            data: chunk.map(<[u8]>::len),
            chunk_length,
            total_processed,
            total_length,
        });
        self.inner
            .on_byte_chunk_received(chunk, chunk_length, total_processed, total_length);
        if let Some(flag) = &self.cancel_on_first_chunk {
            flag.cancel();
        }
    }

    fn generate_content(&mut self) -> courier_client::Result<()> {
        self.events.push("generate");
        self.inner.generate_content()
    }

    fn content(&self) -> Option<&String> {
        self.inner.content()
    }

    fn take_content(&mut self) -> Option<String> {
        self.inner.take_content()
    }

    fn before_success(&mut self) {
        self.events.push("before_success");
    }

    fn on_success(&mut self) {
        self.events.push("success");
    }

    fn on_failure(&mut self) {
        self.events.push("failure");
    }

    fn before_finish(&mut self) {
        self.events.push("before_finish");
    }

    fn on_finish(&mut self) {
        self.events.push("finish");
    }
}
