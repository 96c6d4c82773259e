use std::sync::Arc;

use crate::cache::CacheTee;
use crate::connect::Connector;
use crate::consumer::ResponseConsumer;
use crate::consumer::connection_info::{is_success_code, now_millis};
use crate::error::classification::io_is_timeout;
use crate::http::RequestSpec;
use crate::http::compression::decode_response_body;
use crate::http::headers::content_length;
use crate::progress::{CancellationFlag, TransferChannel, TransferSink};
use crate::telemetry::ClientStats;
use crate::transport::Transport;

/// Runs exchanges synchronously on the calling thread.
///
/// Cheap to share: one executor serves any number of exchanges, sequentially or from
/// several threads at once. Each exchange opens its own connection.
#[derive(Debug, Default)]
pub struct RequestExecutor {
    pub(super) connector: Connector,
    pub(super) stats: Arc<ClientStats>,
}

impl RequestExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Share counters with other executors.
    #[must_use]
    pub fn with_stats(stats: Arc<ClientStats>) -> Self {
        Self {
            connector: Connector::new(),
            stats,
        }
    }

    #[inline]
    pub fn stats(&self) -> &Arc<ClientStats> {
        &self.stats
    }

    /// Run one exchange to completion, driving `consumer` through its lifecycle.
    ///
    /// Never fails: transport errors are logged and surface as response code 0 with
    /// `on_failure`. `before_finish` always runs last; `on_finish` is left to the
    /// driver so it can run on the owner thread.
    pub fn execute<C: ResponseConsumer>(
        &self,
        spec: RequestSpec,
        consumer: &mut C,
        cancellation: &CancellationFlag,
        sink: &dyn TransferSink,
    ) {
        let channel = TransferChannel::new(cancellation, sink);
        self.stats.record_request();

        if !channel.is_cancelled() {
            pre_execute(&spec, consumer);
            consumer.on_send();
            if !channel.is_cancelled() {
                consumer.connection_info_mut().connection_length =
                    spec.body.as_ref().and_then(|body| body.length());
                let code = self.run(spec, consumer, &channel);
                if !channel.is_cancelled() {
                    self.post_execute(consumer, code);
                }
            }
        }

        if channel.is_cancelled() {
            tracing::debug!(target: "courier::executor", "Exchange cancelled");
            self.stats.record_cancelled();
        }
        consumer.before_finish();
    }

    fn run<C: ResponseConsumer>(
        &self,
        mut spec: RequestSpec,
        consumer: &mut C,
        channel: &TransferChannel<'_>,
    ) -> u16 {
        let transport = match Transport::new(spec.timeout) {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!(target: "courier::executor", error = %e, "Cannot start transport runtime");
                return 0;
            }
        };

        let url = spec.url.clone();
        let delivery = match self.dispatch(&transport, &mut spec, consumer, channel) {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::warn!(
                    target: "courier::executor",
                    method = %spec.method,
                    url = %url,
                    error = %e,
                    "Exchange failed"
                );
                return 0;
            }
        };
        let Some(delivered) = delivery.into_delivered() else {
            return 0;
        };
        if channel.is_cancelled() {
            return 0;
        }

        let info = consumer.connection_info_mut();
        info.response_headers = delivered.headers.clone();
        info.response_code = delivered.status;
        info.served_from_cache = delivered.from_cache;
        if delivered.from_cache {
            self.stats.record_cache_served();
        }

        let mut tee = CacheTee::new(delivered.body, delivered.writer);
        let received = decode_response_body(&mut tee, &delivered.headers).and_then(
            |(mut stream, decoded)| {
                let total_length = if decoded {
                    None
                } else {
                    delivered
                        .stored_length
                        .or_else(|| content_length(&delivered.headers))
                };
                consumer.on_receive_stream(&mut *stream, channel, total_length)
            },
        );

        match received {
            Err(e) if io_is_timeout(&e) => {
                tracing::warn!(target: "courier::executor", url = %url, "Response body timed out");
                0
            }
            Err(e) => {
                tracing::warn!(
                    target: "courier::executor",
                    url = %url,
                    error = %e,
                    "Response body read failed"
                );
                delivered.status
            }
            Ok(()) => {
                if channel.is_cancelled() {
                    return delivered.status;
                }
                if let Some(length) = consumer.connection_info().response_length {
                    self.stats.record_bytes_received(length);
                }
                if let Err(e) = consumer.generate_content() {
                    tracing::warn!(
                        target: "courier::executor",
                        url = %url,
                        error = %e,
                        "Content generation failed"
                    );
                }
                if let Err(e) = tee.finish() {
                    tracing::warn!(target: "courier::cache", url = %url, error = %e, "Cache store failed");
                }
                delivered.status
            }
        }
    }

    fn post_execute<C: ResponseConsumer>(&self, consumer: &mut C, code: u16) {
        let info = consumer.connection_info_mut();
        info.response_code = code;
        info.response_time = Some(now_millis());

        tracing::debug!(
            target: "courier::executor",
            code,
            elapsed_ms = info.elapsed_millis(),
            "Exchange complete"
        );
        if is_success_code(code) {
            self.stats.record_success();
            consumer.before_success();
            consumer.on_success();
        } else {
            self.stats.record_failure();
            consumer.on_failure();
        }
    }
}

fn pre_execute<C: ResponseConsumer>(spec: &RequestSpec, consumer: &mut C) {
    let info = consumer.connection_info_mut();
    info.connection_url = Some(spec.url.clone());
    info.request_method = Some(spec.method);
    info.request_headers = spec.headers.clone();
    info.connection_time = Some(now_millis());
}
