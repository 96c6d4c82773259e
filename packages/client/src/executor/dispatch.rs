use std::fs::File;
use std::sync::Arc;

use http::HeaderMap;
use http::header::{CONTENT_TYPE, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use url::Url;

use super::core::RequestExecutor;
use super::response::Delivery;
use super::upload::{Upload, send_body};
use crate::cache::cache_entry::is_cacheable;
use crate::cache::{CacheControl, CacheEntry, CacheKey, CacheLookup, DiskCache};
use crate::consumer::ResponseConsumer;
use crate::consumer::connection_info::now_millis;
use crate::error;
use crate::http::headers::outbound_headers;
use crate::http::{RequestBody, RequestSpec};
use crate::progress::TransferChannel;
use crate::redirect::{
    Action, Attempt, RedirectPolicy, is_redirect_status, plan_redirect, remove_sensitive_headers,
};
use crate::transport::Transport;

/// A stored response awaiting a conditional request's verdict.
struct Revalidation {
    entry: CacheEntry,
    body: File,
}

/// Cache state carried through one exchange.
struct CacheContext {
    cache: Arc<DiskCache>,
    key: CacheKey,
    revalidation: Option<Revalidation>,
}

impl RequestExecutor {
    /// Resolve the response to deliver: from the cache, or from the network after
    /// following redirects and revalidating.
    pub(super) fn dispatch<'t, C: ResponseConsumer>(
        &self,
        transport: &'t Transport,
        spec: &mut RequestSpec,
        consumer: &mut C,
        channel: &TransferChannel<'_>,
    ) -> crate::Result<Delivery<'t>> {
        let mut headers = spec.headers.clone();

        let mut cache = match spec.cache.clone() {
            Some(cache) => match consult_cache(cache, spec, &mut headers) {
                Ok(context) => Some(context),
                Err(delivery) => return Ok(delivery),
            },
            None => None,
        };

        let policy = if spec.follow_redirects {
            RedirectPolicy::limited(spec.max_redirects)
        } else {
            RedirectPolicy::none()
        };
        let mut url = spec.url.clone();
        let mut method = spec.method;
        let mut body = spec.body.take();
        let mut visited: Vec<Url> = Vec::new();
        let request_time = now_millis();

        loop {
            visited.push(url.clone());
            let first_hop = visited.len() == 1;
            let replay = body.as_ref().and_then(RequestBody::try_clone);
            let body_length = body.as_ref().map(RequestBody::length);
            let wire_headers =
                outbound_headers(&url, &headers, spec.user_agent.as_deref(), body_length);

            self.stats.record_connection();
            let mut hop = transport
                .open(
                    &self.connector,
                    &url,
                    method,
                    wire_headers,
                    body_length,
                    spec.trust_mode,
                    spec.use_native_certs,
                )
                .inspect_err(|_| self.stats.record_connection_failure())?;

            if let Some(outgoing) = body.take() {
                match send_body(&mut hop, outgoing, consumer, channel, first_hop)? {
                    Upload::Complete(sent) | Upload::Truncated(sent) => {
                        self.stats.record_bytes_sent(sent);
                    }
                    Upload::Cancelled => return Ok(Delivery::Cancelled),
                }
            }
            if channel.is_cancelled() {
                return Ok(Delivery::Cancelled);
            }

            let head = hop.response()?;
            let response_time = now_millis();

            if spec.method.invalidates_cache() && (200..400).contains(&head.status) {
                if let Some(context) = &cache {
                    context.cache.invalidate(&spec.url);
                }
            }

            if is_redirect_status(head.status) {
                let next = plan_redirect(
                    head.status,
                    method,
                    &url,
                    &head.headers,
                    body_length.is_some(),
                    replay.is_some(),
                );
                if let Some(next) = next {
                    match policy.check(Attempt::new(head.status, &next.url, &visited)) {
                        Action::Follow => {
                            tracing::debug!(
                                target: "courier::redirect",
                                status = head.status,
                                from = %url,
                                to = %next.url,
                                "Following redirect"
                            );
                            drop(head);
                            remove_sensitive_headers(&mut headers, &next.url, &url);
                            if !next.keep_body {
                                headers.remove(CONTENT_TYPE);
                            }
                            if let Some(context) = cache.as_mut() {
                                if context.revalidation.take().is_some() {
                                    headers.remove(IF_NONE_MATCH);
                                    headers.remove(IF_MODIFIED_SINCE);
                                }
                            }
                            body = if next.keep_body { replay } else { None };
                            method = next.method;
                            url = next.url;
                            self.stats.record_redirect();
                            continue;
                        }
                        Action::TooManyRedirects => {
                            return Err(error::too_many_redirects(
                                policy.max_redirects(),
                                next.url,
                            ));
                        }
                        Action::Stop => {}
                    }
                }
            }

            let Some(context) = cache else {
                return Ok(Delivery::Network { head, writer: None });
            };

            if head.status == 304 {
                if let Some(Revalidation { mut entry, body }) = context.revalidation {
                    tracing::debug!(target: "courier::cache", url = %url, "Revalidated stored response");
                    context.cache.record_conditional_hit();
                    entry.merge_not_modified(&head.headers, request_time, response_time);
                    context.cache.update(&context.key, &entry);
                    return Ok(Delivery::Cached { entry, body });
                }
            }

            let writer = if first_hop
                && is_cacheable(method, head.status, &head.headers, &headers)
            {
                CacheEntry::from_response(
                    &url,
                    method,
                    head.status,
                    &head.headers,
                    &headers,
                    request_time,
                    response_time,
                )
                .and_then(|entry| context.cache.begin(&context.key, entry))
            } else {
                None
            };
            return Ok(Delivery::Network { head, writer });
        }
    }
}

/// Look the request up in the cache.
///
/// `Err` carries a delivery that needs no network round trip. Stale entries with
/// validators add conditional headers unless the caller sent its own.
fn consult_cache<'t>(
    cache: Arc<DiskCache>,
    spec: &RequestSpec,
    headers: &mut HeaderMap,
) -> Result<CacheContext, Delivery<'t>> {
    let key = CacheKey::new(spec.method, &spec.url);
    let mut revalidation = None;

    if spec.method.is_cacheable() {
        let request_control = CacheControl::from_headers(&spec.headers);
        match cache.lookup(&key, &spec.headers, now_millis()) {
            CacheLookup::Fresh(entry, body) => {
                tracing::debug!(target: "courier::cache", url = %spec.url, "Serving fresh stored response");
                cache.record_request(false, true);
                return Err(Delivery::Cached { entry, body });
            }
            CacheLookup::Stale(entry, body, conditional) => {
                let caller_conditional =
                    headers.contains_key(IF_NONE_MATCH) || headers.contains_key(IF_MODIFIED_SINCE);
                if !caller_conditional && !request_control.only_if_cached {
                    for (name, value) in &conditional {
                        headers.insert(name.clone(), value.clone());
                    }
                    revalidation = Some(Revalidation { entry, body });
                }
            }
            CacheLookup::Miss => {}
        }

        if request_control.only_if_cached {
            tracing::debug!(target: "courier::cache", url = %spec.url, "only-if-cached with no usable entry");
            cache.record_request(false, false);
            return Err(Delivery::Synthetic { status: 504 });
        }
    }

    cache.record_request(true, false);
    Ok(CacheContext {
        cache,
        key,
        revalidation,
    })
}
