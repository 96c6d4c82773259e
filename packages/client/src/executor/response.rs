use std::fs::File;
use std::io::{self, Read};

use http::HeaderMap;

use crate::cache::{CacheEntry, CacheWriter};
use crate::transport::{BlockingBody, ResponseHead};

/// Where the delivered response body comes from.
pub enum ResponseBody<'t> {
    Network(BlockingBody<'t>),
    Cached(File),
    Empty,
}

impl Read for ResponseBody<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ResponseBody::Network(body) => body.read(buf),
            ResponseBody::Cached(file) => file.read(buf),
            ResponseBody::Empty => Ok(0),
        }
    }
}

/// The response chosen for the consumer once redirects and revalidation are settled.
pub(super) enum Delivery<'t> {
    Network {
        head: ResponseHead<'t>,
        writer: Option<CacheWriter>,
    },
    Cached {
        entry: CacheEntry,
        body: File,
    },
    /// Generated locally, with no body.
    Synthetic { status: u16 },
    Cancelled,
}

/// Status, headers and body of a [`Delivery`], ready for the consumer.
pub(super) struct Delivered<'t> {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ResponseBody<'t>,
    pub writer: Option<CacheWriter>,
    pub from_cache: bool,
    /// Exact body length when known independently of the headers.
    pub stored_length: Option<u64>,
}

impl<'t> Delivery<'t> {
    pub(super) fn into_delivered(self) -> Option<Delivered<'t>> {
        match self {
            Delivery::Network { head, writer } => Some(Delivered {
                status: head.status,
                headers: head.headers,
                body: ResponseBody::Network(head.body),
                writer,
                from_cache: false,
                stored_length: None,
            }),
            Delivery::Cached { entry, body } => Some(Delivered {
                status: entry.status,
                headers: entry.headers(),
                body: ResponseBody::Cached(body),
                writer: None,
                from_cache: true,
                stored_length: Some(entry.body_length),
            }),
            Delivery::Synthetic { status } => Some(Delivered {
                status,
                headers: HeaderMap::new(),
                body: ResponseBody::Empty,
                writer: None,
                from_cache: false,
                stored_length: Some(0),
            }),
            Delivery::Cancelled => None,
        }
    }
}
