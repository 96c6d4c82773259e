//! `multipart/form-data` entities
//!
//! A form is a list of named parts separated by a random boundary. Forms made only
//! of in-memory parts are sent as one buffer; a form with file parts streams the
//! files with a precomputed `Content-Length`.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};
use courier_client::RequestBody;
use http::header::{CONTENT_TYPE, HeaderValue};

use super::core::RequestBuilder;

const BOUNDARY_CHARS: usize = 30;

enum Source {
    Memory(Bytes),
    File { path: PathBuf, length: u64 },
}

impl Source {
    fn length(&self) -> u64 {
        match self {
            Source::Memory(data) => data.len() as u64,
            Source::File { length, .. } => *length,
        }
    }
}

/// One field of a [`Form`].
pub struct Part {
    source: Source,
    file_name: Option<String>,
    mime: Option<String>,
}

impl Part {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::bytes(value.into())
    }

    #[must_use]
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self {
            source: Source::Memory(value.into()),
            file_name: None,
            mime: None,
        }
    }

    /// A part streamed from `path`, named after the file and sent as
    /// `application/octet-stream` unless overridden.
    ///
    /// # Errors
    ///
    /// Fails when the file's metadata cannot be read.
    pub fn file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let length = std::fs::metadata(path)?.len();
        Ok(Self {
            source: Source::File {
                path: path.to_path_buf(),
                length,
            },
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            mime: Some("application/octet-stream".to_owned()),
        })
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    fn header(&self, boundary: &str, name: &str) -> Bytes {
        let mut head = BytesMut::new();
        head.put_slice(format!("--{boundary}\r\n").as_bytes());
        head.put_slice(
            format!("Content-Disposition: form-data; name=\"{}\"", escape(name)).as_bytes(),
        );
        if let Some(file_name) = &self.file_name {
            head.put_slice(format!("; filename=\"{}\"", escape(file_name)).as_bytes());
        }
        head.put_slice(b"\r\n");
        if let Some(mime) = &self.mime {
            head.put_slice(format!("Content-Type: {mime}\r\n").as_bytes());
        }
        head.put_slice(b"\r\n");
        head.freeze()
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Part");
        match &self.source {
            Source::Memory(data) => dbg.field("length", &data.len()),
            Source::File { path, length } => dbg.field("path", path).field("length", length),
        };
        dbg.field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .finish()
    }
}

/// A `multipart/form-data` body.
#[derive(Debug)]
pub struct Form {
    boundary: String,
    parts: Vec<(String, Part)>,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        let suffix: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(BOUNDARY_CHARS)
            .collect();
        Self {
            boundary: format!("courier-{suffix}"),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Add a plain text field.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(name, Part::text(value))
    }

    /// Add a file field streamed from `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file's metadata cannot be read.
    pub fn file(self, name: impl Into<String>, path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(self.part(name, Part::file(path)?))
    }

    #[must_use]
    pub fn part(mut self, name: impl Into<String>, part: Part) -> Self {
        self.parts.push((name.into(), part));
        self
    }

    /// Value for the request's `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn closing(&self) -> Bytes {
        Bytes::from(format!("--{}--\r\n", self.boundary))
    }

    /// Total encoded length.
    #[must_use]
    pub fn content_length(&self) -> u64 {
        let parts: u64 = self
            .parts
            .iter()
            .map(|(name, part)| part.header(&self.boundary, name).len() as u64 + part.source.length() + 2)
            .sum();
        parts + self.closing().len() as u64
    }

    /// Encode the form. Files are opened here and read while the body is sent.
    ///
    /// # Errors
    ///
    /// Fails when a file part cannot be opened.
    pub fn into_body(self) -> io::Result<RequestBody> {
        let length = self.content_length();
        let streamed = self
            .parts
            .iter()
            .any(|(_, part)| matches!(part.source, Source::File { .. }));

        if !streamed {
            let mut buffer = BytesMut::with_capacity(usize::try_from(length).unwrap_or(0));
            for (name, part) in &self.parts {
                buffer.put(part.header(&self.boundary, name));
                if let Source::Memory(data) = &part.source {
                    buffer.put_slice(data);
                }
                buffer.put_slice(b"\r\n");
            }
            buffer.put(self.closing());
            return Ok(RequestBody::bytes(buffer.freeze()));
        }

        let mut segments: VecDeque<Box<dyn Read + Send>> = VecDeque::new();
        for (name, part) in &self.parts {
            segments.push_back(Box::new(Cursor::new(part.header(&self.boundary, name))));
            match &part.source {
                Source::Memory(data) => segments.push_back(Box::new(Cursor::new(data.clone()))),
                Source::File { path, length } => {
                    segments.push_back(Box::new(File::open(path)?.take(*length)));
                }
            }
            segments.push_back(Box::new(Cursor::new(Bytes::from_static(b"\r\n"))));
        }
        segments.push_back(Box::new(Cursor::new(self.closing())));
        Ok(RequestBody::reader(Segments { segments }, Some(length)))
    }
}

/// Reads each segment to its end before moving to the next.
struct Segments {
    segments: VecDeque<Box<dyn Read + Send>>,
}

impl Read for Segments {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while let Some(current) = self.segments.front_mut() {
            let n = current.read(buf)?;
            if n > 0 || buf.is_empty() {
                return Ok(n);
            }
            self.segments.pop_front();
        }
        Ok(0)
    }
}

fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

impl<D> RequestBuilder<D> {
    /// Send `form` as `multipart/form-data`, replacing any `Content-Type`.
    #[must_use]
    pub fn multipart(self, form: Form) -> Self {
        self.try_map(|spec| {
            let content_type =
                HeaderValue::from_str(&form.content_type()).map_err(courier_client::error::builder)?;
            log::debug!(
                "courier: multipart body ({} parts, {} bytes)",
                form.parts.len(),
                form.content_length()
            );
            let body = form.into_body().map_err(courier_client::error::body)?;
            Ok(spec.header(CONTENT_TYPE, content_type).body(body))
        })
    }
}
