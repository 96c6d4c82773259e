use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ConnectionInfo, ResponseConsumer};
use crate::progress::ProgressListener;

/// Writes the body straight to a file as it arrives.
///
/// Any file already at the path is removed when the request is sent. Content is the
/// path once the body has been fully written.
#[derive(Debug)]
pub struct FileConsumer {
    info: ConnectionInfo,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    error: Option<io::Error>,
    complete: bool,
    content: Option<PathBuf>,
}

impl FileConsumer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            info: ConnectionInfo::default(),
            path: path.into(),
            writer: None,
            error: None,
            complete: false,
            content: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.writer.is_none() {
            self.writer = Some(BufWriter::new(File::create(&self.path)?));
        }
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(chunk),
            None => Ok(()),
        }
    }

    fn finish_file(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => File::create(&self.path).map(drop),
        }
    }
}

impl ProgressListener for FileConsumer {}

impl ResponseConsumer for FileConsumer {
    type Content = PathBuf;

    fn connection_info(&self) -> &ConnectionInfo {
        &self.info
    }

    fn connection_info_mut(&mut self) -> &mut ConnectionInfo {
        &mut self.info
    }

    fn on_send(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.error = Some(e),
        }
    }

    fn on_byte_chunk_received(
        &mut self,
        chunk: Option<&[u8]>,
        _chunk_length: u64,
        _total_processed: u64,
        _total_length: Option<u64>,
    ) {
        if self.error.is_some() {
            return;
        }
        let result = match chunk {
            Some(chunk) => self.write_chunk(chunk),
            None => {
                self.complete = true;
                self.finish_file()
            }
        };
        if let Err(e) = result {
            tracing::warn!(
                target: "courier::consumer",
                path = %self.path.display(),
                error = %e,
                "File sink write failed"
            );
            self.writer = None;
            self.error = Some(e);
        }
    }

    fn generate_content(&mut self) -> crate::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(crate::error::body(e));
        }
        if self.complete {
            self.content = Some(self.path.clone());
        }
        Ok(())
    }

    fn content(&self) -> Option<&PathBuf> {
        self.content.as_ref()
    }

    fn take_content(&mut self) -> Option<PathBuf> {
        self.content.take()
    }
}
