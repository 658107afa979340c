use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::{ChunkSource, SourceError, DEFAULT_CHUNK_SIZE};

/// Streams any async reader: a saved capture, stdin, a socket.
pub struct ReaderSource<R> {
    label: String,
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: AsyncRead + Unpin + Send> ReaderSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reader,
            buf: vec![0; DEFAULT_CHUNK_SIZE],
            done: false,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.buf = vec![0; chunk_size.max(1)];
        self
    }
}

impl ReaderSource<tokio::fs::File> {
    /// Open a saved capture file.
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| SourceError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(file, path.display().to_string()))
    }
}

impl ReaderSource<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin(), "<stdin>")
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ChunkSource for ReaderSource<R> {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        if self.done {
            return Ok(None);
        }

        let n = self
            .reader
            .read(&mut self.buf)
            .await
            .map_err(SourceError::ReadFailed)?;

        if n == 0 {
            debug!(source = %self.label, "End of stream");
            self.done = true;
            return Ok(None);
        }

        Ok(Some(self.buf[..n].to_vec()))
    }
}
