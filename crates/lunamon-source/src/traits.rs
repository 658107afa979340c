use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by chunk sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to spawn monitor process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to open capture file {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read monitor output: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("No monitor command configured")]
    EmptyCommand,

    #[error("Monitor process {0} was not captured")]
    NotCaptured(&'static str),
}

/// Something that delivers the monitor's output a chunk at a time.
///
/// `Ok(None)` signals that the stream has terminated. Chunk boundaries are
/// arbitrary and may fall inside a line or a UTF-8 sequence.
#[async_trait]
pub trait ChunkSource: Send {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Wait for the next chunk.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SourceError>;
}

/// How to launch the monitor command.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env_vars: HashMap<String, String>,
    /// Read buffer size per chunk.
    pub chunk_size: usize,
}

pub const DEFAULT_CHUNK_SIZE: usize = 8192;

impl CommandConfig {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            working_dir: None,
            env_vars: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}
