//! Chunk sources for lunamon.
//!
//! These are the only pieces that touch processes or files. They hand raw
//! output to the caller one chunk at a time and report termination; they
//! know nothing about the trace format.

mod process;
mod reader;
mod traits;

pub use process::ProcessSource;
pub use reader::ReaderSource;
pub use traits::{ChunkSource, CommandConfig, SourceError, DEFAULT_CHUNK_SIZE};

/// Drain a source completely, concatenating every chunk.
pub async fn read_to_end(source: &mut dyn ChunkSource) -> Result<Vec<u8>, SourceError> {
    let mut out = Vec::new();
    while let Some(chunk) = source.next_chunk().await? {
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}
