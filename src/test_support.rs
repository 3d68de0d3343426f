use crate::api::ByteStream;
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::stream;
use tokio::sync::Mutex as AsyncMutex;

/// Process-wide lock for tests that mutate environment variables.
/// Use `.blocking_lock()` in sync tests and `.lock().await` in async tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// A transport that delivers `chunks` exactly as split, then closes.
pub fn chunk_stream(chunks: &[&str]) -> ByteStream {
    let items: Vec<Result<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from(chunk.to_string())))
        .collect();
    Box::pin(stream::iter(items))
}

/// Like [`chunk_stream`], but fails with `message` after the last chunk.
pub fn failing_chunk_stream(chunks: &[&str], message: &str) -> ByteStream {
    let mut items: Vec<Result<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from(chunk.to_string())))
        .collect();
    items.push(Err(anyhow!("{message}")));
    Box::pin(stream::iter(items))
}
