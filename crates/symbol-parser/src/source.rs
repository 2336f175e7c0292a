use async_trait::async_trait;
use index_core::SymbolEntry;

use crate::error::Result;

/// A collaborator capable of extracting symbol entries from one file's
/// content. Serialization (one request in flight at a time) and
/// subprocess lifetime are implementation details of concrete sources.
#[async_trait]
pub trait SymbolSource: Send + Sync {
    async fn parse(&self, name: &str, content: &[u8]) -> Result<Vec<SymbolEntry>>;

    /// Release any held resources (subprocess, pipes). Idempotent.
    async fn close(&self);
}
