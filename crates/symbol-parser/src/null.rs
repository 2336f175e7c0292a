use async_trait::async_trait;
use index_core::SymbolEntry;

use crate::error::Result;
use crate::source::SymbolSource;

/// Sentinel used when the configured ctags-like binary is absent. Every
/// call succeeds with no entries; it is the caller's job (at `Builder::new`)
/// to fail the build instead when `ctags_must_succeed` is set.
pub struct NullSymbolSource;

#[async_trait]
impl SymbolSource for NullSymbolSource {
    async fn parse(&self, _name: &str, _content: &[u8]) -> Result<Vec<SymbolEntry>> {
        Ok(Vec::new())
    }

    async fn close(&self) {}
}
