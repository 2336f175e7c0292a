use std::path::Path;

use index_core::ShardZeroMetadata;

use crate::error::BuildError;

/// Capability a compound-shard reader/writer would expose: mark one
/// repository's data inside the compound file as tombstoned without deleting
/// the file itself, and look a repository up by name when no standalone
/// shard-zero file exists for it. Building compound shards is out of scope
/// here; this trait exists so `Builder` and `FsShardMetadataSource` can
/// depend on the capability rather than a concrete format.
pub trait CompoundShardHandle: Send + Sync {
    fn set_tombstone(&self, path: &Path, repository_id: u32) -> Result<(), BuildError>;

    /// Fallback lookup for the classification oracle's "find shard 0, else
    /// scan compound shards" rule: scan whatever compound shards this handle
    /// knows about for a repository named `repo_name`. `Ok(None)` when no
    /// compound shard format is configured, or none contains this
    /// repository.
    fn find_repository(&self, repo_name: &str) -> anyhow::Result<Option<ShardZeroMetadata>>;
}

/// Default handle: no compound-shard format is implemented, so tombstoning
/// is logged and otherwise a no-op, and lookups always report nothing found.
/// A deployment that writes compound shards would supply its own
/// `CompoundShardHandle`.
pub struct NullCompoundShardHandle;

impl CompoundShardHandle for NullCompoundShardHandle {
    fn set_tombstone(&self, path: &Path, repository_id: u32) -> Result<(), BuildError> {
        tracing::warn!(
            path = %path.display(),
            repository_id,
            "compound shard tombstoning requested but no compound shard format is configured"
        );
        Ok(())
    }

    fn find_repository(&self, _repo_name: &str) -> anyhow::Result<Option<ShardZeroMetadata>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn null_handle_never_errors() {
        let handle = NullCompoundShardHandle;
        assert!(handle.set_tombstone(&PathBuf::from("/idx/compound-0001.zoekt"), 7).is_ok());
    }

    #[test]
    fn null_handle_finds_nothing() {
        let handle = NullCompoundShardHandle;
        assert!(handle.find_repository("repo").unwrap().is_none());
    }
}
