use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use index_core::shard_writer::{read_header_and_repo, FORMAT_VERSION};
use index_core::{RepositoryDescription, ShardMetadataSource, ShardZeroMetadata};

use crate::compound::CompoundShardHandle;

/// One shard file already on disk for a repository, with its `.meta`
/// sidecar path if present.
#[derive(Debug, Clone)]
pub struct ExistingShard {
    pub shard_path: PathBuf,
    pub meta_path: Option<PathBuf>,
}

/// Filesystem-backed [`ShardMetadataSource`]: scans `index_dir` for shard
/// files belonging to a repository by the naming convention in
/// `shard_fs::naming`. When no standalone shard 0 exists, falls back to
/// `compound_handle.find_repository`, per the classification algorithm's
/// "else scan compound shards" step.
pub struct FsShardMetadataSource {
    index_dir: PathBuf,
    compound_handle: Arc<dyn CompoundShardHandle>,
}

impl FsShardMetadataSource {
    pub fn new(index_dir: impl Into<PathBuf>, compound_handle: Arc<dyn CompoundShardHandle>) -> Self {
        Self { index_dir: index_dir.into(), compound_handle }
    }

    fn shard_prefix(&self, repo_name: &str) -> String {
        format!("{}_v{}.", shard_fs::escape_repo_name(repo_name), FORMAT_VERSION)
    }

    /// Next free shard index for this repository: one past the highest
    /// numbered shard currently on disk, or 0 if none exist.
    pub fn existing_shard_count(&self, repo_name: &str) -> std::io::Result<u32> {
        if !self.index_dir.exists() {
            return Ok(0);
        }
        let prefix = self.shard_prefix(repo_name);
        let mut max_seen: Option<u32> = None;
        for entry in std::fs::read_dir(&self.index_dir)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(rest) = name.strip_prefix(&prefix) {
                if let Some(idx_str) = rest.strip_suffix(".zoekt") {
                    if let Ok(idx) = idx_str.parse::<u32>() {
                        max_seen = Some(max_seen.map_or(idx, |m| m.max(idx)));
                    }
                }
            }
        }
        Ok(max_seen.map(|m| m + 1).unwrap_or(0))
    }

    pub fn list_existing_shards(&self, repo_name: &str) -> std::io::Result<Vec<ExistingShard>> {
        let mut out = Vec::new();
        if !self.index_dir.exists() {
            return Ok(out);
        }
        let prefix = self.shard_prefix(repo_name);
        for entry in std::fs::read_dir(&self.index_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            if name.starts_with(&prefix) && name.ends_with(".zoekt") {
                let meta_path = shard_fs::meta_path_for(&path);
                let meta_path = meta_path.exists().then_some(meta_path);
                out.push(ExistingShard { shard_path: path, meta_path });
            }
        }
        Ok(out)
    }

    fn read_repository(&self, shard: &ExistingShard) -> anyhow::Result<(u32, u32, RepositoryDescription)> {
        let file = std::fs::File::open(&shard.shard_path)?;
        let (header, embedded_repo) = read_header_and_repo(BufReader::new(file))?;

        // A `.meta` sidecar, when present, carries the current repository
        // descriptor without requiring a rewrite of the shard body.
        let repo = if let Some(meta_path) = &shard.meta_path {
            let bytes = std::fs::read(meta_path)?;
            serde_json::from_slice(&bytes)?
        } else {
            embedded_repo
        };

        Ok((header.format_version, header.feature_version, repo))
    }
}

impl ShardMetadataSource for FsShardMetadataSource {
    fn read_shard_zero(&self, repo_name: &str) -> anyhow::Result<Option<ShardZeroMetadata>> {
        let path = shard_fs::shard_path(&self.index_dir, repo_name, FORMAT_VERSION, 0);
        if path.exists() {
            let shard = ExistingShard { meta_path: Some(shard_fs::meta_path_for(&path)).filter(|p| p.exists()), shard_path: path };
            let (format_version, feature_version, repository) = self.read_repository(&shard)?;
            return Ok(Some(ShardZeroMetadata { format_version, feature_version, repository }));
        }

        // No standalone shard 0: the repository may still live inside a
        // compound shard, so the oracle's "missing" verdict isn't final
        // until that's been ruled out too.
        self.compound_handle.find_repository(repo_name)
    }
}
