//! On-disk primitives shared by the indexing core: shard naming, temp-file
//! handling, the rotating shard-activity log, and `LargeFiles` glob matching.
//!
//! Nothing in this crate knows about the shard binary format; it only deals
//! with paths, bytes-on-disk bookkeeping, and text.

use std::path::PathBuf;

pub mod large_files;
pub mod naming;
pub mod rotate;
pub mod sweep;

pub use large_files::is_large_file;
pub use naming::{escape_repo_name, is_compound_shard, meta_path_for, shard_basename, shard_path, temp_path_for};
pub use rotate::{RotatingWriter, ShardLogAction};
pub use sweep::sweep_stale_temp_files;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
