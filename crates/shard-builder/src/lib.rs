//! The Builder state machine: buffers `Document`s, rotates shards by size,
//! drives parallel shard construction via `shard-builder::worker`, and
//! publishes results atomically. Ties together `index-core` (data model and
//! pure algorithms), `symbol-parser` (the subprocess collaborator), and
//! `shard-fs` (naming, rotation, sweeping).

pub mod builder;
pub mod classify;
pub mod compound;
pub mod error;
pub mod metadata;
pub mod run_id;
pub mod worker;

pub use builder::Builder;
pub use compound::{CompoundShardHandle, NullCompoundShardHandle};
pub use error::{BuildError, Result};
pub use metadata::{ExistingShard, FsShardMetadataSource};
pub use run_id::generate_run_id;
