//! Data model, ranking, symbol-section resolution, option fingerprinting,
//! the shard binary format, and the `IndexState` oracle for the zoekt
//! indexing core. Everything here is synchronous and has no opinion about
//! concurrency, filesystem layout, or subprocess management — those belong
//! to `shard-fs`, `symbol-parser`, and `shard-builder`.

pub mod document;
pub mod error;
pub mod fingerprint;
pub mod options;
pub mod rank;
pub mod repository;
pub mod sections;
pub mod shard_writer;
pub mod state;
pub mod trigram;

pub use document::{Document, SymbolMetaData};
pub use error::{Error, Result};
pub use fingerprint::hash_options;
pub use options::Options;
pub use rank::{rank_key, sort_batch, squash, RankKey};
pub use repository::{BranchRef, RepositoryDescription, SubRepository};
pub use sections::{tags_to_sections, SymbolEntry};
pub use shard_writer::{DocumentRecord, FramedShardReader, FramedShardWriter, ShardHeader};
pub use state::{classify, IndexState, ShardMetadataSource, ShardZeroMetadata};
pub use trigram::{binary_check, contains_nul, distinct_trigram_count};
