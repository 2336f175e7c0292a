use crate::fingerprint::hash_options;
use crate::options::Options;
use crate::repository::RepositoryDescription;
use crate::shard_writer::FEATURE_VERSION;

/// Classification of existing on-disk state against a proposed build,
/// exposed as the exact strings external tools branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Missing,
    Corrupt,
    VersionMismatch,
    OptionMismatch,
    MetaMismatch,
    ContentMismatch,
    BranchSetMismatch,
    BranchVersionMismatch,
    Equal,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Corrupt => "corrupt",
            Self::VersionMismatch => "version-mismatch",
            Self::OptionMismatch => "option-mismatch",
            Self::MetaMismatch => "meta-mismatch",
            Self::ContentMismatch => "content-mismatch",
            Self::BranchSetMismatch => "branch-set-mismatch",
            Self::BranchVersionMismatch => "branch-version-mismatch",
            Self::Equal => "equal",
        }
    }

    /// `true` for the states under which a caller may skip reindexing.
    pub fn incremental_skip_indexing(&self) -> bool {
        matches!(self, Self::Equal | Self::MetaMismatch)
    }
}

/// What a shard-zero lookup returned: the format/feature the shard was
/// written with, and the repository descriptor embedded in it (or in its
/// `.meta` sidecar, if the caller's implementation prefers that).
pub struct ShardZeroMetadata {
    pub format_version: u32,
    pub feature_version: u32,
    pub repository: RepositoryDescription,
}

/// Implemented by the filesystem-backed lookup in `shard-builder`; kept as a
/// trait here so the oracle's decision logic can be unit-tested without
/// touching disk.
pub trait ShardMetadataSource {
    /// `Ok(None)` when no shard exists for this repository. `Err` for any
    /// other read failure (maps to `IndexState::Corrupt`).
    fn read_shard_zero(&self, repo_name: &str) -> anyhow::Result<Option<ShardZeroMetadata>>;
}

/// Compare `options` against whatever `source` reports for this repository
/// and classify the action required, per the nine-way taxonomy.
pub fn classify(source: &dyn ShardMetadataSource, options: &Options) -> IndexState {
    let zero = match source.read_shard_zero(&options.repository_description.name) {
        Ok(Some(z)) => z,
        Ok(None) => return IndexState::Missing,
        Err(_) => return IndexState::Corrupt,
    };

    if zero.format_version != crate::shard_writer::FORMAT_VERSION || zero.feature_version != FEATURE_VERSION {
        return IndexState::VersionMismatch;
    }

    let on_disk = &zero.repository;
    let requested = &options.repository_description;

    if on_disk.name != requested.name {
        return IndexState::Corrupt;
    }

    let expected_fingerprint = hash_options(options);
    if on_disk.index_options != expected_fingerprint {
        return IndexState::OptionMismatch;
    }

    if options.is_delta {
        if on_disk.branch_name_set() != requested.branch_name_set() {
            return IndexState::BranchSetMismatch;
        }
        if on_disk.branch_version_set() != requested.branch_version_set() {
            return IndexState::BranchVersionMismatch;
        }
    } else if on_disk.branches != requested.branches {
        return IndexState::ContentMismatch;
    }

    if on_disk.immutable_fields_differ(requested) {
        return IndexState::ContentMismatch;
    }

    if on_disk.mutable_fields_differ(requested) {
        return IndexState::MetaMismatch;
    }

    IndexState::Equal
}
