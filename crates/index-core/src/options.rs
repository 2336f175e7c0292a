use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::repository::RepositoryDescription;

pub const DEFAULT_PARALLELISM: usize = 4;
pub const DEFAULT_SIZE_MAX: usize = 2 * 1024 * 1024;
pub const DEFAULT_SHARD_MAX: u64 = 100 * 1024 * 1024;
pub const DEFAULT_TRIGRAM_MAX: usize = 20_000;

/// The build request. Mirrors the upstream `Options` struct; defaults are
/// applied explicitly via [`Options::apply_defaults`] before any stateful
/// construction, never implicitly inside `Builder::new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    pub index_dir: PathBuf,
    pub size_max: usize,
    pub trigram_max: usize,
    pub shard_max: u64,
    pub parallelism: usize,
    pub large_files: Vec<String>,
    pub ctags_path: Option<PathBuf>,
    pub ctags_must_succeed: bool,
    pub disable_ctags: bool,
    pub is_delta: bool,
    pub changed_or_removed_files: Vec<String>,
    pub repository_description: RepositoryDescription,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("."),
            size_max: 0,
            trigram_max: 0,
            shard_max: 0,
            parallelism: 0,
            large_files: Vec::new(),
            ctags_path: None,
            ctags_must_succeed: false,
            disable_ctags: false,
            is_delta: false,
            changed_or_removed_files: Vec::new(),
            repository_description: RepositoryDescription::default(),
        }
    }
}

impl Options {
    /// Fill in zero-valued fields with their documented defaults. Idempotent.
    pub fn apply_defaults(&mut self) {
        if self.parallelism == 0 {
            self.parallelism = DEFAULT_PARALLELISM;
        }
        if self.size_max == 0 {
            self.size_max = DEFAULT_SIZE_MAX;
        }
        if self.shard_max == 0 {
            self.shard_max = DEFAULT_SHARD_MAX;
        }
        if self.trigram_max == 0 {
            self.trigram_max = DEFAULT_TRIGRAM_MAX;
        }
    }

    /// Validate the subset of preconditions `Builder::new` must check before
    /// constructing any stateful resources.
    pub fn validate(&self) -> Result<()> {
        if self.repository_description.name.trim().is_empty() {
            return Err(Error::Configuration("RepositoryDescription.Name must be set".into()));
        }
        if self.ctags_must_succeed && self.disable_ctags {
            return Err(Error::Configuration(
                "ctags_must_succeed requires ctags to be enabled".into(),
            ));
        }
        Ok(())
    }
}
