use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubRepository {
    pub path: String,
    pub name: String,
}

/// Static metadata attached to every shard produced for a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDescription {
    pub name: String,
    pub id: u32,
    pub url: String,
    pub branches: Vec<BranchRef>,
    pub commit_url_template: String,
    pub file_url_template: String,
    pub line_fragment_template: String,
    /// Hex fingerprint of build options that affect shard content. Filled
    /// in by the Builder from `fingerprint::hash_options`, not by callers.
    pub index_options: String,
    pub file_tombstones: BTreeSet<String>,
    pub raw_config: BTreeMap<String, String>,
    pub latest_commit_date: Option<DateTime<Utc>>,
    pub rank: u16,
    pub has_symbols: bool,
    pub sub_repositories: BTreeMap<String, SubRepository>,
}

impl Default for RepositoryDescription {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            url: String::new(),
            branches: Vec::new(),
            commit_url_template: String::new(),
            file_url_template: String::new(),
            line_fragment_template: String::new(),
            index_options: String::new(),
            file_tombstones: BTreeSet::new(),
            raw_config: BTreeMap::new(),
            latest_commit_date: None,
            rank: 0,
            has_symbols: false,
            sub_repositories: BTreeMap::new(),
        }
    }
}

impl RepositoryDescription {
    pub fn branch_name_set(&self) -> BTreeSet<&str> {
        self.branches.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn branch_version_set(&self) -> BTreeSet<(&str, &str)> {
        self.branches.iter().map(|b| (b.name.as_str(), b.version.as_str())).collect()
    }

    /// True if any field considered immutable after first publication
    /// differs between `self` (on disk) and `requested`.
    pub fn immutable_fields_differ(&self, requested: &RepositoryDescription) -> bool {
        self.name != requested.name
            || self.id != requested.id
            || self.url != requested.url
            || self.commit_url_template != requested.commit_url_template
            || self.file_url_template != requested.file_url_template
            || self.line_fragment_template != requested.line_fragment_template
    }

    /// True if any mutable field (tombstones, raw config, commit date, rank,
    /// symbol flag, sub-repositories) differs. Branches and IndexOptions are
    /// compared separately by the caller, per the state-oracle algorithm.
    pub fn mutable_fields_differ(&self, requested: &RepositoryDescription) -> bool {
        self.file_tombstones != requested.file_tombstones
            || self.raw_config != requested.raw_config
            || self.latest_commit_date != requested.latest_commit_date
            || self.rank != requested.rank
            || self.has_symbols != requested.has_symbols
            || self.sub_repositories != requested.sub_repositories
    }

    /// Apply the delta-mode old-shard update: add newly changed/removed
    /// files to the tombstone set and overwrite the branch list wholesale.
    /// Upstream performs this overwrite without checking for branch-set
    /// drift; see DESIGN.md for why that is preserved here.
    pub fn apply_delta_update(&mut self, changed_or_removed: &[String], new_branches: &[BranchRef]) {
        self.file_tombstones.extend(changed_or_removed.iter().cloned());
        self.branches = new_branches.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> RepositoryDescription {
        RepositoryDescription { name: name.to_string(), ..Default::default() }
    }

    #[test]
    fn immutable_diff_catches_renamed_url() {
        let a = repo("acme/widgets");
        let mut b = repo("acme/widgets");
        b.url = "https://example.com".into();
        assert!(a.immutable_fields_differ(&b));
    }

    #[test]
    fn mutable_diff_ignores_tombstones_and_rank_for_immutable_check() {
        let a = repo("acme/widgets");
        let mut b = repo("acme/widgets");
        b.rank = 5;
        assert!(!a.immutable_fields_differ(&b));
        assert!(a.mutable_fields_differ(&b));
    }

    #[test]
    fn delta_update_unions_tombstones_and_overwrites_branches() {
        let mut a = repo("acme/widgets");
        a.file_tombstones.insert("old.go".into());
        let new_branches = vec![BranchRef { name: "main".into(), version: "deadbeef".into() }];
        a.apply_delta_update(&["foo.go".to_string()], &new_branches);
        assert!(a.file_tombstones.contains("old.go"));
        assert!(a.file_tombstones.contains("foo.go"));
        assert_eq!(a.branches, new_branches);
    }
}
