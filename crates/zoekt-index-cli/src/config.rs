use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use index_core::Options;
use serde::Deserialize;

/// Mirrors the fields of `Options` a user would reasonably want to pin in a
/// checked-in file rather than retype on every invocation. Everything is
/// optional: a config file only ever supplies defaults, CLI flags always win.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub index_dir: Option<PathBuf>,
    pub size_max: Option<usize>,
    pub trigram_max: Option<usize>,
    pub shard_max: Option<u64>,
    pub parallelism: Option<usize>,
    pub large_files: Option<Vec<String>>,
    pub ctags_path: Option<PathBuf>,
    pub ctags_must_succeed: Option<bool>,
    pub disable_ctags: Option<bool>,
    pub repository_name: Option<String>,
    pub repository_url: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Fill in `options` fields the config named, but only where the caller
    /// hasn't already set something more specific on the command line.
    /// `present` reports which fields the CLI layer actually set, so a
    /// config value never silently overrides an explicit flag.
    pub fn apply_to(&self, options: &mut Options, present: &CliPresence) {
        if !present.index_dir {
            if let Some(v) = &self.index_dir {
                options.index_dir = v.clone();
            }
        }
        if !present.size_max {
            if let Some(v) = self.size_max {
                options.size_max = v;
            }
        }
        if !present.trigram_max {
            if let Some(v) = self.trigram_max {
                options.trigram_max = v;
            }
        }
        if !present.shard_max {
            if let Some(v) = self.shard_max {
                options.shard_max = v;
            }
        }
        if !present.parallelism {
            if let Some(v) = self.parallelism {
                options.parallelism = v;
            }
        }
        if !present.large_files {
            if let Some(v) = &self.large_files {
                options.large_files = v.clone();
            }
        }
        if !present.ctags_path {
            if let Some(v) = &self.ctags_path {
                options.ctags_path = Some(v.clone());
            }
        }
        if !present.ctags_must_succeed {
            if let Some(v) = self.ctags_must_succeed {
                options.ctags_must_succeed = v;
            }
        }
        if !present.disable_ctags {
            if let Some(v) = self.disable_ctags {
                options.disable_ctags = v;
            }
        }
        if !present.repository_name {
            if let Some(v) = &self.repository_name {
                options.repository_description.name = v.clone();
            }
        }
        if !present.repository_url {
            if let Some(v) = &self.repository_url {
                options.repository_description.url = v.clone();
            }
        }
    }
}

/// Tracks which of `Options`' config-overridable fields the CLI itself set
/// explicitly, so `FileConfig::apply_to` knows not to clobber them.
#[derive(Debug, Default)]
pub struct CliPresence {
    pub index_dir: bool,
    pub size_max: bool,
    pub trigram_max: bool,
    pub shard_max: bool,
    pub parallelism: bool,
    pub large_files: bool,
    pub ctags_path: bool,
    pub ctags_must_succeed: bool,
    pub disable_ctags: bool,
    pub repository_name: bool,
    pub repository_url: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fills_only_absent_fields() {
        let config = FileConfig { size_max: Some(123), repository_name: Some("from-config".into()), ..Default::default() };
        let mut options = Options::default();
        options.size_max = 999;
        let mut present = CliPresence::default();
        present.size_max = true;

        config.apply_to(&mut options, &present);

        assert_eq!(options.size_max, 999, "CLI-set field must not be overridden by the config file");
        assert_eq!(options.repository_description.name, "from-config");
    }

    #[test]
    fn load_parses_kebab_case_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zoekt.toml");
        std::fs::write(&path, "shard-max = 2048\ndisable-ctags = true\n").unwrap();

        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.shard_max, Some(2048));
        assert_eq!(config.disable_ctags, Some(true));
    }
}
