use std::path::{Path, PathBuf};

use url::form_urlencoded;

/// Shard basenames are truncated to this many escaped characters before the
/// disambiguating hash suffix is appended. Matches the upstream limit that
/// keeps shard filenames well under common filesystem path-length limits.
const MAX_ESCAPED_LEN: usize = 200;

/// URL-query-escape a repository name for use in a shard filename, truncating
/// and disambiguating with a content hash when the escaped form is too long.
pub fn escape_repo_name(name: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    if escaped.chars().count() <= MAX_ESCAPED_LEN {
        return escaped;
    }
    let hash = blake3::hash(name.as_bytes());
    let hex8 = &hash.to_hex()[..8];
    let truncated: String = escaped.chars().take(MAX_ESCAPED_LEN).collect();
    format!("{truncated}{hex8}")
}

/// `<escaped-name>_v<format>.<shard-index:05>.zoekt`
pub fn shard_basename(repo_name: &str, format_version: u32, shard_index: u32) -> String {
    format!(
        "{}_v{}.{:05}.zoekt",
        escape_repo_name(repo_name),
        format_version,
        shard_index
    )
}

pub fn shard_path(index_dir: &Path, repo_name: &str, format_version: u32, shard_index: u32) -> PathBuf {
    index_dir.join(shard_basename(repo_name, format_version, shard_index))
}

/// `.meta` sibling of a shard path, carrying mutable metadata without a
/// rewrite of the shard body.
pub fn meta_path_for(shard_path: &Path) -> PathBuf {
    let mut s = shard_path.as_os_str().to_os_string();
    s.push(".meta");
    PathBuf::from(s)
}

/// `<final>.<uniq>.tmp`, always ending in `.tmp` so a startup sweep can find
/// it by name pattern alone.
pub fn temp_path_for(final_path: &Path, uniq: &str) -> PathBuf {
    let mut s = final_path.as_os_str().to_os_string();
    s.push(".");
    s.push(uniq);
    s.push(".tmp");
    PathBuf::from(s)
}

/// Compound shards are read-only containers for several repositories,
/// identified purely by filename convention.
pub fn is_compound_shard(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("compound-"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_roundtrips() {
        let base = shard_basename("github.com/acme/widgets", 17, 0);
        assert_eq!(base, "github.com%2Facme%2Fwidgets_v17.00000.zoekt");
    }

    #[test]
    fn long_name_truncates_and_hashes() {
        let long_name = "x".repeat(500);
        let escaped = escape_repo_name(&long_name);
        assert_eq!(escaped.len(), MAX_ESCAPED_LEN + 8);
        assert!(escaped.ends_with(&blake3::hash(long_name.as_bytes()).to_hex()[..8]));
    }

    #[test]
    fn meta_and_temp_paths() {
        let shard = PathBuf::from("/idx/repo_v17.00000.zoekt");
        assert_eq!(meta_path_for(&shard), PathBuf::from("/idx/repo_v17.00000.zoekt.meta"));
        let tmp = temp_path_for(&shard, "ab12");
        assert_eq!(tmp, PathBuf::from("/idx/repo_v17.00000.zoekt.ab12.tmp"));
    }

    #[test]
    fn compound_shard_detection() {
        assert!(is_compound_shard(Path::new("/idx/compound-0001.zoekt")));
        assert!(!is_compound_shard(Path::new("/idx/repo_v17.00000.zoekt")));
    }
}
