use std::path::Path;

/// Remove every `*.tmp` file directly under `dir`. Safe to call at startup:
/// temp files are never renamed to anything other than their final shard
/// name, so a leftover `.tmp` always belongs to an aborted build.
pub fn sweep_stale_temp_files(dir: &Path) -> crate::Result<usize> {
    let mut removed = 0;
    let entries = std::fs::read_dir(dir).map_err(|e| crate::Error::Io { path: dir.to_path_buf(), source: e })?;
    for entry in entries {
        let entry = entry.map_err(|e| crate::Error::Io { path: dir.to_path_buf(), source: e })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tmp") && std::fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn removes_only_tmp_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.zoekt.123.tmp"), b"x").unwrap();
        fs::write(dir.path().join("b.zoekt"), b"x").unwrap();
        let removed = sweep_stale_temp_files(dir.path()).unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("a.zoekt.123.tmp").exists());
        assert!(dir.path().join("b.zoekt").exists());
    }
}
