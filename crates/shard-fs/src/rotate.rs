use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

const MAX_BYTES: u64 = 100 * 1024 * 1024;
const MAX_BACKUPS: u32 = 5;

pub enum ShardLogAction {
    Upsert,
    Remove,
    Tomb,
}

impl ShardLogAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Remove => "remove",
            Self::Tomb => "tomb",
        }
    }
}

/// Append-only, tab-separated shard-activity log. One line per publication
/// action: `<RFC3339>\t<action>\t<shard basename>\t<size bytes>\t<repo name>`.
/// Rotates at 100 MiB, keeping 5 numbered backups.
pub struct RotatingWriter {
    path: PathBuf,
    file: BufWriter<File>,
    size: u64,
}

impl RotatingWriter {
    pub fn open(dir: &Path) -> crate::Result<Self> {
        let path = dir.join("zoekt-builder-shard-log.tsv");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| crate::Error::Io { path: path.clone(), source: e })?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self { path, file: BufWriter::new(file), size })
    }

    pub fn log(&mut self, action: ShardLogAction, shard_basename: &str, size_bytes: u64, repo_name: &str) -> crate::Result<()> {
        let line = format!(
            "{}\t{}\t{}\t{}\t{}\n",
            Utc::now().to_rfc3339(),
            action.as_str(),
            shard_basename,
            size_bytes,
            repo_name
        );
        self.write_line(&line)?;
        if self.size >= MAX_BYTES {
            self.rotate()?;
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> crate::Result<()> {
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| crate::Error::Io { path: self.path.clone(), source: e })?;
        self.size += line.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> crate::Result<()> {
        self.file
            .flush()
            .map_err(|e| crate::Error::Io { path: self.path.clone(), source: e })?;
        for gen in (1..MAX_BACKUPS).rev() {
            let src = backup_path(&self.path, gen);
            let dst = backup_path(&self.path, gen + 1);
            if src.exists() {
                let _ = fs::rename(&src, &dst);
            }
        }
        fs::rename(&self.path, backup_path(&self.path, 1))
            .map_err(|e| crate::Error::Io { path: self.path.clone(), source: e })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| crate::Error::Io { path: self.path.clone(), source: e })?;
        self.file = BufWriter::new(file);
        self.size = 0;
        Ok(())
    }
}

fn backup_path(path: &Path, gen: u32) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(format!(".{gen}"));
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_tab_separated_lines() {
        let dir = tempdir().unwrap();
        let mut w = RotatingWriter::open(dir.path()).unwrap();
        w.log(ShardLogAction::Upsert, "repo_v17.00000.zoekt", 1024, "repo").unwrap();
        let contents = fs::read_to_string(dir.path().join("zoekt-builder-shard-log.tsv")).unwrap();
        let fields: Vec<&str> = contents.trim_end().split('\t').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[1], "upsert");
        assert_eq!(fields[2], "repo_v17.00000.zoekt");
        assert_eq!(fields[3], "1024");
        assert_eq!(fields[4], "repo");
    }

    #[test]
    fn rotates_when_oversize() {
        let dir = tempdir().unwrap();
        let mut w = RotatingWriter::open(dir.path()).unwrap();
        w.size = MAX_BYTES;
        w.log(ShardLogAction::Remove, "x.zoekt", 0, "repo").unwrap();
        assert!(dir.path().join("zoekt-builder-shard-log.tsv.1").exists());
        assert!(dir.path().join("zoekt-builder-shard-log.tsv").exists());
    }
}
