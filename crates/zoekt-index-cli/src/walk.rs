use std::path::Path;

use anyhow::{Context, Result};
use index_core::Document;

/// Walks `root` recursively and turns every regular file into a `Document`
/// named by its path relative to `root`, tagged with `branch`. Acquiring
/// documents from a real VCS is explicitly out of scope here; this is the
/// simplest thing that can feed a `Builder` from a directory on disk.
pub fn collect_documents(root: &Path, branch: &str) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    walk(root, root, branch, &mut docs)?;
    docs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(docs)
}

fn walk(root: &Path, dir: &Path, branch: &str, out: &mut Vec<Document>) -> Result<()> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if entry.file_name() == ".git" {
                continue;
            }
            walk(root, &path, branch, out)?;
        } else if file_type.is_file() {
            let content = std::fs::read(&path).with_context(|| format!("reading file {}", path.display()))?;
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.push(Document { branches: vec![branch.to_string()], ..Document::new(relative, content) });
        }
    }
    Ok(())
}
