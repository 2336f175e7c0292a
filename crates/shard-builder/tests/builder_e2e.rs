use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use index_core::{BranchRef, Document, Options};
use shard_builder::{Builder, FsShardMetadataSource, NullCompoundShardHandle};

fn list_shards(dir: &Path, repo_name: &str) -> Vec<PathBuf> {
    let prefix = format!("{}_v{}.", shard_fs::escape_repo_name(repo_name), index_core::shard_writer::FORMAT_VERSION);
    let mut out: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix) && n.ends_with(".zoekt"))
                .unwrap_or(false)
        })
        .collect();
    out.sort();
    out
}

fn read_all_documents(path: &Path) -> (index_core::ShardHeader, index_core::RepositoryDescription, Vec<index_core::DocumentRecord>) {
    let file = std::fs::File::open(path).unwrap();
    let (mut reader, header, repo) = index_core::FramedShardReader::open(std::io::BufReader::new(file)).unwrap();
    let mut docs = Vec::new();
    while let Some(doc) = reader.next_document().unwrap() {
        docs.push(doc);
    }
    (header, repo, docs)
}

fn base_options(dir: &Path, repo_name: &str) -> Options {
    let mut o = Options::default();
    o.index_dir = dir.to_path_buf();
    o.disable_ctags = true;
    o.repository_description.name = repo_name.to_string();
    o
}

#[tokio::test]
async fn s1_equal_sized_files_each_land_in_their_own_shard() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = base_options(dir.path(), "repo");
    options.shard_max = 1024;
    options.parallelism = 1;
    options.size_max = 1 << 20;

    let mut builder = Builder::new(options, Arc::new(NullCompoundShardHandle)).unwrap();
    for i in 0..4u8 {
        builder.add(Document::new(format!("F{i}"), vec![b'0' + i; 1000]));
    }
    builder.finish().await.unwrap();

    let shards = list_shards(dir.path(), "repo");
    assert_eq!(shards.len(), 4);

    let mut run_ids = HashSet::new();
    let mut index_times = HashSet::new();
    let mut owner_of_111 = None;
    for path in &shards {
        let (header, _repo, docs) = read_all_documents(path);
        run_ids.insert(header.run_id);
        index_times.insert(header.index_time_unix_ms);
        for doc in docs {
            if doc.content == vec![b'1'; 1000] {
                owner_of_111 = Some(doc.name);
            }
        }
    }
    assert_eq!(run_ids.len(), 1, "every shard from one build shares a run id");
    assert_eq!(index_times.len(), 1, "every shard from one build shares an index time");
    assert_eq!(owner_of_111.as_deref(), Some("F1"));
}

#[tokio::test]
async fn s2_large_files_override_bypasses_size_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = base_options(dir.path(), "repo");
    options.size_max = 1000;
    options.large_files = vec!["F0".into(), "F1".into(), "F2".into(), "!F1".into()];

    let mut builder = Builder::new(options, Arc::new(NullCompoundShardHandle)).unwrap();
    for i in 0..4u8 {
        builder.add(Document::new(format!("F{i}"), vec![b'a'; 1001]));
    }
    builder.finish().await.unwrap();

    let shards = list_shards(dir.path(), "repo");
    let mut indexed: Vec<String> = Vec::new();
    for path in &shards {
        let (_h, _r, docs) = read_all_documents(path);
        indexed.extend(docs.into_iter().filter(|d| d.skip_reason.is_none()).map(|d| d.name));
    }
    indexed.sort();
    assert_eq!(indexed, vec!["F0".to_string(), "F2".to_string()]);
}

#[tokio::test]
async fn s3_rebuild_with_identical_options_is_equal() {
    let dir = tempfile::tempdir().unwrap();

    let mut builder = Builder::new(base_options(dir.path(), "repo"), Arc::new(NullCompoundShardHandle)).unwrap();
    builder.add(Document::new("a.go", b"package main".to_vec()));
    builder.finish().await.unwrap();

    let mut options = base_options(dir.path(), "repo");
    options.apply_defaults();
    options.repository_description.index_options = index_core::hash_options(&options);

    let source = FsShardMetadataSource::new(dir.path(), Arc::new(NullCompoundShardHandle));
    let state = index_core::classify(&source, &options);
    assert_eq!(state, index_core::IndexState::Equal);
    assert!(state.incremental_skip_indexing());
}

#[tokio::test]
async fn s4_delta_tombstones_changed_files_in_old_shards() {
    let dir = tempfile::tempdir().unwrap();
    let main = BranchRef { name: "main".into(), version: "v1".into() };
    let release = BranchRef { name: "release".into(), version: "v1".into() };

    let mut first = base_options(dir.path(), "repo");
    first.repository_description.branches = vec![main.clone(), release.clone()];

    let mut builder = Builder::new(first, Arc::new(NullCompoundShardHandle)).unwrap();
    builder.add(Document { branches: vec!["main".into()], ..Document::new("bar.go", b"package main".to_vec()) });
    builder.add(Document {
        branches: vec!["main".into(), "release".into()],
        ..Document::new("foo.go", b"package main".to_vec())
    });
    builder.finish().await.unwrap();

    let mut delta = base_options(dir.path(), "repo");
    delta.is_delta = true;
    delta.changed_or_removed_files = vec!["foo.go".into()];
    delta.repository_description.branches = vec![main, release];

    let mut delta_builder = Builder::new(delta, Arc::new(NullCompoundShardHandle)).unwrap();
    delta_builder.finish().await.unwrap();

    let shard0 = shard_fs::shard_path(dir.path(), "repo", index_core::shard_writer::FORMAT_VERSION, 0);
    let meta_path = shard_fs::meta_path_for(&shard0);
    assert!(meta_path.exists(), "delta build should have written a .meta sidecar for the old shard");

    let repo: index_core::RepositoryDescription = serde_json::from_slice(&std::fs::read(meta_path).unwrap()).unwrap();
    assert!(repo.file_tombstones.contains("foo.go"));
}

#[tokio::test]
async fn s5_failed_build_leaves_no_temp_or_shard_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = base_options(dir.path(), "repo");
    options.disable_ctags = false;
    options.ctags_must_succeed = true;
    // `true` exits immediately without speaking the parser's framing
    // protocol, which is enough to make every parse call fail.
    options.ctags_path = Some(PathBuf::from("/bin/true"));

    let mut builder = Builder::new(options, Arc::new(NullCompoundShardHandle)).unwrap();
    for i in 0..4u8 {
        builder.add(Document::new(format!("F{i}"), vec![b'a'; 10]));
    }
    let result = builder.finish().await;
    assert!(result.is_err());

    let leftover: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".zoekt") || name.ends_with(".tmp"))
        .collect();
    assert!(leftover.is_empty(), "unexpected leftover build artifacts: {leftover:?}");
}

#[tokio::test]
async fn s6_binary_document_is_recorded_with_skip_reason() {
    let dir = tempfile::tempdir().unwrap();
    let options = base_options(dir.path(), "repo");

    let mut content = b"header__".to_vec();
    content.extend_from_slice(&[0u8; 100]);

    let mut builder = Builder::new(options, Arc::new(NullCompoundShardHandle)).unwrap();
    builder.add(Document::new("data.bin", content));
    builder.finish().await.unwrap();

    let shards = list_shards(dir.path(), "repo");
    assert_eq!(shards.len(), 1);
    let (_h, _r, docs) = read_all_documents(&shards[0]);
    assert_eq!(docs.len(), 1);
    assert!(docs[0].skip_reason.is_some());
    assert_eq!(docs[0].language.as_deref(), Some("binary"));
}

#[tokio::test]
async fn finish_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = Builder::new(base_options(dir.path(), "repo"), Arc::new(NullCompoundShardHandle)).unwrap();
    builder.add(Document::new("a.go", b"package main".to_vec()));

    builder.finish().await.unwrap();
    let shards_after_first = list_shards(dir.path(), "repo").len();

    // A second call returns the same (successful) outcome without touching
    // the filesystem again.
    builder.finish().await.unwrap();
    assert_eq!(list_shards(dir.path(), "repo").len(), shards_after_first);
}
