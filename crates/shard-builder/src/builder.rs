use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use index_core::{Document, Options, RepositoryDescription};
use shard_fs::{RotatingWriter, ShardLogAction};
use symbol_parser::SymbolSource;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::classify;
use crate::compound::CompoundShardHandle;
use crate::error::BuildError;
use crate::metadata::{ExistingShard, FsShardMetadataSource};
use crate::run_id::generate_run_id;
use crate::worker;

struct PendingState {
    artifacts: HashMap<PathBuf, PathBuf>,
    first_error: Option<BuildError>,
}

/// Top-level state machine: buffers `Add`ed documents, rotates shards by
/// size, drives a bounded pool of shard-building workers, and publishes
/// the results atomically on `finish`.
///
/// Not safe for concurrent use from multiple tasks — `add`, `flush`, and
/// `finish` must all be called from the single task that owns the Builder.
pub struct Builder {
    options: Options,
    symbol_source: Arc<dyn SymbolSource>,
    metadata_source: FsShardMetadataSource,
    compound_handle: Arc<dyn CompoundShardHandle>,
    shard_log: Arc<Mutex<RotatingWriter>>,
    semaphore: Arc<Semaphore>,
    pending: Arc<Mutex<PendingState>>,
    workers: Vec<JoinHandle<()>>,
    buffer: Vec<Document>,
    buffered_size: u64,
    next_shard_index: u32,
    index_time_unix_ms: i64,
    run_id: String,
    finished: Option<std::result::Result<(), String>>,
}

impl Builder {
    /// Validates `options`, initializes the run ID and index timestamp, and
    /// (in delta mode) reads the count of existing shards to pick the
    /// starting shard index.
    pub fn new(mut options: Options, compound_handle: Arc<dyn CompoundShardHandle>) -> Result<Self, BuildError> {
        options.apply_defaults();
        options.validate().map_err(|e| BuildError::Configuration(e.to_string()))?;

        if !options.disable_ctags && options.ctags_must_succeed {
            let available = options.ctags_path.as_deref().map(|p| p.exists()).unwrap_or(false);
            if !available {
                return Err(BuildError::Configuration(
                    "ctags_must_succeed is set but no ctags binary is available".into(),
                ));
            }
        }

        let symbol_source: Arc<dyn SymbolSource> = if options.disable_ctags {
            Arc::new(symbol_parser::NullSymbolSource)
        } else {
            symbol_parser::new_symbol_source(options.ctags_path.as_deref())
        };

        std::fs::create_dir_all(&options.index_dir)
            .map_err(|e| BuildError::Io { path: options.index_dir.clone(), source: e })?;

        let metadata_source = FsShardMetadataSource::new(options.index_dir.clone(), Arc::clone(&compound_handle));
        let next_shard_index = if options.is_delta {
            metadata_source
                .existing_shard_count(&options.repository_description.name)
                .map_err(|e| BuildError::Io { path: options.index_dir.clone(), source: e })?
        } else {
            0
        };

        let shard_log = RotatingWriter::open(&options.index_dir).map_err(|e| BuildError::Configuration(e.to_string()))?;

        let parallelism = options.parallelism.max(1);

        Ok(Self {
            run_id: generate_run_id(),
            index_time_unix_ms: Utc::now().timestamp_millis(),
            semaphore: Arc::new(Semaphore::new(parallelism)),
            metadata_source,
            compound_handle,
            symbol_source,
            shard_log: Arc::new(Mutex::new(shard_log)),
            pending: Arc::new(Mutex::new(PendingState { artifacts: HashMap::new(), first_error: None })),
            workers: Vec::new(),
            buffer: Vec::new(),
            buffered_size: 0,
            next_shard_index,
            finished: None,
            options,
        })
    }

    /// Classifies `doc` (oversized / binary / normal), updates the size
    /// accumulator, and triggers a flush once the accumulator crosses
    /// `shard_max`.
    pub fn add(&mut self, mut doc: Document) {
        let contributed = classify::classify_and_accumulate(
            &mut doc,
            &self.options.large_files,
            self.options.size_max,
            self.options.trigram_max,
        ) as u64;

        // Rotate *before* absorbing a document that would push the running
        // total over the threshold, rather than after: this is what keeps a
        // sequence of same-sized documents each landing in their own shard
        // instead of pairing up across the boundary.
        if !self.buffer.is_empty() && self.buffered_size + contributed > self.options.shard_max {
            self.flush();
        }
        self.buffered_size += contributed;
        self.buffer.push(doc);
    }

    /// Records that `path` must be tombstoned in older shards at `finish`
    /// time. Only meaningful in delta mode.
    pub fn mark_file_as_changed_or_removed(&mut self, path: impl Into<String>) {
        self.options.changed_or_removed_files.push(path.into());
    }

    /// Dispatches the current buffer to a worker. A no-op if the buffer is
    /// empty, or if a previous worker has already recorded the first error
    /// (further flushes can't change a build that's already doomed).
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        if let Ok(guard) = self.pending.try_lock() {
            if guard.first_error.is_some() {
                self.buffer.clear();
                self.buffered_size = 0;
                return;
            }
        }

        let batch = std::mem::take(&mut self.buffer);
        self.buffered_size = 0;
        let shard_index = self.next_shard_index;
        self.next_shard_index += 1;

        let options = self.options.clone();
        let symbol_source = Arc::clone(&self.symbol_source);
        let pending = Arc::clone(&self.pending);
        let semaphore = Arc::clone(&self.semaphore);
        let run_id = self.run_id.clone();
        let index_time = self.index_time_unix_ms;

        let handle = tokio::spawn(async move {
            // Acquiring the permit inside the worker (not before spawning)
            // keeps `Add`/`flush` non-blocking: dispatch never waits on a
            // free slot, only the worker itself does.
            let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
            let result = worker::build_shard(batch, shard_index, &options, symbol_source.as_ref(), index_time, &run_id).await;
            let mut guard = pending.lock().await;
            match result {
                Ok((temp, final_path)) => {
                    guard.artifacts.insert(temp, final_path);
                }
                Err(e) => {
                    if guard.first_error.is_none() {
                        guard.first_error = Some(e);
                    }
                }
            }
        });
        self.workers.push(handle);
    }

    /// Flushes the remaining buffer, waits for every worker, and either
    /// promotes all temp shards or cleans them up. Idempotent: a second call
    /// returns the first call's outcome without touching the filesystem
    /// again.
    pub async fn finish(&mut self) -> Result<(), BuildError> {
        if let Some(outcome) = &self.finished {
            return match outcome {
                Ok(()) => Ok(()),
                Err(msg) => Err(BuildError::Repeated(msg.clone())),
            };
        }

        self.flush();

        for handle in std::mem::take(&mut self.workers) {
            let _ = handle.await;
        }

        let outcome = self.publish().await;
        self.finished = Some(outcome.as_ref().map(|_| ()).map_err(|e| e.to_string()));
        self.symbol_source.close().await;
        outcome
    }

    async fn publish(&mut self) -> Result<(), BuildError> {
        let mut pending = self.pending.lock().await;
        if let Some(err) = pending.first_error.take() {
            for temp in pending.artifacts.keys() {
                let _ = std::fs::remove_file(temp);
            }
            pending.artifacts.clear();
            return Err(err);
        }
        let mut artifacts = std::mem::take(&mut pending.artifacts);
        drop(pending);

        let repo_name = self.options.repository_description.name.clone();

        if self.options.is_delta {
            let existing = self
                .metadata_source
                .list_existing_shards(&repo_name)
                .map_err(|e| BuildError::Metadata(e.to_string()))?;
            for shard in &existing {
                match self.prepare_delta_meta_update(shard) {
                    Ok(Some((temp, final_meta))) => {
                        artifacts.insert(temp, final_meta);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(shard = %shard.shard_path.display(), error = %e, "skipping meta update for old shard");
                    }
                }
            }
        }

        let mut to_delete: Option<HashSet<PathBuf>> = if !self.options.is_delta {
            let existing = self
                .metadata_source
                .list_existing_shards(&repo_name)
                .map_err(|e| BuildError::Metadata(e.to_string()))?;
            let mut set = HashSet::new();
            for shard in &existing {
                set.insert(shard.shard_path.clone());
                if let Some(meta) = &shard.meta_path {
                    set.insert(meta.clone());
                }
            }
            Some(set)
        } else {
            None
        };

        let mut build_error: Option<BuildError> = None;

        for (temp, final_path) in artifacts.iter() {
            match std::fs::rename(temp, final_path) {
                Ok(()) => {
                    if let Some(set) = to_delete.as_mut() {
                        set.remove(final_path);
                    }
                    let size = std::fs::metadata(final_path).map(|m| m.len()).unwrap_or(0);
                    self.log_action(ShardLogAction::Upsert, final_path, size, &repo_name).await;
                }
                Err(e) => {
                    // The upsert line is still written for audit continuity
                    // even though the rename itself failed.
                    self.log_action(ShardLogAction::Upsert, final_path, 0, &repo_name).await;
                    if build_error.is_none() {
                        build_error = Some(BuildError::Io { path: final_path.clone(), source: e });
                    }
                }
            }
        }

        if let Some(set) = to_delete {
            for path in set {
                if shard_fs::is_compound_shard(&path) {
                    match self.compound_handle.set_tombstone(&path, self.options.repository_description.id) {
                        Ok(()) => self.log_action(ShardLogAction::Tomb, &path, 0, &repo_name).await,
                        Err(e) => tracing::warn!(path = %path.display(), error = %e, "compound shard tombstone failed"),
                    }
                } else if std::fs::remove_file(&path).is_ok() {
                    self.log_action(ShardLogAction::Remove, &path, 0, &repo_name).await;
                }
            }
        }

        match build_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn log_action(&self, action: ShardLogAction, path: &std::path::Path, size: u64, repo_name: &str) {
        let basename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let mut log = self.shard_log.lock().await;
        if let Err(e) = log.log(action, basename, size, repo_name) {
            tracing::warn!(error = %e, "failed to append shard log line");
        }
    }

    /// Reads an existing shard's repository descriptor, merges in the
    /// current build's tombstones and branch list, and serializes it to a
    /// `.tmp` sibling of its `.meta` path. Returns `None` for shards that
    /// don't belong to this repository (by ID).
    fn prepare_delta_meta_update(&self, shard: &ExistingShard) -> anyhow::Result<Option<(PathBuf, PathBuf)>> {
        let mut repo: RepositoryDescription = if let Some(meta_path) = &shard.meta_path {
            serde_json::from_slice(&std::fs::read(meta_path)?)?
        } else {
            let file = std::fs::File::open(&shard.shard_path)?;
            let (_header, repo) = index_core::shard_writer::read_header_and_repo(std::io::BufReader::new(file))?;
            repo
        };

        if repo.id != self.options.repository_description.id {
            return Ok(None);
        }

        repo.apply_delta_update(&self.options.changed_or_removed_files, &self.options.repository_description.branches);

        let final_meta = shard_fs::meta_path_for(&shard.shard_path);
        let mut tmp_os = final_meta.as_os_str().to_os_string();
        tmp_os.push(".tmp");
        let tmp_meta = PathBuf::from(tmp_os);

        std::fs::write(&tmp_meta, serde_json::to_vec_pretty(&repo)?)?;
        Ok(Some((tmp_meta, final_meta)))
    }
}
