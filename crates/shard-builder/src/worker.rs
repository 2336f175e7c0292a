use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind};
use std::path::PathBuf;

use index_core::shard_writer::{DocumentRecord, FramedShardWriter, ShardHeader, FEATURE_VERSION, FORMAT_VERSION};
use index_core::{Document, Options};
use symbol_parser::SymbolSource;

use crate::error::BuildError;

fn to_io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(ErrorKind::Other, e.to_string())
}

/// `buildShard`: parse symbols, rank, and write one temp shard file.
/// Returns the `(temp_path, final_path)` pair for the caller to promote at
/// publish time.
pub async fn build_shard(
    mut batch: Vec<Document>,
    shard_index: u32,
    options: &Options,
    symbol_source: &dyn SymbolSource,
    index_time_unix_ms: i64,
    run_id: &str,
) -> Result<(PathBuf, PathBuf), BuildError> {
    if !options.disable_ctags {
        for doc in batch.iter_mut() {
            if doc.is_skipped() || doc.symbols.is_some() {
                continue;
            }
            match symbol_source.parse(&doc.name, &doc.content).await {
                Ok(entries) => {
                    let (ranges, metas) = index_core::tags_to_sections(&doc.content, &entries);
                    doc.symbols = Some(ranges);
                    doc.symbols_meta_data = Some(metas);
                }
                Err(e) => {
                    if options.ctags_must_succeed {
                        return Err(BuildError::Parser(e.to_string()));
                    }
                    tracing::warn!(doc = %doc.name, error = %e, "symbol parser failed; continuing without symbols");
                }
            }
        }
    }

    let ranked = index_core::sort_batch(batch);

    let mut repo = options.repository_description.clone();
    repo.has_symbols = !options.disable_ctags;
    repo.index_options = index_core::hash_options(options);

    let header = ShardHeader {
        format_version: FORMAT_VERSION,
        feature_version: FEATURE_VERSION,
        index_time_unix_ms,
        run_id: run_id.to_string(),
    };

    let final_path = shard_fs::shard_path(&options.index_dir, &repo.name, FORMAT_VERSION, shard_index);
    let uniq = format!("{run_id}-{shard_index:05}");
    let temp_path = shard_fs::temp_path_for(&final_path, &uniq);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| BuildError::Io { path: temp_path.clone(), source: e })?;
    // Default `File::create`-style permissions are already masked by the
    // process umask at the kernel level, so there is no separate chmod step.
    let mut writer = FramedShardWriter::begin(BufWriter::new(file), &header, &repo)
        .map_err(|e| BuildError::Io { path: temp_path.clone(), source: to_io_error(e) })?;

    for doc in &ranked {
        let sections = doc
            .symbols
            .as_ref()
            .map(|ranges| ranges.iter().map(|r| (r.start, r.end)).collect())
            .unwrap_or_default();
        let symbols_meta_data = doc.symbols_meta_data.clone().unwrap_or_default();
        let record = DocumentRecord {
            name: doc.name.clone(),
            content: doc.content.clone(),
            branches: doc.branches.clone(),
            skip_reason: doc.skip_reason.clone(),
            language: doc.language.clone(),
            sections,
            symbols_meta_data,
        };
        writer
            .add_document(&record)
            .map_err(|e| BuildError::Io { path: temp_path.clone(), source: to_io_error(e) })?;
    }

    let buffered = writer
        .finish()
        .map_err(|e| BuildError::Io { path: temp_path.clone(), source: to_io_error(e) })?;
    buffered
        .get_ref()
        .sync_all()
        .map_err(|e| BuildError::Io { path: temp_path.clone(), source: e })?;

    Ok((temp_path, final_path))
}
