use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::repository::RepositoryDescription;

pub const FORMAT_VERSION: u32 = 1;
pub const FEATURE_VERSION: u32 = 1;
const MAGIC: &[u8; 4] = b"ZIX1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardHeader {
    pub format_version: u32,
    pub feature_version: u32,
    pub index_time_unix_ms: i64,
    pub run_id: String,
}

/// On-disk representation of one document within a shard. The binary layout
/// is an implementation detail private to this crate; downstream readers of
/// a published `.zoekt` file only ever go through this module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub name: String,
    pub content: Vec<u8>,
    pub branches: Vec<String>,
    pub skip_reason: Option<String>,
    pub language: Option<String>,
    pub sections: Vec<(u32, u32)>,
    pub symbols_meta_data: Vec<crate::document::SymbolMetaData>,
}

fn write_framed<W: Write, T: Serialize>(w: &mut W, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value)?;
    w.write_all(&(bytes.len() as u64).to_le_bytes())?;
    w.write_all(&bytes)?;
    Ok(())
}

fn read_framed<R: Read, T: DeserializeOwned>(r: &mut R) -> Result<T> {
    let mut len_buf = [0u8; 8];
    r.read_exact(&mut len_buf)?;
    let len = u64::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

/// Sequential shard writer: header, repository descriptor, then one framed
/// record per document. Produces a fresh shard; the caller is responsible
/// for writing it to a `.tmp` path and renaming into place.
pub struct FramedShardWriter<W: Write> {
    writer: W,
    document_count: u64,
}

impl<W: Write> FramedShardWriter<W> {
    pub fn begin(mut writer: W, header: &ShardHeader, repo: &RepositoryDescription) -> Result<Self> {
        writer.write_all(MAGIC)?;
        write_framed(&mut writer, header)?;
        write_framed(&mut writer, repo)?;
        Ok(Self { writer, document_count: 0 })
    }

    pub fn add_document(&mut self, doc: &DocumentRecord) -> Result<()> {
        write_framed(&mut self.writer, doc)?;
        self.document_count += 1;
        Ok(())
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Read just the header and repository descriptor from a shard, without
/// reading any document bodies. Used by the `IndexState` oracle.
pub fn read_header_and_repo<R: Read>(mut r: R) -> Result<(ShardHeader, RepositoryDescription)> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::Corrupt("bad shard magic".into()));
    }
    let header: ShardHeader = read_framed(&mut r)?;
    let repo: RepositoryDescription = read_framed(&mut r)?;
    Ok((header, repo))
}

/// Sequential reader over a whole shard, documents included. Downstream
/// search runtimes are out of scope, but callers that need to verify what
/// was actually written (tests, diagnostics) can use this instead of
/// re-deriving the framing.
pub struct FramedShardReader<R: Read> {
    reader: R,
}

impl<R: Read> FramedShardReader<R> {
    pub fn open(mut reader: R) -> Result<(Self, ShardHeader, RepositoryDescription)> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::Corrupt("bad shard magic".into()));
        }
        let header: ShardHeader = read_framed(&mut reader)?;
        let repo: RepositoryDescription = read_framed(&mut reader)?;
        Ok((Self { reader }, header, repo))
    }

    pub fn next_document(&mut self) -> Result<Option<DocumentRecord>> {
        let mut len_buf = [0u8; 8];
        match self.reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = u64::from_le_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        Ok(Some(bincode::deserialize(&buf)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn repo() -> RepositoryDescription {
        RepositoryDescription {
            name: "acme/widgets".into(),
            id: 7,
            url: "https://example.com".into(),
            branches: Vec::new(),
            commit_url_template: String::new(),
            file_url_template: String::new(),
            line_fragment_template: String::new(),
            index_options: "deadbeef".into(),
            file_tombstones: BTreeSet::new(),
            raw_config: BTreeMap::new(),
            latest_commit_date: None,
            rank: 0,
            has_symbols: false,
            sub_repositories: BTreeMap::new(),
        }
    }

    #[test]
    fn round_trips_header_and_repo_without_reading_documents() {
        let header = ShardHeader { format_version: FORMAT_VERSION, feature_version: FEATURE_VERSION, index_time_unix_ms: 123, run_id: "r1".into() };
        let mut buf = Vec::new();
        let mut w = FramedShardWriter::begin(&mut buf, &header, &repo()).unwrap();
        w.add_document(&DocumentRecord {
            name: "a.go".into(),
            content: b"package main".to_vec(),
            branches: vec!["main".into()],
            skip_reason: None,
            language: Some("go".into()),
            sections: Vec::new(),
            symbols_meta_data: Vec::new(),
        })
        .unwrap();
        w.finish().unwrap();

        let (read_header, read_repo) = read_header_and_repo(buf.as_slice()).unwrap();
        assert_eq!(read_header.run_id, "r1");
        assert_eq!(read_repo.name, "acme/widgets");
        assert_eq!(read_repo.id, 7);
    }

    #[test]
    fn rejects_bad_magic() {
        let buf = vec![0u8; 16];
        assert!(read_header_and_repo(buf.as_slice()).is_err());
    }
}
