use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A byte-range annotation plus the symbol it names, produced by
/// `crate::sections::tags_to_sections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMetaData {
    pub name: String,
    pub kind: String,
    pub parent: String,
    pub parent_kind: String,
}

/// The unit ingested by the Builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: Vec<u8>,
    pub branches: Vec<String>,
    pub skip_reason: Option<String>,
    pub language: Option<String>,
    pub symbols: Option<Vec<Range<u32>>>,
    pub symbols_meta_data: Option<Vec<SymbolMetaData>>,
    pub ranks: Option<Vec<f64>>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self { name: name.into(), content, ..Default::default() }
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }

    /// Bytes this document contributes to the shard-rotation accumulator:
    /// the name plus either the content or, if skipped, the skip reason.
    /// Preserved verbatim from upstream behavior even though the skip
    /// reason can be longer than the name it replaces.
    pub fn accounted_size(&self) -> usize {
        self.name.len()
            + match &self.skip_reason {
                Some(reason) => reason.len(),
                None => self.content.len(),
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounted_size_uses_skip_reason_not_content() {
        let mut d = Document::new("big.bin", vec![0u8; 4096]);
        d.skip_reason = Some("document size 4096 larger than limit 1000".to_string());
        assert_eq!(d.accounted_size(), "big.bin".len() + d.skip_reason.as_ref().unwrap().len());
    }

    #[test]
    fn accounted_size_uses_content_when_not_skipped() {
        let d = Document::new("small.go", b"package main".to_vec());
        assert_eq!(d.accounted_size(), "small.go".len() + "package main".len());
    }
}
