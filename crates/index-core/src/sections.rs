use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::document::SymbolMetaData;

/// One symbol reported by the external symbol parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    /// 1-based line number.
    pub line: i64,
    pub kind: String,
    pub parent: String,
    pub parent_kind: String,
    pub pattern: Option<String>,
    pub signature: Option<String>,
    pub language: Option<String>,
}

fn line_starts(content: &[u8]) -> Vec<usize> {
    let mut starts = vec![0usize];
    for (i, &b) in content.iter().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// Byte bounds `[start, end)` of 1-based `line`, excluding the trailing
/// newline. Returns `None` for lines outside the document.
fn line_bounds(starts: &[usize], content_len: usize, line: usize) -> Option<(usize, usize)> {
    if line == 0 || line > starts.len() {
        return None;
    }
    let start = starts[line - 1];
    let end = if line < starts.len() {
        starts[line].saturating_sub(1)
    } else {
        content_len
    };
    if start > end || start > content_len {
        return None;
    }
    Some((start, end.min(content_len)))
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn ranges_overlap(a: &Range<u32>, b: &Range<u32>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Insert `new_range`/`meta` into the sorted, non-overlapping output unless
/// it collides with a neighbor, in which case the entry is dropped.
fn insert_if_no_overlap(
    ranges: &mut Vec<Range<u32>>,
    metas: &mut Vec<SymbolMetaData>,
    new_range: Range<u32>,
    meta: SymbolMetaData,
) {
    let pos = ranges.partition_point(|r| r.start < new_range.start);
    if pos > 0 && ranges_overlap(&ranges[pos - 1], &new_range) {
        return;
    }
    if pos < ranges.len() && ranges_overlap(&ranges[pos], &new_range) {
        return;
    }
    ranges.insert(pos, new_range);
    metas.insert(pos, meta);
}

/// Convert symbol entries into byte-range sections plus parallel metadata,
/// resolving overlaps by dropping later entries that collide with an
/// already-placed one.
pub fn tags_to_sections(content: &[u8], entries: &[SymbolEntry]) -> (Vec<Range<u32>>, Vec<SymbolMetaData>) {
    let starts = line_starts(content);
    let mut ranges: Vec<Range<u32>> = Vec::new();
    let mut metas: Vec<SymbolMetaData> = Vec::new();

    for entry in entries {
        if entry.line <= 0 {
            continue;
        }
        let Some((line_start, line_end)) = line_bounds(&starts, content.len(), entry.line as usize) else {
            continue;
        };
        let line_bytes = &content[line_start..line_end];
        let Some(idx) = find_subsequence(line_bytes, entry.name.as_bytes()) else {
            continue;
        };
        let start = (line_start + idx) as u32;
        let end = start + entry.name.len() as u32;

        let meta = SymbolMetaData {
            name: entry.name.clone(),
            kind: entry.kind.clone(),
            parent: entry.parent.clone(),
            parent_kind: entry.parent_kind.clone(),
        };
        insert_if_no_overlap(&mut ranges, &mut metas, start..end, meta);
    }

    (ranges, metas)
}
