use std::cmp::Ordering;
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;

use crate::document::Document;

/// Maps `[0, infinity)` monotonically onto `[0, 1)`. Larger inputs rank
/// "worse" (closer to 1) wherever a key component wants smaller-is-better.
pub fn squash(x: f64) -> f64 {
    x / (1.0 + x)
}

fn test_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("test").expect("static regex is valid"))
}

fn is_generated(name: &str) -> bool {
    name.ends_with("min.js") || name.ends_with("js.map")
}

fn is_vendor(name: &str) -> bool {
    name.contains("vendor/") || name.contains("node_modules/")
}

/// The eight-component lexicographic key from the ranking spec, smaller is
/// better in every slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankKey([f64; 8]);

impl RankKey {
    fn cmp_key(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.partial_cmp(b).expect("rank components are never NaN") {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

pub fn rank_key(doc: &Document, original_index: usize) -> RankKey {
    let generated = if is_generated(&doc.name) { 1.0 } else { 0.0 };
    let vendor = if is_vendor(&doc.name) { 1.0 } else { 0.0 };
    let test = if test_name_regex().is_match(&doc.name) { 1.0 } else { 0.0 };
    let symbols_len = doc.symbols.as_ref().map(|s| s.len()).unwrap_or(0) as f64;
    let content_len = doc.content.len() as f64;
    let name_len = doc.name.len() as f64;
    let branches_len = doc.branches.len() as f64;

    RankKey([
        generated,
        vendor,
        test,
        1.0 - squash(symbols_len),
        squash(content_len),
        squash(name_len),
        1.0 - squash(branches_len),
        squash(original_index as f64),
    ])
}

/// Sort a shard's buffered documents by `RankedOrder`, consuming the input.
/// Key computation touches every document's content independently, so it
/// fans out over `rayon`'s pool; the final ordering step is sequential since
/// the comparator itself is cheap once keys are in hand.
pub fn sort_batch(docs: Vec<Document>) -> Vec<Document> {
    let mut keyed: Vec<(RankKey, Document)> = docs
        .into_par_iter()
        .enumerate()
        .map(|(i, d)| (rank_key(&d, i), d))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp_key(&b.0));
    keyed.into_iter().map(|(_, d)| d).collect()
}
