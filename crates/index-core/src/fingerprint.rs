use sha1::{Digest, Sha1};

use crate::options::Options;

/// `HashOptions`: a SHA-1 hex digest over the canonical textual rendering of
/// exactly the five option fields that influence shard content. No other
/// field may be folded in here — callers that need to detect other drift
/// must do so separately (see `IndexState`'s branch comparisons).
pub fn hash_options(options: &Options) -> String {
    let text = canonical_text(options);
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    to_hex(&hasher.finalize())
}

fn canonical_text(options: &Options) -> String {
    let ctags_path = options
        .ctags_path
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    format!(
        "{}{}{}{}{}",
        ctags_path,
        go_bool(options.ctags_must_succeed),
        options.size_max,
        go_quote_list(&options.large_files),
        go_bool(options.disable_ctags),
    )
}

fn go_bool(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// Approximates Go's `%q` applied to a `[]string`: `["a" "b"]`.
fn go_quote_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| go_quote(s)).collect();
    format!("[{}]", quoted.join(" "))
}

fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}
