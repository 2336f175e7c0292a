use globset::Glob;

/// Evaluate the `LargeFiles` pattern list against `path`, applying patterns in
/// order. A leading `!` negates a previously matched path rather than
/// matching by itself; the final effective match wins.
pub fn is_large_file(patterns: &[String], path: &str) -> bool {
    let mut matched = false;
    for pattern in patterns {
        let (negate, glob_pat) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern.as_str()),
        };
        let glob = match Glob::new(glob_pat) {
            Ok(g) => g.compile_matcher(),
            Err(_) => continue,
        };
        if glob.is_match(path) {
            matched = !negate;
        }
    }
    matched
}
