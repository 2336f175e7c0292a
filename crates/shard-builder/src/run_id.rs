use chrono::Utc;
use rand::Rng;

const ID_LEN: usize = 20;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// A 20-character run ID shared by every shard emitted by one build:
/// a millisecond-timestamp prefix (so run IDs sort in build order) plus a
/// random suffix to disambiguate builds that land in the same millisecond.
pub fn generate_run_id() -> String {
    let prefix = format!("{:013}", Utc::now().timestamp_millis());
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_LEN - prefix.len())
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_has_fixed_length() {
        assert_eq!(generate_run_id().len(), ID_LEN);
    }

    #[test]
    fn successive_ids_are_distinct() {
        assert_ne!(generate_run_id(), generate_run_id());
    }
}
