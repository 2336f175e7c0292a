use index_core::Document;

/// Applies the `Add` classification policy in place and returns the number
/// of bytes this document contributes to the shard-rotation accumulator.
///
/// `LargeFiles` patterns apply first: a positive match bypasses both
/// `size_max` and the trigram/binary check entirely. Otherwise an oversized
/// document is skipped with a size reason; a binary-looking one is skipped
/// with a trigram reason and tagged `language = "binary"`.
pub fn classify_and_accumulate(
    doc: &mut Document,
    large_files: &[String],
    size_max: usize,
    trigram_max: usize,
) -> usize {
    let is_large = shard_fs::is_large_file(large_files, &doc.name);

    if !is_large {
        if doc.content.len() > size_max {
            doc.skip_reason = Some(format!(
                "document size {} larger than limit {}",
                doc.content.len(),
                size_max
            ));
        } else if let Some(reason) = index_core::binary_check(&doc.content, trigram_max) {
            doc.skip_reason = Some(reason);
            doc.language = Some("binary".to_string());
        }
    }

    doc.accounted_size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_document_is_skipped_with_size_reason() {
        let mut doc = Document::new("big.bin", vec![b'a'; 2000]);
        let size = classify_and_accumulate(&mut doc, &[], 1000, 20_000);
        assert!(doc.skip_reason.as_ref().unwrap().contains("larger than limit"));
        assert_eq!(size, doc.name.len() + doc.skip_reason.as_ref().unwrap().len());
    }

    #[test]
    fn binary_content_is_skipped_and_tagged() {
        let mut content = b"header__".to_vec();
        content.extend_from_slice(&[0u8; 100]);
        let mut doc = Document::new("data.bin", content);
        classify_and_accumulate(&mut doc, &[], 1_000_000, 20_000);
        assert!(doc.skip_reason.is_some());
        assert_eq!(doc.language.as_deref(), Some("binary"));
        // Skipped content never counts toward rotation: the accumulator sees
        // only the name plus the (short) skip reason, never the 100 NULs.
        let size = doc.accounted_size();
        assert!(size < 100);
    }

    #[test]
    fn large_files_override_bypasses_size_and_binary_checks() {
        let patterns = vec!["F0".to_string(), "F1".to_string(), "!F1".to_string()];
        let mut doc = Document::new("F0", vec![b'a'; 5000]);
        classify_and_accumulate(&mut doc, &patterns, 10, 1);
        assert!(doc.skip_reason.is_none());

        let mut excluded = Document::new("F1", vec![b'a'; 5000]);
        classify_and_accumulate(&mut excluded, &patterns, 10, 1);
        assert!(excluded.skip_reason.is_some());
    }
}
