//! Property tests for the chunkers.

use proptest::prelude::*;
use ragline_rag::{Chunk, Chunker, Document, FixedSizeChunker, RecursiveChunker};

/// Text drawn from words, separators and some multi-byte characters.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[a-z]{1,12}",
            Just(" ".to_string()),
            Just("\n".to_string()),
            Just("\n\n".to_string()),
            Just(". ".to_string()),
            Just("? ".to_string()),
            Just("é".to_string()),
            Just("日本".to_string()),
        ],
        0..80,
    )
    .prop_map(|parts| parts.concat())
}

/// Size and overlap with `overlap < size`.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
}

fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let skip = if i == 0 { 0 } else { overlap };
        out.extend(chunk.text.chars().skip(skip));
    }
    out
}

fn check(chunks: &[Chunk], text: &str, size: usize, overlap: usize) -> Result<(), TestCaseError> {
    prop_assert_eq!(reconstruct(chunks, overlap), text);

    for chunk in chunks {
        let len = chunk.text.chars().count();
        prop_assert!(len <= size, "chunk of {} chars exceeds {}", len, size);
        prop_assert!(len > 0);
    }

    for pair in chunks.windows(2) {
        let prev: Vec<char> = pair[0].text.chars().collect();
        let next: Vec<char> = pair[1].text.chars().collect();
        prop_assert!(prev.len() > overlap);
        prop_assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn recursive_chunks_reconstruct_and_respect_bounds(
        text in arb_text(),
        (size, overlap) in arb_sizes(),
    ) {
        let doc = Document::new("d", &text);
        let chunks = RecursiveChunker::new(size, overlap).unwrap().chunk(&doc);
        check(&chunks, &text, size, overlap)?;
    }

    #[test]
    fn fixed_chunks_reconstruct_and_respect_bounds(
        text in arb_text(),
        (size, overlap) in arb_sizes(),
    ) {
        let doc = Document::new("d", &text);
        let chunks = FixedSizeChunker::new(size, overlap).unwrap().chunk(&doc);
        check(&chunks, &text, size, overlap)?;
    }

    #[test]
    fn chunk_ids_are_sequential(text in arb_text(), (size, overlap) in arb_sizes()) {
        let doc = Document::new("doc", &text);
        let chunks = RecursiveChunker::new(size, overlap).unwrap().chunk(&doc);
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(&chunk.id, &format!("doc_{i}"));
        }
    }
}
