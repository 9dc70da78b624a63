//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`]: prefers paragraph, line, sentence, then word
//!   boundaries, falling back to a hard character cut
//! - [`FixedSizeChunker`]: hard character cuts only
//!
//! Both measure length in characters (Unicode scalar values), never split a
//! UTF-8 sequence, and produce contiguous windows: chunk `i + 1` starts
//! exactly `chunk_overlap` characters before chunk `i` ends. Dropping the
//! first `chunk_overlap` characters of every chunk but the first and
//! concatenating the rest reconstructs the document text.

use crate::config::{RagConfig, validate_chunking};
use crate::document::{Chunk, Document};
use crate::error::Result;

/// Boundaries tried in order, coarsest first.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// Each chunk is at most `chunk_size` characters. Within the window a chunk
/// may occupy, the chunker cuts just after the last paragraph break if there
/// is one, else after the last line break, and so on down to a hard cut at
/// `chunk_size`. The separator stays with the preceding chunk.
///
/// # Example
///
/// ```rust
/// use ragline_rag::{Chunker, Document, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(20, 0).unwrap();
/// let chunks = chunker.chunk(&Document::new("d", "First part.\n\nSecond part."));
/// assert_eq!(chunks[0].text, "First part.\n\n");
/// assert_eq!(chunks[1].text, "Second part.");
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker using the sizes in `config`.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let windows =
            split_windows(&document.text, self.chunk_size, self.chunk_overlap, &SEPARATORS);
        into_chunks(document, windows)
    }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus `chunk_index` and `start_offset` fields.
///
/// # Example
///
/// ```rust
/// use ragline_rag::{Chunker, Document, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(4, 1).unwrap();
/// let chunks = chunker.chunk(&Document::new("d", "abcdefg"));
/// let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["abcd", "defg"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let windows = split_windows(&document.text, self.chunk_size, self.chunk_overlap, &[]);
        into_chunks(document, windows)
    }
}

/// A contiguous slice of the source text and its starting character offset.
struct Window<'a> {
    start: usize,
    text: &'a str,
}

fn into_chunks(document: &Document, windows: Vec<Window<'_>>) -> Vec<Chunk> {
    windows
        .into_iter()
        .enumerate()
        .map(|(i, window)| {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), i.to_string());
            metadata.insert("start_offset".to_string(), window.start.to_string());
            if let Some(source) = &document.source_uri {
                metadata.insert("source".to_string(), source.clone());
            }
            Chunk {
                id: format!("{}_{i}", document.id),
                text: window.text.to_string(),
                embedding: Vec::new(),
                metadata,
                document_id: document.id.clone(),
            }
        })
        .collect()
}

/// Cut `text` into windows of at most `chunk_size` characters, consecutive
/// windows sharing exactly `chunk_overlap` characters.
fn split_windows<'a>(
    text: &'a str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<Window<'a>> {
    // offsets[i] is the byte offset of character i; the extra entry is text.len().
    let offsets: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let total = offsets.len() - 1;

    let mut windows = Vec::new();
    let mut start = 0;
    while start < total {
        let limit = (start + chunk_size).min(total);
        let end = if limit == total {
            total
        } else {
            // The cut must leave more than `chunk_overlap` characters so the
            // next window starts strictly after this one.
            let min_end = start + chunk_overlap + 1;
            find_break(text, &offsets, start, min_end, limit, separators).unwrap_or(limit)
        };

        windows.push(Window { start, text: &text[offsets[start]..offsets[end]] });
        if end == total {
            break;
        }
        start = end - chunk_overlap;
    }
    windows
}

/// Find the character index just past the last occurrence of the coarsest
/// separator that yields a cut in `min_end..=limit`.
fn find_break(
    text: &str,
    offsets: &[usize],
    start: usize,
    min_end: usize,
    limit: usize,
    separators: &[&str],
) -> Option<usize> {
    let base = offsets[start];
    let window = &text[base..offsets[limit]];
    for separator in separators {
        let Some(pos) = window.rfind(separator) else { continue };
        let cut_byte = base + pos + separator.len();
        // Separators are ASCII, so the byte just past one is a char boundary.
        let Ok(cut) = offsets.binary_search(&cut_byte) else { continue };
        if cut >= min_end {
            return Some(cut);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let doc = Document::new("empty", "");
        assert!(RecursiveChunker::new(10, 2).unwrap().chunk(&doc).is_empty());
        assert!(FixedSizeChunker::new(10, 2).unwrap().chunk(&doc).is_empty());
    }

    #[test]
    fn short_document_is_one_chunk() {
        let doc = Document::new("d", "tiny");
        let chunks = RecursiveChunker::new(10, 3).unwrap().chunk(&doc);
        assert_eq!(texts(&chunks), ["tiny"]);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(RecursiveChunker::new(10, 10).is_err());
        assert!(RecursiveChunker::new(10, 11).is_err());
        assert!(FixedSizeChunker::new(0, 0).is_err());
    }

    #[test]
    fn prefers_paragraph_over_sentence_break() {
        let doc = Document::new("d", "One. Two.\n\nThree. Four.");
        let chunks = RecursiveChunker::new(16, 0).unwrap().chunk(&doc);
        assert_eq!(texts(&chunks), ["One. Two.\n\n", "Three. Four."]);
    }

    #[test]
    fn falls_back_to_word_break() {
        let doc = Document::new("d", "alpha beta gamma delta");
        let chunks = RecursiveChunker::new(12, 0).unwrap().chunk(&doc);
        assert_eq!(texts(&chunks), ["alpha beta ", "gamma delta"]);
    }

    #[test]
    fn hard_cut_when_no_boundary() {
        let doc = Document::new("d", "abcdefghij");
        let chunks = RecursiveChunker::new(4, 0).unwrap().chunk(&doc);
        assert_eq!(texts(&chunks), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn overlap_is_exact() {
        let doc = Document::new("d", "abcdefghij");
        let chunks = FixedSizeChunker::new(4, 2).unwrap().chunk(&doc);
        assert_eq!(texts(&chunks), ["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn multibyte_text_is_measured_in_chars() {
        let doc = Document::new("d", "äöüßéèêë");
        let chunks = FixedSizeChunker::new(3, 1).unwrap().chunk(&doc);
        assert_eq!(texts(&chunks), ["äöü", "üßé", "éèê", "êë"]);
    }

    #[test]
    fn chunks_carry_provenance() {
        let doc = Document::new("book", "first words. second words.")
            .with_source("./book.pdf")
            .with_metadata("lang", "en");
        let chunks = RecursiveChunker::new(14, 0).unwrap().chunk(&doc);
        assert_eq!(chunks[0].id, "book_0");
        assert_eq!(chunks[1].id, "book_1");
        for chunk in &chunks {
            assert_eq!(chunk.document_id, "book");
            assert!(chunk.embedding.is_empty());
            assert_eq!(chunk.metadata["source"], "./book.pdf");
            assert_eq!(chunk.metadata["lang"], "en");
        }
        assert_eq!(chunks[1].metadata["start_offset"], "13");
    }

    #[test]
    fn splitting_is_deterministic() {
        let doc =
            Document::new("d", "Some text. More text!\nAnother line? Yes.\n\nNew paragraph here.");
        let chunker = RecursiveChunker::new(15, 4).unwrap();
        assert_eq!(chunker.chunk(&doc), chunker.chunk(&doc));
    }
}
