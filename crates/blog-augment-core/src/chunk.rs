//! Sentence-boundary text chunker.
//!
//! Splits an article body into [`EmbeddingChunk`]s of roughly
//! `target_chars` characters. Splitting happens on sentence boundaries so a
//! chunk never cuts a sentence in half.
//!
//! Each chunk receives a deterministic UUID derived from its article ID
//! and index, plus a SHA-256 hash of its text for staleness detection.
//!
//! # Algorithm
//!
//! 1. Split the body into sentences on `。！？；`, `.!?` and newlines. A Latin
//!    `.` only ends a sentence when followed by whitespace or end of input,
//!    so `v3.2` and `3.14` stay intact. Terminators stay attached to their
//!    sentence; newlines are dropped.
//! 2. Discard fragments that are empty after trimming.
//! 3. Accumulate sentences into a buffer. When the next sentence would push
//!    the buffer past `target_chars` and the buffer is non-empty, flush it
//!    as a chunk and start a new buffer with that sentence.
//! 4. Flush the remaining buffer.
//!
//! A sentence longer than `target_chars` becomes a chunk of its own; no
//! hard split is performed. Empty input yields no chunks.
//!
//! Sizes are measured in Unicode scalar values, not bytes, so CJK text is
//! budgeted the same way as Latin text.
//!
//! # Example
//!
//! ```rust
//! use blog_augment_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("article-1", "第一句。第二句！Third one.", 500);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].chunk_index, 0);
//! ```

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::EmbeddingChunk;

/// Default chunk size in characters.
pub const DEFAULT_TARGET_CHARS: usize = 500;

const TERMINATORS: &[char] = &['。', '！', '？', '；', '!', '?'];

/// Split text into trimmed, non-empty sentences, keeping terminators.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        let ends_sentence = if c == '.' {
            chars.peek().map_or(true, |next| next.is_whitespace())
        } else {
            TERMINATORS.contains(&c)
        };
        if ends_sentence {
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Split an article body into chunks of at most `target_chars` characters
/// where sentence boundaries allow.
///
/// # Guarantees
///
/// - Empty or whitespace-only input returns an empty vector.
/// - No chunk is empty.
/// - Chunk indices are contiguous: `0, 1, 2, …, N-1`.
/// - The sentences of all chunks, in order, are exactly
///   [`split_sentences`] of the input.
/// - Pure: the same input always produces the same ids and hashes.
pub fn chunk_text(article_id: &str, text: &str, target_chars: usize) -> Vec<EmbeddingChunk> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();

        if !buf.is_empty() && buf_chars + separator(&buf).len() + sentence_chars > target_chars {
            chunks.push(make_chunk(article_id, chunks.len() as i64, &buf));
            buf.clear();
            buf_chars = 0;
        }

        let sep = separator(&buf);
        buf.push_str(sep);
        buf_chars += sep.len();
        buf.push_str(&sentence);
        buf_chars += sentence_chars;
    }

    if !buf.is_empty() {
        chunks.push(make_chunk(article_id, chunks.len() as i64, &buf));
    }

    chunks
}

/// Text inserted between the buffer and the next sentence.
///
/// After a Latin terminator a space, after a CJK terminator nothing, and
/// after a sentence that was ended by a line break, the line break itself.
/// Re-splitting a chunk therefore yields exactly the sentences put into it.
fn separator(buf: &str) -> &'static str {
    match buf.chars().last() {
        None => "",
        Some(c) if c == '.' || TERMINATORS.contains(&c) => {
            if c.is_ascii() {
                " "
            } else {
                ""
            }
        }
        Some(_) => "\n",
    }
}

/// Derive the stable vector-store id of chunk `index` of `article_id`.
///
/// The first 16 bytes of `SHA-256("{article_id}:{index}")` are used as a
/// UUID, so the same pair always maps to the same id.
pub fn chunk_id(article_id: &str, index: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", article_id, index).as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

/// SHA-256 of a chunk's text, hex encoded.
pub fn text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn make_chunk(article_id: &str, index: i64, text: &str) -> EmbeddingChunk {
    EmbeddingChunk {
        id: chunk_id(article_id, index),
        article_id: article_id.to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash: text_hash(text),
    }
}
