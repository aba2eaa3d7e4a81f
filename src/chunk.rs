//! Fixed-window text chunker.
//!
//! Splits document content into overlapping character windows (default
//! 1000 chars with 100 chars of overlap) so that context spanning a chunk
//! boundary is not lost. Boundaries are purely length-based, with no
//! semantic boundary detection. Windows are measured in characters, not
//! bytes, so multibyte text gets the same window width as ASCII.
//!
//! Each chunk carries a UUID and a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, Document};

/// Split text into overlapping windows of at most `chunk_size` characters.
///
/// Consecutive windows share `overlap` characters. Whitespace-only windows
/// are dropped; any text with visible content yields at least one window.
///
/// `overlap` must be smaller than `chunk_size` (enforced by config
/// validation).
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    // byte offset of each char, plus the end of the string, so windows can
    // be addressed by char index and sliced by byte offset
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;

    // step >= 1, so the loop always advances
    let step = (chunk_size - overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0usize;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        let piece = &text[offsets[start]..offsets[end]];
        if !piece.trim().is_empty() {
            windows.push(piece.to_string());
        }
        if end >= char_count {
            break;
        }
        start += step;
    }

    windows
}

/// Chunk a document into indexed [`Chunk`]s with content hashes.
pub fn chunk_document(doc: &Document, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    split_text(&doc.content, chunk_size, overlap)
        .into_iter()
        .enumerate()
        .map(|(i, text)| make_chunk(doc, i as i64, text))
        .collect()
}

fn make_chunk(doc: &Document, index: i64, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        doc_path: doc.path.to_string_lossy().to_string(),
        chunk_index: index,
        text,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(content: &str) -> Document {
        Document {
            path: PathBuf::from("test.txt"),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_small_text_single_window() {
        let windows = split_text("def f(): pass", 1000, 100);
        assert_eq!(windows, vec!["def f(): pass".to_string()]);
    }

    #[test]
    fn test_empty_and_whitespace_yield_nothing() {
        assert!(split_text("", 1000, 100).is_empty());
        assert!(split_text("   \n\t  ", 1000, 100).is_empty());
    }

    #[test]
    fn test_windows_overlap() {
        let text = "abcdefghij".repeat(10); // 100 chars
        let windows = split_text(&text, 40, 10);
        assert!(windows.len() > 1);
        for pair in windows.windows(2) {
            let prev_tail = &pair[0][pair[0].len() - 10..];
            assert!(pair[1].starts_with(prev_tail));
        }
    }

    #[test]
    fn test_every_char_covered() {
        let text = "0123456789".repeat(25);
        let windows = split_text(&text, 100, 20);
        let mut rebuilt = windows[0].clone();
        for w in &windows[1..] {
            // drop the overlapping prefix when re-joining
            rebuilt.push_str(&w[20.min(w.len())..]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let text = "héllo wörld ☃ ".repeat(50);
        let windows = split_text(&text, 37, 9);
        assert!(!windows.is_empty());
        let joined: String = windows.concat();
        assert!(joined.contains('☃'));
    }

    #[test]
    fn test_tiny_chunk_size_over_multibyte_text_terminates() {
        // windows narrower than one char's byte width must still advance
        for chunk_size in 1..=3 {
            let windows = split_text("é snowman ☃", chunk_size, 0);
            let joined: String = windows.concat();
            assert!(joined.contains('é'));
            assert!(joined.contains('☃'));
        }
    }

    #[test]
    fn test_windows_measured_in_chars_not_bytes() {
        // 10 chars, 30 bytes
        let text = "☃".repeat(10);
        let windows = split_text(&text, 4, 0);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].chars().count(), 4);
        assert_eq!(windows[1].chars().count(), 4);
        assert_eq!(windows[2].chars().count(), 2);
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let d = doc(&"word ".repeat(500));
        let chunks = chunk_document(&d, 200, 50);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
            assert_eq!(c.doc_path, "test.txt");
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let d = doc("some stable content");
        let a = chunk_document(&d, 1000, 100);
        let b = chunk_document(&d, 1000, 100);
        assert_eq!(a[0].hash, b[0].hash);
        assert_ne!(a[0].id, b[0].id);
    }
}
