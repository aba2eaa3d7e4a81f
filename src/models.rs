//! Core data models used throughout repo-chat.
//!
//! These types represent the documents, chunks, and retrieval results that
//! flow through the analysis and question-answering pipeline, plus the
//! conversation transcript kept by the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file loaded from the repository, before chunking.
///
/// Immutable once created; discarded after indexing and context assembly.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
}

/// A bounded-length window of a document's content.
///
/// Chunks exist transiently during index construction and live inside the
/// vector index afterwards. Boundaries are purely length-based with a
/// configured overlap between consecutive chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub doc_path: String,
    pub chunk_index: i64,
    pub text: String,
    pub hash: String,
}

/// A chunk returned from similarity search, with its cosine score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry in the running conversation transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}
