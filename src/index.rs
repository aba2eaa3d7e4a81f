//! In-process vector index over chunk embeddings.
//!
//! The index owns the chunking policy and the chunk/vector pairs; the
//! embedding computation itself is delegated to an [`EmbeddingClient`].
//! Search is brute-force cosine ranking, which is plenty for a single
//! repository's worth of chunks.
//!
//! An index is rebuilt wholesale on every analysis — there is no
//! incremental update path. As a side effect it can be persisted to a
//! fixed directory (`chunks.json` + `vectors.bin`); any previously
//! persisted index at that location is deleted first so a corrupted store
//! from a prior run is never reused.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::chunk::chunk_document;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, EmbeddingClient};
use crate::models::{Chunk, Document, RetrievedChunk};

const CHUNKS_FILE: &str = "chunks.json";
const VECTORS_FILE: &str = "vectors.bin";

struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Similarity-searchable structure over chunk embeddings.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dims: usize,
}

impl VectorIndex {
    pub(crate) fn empty() -> Self {
        Self {
            entries: Vec::new(),
            dims: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return the top-`k` chunks by cosine similarity to `query_vec`,
    /// best first. Chunks with no positive similarity are not considered
    /// relevant and are dropped.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let mut hits: Vec<RetrievedChunk> = self
            .entries
            .iter()
            .map(|entry| RetrievedChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_vec, &entry.vector),
            })
            .filter(|hit| hit.score.is_finite() && hit.score > 0.0)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }

    /// Persist the index under `dir`, replacing any previous persisted
    /// index wholesale.
    pub fn save(&self, dir: &Path) -> Result<()> {
        if dir.exists() {
            fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to clear index dir: {}", dir.display()))?;
        }
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create index dir: {}", dir.display()))?;

        let chunks: Vec<&Chunk> = self.entries.iter().map(|e| &e.chunk).collect();
        let json = serde_json::to_vec_pretty(&chunks)?;
        fs::write(dir.join(CHUNKS_FILE), json)?;

        // dims header followed by one fixed-size blob per vector
        let mut blob = Vec::with_capacity(4 + self.entries.len() * self.dims * 4);
        blob.extend_from_slice(&(self.dims as u32).to_le_bytes());
        for entry in &self.entries {
            blob.extend_from_slice(&vec_to_blob(&entry.vector));
        }
        fs::write(dir.join(VECTORS_FILE), blob)?;

        debug!(chunks = self.entries.len(), dir = %dir.display(), "index persisted");
        Ok(())
    }

    /// Restore a previously persisted index from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let chunks_raw = fs::read(dir.join(CHUNKS_FILE))
            .with_context(|| format!("No persisted index at {}", dir.display()))?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunks_raw)
            .context("Corrupt persisted index: bad chunks.json")?;

        let vectors_raw = fs::read(dir.join(VECTORS_FILE))
            .with_context(|| format!("No persisted vectors at {}", dir.display()))?;
        if vectors_raw.len() < 4 {
            bail!("Corrupt persisted index: vectors.bin too short");
        }
        let dims = u32::from_le_bytes([
            vectors_raw[0],
            vectors_raw[1],
            vectors_raw[2],
            vectors_raw[3],
        ]) as usize;

        let body = &vectors_raw[4..];

        // an analysis over whitespace-only documents persists an empty index
        if chunks.is_empty() && dims == 0 && body.is_empty() {
            return Ok(Self::empty());
        }

        let stride = dims * 4;
        if dims == 0 || body.len() != chunks.len() * stride {
            bail!(
                "Corrupt persisted index: {} chunks but {} vector bytes (dims {})",
                chunks.len(),
                body.len(),
                dims
            );
        }

        let entries = chunks
            .into_iter()
            .zip(body.chunks_exact(stride))
            .map(|(chunk, blob)| IndexEntry {
                chunk,
                vector: blob_to_vec(blob),
            })
            .collect();

        Ok(Self { entries, dims })
    }
}

/// Chunk every document and embed all chunks into a fresh [`VectorIndex`].
///
/// A failure to embed any chunk fails the whole build; there is no
/// partial index.
pub async fn build_index(
    docs: &[Document],
    embedder: &dyn EmbeddingClient,
    chunk_size: usize,
    overlap: usize,
) -> Result<VectorIndex> {
    let mut chunks = Vec::new();
    for doc in docs {
        chunks.extend(chunk_document(doc, chunk_size, overlap));
    }

    if chunks.is_empty() {
        return Ok(VectorIndex::empty());
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder
        .embed(&texts)
        .await
        .context("Failed to embed chunks")?;

    if vectors.len() != chunks.len() {
        bail!(
            "Embedding count mismatch: {} chunks, {} vectors",
            chunks.len(),
            vectors.len()
        );
    }

    let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
    if dims == 0 {
        bail!("Embedding service returned zero-dimensional vectors");
    }
    for v in &vectors {
        if v.len() != dims {
            bail!("Embedding dims mismatch: expected {}, got {}", dims, v.len());
        }
    }

    let entries = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexEntry { chunk, vector })
        .collect::<Vec<_>>();

    debug!(chunks = entries.len(), dims, "vector index built");
    Ok(VectorIndex { entries, dims })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Deterministic stub: dimension `i` is 1.0 when the text contains
    /// vocabulary word `i`.
    struct VocabEmbedder {
        vocab: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl EmbeddingClient for VocabEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    self.vocab
                        .iter()
                        .map(|w| if t.contains(w) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "vocab-stub"
        }
    }

    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingClient for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            bail!("embedding backend unavailable")
        }

        fn model_name(&self) -> &str {
            "failing-stub"
        }
    }

    fn doc(name: &str, content: &str) -> Document {
        Document {
            path: PathBuf::from(name),
            content: content.to_string(),
        }
    }

    fn embedder() -> VocabEmbedder {
        VocabEmbedder {
            vocab: vec!["rust", "cargo", "python", "torch"],
        }
    }

    #[tokio::test]
    async fn test_build_and_search_ranks_by_similarity() {
        let docs = vec![
            doc("a.md", "rust and cargo build tooling"),
            doc("b.md", "python with torch models"),
        ];
        let embedder = embedder();
        let index = build_index(&docs, &embedder, 1000, 100).await.unwrap();
        assert_eq!(index.len(), 2);

        let query = embedder.embed(&["rust".to_string()]).await.unwrap();
        let hits = index.search(&query[0], 5);
        assert!(!hits.is_empty());
        assert!(hits[0].chunk.text.contains("rust"));
    }

    #[tokio::test]
    async fn test_search_drops_unrelated_chunks() {
        let docs = vec![doc("a.md", "rust and cargo")];
        let embedder = embedder();
        let index = build_index(&docs, &embedder, 1000, 100).await.unwrap();

        let query = embedder.embed(&["torch".to_string()]).await.unwrap();
        let hits = index.search(&query[0], 5);
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_empty_documents_give_empty_index() {
        let index = build_index(&[], &embedder(), 1000, 100).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_embed_failure_fails_whole_build() {
        let docs = vec![doc("a.md", "anything at all")];
        let result = build_index(&docs, &FailingEmbedder, 1000, 100).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let docs = vec![
            doc("a.md", "rust and cargo"),
            doc("b.md", "python and torch"),
        ];
        let embedder = embedder();
        let index = build_index(&docs, &embedder, 1000, 100).await.unwrap();

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        index.save(&dir).unwrap();

        let restored = VectorIndex::load(&dir).unwrap();
        assert_eq!(restored.len(), index.len());

        let query = embedder.embed(&["cargo".to_string()]).await.unwrap();
        let hits = restored.search(&query[0], 5);
        assert!(hits[0].chunk.text.contains("cargo"));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_index() {
        let embedder = embedder();
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");

        let old = build_index(&[doc("old.md", "python torch")], &embedder, 1000, 100)
            .await
            .unwrap();
        old.save(&dir).unwrap();

        let new = build_index(&[doc("new.md", "rust cargo")], &embedder, 1000, 100)
            .await
            .unwrap();
        new.save(&dir).unwrap();

        let restored = VectorIndex::load(&dir).unwrap();
        assert_eq!(restored.len(), 1);
        let query = embedder.embed(&["python".to_string()]).await.unwrap();
        assert!(restored.search(&query[0], 5).is_empty());
    }

    #[test]
    fn test_load_missing_dir_is_error() {
        assert!(VectorIndex::load(Path::new("/nonexistent/index")).is_err());
    }

    #[test]
    fn test_empty_index_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");

        VectorIndex::empty().save(&dir).unwrap();

        let restored = VectorIndex::load(&dir).unwrap();
        assert!(restored.is_empty());
        assert!(restored.search(&[1.0, 0.0], 5).is_empty());
    }
}
