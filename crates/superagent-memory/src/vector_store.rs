use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use superagent_types::MemoryItemId;

/// Replaceable dense-similarity backend (spec §1 non-goal: "Persistent
/// vector-store implementation internals... treated as a replaceable
/// backend behind an interface"). Mirrors the teacher's pattern of keeping
/// a storage backend swappable behind a trait (`session/sqlite.rs` vs. an
/// in-memory equivalent).
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, id: MemoryItemId, embedding: Vec<f32>);
    async fn remove(&self, id: &MemoryItemId);
    /// Top `k` ids by cosine similarity to `query`, descending.
    async fn top_k(&self, query: &[f32], k: usize) -> Vec<(MemoryItemId, f32)>;
}

/// Default/test backend: an in-memory cosine-similarity index. Good enough
/// for the session-scoped dense search spec §4.5 describes; a production
/// deployment would swap in a persistent ANN index behind the same trait.
#[derive(Default)]
pub struct InMemoryVectorStore {
    embeddings: RwLock<HashMap<MemoryItemId, Vec<f32>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, id: MemoryItemId, embedding: Vec<f32>) {
        self.embeddings.write().insert(id, embedding);
    }

    async fn remove(&self, id: &MemoryItemId) {
        self.embeddings.write().remove(id);
    }

    async fn top_k(&self, query: &[f32], k: usize) -> Vec<(MemoryItemId, f32)> {
        let mut scored: Vec<(MemoryItemId, f32)> = self
            .embeddings
            .read()
            .iter()
            .map(|(id, emb)| (id.clone(), cosine_similarity(query, emb)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

/// Turns text into a fixed-dimension embedding. Modeled as a trait so an
/// embedding-model call (out of scope per spec §1) can be substituted
/// without touching retrieval/compression logic.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
    fn dimension(&self) -> usize;
}

/// Deterministic bag-of-words hashing embedder used as the default/test
/// embedder. Good enough to exercise dense retrieval end-to-end without a
/// network call to a real embedding model.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let bucket = fnv1a(&token.to_lowercase()) as usize % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn top_k_ranks_by_cosine_similarity() {
        let store = InMemoryVectorStore::new();
        store.upsert(MemoryItemId::new("a"), vec![1.0, 0.0]).await;
        store.upsert(MemoryItemId::new("b"), vec![0.0, 1.0]).await;

        let hits = store.top_k(&[1.0, 0.0], 1).await;
        assert_eq!(hits[0].0, MemoryItemId::new("a"));
    }

    #[test]
    fn hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::default();
        assert_eq!(embedder.embed("Alice met Bob"), embedder.embed("Alice met Bob"));
    }

    #[test]
    fn hashing_embedder_distinguishes_different_text() {
        let embedder = HashingEmbedder::default();
        assert_ne!(embedder.embed("Alice"), embedder.embed("completely different text"));
    }
}
