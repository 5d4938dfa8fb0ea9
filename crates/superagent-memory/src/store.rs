use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use superagent_types::{MemoryItem, MemoryItemId, MemoryType};

use crate::compression::compress;
use crate::episodic::{EpisodicTier, DEFAULT_EPISODIC_CAPACITY};
use crate::procedural::ProceduralStore;
use crate::retrieval::{retrieve_relevant_context, RetrievedContext, DEFAULT_TEMPORAL_WEIGHT};
use crate::vector_store::{Embedder, HashingEmbedder, InMemoryVectorStore, VectorStore};
use crate::working::{WorkingTier, DEFAULT_WORKING_CAPACITY};

pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 50;

/// Tunable limits for [`AdaptiveMemory`] (spec §6 "Memory" configuration
/// block).
#[derive(Debug, Clone, Copy)]
pub struct MemoryConfig {
    pub working_capacity: usize,
    pub episodic_capacity: usize,
    pub compression_threshold: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            working_capacity: DEFAULT_WORKING_CAPACITY,
            episodic_capacity: DEFAULT_EPISODIC_CAPACITY,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }
}

/// Three-tier adaptive memory store (spec §4.5): working / episodic /
/// procedural tiers, a pending-compression buffer, and hybrid retrieval.
/// The pending buffer is drained and compressed synchronously with
/// respect to other `add` calls (spec §5: "Compression runs to completion
/// while holding the pending buffer; concurrent adds queue behind it"),
/// but never blocks episodic retrieval since that holds only the episodic
/// tier's own lock.
pub struct AdaptiveMemory {
    pub working: WorkingTier,
    pub episodic: EpisodicTier,
    pub procedural: ProceduralStore,
    pending: Mutex<Vec<MemoryItem>>,
    compression_threshold: usize,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl AdaptiveMemory {
    pub fn new(config: MemoryConfig) -> Self {
        let vector_store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        Self {
            working: WorkingTier::new(config.working_capacity),
            episodic: EpisodicTier::new(config.episodic_capacity, vector_store.clone()),
            procedural: ProceduralStore::new(),
            pending: Mutex::new(Vec::new()),
            compression_threshold: config.compression_threshold,
            embedder: Arc::new(HashingEmbedder::default()),
            vector_store,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    /// Adds a working-tier observation, enqueues it into the pending
    /// compression buffer, and runs [`crate::compression::compress`] once
    /// the buffer reaches `compression_threshold` (spec §4.5).
    pub async fn add_working(&self, content: impl Into<String>, now: i64) -> MemoryItem {
        let mut item = MemoryItem::new(MemoryItemId::generate(), content, MemoryType::Working, now);
        item.embedding = Some(self.embedder.embed(&item.content));
        self.working.add(item.clone());

        let drained = {
            let mut pending = self.pending.lock();
            pending.push(item.clone());
            if pending.len() >= self.compression_threshold {
                Some(std::mem::take(&mut *pending))
            } else {
                None
            }
        };

        if let Some(batch) = drained {
            self.compress_and_store(&batch, now).await;
        }

        item
    }

    async fn compress_and_store(&self, batch: &[MemoryItem], now: i64) {
        let summary = compress(batch);
        let mut item = MemoryItem::new(MemoryItemId::generate(), summary.text.clone(), MemoryType::LongTerm, now);
        item.embedding = Some(self.embedder.embed(&summary.text));
        item.metadata.insert("compression_ratio".into(), json!(summary.compression_ratio));
        item.metadata.insert("entities".into(), json!(summary.entities));
        item.metadata.insert("key_decisions".into(), json!(summary.key_decisions));
        self.episodic.add(item).await;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Hybrid dense+sparse+temporal retrieval (spec §4.5
    /// `retrieve_relevant_context`).
    pub async fn retrieve_relevant_context(
        &self,
        query: &str,
        k: usize,
        temporal_weight: f32,
        now: i64,
    ) -> Vec<RetrievedContext> {
        retrieve_relevant_context(
            query,
            k,
            temporal_weight,
            now,
            self.embedder.as_ref(),
            self.vector_store.as_ref(),
            &self.working,
            &self.episodic,
        )
        .await
    }

    pub async fn retrieve_default(&self, query: &str, k: usize, now: i64) -> Vec<RetrievedContext> {
        self.retrieve_relevant_context(query, k, DEFAULT_TEMPORAL_WEIGHT, now).await
    }
}

impl Default for AdaptiveMemory {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn compression_triggers_at_threshold_and_clears_pending() {
        let memory = AdaptiveMemory::new(MemoryConfig {
            working_capacity: 10,
            episodic_capacity: 100,
            compression_threshold: 3,
        });

        memory.add_working("Alice decided to proceed", 0).await;
        memory.add_working("Bob agreed with Alice", 60).await;
        assert_eq!(memory.pending_len(), 2);
        assert_eq!(memory.episodic.len(), 0);

        memory.add_working("Alice and Bob shipped it", 120).await;

        assert_eq!(memory.pending_len(), 0, "pending buffer is empty");
        assert_eq!(memory.episodic.len(), 1, "one new summary in episodic tier");

        let results = memory.retrieve_default("Alice", 5, 200).await;
        assert!(results.iter().any(|r| r.item.content.contains("Alice") && r.score > 0.0));
    }

    #[tokio::test]
    async fn working_tier_stays_within_capacity_after_compression() {
        let memory = AdaptiveMemory::new(MemoryConfig {
            working_capacity: 2,
            episodic_capacity: 100,
            compression_threshold: 3,
        });
        for i in 0..5 {
            memory.add_working(format!("message {i}"), i).await;
        }
        assert!(memory.working.len() <= 2);
        assert!(memory.episodic.len() <= 100);
    }
}
