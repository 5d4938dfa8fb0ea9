use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use superagent_types::MemoryItem;

use crate::vector_store::VectorStore;

pub const DEFAULT_EPISODIC_CAPACITY: usize = 1000;

/// Persistent, vector-indexed long-term tier (spec §4.5 "Episodic").
/// Bounded by `episodic_capacity`; oldest summaries are evicted once the
/// bound is exceeded. Compression does not block retrieval from this tier
/// (spec §5): reads take the `RwLock` read side, and the vector-store
/// write happens outside the lock so an `add` never holds the lock across
/// an `.await`.
pub struct EpisodicTier {
    capacity: usize,
    items: RwLock<VecDeque<MemoryItem>>,
    vector_store: Arc<dyn VectorStore>,
}

impl EpisodicTier {
    pub fn new(capacity: usize, vector_store: Arc<dyn VectorStore>) -> Self {
        Self { capacity: capacity.max(1), items: RwLock::new(VecDeque::new()), vector_store }
    }

    pub async fn add(&self, item: MemoryItem) {
        let evicted = {
            let mut items = self.items.write();
            let evicted = if items.len() >= self.capacity { items.pop_front() } else { None };
            items.push_back(item.clone());
            evicted
        };

        if let Some(embedding) = item.embedding.clone() {
            self.vector_store.upsert(item.id.clone(), embedding).await;
        }
        if let Some(evicted) = evicted {
            self.vector_store.remove(&evicted.id).await;
        }
    }

    pub fn snapshot(&self) -> Vec<MemoryItem> {
        self.items.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::InMemoryVectorStore;
    use superagent_types::{MemoryItemId, MemoryType};

    fn item(id: &str) -> MemoryItem {
        let mut i = MemoryItem::new(MemoryItemId::new(id), id, MemoryType::LongTerm, 0);
        i.embedding = Some(vec![1.0, 0.0]);
        i
    }

    #[tokio::test]
    async fn evicts_oldest_summary_once_capacity_exceeded() {
        let tier = EpisodicTier::new(2, Arc::new(InMemoryVectorStore::new()));
        tier.add(item("a")).await;
        tier.add(item("b")).await;
        tier.add(item("c")).await;

        assert_eq!(tier.len(), 2);
        let ids: Vec<_> = tier.snapshot().iter().map(|i| i.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["b".to_string(), "c".to_string()]);
    }
}
