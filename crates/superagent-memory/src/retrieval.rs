use std::collections::{HashMap, HashSet};

use superagent_types::{MemoryItem, MemoryItemId};

use crate::episodic::EpisodicTier;
use crate::vector_store::{Embedder, VectorStore};
use crate::working::WorkingTier;

pub const DEFAULT_TEMPORAL_WEIGHT: f32 = 0.3;
const DENSE_WEIGHT: f32 = 0.4;
const SPARSE_WEIGHT: f32 = 0.3;
const RRF_OFFSET: f32 = 60.0;

/// One fused retrieval hit (spec §4.5 "Return top k as contexts").
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub item: MemoryItem,
    pub score: f32,
}

/// Hybrid dense + sparse + temporal-decay retrieval (spec §4.5
/// `retrieve_relevant_context`). Dense search queries the vector store;
/// sparse search is a BM25-style keyword overlap over the working tier
/// (and episodic, per spec: "and optionally episodic" -- we always include
/// it since both tiers are already in memory and cheap to scan); both are
/// fused by reciprocal-rank fusion with a temporal-decay term.
pub async fn retrieve_relevant_context(
    query: &str,
    k: usize,
    temporal_weight: f32,
    now: i64,
    embedder: &dyn Embedder,
    vector_store: &dyn VectorStore,
    working: &WorkingTier,
    episodic: &EpisodicTier,
) -> Vec<RetrievedContext> {
    let fanout = (2 * k).max(1);

    let query_embedding = embedder.embed(query);
    let dense_hits = vector_store.top_k(&query_embedding, fanout).await;

    let mut candidates = working.snapshot();
    candidates.extend(episodic.snapshot());
    let by_id: HashMap<MemoryItemId, MemoryItem> =
        candidates.into_iter().map(|item| (item.id.clone(), item)).collect();

    let sparse_hits = sparse_rank(query, by_id.values(), fanout);

    let mut fused: HashMap<MemoryItemId, f32> = HashMap::new();
    for (rank, (id, _similarity)) in dense_hits.iter().enumerate() {
        *fused.entry(id.clone()).or_insert(0.0) += DENSE_WEIGHT / (RRF_OFFSET + rank as f32 + 1.0);
    }
    for (rank, (id, _overlap)) in sparse_hits.iter().enumerate() {
        *fused.entry(id.clone()).or_insert(0.0) += SPARSE_WEIGHT / (RRF_OFFSET + rank as f32 + 1.0);
    }
    for (id, score) in fused.iter_mut() {
        if let Some(item) = by_id.get(id) {
            let age_hours = (now - item.timestamp).max(0) as f32 / 3600.0;
            *score += temporal_weight * (1.0 / (1.0 + age_hours));
        }
    }

    let mut ranked: Vec<(MemoryItemId, f32)> = fused.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);

    ranked
        .into_iter()
        .filter_map(|(id, score)| by_id.get(&id).cloned().map(|item| RetrievedContext { item, score }))
        .collect()
}

/// Keyword-overlap ranking across `candidates`, descending by overlap
/// count, truncated to `limit`.
fn sparse_rank<'a>(
    query: &str,
    candidates: impl Iterator<Item = &'a MemoryItem>,
    limit: usize,
) -> Vec<(MemoryItemId, f32)> {
    let query_tokens = tokenize(query);
    let mut scored: Vec<(MemoryItemId, f32)> = candidates
        .map(|item| {
            let tokens = tokenize(&item.content);
            let overlap = query_tokens.intersection(&tokens).count() as f32;
            (item.id.clone(), overlap)
        })
        .filter(|(_, score)| *score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
