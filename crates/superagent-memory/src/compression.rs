use std::collections::{HashMap, HashSet};

use superagent_types::MemoryItem;

const MAX_ENTITIES: usize = 50;
const MAX_KEY_DECISIONS: usize = 10;
const KEY_DECISION_MAX_CHARS: usize = 200;
const DECISION_KEYWORDS: [&str; 5] = ["decided", "chose", "selected", "determined", "concluded"];

/// Output of [`compress`] (spec §4.5 "Compress"). `compression_ratio` is
/// `|summary.text| / sum(|original content|)`.
#[derive(Debug, Clone)]
pub struct Summary {
    pub text: String,
    pub entities: Vec<String>,
    pub relationships: HashMap<String, Vec<String>>,
    pub key_decisions: Vec<String>,
    pub compression_ratio: f32,
    pub span_messages: usize,
    pub span_minutes: f64,
}

/// Runs the four-step compression heuristic over a batch of pending
/// memory items once the pending buffer reaches `compression_threshold`
/// (spec §4.5 points 1-4). Pure function: the caller is responsible for
/// draining the pending buffer and persisting the resulting summary.
pub fn compress(pending: &[MemoryItem]) -> Summary {
    let entities = extract_entities(pending);
    let relationships = build_relationship_graph(pending);
    let key_decisions = extract_key_decisions(pending);

    let span_messages = pending.len();
    let span_minutes = match (pending.first(), pending.last()) {
        (Some(first), Some(last)) => (last.timestamp - first.timestamp).unsigned_abs() as f64 / 60.0,
        _ => 0.0,
    };

    let text = format!(
        "Entities: {}\nKey decisions: {}\n{span_messages} messages over {span_minutes:.1} minutes",
        entities.join(", "),
        key_decisions.join(" | "),
    );

    let original_len: usize = pending.iter().map(|item| item.content.len()).sum();
    let compression_ratio = if original_len == 0 { 0.0 } else { text.len() as f32 / original_len as f32 };

    Summary { text, entities, relationships, key_decisions, compression_ratio, span_messages, span_minutes }
}

/// Distinct capitalized tokens across `items`, capped at [`MAX_ENTITIES`]
/// (spec §4.5 point 1).
fn extract_entities(items: &[MemoryItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();
    'outer: for item in items {
        for token in capitalized_tokens(&item.content) {
            if seen.insert(token.clone()) {
                entities.push(token);
                if entities.len() >= MAX_ENTITIES {
                    break 'outer;
                }
            }
        }
    }
    entities
}

/// For each pair of capitalized tokens co-occurring in one message, adds
/// the second to the first's relationship list (spec §4.5 point 2).
fn build_relationship_graph(items: &[MemoryItem]) -> HashMap<String, Vec<String>> {
    let mut graph: HashMap<String, Vec<String>> = HashMap::new();
    for item in items {
        let tokens = capitalized_tokens(&item.content);
        for e1 in &tokens {
            for e2 in &tokens {
                if e1 == e2 {
                    continue;
                }
                let list = graph.entry(e1.clone()).or_default();
                if !list.contains(e2) {
                    list.push(e2.clone());
                }
            }
        }
    }
    graph
}

/// Messages mentioning a decision keyword, first [`MAX_KEY_DECISIONS`],
/// each truncated to [`KEY_DECISION_MAX_CHARS`] (spec §4.5 point 3).
fn extract_key_decisions(items: &[MemoryItem]) -> Vec<String> {
    let mut decisions = Vec::new();
    for item in items {
        let lower = item.content.to_lowercase();
        if DECISION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            let mut text = item.content.clone();
            if text.len() > KEY_DECISION_MAX_CHARS {
                text.truncate(KEY_DECISION_MAX_CHARS);
            }
            decisions.push(text);
            if decisions.len() >= MAX_KEY_DECISIONS {
                break;
            }
        }
    }
    decisions
}

fn capitalized_tokens(content: &str) -> Vec<String> {
    content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .filter(|word| word.chars().next().is_some_and(char::is_uppercase))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use superagent_types::{MemoryItemId, MemoryType};

    fn item(content: &str, timestamp: i64) -> MemoryItem {
        MemoryItem::new(MemoryItemId::generate(), content, MemoryType::Working, timestamp)
    }

    #[test]
    fn extracts_distinct_capitalized_entities() {
        let items = vec![item("Alice met Bob", 0), item("Bob called Alice again", 60)];
        let summary = compress(&items);
        assert!(summary.entities.contains(&"Alice".to_string()));
        assert!(summary.entities.contains(&"Bob".to_string()));
        assert_eq!(summary.entities.iter().filter(|e| *e == "Alice").count(), 1);
    }

    #[test]
    fn builds_co_occurrence_relationships() {
        let items = vec![item("Alice met Bob", 0)];
        let summary = compress(&items);
        assert!(summary.relationships.get("Alice").unwrap().contains(&"Bob".to_string()));
        assert!(summary.relationships.get("Bob").unwrap().contains(&"Alice".to_string()));
    }

    #[test]
    fn keeps_first_ten_key_decisions_truncated() {
        let long_content = format!("We decided {}", "x".repeat(300));
        let items: Vec<_> = (0..15).map(|i| item(&long_content, i * 60)).collect();
        let summary = compress(&items);
        assert_eq!(summary.key_decisions.len(), 10);
        assert!(summary.key_decisions[0].len() <= KEY_DECISION_MAX_CHARS);
    }

    #[test]
    fn summary_includes_span_descriptor() {
        let items = vec![item("hello", 0), item("world", 600)];
        let summary = compress(&items);
        assert_eq!(summary.span_messages, 2);
        assert!((summary.span_minutes - 10.0).abs() < 1e-9);
        assert!(summary.text.contains("2 messages over 10.0 minutes"));
    }
}
