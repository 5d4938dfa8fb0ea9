use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

/// Keyed map from skill/pattern name to learned parameters (spec §4.5
/// "Procedural -- write-through, no eviction").
#[derive(Default)]
pub struct ProceduralStore {
    patterns: RwLock<HashMap<String, Value>>,
}

impl ProceduralStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, name: impl Into<String>, params: Value) {
        self.patterns.write().insert(name.into(), params);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.patterns.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.patterns.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn write_through_has_no_eviction() {
        let store = ProceduralStore::new();
        for i in 0..5000 {
            store.upsert(format!("skill-{i}"), json!({"n": i}));
        }
        assert_eq!(store.names().len(), 5000);
        assert_eq!(store.get("skill-0").unwrap(), json!({"n": 0}));
    }
}
