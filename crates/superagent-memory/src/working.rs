use std::collections::VecDeque;

use parking_lot::Mutex;

use superagent_types::MemoryItem;

pub const DEFAULT_WORKING_CAPACITY: usize = 10;

/// Bounded FIFO ring of recent items (spec §4.5 "Working -- bounded ring
/// (default capacity 10)"). Guarded so `add`/`retrieve` are safe under
/// concurrent callers (spec §5).
pub struct WorkingTier {
    capacity: usize,
    items: Mutex<VecDeque<MemoryItem>>,
}

impl WorkingTier {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), items: Mutex::new(VecDeque::new()) }
    }

    /// Appends `item`, evicting the oldest entry if the ring is at
    /// capacity. Returns the evicted item, if any.
    pub fn add(&self, item: MemoryItem) -> Option<MemoryItem> {
        let mut items = self.items.lock();
        let evicted = if items.len() >= self.capacity { items.pop_front() } else { None };
        items.push_back(item);
        evicted
    }

    pub fn snapshot(&self) -> Vec<MemoryItem> {
        self.items.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl Default for WorkingTier {
    fn default() -> Self {
        Self::new(DEFAULT_WORKING_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use superagent_types::{MemoryItemId, MemoryType};

    fn item(id: &str) -> MemoryItem {
        MemoryItem::new(MemoryItemId::new(id), id, MemoryType::Working, 0)
    }

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let tier = WorkingTier::new(2);
        assert!(tier.add(item("a")).is_none());
        assert!(tier.add(item("b")).is_none());
        let evicted = tier.add(item("c")).unwrap();
        assert_eq!(evicted.id, MemoryItemId::new("a"));
        assert_eq!(tier.len(), 2);
        assert_eq!(tier.snapshot().iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
