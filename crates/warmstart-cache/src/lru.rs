//! Recency ordering for resident blocks.
//!
//! Tracks object keys from most- to least-recently-used. Pure ordering:
//! sizes, budgets, and the decision to evict live in the engine, which
//! also serializes all access under its lock.

use std::collections::HashMap;

/// Node in the recency list.
struct LruNode {
    prev: Option<String>,
    next: Option<String>,
}

/// Ordered set of object keys, most-recently-used first.
///
/// Backed by a doubly-linked list whose links are stored in a map keyed by
/// the object key itself, so `touch`, `remove`, and `evict_lru` are all
/// constant-time.
///
/// Not thread-safe.
#[derive(Default)]
pub struct LruTracker {
    nodes: HashMap<String, LruNode>,
    /// Most recently used key.
    head: Option<String>,
    /// Least recently used key; the next eviction victim.
    tail: Option<String>,
}

impl LruTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tracker is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `key` is tracked.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Mark `key` as most recently used, inserting it if absent.
    pub fn touch(&mut self, key: &str) {
        if self.nodes.contains_key(key) {
            self.move_to_front(key);
        } else {
            self.add_to_front(key);
        }
    }

    /// Detach `key`; no-op if absent.
    pub fn remove(&mut self, key: &str) {
        self.remove_node(key);
    }

    /// Detach and return the least-recently-used key.
    pub fn evict_lru(&mut self) -> Option<String> {
        let key = self.tail.clone()?;
        self.remove_node(&key);
        Some(key)
    }

    /// All keys in LRU order (most recent first). Linear; for tests and
    /// diagnostics.
    #[must_use]
    pub fn keys_lru_order(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.nodes.len());
        let mut current = self.head.clone();

        while let Some(key) = current {
            keys.push(key.clone());
            current = self.nodes.get(&key).and_then(|n| n.next.clone());
        }

        keys
    }

    fn add_to_front(&mut self, key: &str) {
        let node = LruNode {
            prev: None,
            next: self.head.clone(),
        };

        if let Some(old_head) = &self.head {
            if let Some(old_node) = self.nodes.get_mut(old_head) {
                old_node.prev = Some(key.to_string());
            }
        }

        self.nodes.insert(key.to_string(), node);
        self.head = Some(key.to_string());

        if self.tail.is_none() {
            self.tail = Some(key.to_string());
        }
    }

    fn remove_node(&mut self, key: &str) {
        if let Some(node) = self.nodes.remove(key) {
            if let Some(prev_key) = &node.prev {
                if let Some(prev_node) = self.nodes.get_mut(prev_key) {
                    prev_node.next = node.next.clone();
                }
            } else {
                // This was the head
                self.head = node.next.clone();
            }

            if let Some(next_key) = &node.next {
                if let Some(next_node) = self.nodes.get_mut(next_key) {
                    next_node.prev = node.prev.clone();
                }
            } else {
                // This was the tail
                self.tail = node.prev.clone();
            }
        }
    }

    fn move_to_front(&mut self, key: &str) {
        if self.head.as_deref() == Some(key) {
            return; // Already at front
        }

        self.remove_node(key);
        self.add_to_front(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_inserts_at_front() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.keys_lru_order(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_touch_existing_moves_to_front() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        lru.touch("a");
        assert_eq!(lru.keys_lru_order(), vec!["a", "c", "b"]);

        // Touching the head is a no-op
        lru.touch("a");
        assert_eq!(lru.keys_lru_order(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_evict_lru_order() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.evict_lru(), Some("b".to_string()));
        assert_eq!(lru.evict_lru(), Some("c".to_string()));
        assert_eq!(lru.evict_lru(), Some("a".to_string()));
        assert_eq!(lru.evict_lru(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_remove_middle() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        lru.remove("b");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("b"));
        assert_eq!(lru.keys_lru_order(), vec!["c", "a"]);
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        lru.remove("c"); // head
        assert_eq!(lru.keys_lru_order(), vec!["b", "a"]);

        lru.remove("a"); // tail
        assert_eq!(lru.keys_lru_order(), vec!["b"]);
        assert_eq!(lru.evict_lru(), Some("b".to_string()));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.remove("missing");

        assert_eq!(lru.len(), 1);
        assert!(lru.contains("a"));
    }

    #[test]
    fn test_single_key() {
        let mut lru = LruTracker::new();

        lru.touch("only");
        assert_eq!(lru.len(), 1);

        lru.touch("only");
        assert_eq!(lru.keys_lru_order(), vec!["only"]);

        assert_eq!(lru.evict_lru(), Some("only".to_string()));
        assert!(lru.is_empty());
        assert_eq!(lru.evict_lru(), None);
    }

    #[test]
    fn test_reinsert_after_evict() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.evict_lru();

        lru.touch("a");
        assert_eq!(lru.keys_lru_order(), vec!["a", "b"]);
    }
}
