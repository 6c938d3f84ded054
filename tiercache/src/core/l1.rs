use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Node in the recency list, addressed by slab index
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Bounded LRU store, the hot tier of the cache
///
/// Pure in-memory data structure: a hash map from key to a slab index paired
/// with an intrusive doubly-linked recency list over the slab. All operations
/// are O(1) average; the orchestrator is responsible for locking.
///
/// `get` counts as use for recency purposes, so does `put`.
pub struct L1Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    capacity: usize,
    map: HashMap<K, (usize, V)>,
    nodes: Vec<Node<K>>,
    free: Vec<usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
}

impl<K, V> L1Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new store holding at most `capacity` entries
    ///
    /// `capacity` must be at least 1; the cache constructor validates this
    /// before building a store.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "L1 capacity must be positive");
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Get a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<V> {
        let idx = self.map.get(key).map(|(idx, _)| *idx)?;
        self.detach(idx);
        self.push_front(idx);
        self.map.get(key).map(|(_, value)| value.clone())
    }

    /// Insert or overwrite a value
    ///
    /// Overwriting an existing key refreshes its recency and never evicts.
    /// Inserting a new key into a full store evicts exactly the least
    /// recently used entry, which is returned so the caller can account
    /// for it.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some((idx, slot)) = self.map.get_mut(&key) {
            *slot = value;
            let idx = *idx;
            self.detach(idx);
            self.push_front(idx);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let idx = self.alloc(key.clone());
        self.map.insert(key, (idx, value));
        self.push_front(idx);

        evicted
    }

    /// Remove a key, reporting whether it was present
    pub fn delete(&mut self, key: &K) -> bool {
        if let Some((idx, _)) = self.map.remove(key) {
            self.detach(idx);
            self.free.push(idx);
            true
        } else {
            false
        }
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Configured maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_lru(&mut self) -> Option<(K, V)> {
        let idx = self.tail?;
        let key = self.nodes[idx].key.clone();
        self.detach(idx);
        self.free.push(idx);
        debug!("l1 evict");
        self.map.remove(&key).map(|(_, value)| (key, value))
    }

    fn alloc(&mut self, key: K) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Node {
                key,
                prev: None,
                next: None,
            };
            idx
        } else {
            self.nodes.push(Node {
                key,
                prev: None,
                next: None,
            });
            self.nodes.len() - 1
        }
    }

    fn detach(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;

        if let Some(old_head) = self.head {
            self.nodes[old_head].prev = Some(idx);
        } else {
            self.tail = Some(idx);
        }

        self.head = Some(idx);
    }
}
