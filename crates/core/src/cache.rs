//! Bounded in-memory cache of styled results.
//!
//! Keyed by `(source image identity, model id)`. Eviction is pure
//! insertion-order FIFO: a hit does not refresh an entry, and re-inserting
//! an existing key keeps its original position. Nothing is persisted across
//! process restarts.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::codec::StyledImage;

/// Default number of styled results kept in memory.
pub const CACHE_MAX_SIZE: usize = 20;

/// The separator never occurs in a model id (catalog ids are bare `.onnx`
/// filenames), so the two key components cannot collide.
pub fn cache_key(source_uri: &str, model_id: &str) -> String {
    format!("{source_uri}::{model_id}")
}

pub struct ResultCache {
    capacity: usize,
    order: VecDeque<String>,
    entries: HashMap<String, Arc<StyledImage>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Access never refreshes insertion order.
    pub fn get(&self, key: &str) -> Option<Arc<StyledImage>> {
        self.entries.get(key).cloned()
    }

    /// Insert, evicting the single oldest-inserted entry once the bound is
    /// exceeded. Replacing an existing key keeps its original position.
    pub fn put(&mut self, key: String, image: Arc<StyledImage>) {
        if self.entries.insert(key.clone(), image).is_none() {
            self.order.push_back(key);
        }

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CACHE_MAX_SIZE)
    }
}
