//! Single-flight registry of per-key debounce deadlines
//!
//! Each key has at most one outstanding deadline. Scheduling a key that is
//! already pending replaces its deadline, so a superseded deadline can never
//! fire. The owner polls [`DebounceRegistry::take_due`] once per frame.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
pub struct DebounceRegistry<K> {
    delay_ms: u64,
    pending: HashMap<K, u64>,
}

impl<K: Eq + Hash + Copy + Ord> DebounceRegistry<K> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: HashMap::new(),
        }
    }

    #[inline]
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// (Re)arm `key` to fire at `now + delay`. Returns true if an earlier
    /// deadline for the same key was cancelled.
    pub fn schedule(&mut self, key: K, now: u64) -> bool {
        self.pending
            .insert(key, now.saturating_add(self.delay_ms))
            .is_some()
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn deadline(&self, key: &K) -> Option<u64> {
        self.pending.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest outstanding deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.values().copied().min()
    }

    /// Remove and return every key whose deadline has passed, oldest first
    pub fn take_due(&mut self, now: u64) -> Vec<K> {
        let mut due: Vec<(u64, K)> = self
            .pending
            .iter()
            .filter(|&(_, &deadline)| deadline <= now)
            .map(|(&key, &deadline)| (deadline, key))
            .collect();
        due.sort_unstable();

        for (_, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Remove and return every key regardless of deadline (teardown)
    pub fn drain(&mut self) -> Vec<K> {
        let mut keys: Vec<(u64, K)> = self.pending.drain().map(|(k, d)| (d, k)).collect();
        keys.sort_unstable();
        keys.into_iter().map(|(_, key)| key).collect()
    }
}
