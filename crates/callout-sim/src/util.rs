//! Small shared utilities.

/// FNV-1a 64-bit string hash.
///
/// Used for the shown-hint set: hashes must be stable across processes
/// because they are part of the save contract, which rules out the
/// randomly seeded std hasher.
pub fn fnv1a_64(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Deferred two-phase removal: mark during iteration, flush afterwards.
///
/// The same discipline guards both layers that allow self-modification
/// during dispatch — the event registry and each event's observer set.
#[derive(Debug, Clone)]
pub struct RemovalQueue<K: PartialEq + Copy> {
    marked: Vec<K>,
}

// Manual impl: a derived Default would demand `K: Default`, and
// observer keys have no meaningful default.
impl<K: PartialEq + Copy> Default for RemovalQueue<K> {
    fn default() -> Self {
        Self { marked: Vec::new() }
    }
}

impl<K: PartialEq + Copy> RemovalQueue<K> {
    pub fn mark(&mut self, key: K) {
        if !self.marked.contains(&key) {
            self.marked.push(key);
        }
    }

    pub fn is_marked(&self, key: &K) -> bool {
        self.marked.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Take all marked keys, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<K> {
        std::mem::take(&mut self.marked)
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_is_stable() {
        // Reference value for the empty string is the FNV offset basis.
        assert_eq!(fnv1a_64(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64("hint"), fnv1a_64("hint"));
        assert_ne!(fnv1a_64("hint_a"), fnv1a_64("hint_b"));
    }

    #[test]
    fn removal_queue_default_works_for_defaultless_keys() {
        #[derive(Debug, Clone, Copy, PartialEq)]
        struct Key(u32);

        let mut q: RemovalQueue<Key> = RemovalQueue::default();
        assert!(q.is_empty());
        q.mark(Key(7));
        assert!(q.is_marked(&Key(7)));
    }

    #[test]
    fn removal_queue_dedups_marks() {
        let mut q: RemovalQueue<u32> = RemovalQueue::default();
        q.mark(1);
        q.mark(2);
        q.mark(1);
        assert!(q.is_marked(&1));
        assert_eq!(q.drain(), vec![1, 2]);
        assert!(q.is_empty());
    }
}
