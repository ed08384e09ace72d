/// Link value for "no next node" and for nodes that are not queued.
pub const NO_NODE: usize = usize::MAX;

/// Highest priority a queue accepts. Buckets are allocated up to the largest
/// priority seen, so this bounds the queue's memory.
pub const MAX_PRIORITY: u32 = 1 << 24;

/// Priority queue over small non-negative integer priorities.
///
/// One bucket per priority; each bucket is a singly linked list threaded
/// through a `links` slice owned by the caller and indexed by node id, so
/// queue membership costs no allocation. The same `links` slice must be passed
/// to every call between two [`BucketQueue::clear`]s.
#[derive(Debug, Clone, Default)]
pub struct BucketQueue {
    heads: Vec<usize>,
    /// Lowest bucket that may be non-empty.
    minimum: usize,
    len: usize,
}

impl BucketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push `node` onto the front of bucket `priority`.
    ///
    /// # Panics
    /// Panics if `priority` exceeds [`MAX_PRIORITY`].
    pub fn enqueue(&mut self, node: usize, priority: u32, links: &mut [usize]) {
        assert!(
            priority <= MAX_PRIORITY,
            "Priority {} of node {} exceeds the queue limit {}",
            priority,
            node,
            MAX_PRIORITY
        );
        let bucket = priority as usize;
        if bucket >= self.heads.len() {
            self.heads.resize(bucket + 1, NO_NODE);
        }
        links[node] = self.heads[bucket];
        self.heads[bucket] = node;
        if self.len == 0 || bucket < self.minimum {
            self.minimum = bucket;
        }
        self.len += 1;
    }

    /// Pop a node with the lowest priority.
    pub fn dequeue(&mut self, links: &mut [usize]) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        while self.minimum < self.heads.len() {
            let head = self.heads[self.minimum];
            if head != NO_NODE {
                self.heads[self.minimum] = links[head];
                links[head] = NO_NODE;
                self.len -= 1;
                return Some(head);
            }
            self.minimum += 1;
        }
        None
    }

    /// Move `node` from bucket `old` to bucket `new`.
    ///
    /// # Panics
    /// Panics if `node` is not queued at priority `old`.
    pub fn decrease_key(&mut self, node: usize, old: u32, new: u32, links: &mut [usize]) {
        let bucket = old as usize;
        let head = self.heads.get(bucket).copied().unwrap_or(NO_NODE);
        if head == node {
            self.heads[bucket] = links[node];
        } else {
            let mut current = head;
            loop {
                assert!(current != NO_NODE, "Node {} is not queued at priority {}", node, old);
                let next = links[current];
                if next == node {
                    links[current] = links[node];
                    break;
                }
                current = next;
            }
        }
        self.len -= 1;
        self.enqueue(node, new, links);
    }

    /// Empty every bucket, keeping the allocation.
    pub fn clear(&mut self) {
        self.heads.fill(NO_NODE);
        self.minimum = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn dequeues_in_priority_order() {
        let mut links = vec![NO_NODE; 5];
        let mut queue = BucketQueue::new();
        queue.enqueue(0, 7, &mut links);
        queue.enqueue(1, 2, &mut links);
        queue.enqueue(2, 9, &mut links);
        queue.enqueue(3, 2, &mut links);
        queue.enqueue(4, 0, &mut links);
        assert_eq!(queue.len(), 5);

        assert_eq!(queue.dequeue(&mut links), Some(4));
        let pair: BTreeSet<usize> = [queue.dequeue(&mut links), queue.dequeue(&mut links)]
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(pair, BTreeSet::from([1, 3]));
        assert_eq!(queue.dequeue(&mut links), Some(0));
        assert_eq!(queue.dequeue(&mut links), Some(2));
        assert_eq!(queue.dequeue(&mut links), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn lower_enqueue_moves_cursor_back() {
        let mut links = vec![NO_NODE; 3];
        let mut queue = BucketQueue::new();
        queue.enqueue(0, 5, &mut links);
        queue.enqueue(1, 6, &mut links);
        assert_eq!(queue.dequeue(&mut links), Some(0));
        queue.enqueue(2, 1, &mut links);
        assert_eq!(queue.dequeue(&mut links), Some(2));
        assert_eq!(queue.dequeue(&mut links), Some(1));
    }

    #[test]
    fn decrease_key_from_head_and_middle() {
        let mut links = vec![NO_NODE; 4];
        let mut queue = BucketQueue::new();
        for node in 0..4 {
            queue.enqueue(node, 10, &mut links);
        }
        // Bucket 10 is 3 -> 2 -> 1 -> 0.
        queue.decrease_key(3, 10, 4, &mut links);
        queue.decrease_key(1, 10, 2, &mut links);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.dequeue(&mut links), Some(1));
        assert_eq!(queue.dequeue(&mut links), Some(3));
        let rest: BTreeSet<usize> = [queue.dequeue(&mut links), queue.dequeue(&mut links)]
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(rest, BTreeSet::from([0, 2]));
        assert!(queue.is_empty());
    }

    #[test]
    #[should_panic(expected = "not queued")]
    fn decrease_key_of_missing_node_panics() {
        let mut links = vec![NO_NODE; 3];
        let mut queue = BucketQueue::new();
        queue.enqueue(0, 3, &mut links);
        queue.decrease_key(1, 3, 1, &mut links);
    }

    #[test]
    #[should_panic(expected = "exceeds the queue limit")]
    fn saturated_priority_is_rejected() {
        let mut links = vec![NO_NODE; 1];
        let mut queue = BucketQueue::new();
        queue.enqueue(0, u32::MAX, &mut links);
    }

    #[test]
    fn clear_keeps_queue_usable() {
        let mut links = vec![NO_NODE; 3];
        let mut queue = BucketQueue::new();
        queue.enqueue(0, 40, &mut links);
        queue.enqueue(1, 3, &mut links);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(&mut links), None);

        links.fill(NO_NODE);
        queue.enqueue(2, 8, &mut links);
        assert_eq!(queue.dequeue(&mut links), Some(2));
    }

    #[test]
    fn matches_ordered_set_under_random_operations() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let nodes = 64;
        let mut links = vec![NO_NODE; nodes];
        let mut queue = BucketQueue::new();
        let mut reference: BTreeSet<(u32, usize)> = BTreeSet::new();
        let mut queued: BTreeMap<usize, u32> = BTreeMap::new();

        for step in 0..5000 {
            match rng.gen_range(0..3) {
                0 => {
                    let node = rng.gen_range(0..nodes);
                    if queued.contains_key(&node) {
                        continue;
                    }
                    let priority = rng.gen_range(0..200);
                    queue.enqueue(node, priority, &mut links);
                    reference.insert((priority, node));
                    queued.insert(node, priority);
                }
                1 => {
                    let Some(&(min, _)) = reference.iter().next() else {
                        assert_eq!(queue.dequeue(&mut links), None);
                        continue;
                    };
                    let node = queue.dequeue(&mut links).expect("queue not empty");
                    let priority = queued.remove(&node).expect("dequeued node was queued");
                    assert_eq!(priority, min, "Step {} dequeued priority {} over {}", step, priority, min);
                    reference.remove(&(priority, node));
                }
                _ => {
                    let Some((&node, &old)) = queued.iter().next() else {
                        continue;
                    };
                    let new = rng.gen_range(0..=old);
                    queue.decrease_key(node, old, new, &mut links);
                    reference.remove(&(old, node));
                    reference.insert((new, node));
                    queued.insert(node, new);
                }
            }
            assert_eq!(queue.len(), reference.len(), "Step {}", step);
        }
    }
}
