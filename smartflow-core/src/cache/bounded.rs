use std::collections::VecDeque;

/// Fixed-capacity FIFO. Pushing into a full queue evicts the oldest entry,
/// whatever its state.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedFifo<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedFifo<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "fifo capacity must be >= 1");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item`, returning the evicted entry if the queue was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + '_ {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut fifo = BoundedFifo::new(3);
        assert_eq!(fifo.push(1), None);
        assert_eq!(fifo.push(2), None);
        assert_eq!(fifo.push(3), None);
        assert_eq!(fifo.push(4), Some(1));
        assert_eq!(fifo.len(), 3);
        assert_eq!(fifo.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn iter_mut_edits_in_place() {
        let mut fifo = BoundedFifo::new(2);
        fifo.push(1);
        fifo.push(2);
        for v in fifo.iter_mut() {
            *v *= 10;
        }
        assert_eq!(fifo.iter().copied().collect::<Vec<_>>(), vec![10, 20]);
    }

    #[test]
    #[should_panic(expected = "fifo capacity must be >= 1")]
    fn zero_capacity_panics() {
        BoundedFifo::<u8>::new(0);
    }
}
