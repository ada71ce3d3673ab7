use std::collections::VecDeque;

/// Fixed-capacity FIFO ring.
///
/// Backed by a `VecDeque` allocated once at full capacity. Pushing into a full
/// ring evicts exactly one element from the head. Copies come out in arrival
/// order, oldest → newest.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty ring with the given maximum capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value at the tail, returning the evicted head when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    /// The most recently pushed value, if any.
    pub fn last(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy the contents out, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        let (head, tail) = self.buf.as_slices();
        let mut out = Vec::with_capacity(self.buf.len());
        out.extend_from_slice(head);
        out.extend_from_slice(tail);
        out
    }
}
