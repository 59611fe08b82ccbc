//! Fixed-capacity circular buffer.
//!
//! All slots are allocated up front; pushing never allocates. Once the buffer
//! is full every push overwrites (and returns) the oldest entry.

/// Pre-allocated circular buffer of events.
#[derive(Debug, Clone)]
pub struct RingBuffer<E> {
    slots: Vec<Option<E>>,
    /// Index of the slot the next push writes to.
    head: usize,
    len: usize,
}

impl<E> RingBuffer<E> {
    /// Creates an empty buffer with `capacity` slots.
    ///
    /// A capacity of zero is bumped to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if the next push will evict an entry.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Appends an entry, returning the evicted oldest entry if the buffer was full.
    pub fn push(&mut self, item: E) -> Option<E> {
        let capacity = self.capacity();
        let evicted = self.slots[self.head].replace(item);
        self.head = (self.head + 1) % capacity;
        if evicted.is_none() {
            self.len += 1;
        }
        evicted
    }

    /// Iterates entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).filter_map(move |offset| self.slots[(start + offset) % capacity].as_ref())
    }

    /// The most recently pushed entry.
    #[must_use]
    pub fn newest(&self) -> Option<&E> {
        if self.len == 0 {
            return None;
        }
        let capacity = self.capacity();
        self.slots[(self.head + capacity - 1) % capacity].as_ref()
    }

    /// Changes the number of slots, keeping as many of the newest entries as fit.
    ///
    /// Returns the number of entries dropped.
    pub fn resize(&mut self, capacity: usize) -> usize {
        let capacity = capacity.max(1);
        let total = self.len;
        let keep = total.min(capacity);

        let capacity_before = self.capacity();
        let start = (self.head + capacity_before - total) % capacity_before;
        let mut ordered: Vec<E> = Vec::with_capacity(total);
        for offset in 0..total {
            if let Some(item) = self.slots[(start + offset) % capacity_before].take() {
                ordered.push(item);
            }
        }

        let dropped = ordered.len() - keep;
        let mut slots: Vec<Option<E>> = Vec::with_capacity(capacity);
        slots.extend(ordered.into_iter().skip(dropped).map(Some));
        slots.resize_with(capacity, || None);

        self.slots = slots;
        self.len = keep;
        self.head = keep % capacity;
        dropped
    }

    /// Removes all entries without releasing the slots.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}
