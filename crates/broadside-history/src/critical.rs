//! Size-capped store for critical events.
//!
//! # Retention
//!
//! When the store grows past its cap it keeps the earliest 10% of the cap
//! (match-start context) and fills the remaining 90% with the most recent
//! events. Everything in between is dropped.

/// Fraction of the cap reserved for the earliest events.
pub const EARLY_RETENTION_FRACTION: f64 = 0.1;

/// Bounded list of critical events in record order.
#[derive(Debug, Clone)]
pub struct CriticalStore<E> {
    events: Vec<E>,
    cap: usize,
}

impl<E> CriticalStore<E> {
    /// Creates an empty store that holds at most `cap` events (minimum 1).
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            events: Vec::new(),
            cap: cap.max(1),
        }
    }

    /// Maximum number of retained events.
    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Retained events in record order.
    #[must_use]
    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    /// Number of slots reserved for the earliest events under the current cap.
    #[must_use]
    pub fn early_slots(&self) -> usize {
        early_slots_for(self.cap)
    }

    /// Appends an event, applying the retention policy if the cap is exceeded.
    ///
    /// Returns the number of events dropped.
    pub fn push(&mut self, event: E) -> usize {
        self.events.push(event);
        self.enforce_cap()
    }

    /// Changes the cap and applies retention immediately.
    ///
    /// Returns the number of events dropped.
    pub fn set_cap(&mut self, cap: usize) -> usize {
        self.cap = cap.max(1);
        self.enforce_cap()
    }

    /// Removes every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn enforce_cap(&mut self) -> usize {
        let len = self.events.len();
        if len <= self.cap {
            return 0;
        }
        let early = early_slots_for(self.cap);
        let recent = self.cap - early;
        let dropped = len - self.cap;
        // Drop the middle run between the preserved head and the recent tail.
        self.events.drain(early..len - recent);
        dropped
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn early_slots_for(cap: usize) -> usize {
    ((cap as f64) * EARLY_RETENTION_FRACTION).floor() as usize
}
