//! Memory statistics for an event history.

use serde::{Deserialize, Serialize};

/// Snapshot of a history's size and footprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Events recorded since creation (or the last `clear`), evicted ones included.
    pub total_events_processed: u64,
    /// Events currently held by the critical store.
    pub critical_event_count: usize,
    /// Events currently held by the ring buffer.
    pub buffered_event_count: usize,
    /// Ring buffer slots.
    pub buffer_capacity: usize,
    /// `buffered_event_count / buffer_capacity`, in `[0, 1]`.
    pub buffer_utilization: f64,
    /// Rough number of bytes used by stored events and pre-allocated slots.
    pub estimated_memory_bytes: usize,
}

impl MemoryStats {
    /// Utilization as a percentage.
    #[must_use]
    pub fn utilization_percent(&self) -> f64 {
        self.buffer_utilization * 100.0
    }
}
