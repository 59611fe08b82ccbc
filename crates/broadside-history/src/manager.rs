//! The event memory manager.
//!
//! [`EventMemoryManager`] owns a [`RingBuffer`] for ordinary churn and a
//! [`CriticalStore`] for events flagged critical. Critical events are written
//! to both: the ring keeps them in order with their neighbours while they are
//! recent, the store keeps them after the ring has moved on.
//!
//! # Invariants
//!
//! - Events are appended in strict call order.
//! - `all_events().len() <= max_events + max_critical_events`.
//! - The most recently recorded event is always present in `all_events()`.

use std::mem::size_of;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::critical::CriticalStore;
use crate::record::Recordable;
use crate::ring::RingBuffer;
use crate::stats::MemoryStats;
use crate::HistoryError;

/// Default ring buffer capacity.
pub const DEFAULT_MAX_EVENTS: usize = 1000;

/// Default critical store capacity.
pub const DEFAULT_MAX_CRITICAL_EVENTS: usize = 100;

/// Capacities of an [`EventMemoryManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Ring buffer slots.
    pub max_events: usize,
    /// Critical store cap.
    pub max_critical_events: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
            max_critical_events: DEFAULT_MAX_CRITICAL_EVENTS,
        }
    }
}

impl HistoryConfig {
    /// Creates a config with explicit capacities.
    #[must_use]
    pub fn new(max_events: usize, max_critical_events: usize) -> Self {
        Self {
            max_events,
            max_critical_events,
        }
    }

    /// Checks that both capacities are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] naming the zero capacity.
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.max_events == 0 {
            return Err(HistoryError::ZeroBufferCapacity);
        }
        if self.max_critical_events == 0 {
            return Err(HistoryError::ZeroCriticalCapacity);
        }
        Ok(())
    }
}

/// Bounded event log with protected critical events.
#[derive(Debug, Clone)]
pub struct EventMemoryManager<E: Recordable> {
    config: HistoryConfig,
    buffer: RingBuffer<E>,
    critical: CriticalStore<E>,
    total_processed: u64,
}

impl<E: Recordable> EventMemoryManager<E> {
    /// Creates an empty manager with pre-allocated buffer slots.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if either capacity is zero.
    pub fn new(config: HistoryConfig) -> Result<Self, HistoryError> {
        config.validate()?;
        Ok(Self {
            config,
            buffer: RingBuffer::with_capacity(config.max_events),
            critical: CriticalStore::new(config.max_critical_events),
            total_processed: 0,
        })
    }

    /// Current capacities.
    #[must_use]
    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Records an event.
    ///
    /// The event goes into the ring buffer (overwriting the oldest entry when
    /// full). Critical events are also appended to the critical store.
    pub fn record_event(&mut self, event: E) {
        self.total_processed += 1;
        if event.is_critical() {
            let dropped = self.critical.push(event.clone());
            if dropped > 0 {
                debug!(dropped, cap = self.critical.cap(), "critical store retention applied");
            }
        }
        self.buffer.push(event);
    }

    /// Every retained event, de-duplicated by id and sorted by timestamp.
    ///
    /// Events with equal timestamps are ordered by id.
    #[must_use]
    pub fn all_events(&self) -> Vec<E> {
        let mut merged: Vec<&E> = self
            .buffer
            .iter()
            .chain(self.critical.as_slice().iter())
            .collect();
        merged.sort_by_key(|event| (event.timestamp(), event.id()));
        merged.dedup_by_key(|event| event.id());
        merged.into_iter().cloned().collect()
    }

    /// The `n` most recent buffered events, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<E> {
        let skip = self.buffer.len().saturating_sub(n);
        self.buffer.iter().skip(skip).cloned().collect()
    }

    /// The most recently recorded event.
    #[must_use]
    pub fn latest(&self) -> Option<&E> {
        self.buffer.newest()
    }

    /// Retained critical events in record order.
    #[must_use]
    pub fn critical_events(&self) -> &[E] {
        self.critical.as_slice()
    }

    /// Retained events matching a predicate, in the order of [`all_events`].
    ///
    /// [`all_events`]: Self::all_events
    pub fn events_where<F>(&self, mut predicate: F) -> Vec<E>
    where
        F: FnMut(&E) -> bool,
    {
        self.all_events()
            .into_iter()
            .filter(|event| predicate(event))
            .collect()
    }

    /// Number of events held by the ring buffer.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Events recorded since creation or the last [`clear`](Self::clear).
    #[must_use]
    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    /// Size and footprint report.
    #[must_use]
    pub fn memory_stats(&self) -> MemoryStats {
        let slot_bytes = self.buffer.capacity() * size_of::<Option<E>>();
        let critical_bytes = self.critical.len() * size_of::<E>();
        let heap_bytes: usize = self
            .buffer
            .iter()
            .chain(self.critical.as_slice().iter())
            .map(Recordable::heap_size)
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let buffer_utilization = self.buffer.len() as f64 / self.buffer.capacity() as f64;

        MemoryStats {
            total_events_processed: self.total_processed,
            critical_event_count: self.critical.len(),
            buffered_event_count: self.buffer.len(),
            buffer_capacity: self.buffer.capacity(),
            buffer_utilization,
            estimated_memory_bytes: slot_bytes + critical_bytes + heap_bytes,
        }
    }

    /// Applies new capacities at runtime.
    ///
    /// A changed `max_events` resizes the ring buffer, keeping as many of the
    /// most recent entries as fit. A changed `max_critical_events` re-applies
    /// the retention policy.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if either capacity is zero; the manager is
    /// left unchanged.
    pub fn update_config(&mut self, config: HistoryConfig) -> Result<(), HistoryError> {
        config.validate()?;
        if config.max_events != self.config.max_events {
            let dropped = self.buffer.resize(config.max_events);
            debug!(
                from = self.config.max_events,
                to = config.max_events,
                dropped,
                "resized event buffer"
            );
        }
        if config.max_critical_events != self.config.max_critical_events {
            let dropped = self.critical.set_cap(config.max_critical_events);
            debug!(
                from = self.config.max_critical_events,
                to = config.max_critical_events,
                dropped,
                "resized critical store"
            );
        }
        self.config = config;
        Ok(())
    }

    /// Drops every event and resets the processed counter.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.critical.clear();
        self.total_processed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::test_support::TestEvent;
    use proptest::prelude::*;

    fn manager(max_events: usize, max_critical: usize) -> EventMemoryManager<TestEvent> {
        EventMemoryManager::new(HistoryConfig::new(max_events, max_critical)).unwrap()
    }

    mod config_tests {
        use super::*;

        #[test]
        fn default_capacities() {
            let config = HistoryConfig::default();
            assert_eq!(config.max_events, 1000);
            assert_eq!(config.max_critical_events, 100);
        }

        #[test]
        fn zero_capacity_rejected() {
            assert_eq!(
                EventMemoryManager::<TestEvent>::new(HistoryConfig::new(0, 10)).unwrap_err(),
                HistoryError::ZeroBufferCapacity
            );
            assert_eq!(
                EventMemoryManager::<TestEvent>::new(HistoryConfig::new(10, 0)).unwrap_err(),
                HistoryError::ZeroCriticalCapacity
            );
        }

        #[test]
        fn invalid_update_leaves_manager_unchanged() {
            let mut history = manager(5, 5);
            history.record_event(TestEvent::plain(1));
            assert!(history.update_config(HistoryConfig::new(0, 5)).is_err());
            assert_eq!(history.config(), HistoryConfig::new(5, 5));
            assert_eq!(history.buffered_len(), 1);
        }
    }

    mod record_tests {
        use super::*;

        #[test]
        fn critical_events_survive_buffer_churn() {
            let mut history = manager(10, 5);
            history.record_event(TestEvent::critical(0));
            for id in 1..100 {
                history.record_event(TestEvent::plain(id));
            }

            let all = history.all_events();
            assert_eq!(all.len(), 11);
            assert_eq!(all[0], TestEvent::critical(0));
            assert_eq!(all.last().unwrap().id, 99);
        }

        #[test]
        fn recent_critical_event_not_duplicated() {
            let mut history = manager(10, 5);
            history.record_event(TestEvent::plain(1));
            history.record_event(TestEvent::critical(2));
            history.record_event(TestEvent::plain(3));

            let ids: Vec<u64> = history.all_events().iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![1, 2, 3]);
        }

        #[test]
        fn equal_timestamps_ordered_by_id() {
            let mut history = manager(10, 5);
            for id in [5, 3, 4] {
                history.record_event(TestEvent {
                    id,
                    at: 100,
                    critical: id == 3,
                });
            }
            let ids: Vec<u64> = history.all_events().iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![3, 4, 5]);
        }

        #[test]
        fn recent_returns_tail() {
            let mut history = manager(10, 5);
            for id in 0..8 {
                history.record_event(TestEvent::plain(id));
            }
            let ids: Vec<u64> = history.recent(3).iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![5, 6, 7]);
            assert_eq!(history.recent(100).len(), 8);
            assert_eq!(history.latest().map(|e| e.id), Some(7));
        }

        #[test]
        fn events_where_filters() {
            let mut history = manager(10, 5);
            for id in 0..6 {
                history.record_event(TestEvent {
                    id,
                    at: id,
                    critical: id % 2 == 0,
                });
            }
            let critical = history.events_where(|e| e.critical);
            assert_eq!(critical.len(), 3);
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn stats_track_processed_and_utilization() {
            let mut history = manager(4, 2);
            history.record_event(TestEvent::critical(0));
            history.record_event(TestEvent::plain(1));

            let stats = history.memory_stats();
            assert_eq!(stats.total_events_processed, 2);
            assert_eq!(stats.critical_event_count, 1);
            assert_eq!(stats.buffered_event_count, 2);
            assert_eq!(stats.buffer_capacity, 4);
            assert!((stats.buffer_utilization - 0.5).abs() < f64::EPSILON);
            assert!(stats.estimated_memory_bytes >= 4 * size_of::<Option<TestEvent>>());
        }

        #[test]
        fn clear_resets_counters() {
            let mut history = manager(4, 2);
            history.record_event(TestEvent::critical(0));
            history.clear();
            let stats = history.memory_stats();
            assert_eq!(stats.total_events_processed, 0);
            assert_eq!(stats.critical_event_count, 0);
            assert!(history.all_events().is_empty());
        }
    }

    mod resize_tests {
        use super::*;

        #[test]
        fn shrinking_keeps_most_recent() {
            let mut history = manager(10, 5);
            for id in 0..10 {
                history.record_event(TestEvent::plain(id));
            }
            history.update_config(HistoryConfig::new(3, 5)).unwrap();

            let ids: Vec<u64> = history.all_events().iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![7, 8, 9]);
            assert_eq!(history.memory_stats().buffer_capacity, 3);
        }

        #[test]
        fn growing_accepts_more_events() {
            let mut history = manager(2, 5);
            for id in 0..2 {
                history.record_event(TestEvent::plain(id));
            }
            history.update_config(HistoryConfig::new(4, 5)).unwrap();
            for id in 2..4 {
                history.record_event(TestEvent::plain(id));
            }
            assert_eq!(history.all_events().len(), 4);
        }

        #[test]
        fn shrinking_critical_cap_applies_retention() {
            let mut history = manager(2, 50);
            for id in 0..50 {
                history.record_event(TestEvent::critical(id));
            }
            history.update_config(HistoryConfig::new(2, 10)).unwrap();
            let critical: Vec<u64> = history.critical_events().iter().map(|e| e.id).collect();
            assert_eq!(critical.len(), 10);
            assert_eq!(critical[0], 0);
            assert_eq!(*critical.last().unwrap(), 49);
        }
    }

    #[test]
    fn ten_thousand_events_stay_bounded() {
        let mut history = manager(100, 100);
        for id in 0..10_000 {
            history.record_event(TestEvent {
                id,
                at: id,
                critical: id % 7 == 0,
            });
        }
        let all = history.all_events();
        assert!(all.len() <= 200);
        assert_eq!(all.last().map(|e| e.id), Some(9_999));
        assert_eq!(history.total_processed(), 10_000);
    }

    proptest! {
        #[test]
        fn all_events_bounded_and_latest_present(
            max_events in 1usize..64,
            max_critical in 1usize..32,
            flags in proptest::collection::vec(any::<bool>(), 1..400),
        ) {
            let mut history = manager(max_events, max_critical);
            for (id, critical) in flags.iter().enumerate() {
                history.record_event(TestEvent { id: id as u64, at: id as u64, critical: *critical });
            }
            let all = history.all_events();
            prop_assert!(all.len() <= max_events + max_critical);
            prop_assert_eq!(all.last().map(|e| e.id), Some(flags.len() as u64 - 1));
            let mut ids: Vec<u64> = all.iter().map(|e| e.id).collect();
            let before = ids.len();
            ids.dedup();
            prop_assert_eq!(before, ids.len());
        }
    }
}
