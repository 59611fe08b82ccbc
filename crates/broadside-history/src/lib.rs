//! # Broadside History
//!
//! Bounded event history for long-running match sessions.
//!
//! A match can emit events for hours. Keeping all of them grows memory without
//! bound, while dropping the oldest ones blindly loses the context needed to
//! audit a match (who joined, when the battle started, which ships sank).
//! This crate splits the history in two:
//!
//! - **Ring buffer**: a pre-allocated, fixed-capacity circular buffer holding
//!   the most recent events of every kind. When full, the oldest entry is
//!   overwritten.
//! - **Critical store**: a separately capped list of events flagged as
//!   critical. When it overflows it keeps the earliest 10% and the most
//!   recent 90%, so match-start context survives while recency is favored.
//!
//! Events are any type implementing [`Recordable`].
//!
//! ## Quick Start
//!
//! ```
//! use broadside_history::{EventMemoryManager, HistoryConfig, Recordable};
//!
//! #[derive(Debug, Clone)]
//! struct Ping {
//!     id: u64,
//!     at: u64,
//! }
//!
//! impl Recordable for Ping {
//!     fn id(&self) -> u64 {
//!         self.id
//!     }
//!     fn timestamp(&self) -> u64 {
//!         self.at
//!     }
//!     fn is_critical(&self) -> bool {
//!         self.id == 0
//!     }
//! }
//!
//! let mut history = EventMemoryManager::new(HistoryConfig::new(4, 2)).unwrap();
//! for id in 0..10 {
//!     history.record_event(Ping { id, at: id * 10 });
//! }
//!
//! let all = history.all_events();
//! // 4 buffered + the critical event 0 that the buffer already evicted
//! assert_eq!(all.len(), 5);
//! assert_eq!(all[0].id, 0);
//! assert_eq!(all.last().unwrap().id, 9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod critical;
pub mod manager;
pub mod record;
pub mod ring;
pub mod stats;

pub use critical::CriticalStore;
pub use manager::{EventMemoryManager, HistoryConfig};
pub use record::Recordable;
pub use ring::RingBuffer;
pub use stats::MemoryStats;

/// Errors raised when configuring a history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// The ring buffer must hold at least one event.
    #[error("max_events must be at least 1")]
    ZeroBufferCapacity,
    /// The critical store must hold at least one event.
    #[error("max_critical_events must be at least 1")]
    ZeroCriticalCapacity,
}
