//! Bounded snapshot history.
//!
//! Snapshots are full copies of [`GameStateData`] kept for replay and
//! debugging. The ring holds the most recent `max_snapshots`; the oldest is
//! evicted first.

use serde::{Deserialize, Serialize};

use broadside_history::RingBuffer;

use crate::state::GameStateData;

/// A copy of the match state at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Completed turns when taken.
    pub turn: u32,
    /// Unix milliseconds when taken.
    pub taken_at: u64,
    /// The state.
    pub data: GameStateData,
}

/// Ring of the most recent snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotRing {
    ring: RingBuffer<StateSnapshot>,
}

impl SnapshotRing {
    /// Creates a ring holding `capacity` snapshots (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::with_capacity(capacity),
        }
    }

    /// Stores a snapshot, evicting the oldest when full.
    pub fn push(&mut self, snapshot: StateSnapshot) {
        self.ring.push(snapshot);
    }

    /// Newest snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&StateSnapshot> {
        self.ring.newest()
    }

    /// Snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &StateSnapshot> + '_ {
        self.ring.iter()
    }

    /// Snapshot taken at `turn`, if still retained.
    #[must_use]
    pub fn at_turn(&self, turn: u32) -> Option<&StateSnapshot> {
        self.ring.iter().filter(|s| s.turn == turn).last()
    }

    /// Number retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether none are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Maximum retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
