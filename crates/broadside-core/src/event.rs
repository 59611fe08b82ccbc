//! Game events recorded in the match history.
//!
//! Events are immutable once created. Lifecycle milestones are flagged
//! critical so the history keeps them through ordinary churn.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use broadside_history::Recordable;

use crate::ids::{EventId, PlayerId};

/// Kind of a game event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventKind {
    /// The match was created.
    GameCreated,
    /// A player took a seat.
    PlayerJoined,
    /// A player left the match.
    PlayerLeft,
    /// A player confirmed the current phase.
    PlayerReady,
    /// The phase advanced.
    PhaseChanged,
    /// A ship was put on the board.
    ShipPlaced,
    /// A ship was taken off the board.
    ShipRemoved,
    /// An attack was resolved.
    AttackResolved,
    /// A ship sank.
    ShipSunk,
    /// An ability was activated.
    AbilityUsed,
    /// A powerup was used.
    PowerupUsed,
    /// The turn passed to the other player.
    TurnAdvanced,
    /// A player ran out of time.
    TurnTimedOut,
    /// The battle was paused.
    GamePaused,
    /// The battle was resumed.
    GameResumed,
    /// A player's client detached.
    PlayerDisconnected,
    /// A player's client reattached.
    PlayerReconnected,
    /// A player surrendered.
    PlayerSurrendered,
    /// A snapshot was taken.
    SnapshotTaken,
    /// The match ended.
    GameEnded,
}

impl GameEventKind {
    /// Whether events of this kind survive ordinary eviction.
    #[must_use]
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Self::GameCreated
                | Self::PhaseChanged
                | Self::GameEnded
                | Self::ShipSunk
                | Self::PlayerJoined
                | Self::PlayerLeft
        )
    }
}

impl fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(Value::String(name)) => f.write_str(&name),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Unique within the match, increasing in record order.
    pub id: EventId,
    /// What happened.
    pub kind: GameEventKind,
    /// Unix milliseconds.
    pub timestamp: u64,
    /// Player involved, if any.
    pub player: Option<PlayerId>,
    /// Kind-specific details.
    pub payload: Value,
}

impl Recordable for GameEvent {
    fn id(&self) -> u64 {
        self.id.get()
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn is_critical(&self) -> bool {
        self.kind.is_critical()
    }

    fn heap_size(&self) -> usize {
        match &self.payload {
            Value::Null => 0,
            payload => payload.to_string().len(),
        }
    }
}
