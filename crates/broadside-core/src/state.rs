//! # Game State Data
//!
//! The aggregate root of a match. [`GameStateData`] is plain data: it is what
//! snapshots store and what [`GameState::state_snapshot`] hands to renderers.
//! Only [`GameState`] mutates it.
//!
//! [`GameState`]: crate::game::GameState
//! [`GameState::state_snapshot`]: crate::game::GameState::state_snapshot

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Coordinate;
use crate::config::GameConfiguration;
use crate::ids::{MatchId, PlayerId};
use crate::outcome::{EndReason, GameOutcome};
use crate::player::Player;
use crate::powerup::PowerupKind;

/// Match phase. Only moves forward.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Waiting for both players to join.
    Waiting,
    /// Both joined; waiting for both to confirm.
    Setup,
    /// Players place their fleets.
    ShipPlacement,
    /// Players take turns attacking.
    Battle,
    /// Terminal.
    Finished,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Setup => "setup",
            Self::ShipPlacement => "ship_placement",
            Self::Battle => "battle",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Coarse status alongside the phase. `Paused` only occurs during battle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Before the battle.
    Waiting,
    /// Battle running.
    Playing,
    /// Battle paused.
    Paused,
    /// Match over.
    Finished,
}

/// Timestamps of a match, Unix milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTimers {
    /// Match creation.
    pub created_at: u64,
    /// Entry into the current phase.
    pub phase_started_at: u64,
    /// Start of the battle.
    pub battle_started_at: Option<u64>,
    /// Start of the current turn.
    pub turn_started_at: Option<u64>,
    /// Start of the current pause.
    pub paused_at: Option<u64>,
    /// Time spent paused over the whole match.
    pub total_paused_ms: u64,
    /// Time spent paused during the current turn.
    pub turn_paused_ms: u64,
    /// End of the match.
    pub ended_at: Option<u64>,
}

impl GameTimers {
    /// Unpaused time spent in the current turn.
    #[must_use]
    pub fn turn_elapsed(&self, now_ms: u64) -> u64 {
        let Some(started) = self.turn_started_at else {
            return 0;
        };
        let end = self.paused_at.unwrap_or(now_ms);
        end.saturating_sub(started).saturating_sub(self.turn_paused_ms)
    }

    /// Unpaused battle time.
    #[must_use]
    pub fn battle_elapsed(&self, now_ms: u64) -> u64 {
        let Some(started) = self.battle_started_at else {
            return 0;
        };
        let end = self.ended_at.or(self.paused_at).unwrap_or(now_ms);
        end.saturating_sub(started).saturating_sub(self.total_paused_ms)
    }
}

/// What a turn consisted of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TurnAction {
    /// A single attack.
    Attack {
        /// Target cell.
        coordinate: Coordinate,
        /// Whether a ship was struck.
        hit: bool,
    },
    /// A powerup that ends the turn.
    Powerup {
        /// Which powerup.
        kind: PowerupKind,
        /// Target cell.
        coordinate: Coordinate,
        /// Whether a ship was struck.
        hit: bool,
    },
    /// The player ran out of time.
    TimedOut,
}

/// One completed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Turn number, starting at 1.
    pub turn: u32,
    /// Who played it.
    pub player: PlayerId,
    /// What they did.
    pub action: TurnAction,
    /// When it completed.
    pub at: u64,
}

/// Full state of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateData {
    /// Match identifier.
    pub match_id: MatchId,
    /// Settings fixed at creation.
    pub config: GameConfiguration,
    /// Current phase.
    pub phase: GamePhase,
    /// Current status.
    pub status: GameStatus,
    /// Players in seat order.
    pub players: Vec<Player>,
    /// Player holding the turn during battle.
    pub current_player: Option<PlayerId>,
    /// Completed turns.
    pub turn_number: u32,
    /// Completed turns since a ship was last struck.
    pub turns_since_last_hit: u32,
    /// Every completed turn.
    pub turn_history: Vec<TurnRecord>,
    /// Timestamps.
    pub timers: GameTimers,
    /// Final outcome once finished.
    pub outcome: Option<GameOutcome>,
}

impl GameStateData {
    /// A fresh match in the waiting phase.
    #[must_use]
    pub fn new(match_id: MatchId, config: GameConfiguration, now_ms: u64) -> Self {
        Self {
            match_id,
            config,
            phase: GamePhase::Waiting,
            status: GameStatus::Waiting,
            players: Vec::with_capacity(2),
            current_player: None,
            turn_number: 0,
            turns_since_last_hit: 0,
            turn_history: Vec::new(),
            timers: GameTimers {
                created_at: now_ms,
                phase_started_at: now_ms,
                ..GameTimers::default()
            },
            outcome: None,
        }
    }

    /// Looks up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    /// The other player of a two-player match.
    #[must_use]
    pub fn opponent_of(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() != id)
    }

    /// Id of the other player.
    #[must_use]
    pub fn opponent_id(&self, id: PlayerId) -> Option<PlayerId> {
        self.opponent_of(id).map(Player::id)
    }

    /// Whether the match ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Finished
    }

    /// Whether the battle is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.status == GameStatus::Paused
    }

    /// Winner, once finished with a winner.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.outcome.as_ref().and_then(|o| o.winner)
    }

    /// End reason, once finished.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.outcome.as_ref().and_then(|o| o.reason)
    }
}
