//! Win and draw detection.
//!
//! [`WinDrawEvaluator::evaluate`] inspects the aggregate state and reports at
//! most one outcome. Conditions are checked in priority order:
//!
//! 1. One fleet fully sunk: the other player wins (`all_ships_sunk`)
//! 2. A player surrendered or left: the other player wins (`surrender`)
//! 3. A player is disconnected and may not (or no longer may) return: the
//!    other player wins (`disconnection`)
//! 4. Both fleets sunk: draw (`mutual_destruction`)
//! 5. The turn counter reached `max_turns`: draw (`turn_limit`)
//! 6. `stalemate_turns` turns in a row without a hit: draw (`stalemate`)
//!
//! Once a match has an outcome it is returned unchanged by every later call.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::PlayerId;
use crate::player::{ConnectionStatus, Player};
use crate::state::{GamePhase, GameStateData};

/// Why a match ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every ship of the loser sank.
    AllShipsSunk,
    /// The loser surrendered or left.
    Surrender,
    /// The loser disconnected for good.
    Disconnection,
    /// The turn ceiling was reached.
    TurnLimit,
    /// Too many turns without a hit.
    Stalemate,
    /// Both fleets sank in the same action.
    MutualDestruction,
    /// An internal inconsistency stopped the match.
    Aborted,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AllShipsSunk => "all_ships_sunk",
            Self::Surrender => "surrender",
            Self::Disconnection => "disconnection",
            Self::TurnLimit => "turn_limit",
            Self::Stalemate => "stalemate",
            Self::MutualDestruction => "mutual_destruction",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Final figures of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// The player.
    pub player: PlayerId,
    /// Attacks made.
    pub shots_fired: u32,
    /// Attacks that struck a ship.
    pub shots_hit: u32,
    /// Hits per shot.
    pub accuracy: f64,
    /// Critical hits landed.
    pub critical_hits: u32,
    /// Hit points removed from enemy ships.
    pub damage_dealt: u32,
    /// Hit points lost.
    pub damage_taken: u32,
    /// Enemy ships sunk.
    pub ships_sunk: u32,
    /// Own ships afloat.
    pub ships_remaining: usize,
}

impl PlayerSummary {
    fn of(player: &Player) -> Self {
        let stats = player.stats();
        Self {
            player: player.id(),
            shots_fired: stats.shots_fired,
            shots_hit: stats.shots_hit,
            accuracy: stats.accuracy(),
            critical_hits: stats.critical_hits,
            damage_dealt: stats.damage_dealt,
            damage_taken: stats.damage_taken,
            ships_sunk: stats.ships_sunk,
            ships_remaining: player.ships_remaining(),
        }
    }
}

/// Figures frozen when the match ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndGameStatistics {
    /// Unpaused battle time.
    pub duration_ms: u64,
    /// Completed turns.
    pub turns: u32,
    /// Per-player figures, in seat order.
    pub players: Vec<PlayerSummary>,
}

impl EndGameStatistics {
    /// Computes the figures from the current state.
    #[must_use]
    pub fn collect(data: &GameStateData, now_ms: u64) -> Self {
        Self {
            duration_ms: data.timers.battle_elapsed(now_ms),
            turns: data.turn_number,
            players: data.players.iter().map(PlayerSummary::of).collect(),
        }
    }
}

/// Verdict of the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Whether the match is over.
    pub is_game_over: bool,
    /// Winner, if any.
    pub winner: Option<PlayerId>,
    /// Loser, if any.
    pub loser: Option<PlayerId>,
    /// Why it ended.
    pub reason: Option<EndReason>,
    /// Whether nobody won.
    pub is_draw: bool,
    /// Final figures, attached when the match is finalized.
    pub statistics: Option<EndGameStatistics>,
}

impl GameOutcome {
    /// The match goes on.
    #[must_use]
    pub fn ongoing() -> Self {
        Self {
            is_game_over: false,
            winner: None,
            loser: None,
            reason: None,
            is_draw: false,
            statistics: None,
        }
    }

    /// `winner` beat `loser`.
    #[must_use]
    pub fn victory(winner: PlayerId, loser: PlayerId, reason: EndReason) -> Self {
        Self {
            is_game_over: true,
            winner: Some(winner),
            loser: Some(loser),
            reason: Some(reason),
            is_draw: false,
            statistics: None,
        }
    }

    /// Nobody won.
    #[must_use]
    pub fn draw(reason: EndReason) -> Self {
        Self {
            is_game_over: true,
            winner: None,
            loser: None,
            reason: Some(reason),
            is_draw: true,
            statistics: None,
        }
    }

    /// The match was stopped by an internal inconsistency.
    #[must_use]
    pub fn aborted() -> Self {
        Self {
            is_game_over: true,
            winner: None,
            loser: None,
            reason: Some(EndReason::Aborted),
            is_draw: false,
            statistics: None,
        }
    }
}

/// Stateless win/draw detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinDrawEvaluator;

impl WinDrawEvaluator {
    /// Evaluates the match.
    ///
    /// Returns the stored outcome of a finished match, and
    /// [`GameOutcome::ongoing`] while fewer than two players have joined.
    #[must_use]
    pub fn evaluate(data: &GameStateData, now_ms: u64) -> GameOutcome {
        if let Some(outcome) = &data.outcome {
            return outcome.clone();
        }
        let [first, second] = data.players.as_slice() else {
            return GameOutcome::ongoing();
        };
        let in_battle = data.phase == GamePhase::Battle;

        if in_battle {
            match (first.all_ships_sunk(), second.all_ships_sunk()) {
                (true, false) => {
                    return GameOutcome::victory(second.id(), first.id(), EndReason::AllShipsSunk)
                }
                (false, true) => {
                    return GameOutcome::victory(first.id(), second.id(), EndReason::AllShipsSunk)
                }
                _ => {}
            }
        }

        if let Some(outcome) = Self::forfeit(first, second, |p| !p.is_active(), EndReason::Surrender) {
            return outcome;
        }

        let policy = data.config.reconnection;
        let gone = |p: &Player| match p.connection() {
            ConnectionStatus::Connected => false,
            ConnectionStatus::Disconnected { since } => {
                !policy.allowed
                    || policy
                        .grace_period_ms
                        .is_some_and(|grace| now_ms.saturating_sub(since) > grace)
            }
        };
        if let Some(outcome) = Self::forfeit(first, second, gone, EndReason::Disconnection) {
            return outcome;
        }

        if !in_battle {
            return GameOutcome::ongoing();
        }
        if first.all_ships_sunk() && second.all_ships_sunk() {
            return GameOutcome::draw(EndReason::MutualDestruction);
        }
        if data
            .config
            .max_turns
            .is_some_and(|max| data.turn_number >= max)
        {
            return GameOutcome::draw(EndReason::TurnLimit);
        }
        if data.turns_since_last_hit >= data.config.stalemate_turns {
            return GameOutcome::draw(EndReason::Stalemate);
        }
        GameOutcome::ongoing()
    }

    /// The first player (in seat order) matching `lost` forfeits to the other.
    fn forfeit(
        first: &Player,
        second: &Player,
        lost: impl Fn(&Player) -> bool,
        reason: EndReason,
    ) -> Option<GameOutcome> {
        if lost(first) {
            Some(GameOutcome::victory(second.id(), first.id(), reason))
        } else if lost(second) {
            Some(GameOutcome::victory(first.id(), second.id(), reason))
        } else {
            None
        }
    }
}
