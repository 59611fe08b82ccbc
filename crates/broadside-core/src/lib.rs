//! # Broadside Core
//!
//! Battle resolution engine for turn-based naval combat.
//!
//! Two players each place a fleet on a private grid and take turns
//! attacking cells of the opponent's grid. The engine validates every
//! action, resolves damage (armor, critical hits, ship abilities, class
//! modifiers), tracks ship health and sinking, alternates turns, decides
//! wins and draws, and keeps a bounded event history.
//!
//! ## Architecture
//!
//! - **[`GameState`]**: per-match state machine and sole writer of match data
//! - **[`combat`]**: stateless validator, resolver and damage calculator
//! - **[`WinDrawEvaluator`]**: pure function from match data to an outcome
//! - **[`MatchRegistry`]**: concurrent map of live matches
//! - **[`broadside_history`]**: bounded event history with a critical store
//!
//! Randomness and time are injected through [`RollSource`] and [`Clock`], so
//! a fixed seed and a manual clock replay a match exactly.
//!
//! ## Usage
//!
//! ```
//! use broadside_core::{
//!     Coordinate, GameConfiguration, GameState, MatchId, Orientation, PlayerId, ShipClass,
//!     ShipId, ShipSpec,
//! };
//!
//! let fleet = vec![
//!     ShipSpec::new(1, "Hood", ShipClass::Cruiser, 3),
//!     ShipSpec::new(2, "Swift", ShipClass::Destroyer, 2),
//! ];
//! let (a, b) = (PlayerId::new(1), PlayerId::new(2));
//!
//! let mut game = GameState::new(MatchId::new(1), GameConfiguration::with_seed(7))?;
//! game.add_player(a, "Alice", &fleet)?;
//! game.add_player(b, "Bob", &fleet)?;
//! game.mark_ready(a)?;
//! game.mark_ready(b)?;
//! for player in [a, b] {
//!     game.place_ship(player, ShipId::new(1), Coordinate::new(0, 0), Orientation::Horizontal)?;
//!     game.place_ship(player, ShipId::new(2), Coordinate::new(0, 2), Orientation::Horizontal)?;
//!     game.mark_ready(player)?;
//! }
//!
//! let outcome = game.make_move(a, Coordinate::new(1, 0))?;
//! assert!(outcome.is_resolved());
//! assert_eq!(game.current_player(), Some(b));
//! # Ok::<(), broadside_core::EngineError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use broadside_history;

pub mod board;
pub mod clock;
pub mod combat;
pub mod config;
pub mod error;
pub mod event;
pub mod game;
pub mod ids;
pub mod outcome;
pub mod player;
pub mod powerup;
pub mod registry;
pub mod rolls;
pub mod ship;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod tests;

pub use board::{Board, BoardView, Cell, CellMarks, CellView, Coordinate, Orientation};
pub use clock::{Clock, ManualClock, SystemClock};
pub use combat::{
    AttackModifiers, AttackOutcome, AttackResolver, AttackResult, ChainHit, CombatValidator,
    DamageBreakdown, DamageCalculator, ProposedAction,
};
pub use config::{GameConfiguration, ReconnectionPolicy};
pub use error::{EngineError, ErrorCode, ValidationIssue, ValidationResult};
pub use event::{GameEvent, GameEventKind};
pub use game::{
    GameState, MoveOutcome, MoveReport, OpponentView, PlayerView, PowerupEffect, PowerupOutcome,
    PowerupReport,
};
pub use ids::{AbilityId, EventId, MatchId, PlayerId, ShipId};
pub use outcome::{EndGameStatistics, EndReason, GameOutcome, PlayerSummary, WinDrawEvaluator};
pub use player::{ConnectionStatus, Player, PlayerStats};
pub use powerup::{PowerupInventory, PowerupKind};
pub use registry::{MatchHandle, MatchRegistry};
pub use rolls::{RollSource, ScriptedRolls, SeededRolls};
pub use ship::{AbilityEffect, AbilitySpec, Ship, ShipClass, ShipSpec};
pub use snapshot::{SnapshotRing, StateSnapshot};
pub use state::{GamePhase, GameStateData, GameStatus, GameTimers, TurnAction, TurnRecord};
