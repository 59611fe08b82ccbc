//! Test helper functions for setting up matches and fleets.
//!
//! This module provides factory functions and setup utilities that make
//! writing tests more ergonomic and consistent.

use std::sync::Arc;

use crate::board::{Coordinate, Orientation};
use crate::clock::ManualClock;
use crate::config::GameConfiguration;
use crate::game::GameState;
use crate::ids::{MatchId, PlayerId, ShipId};
use crate::rolls::{RollSource, ScriptedRolls};
use crate::ship::{ShipClass, ShipSpec};
use crate::state::GamePhase;

/// First seat. Moves first in battle.
pub const PLAYER_A: PlayerId = PlayerId::new(1);

/// Second seat.
pub const PLAYER_B: PlayerId = PlayerId::new(2);

/// Clock reading at match creation.
pub const START_MS: u64 = 1_700_000_000_000;

/// A roll that never lands a critical hit or an evasion.
pub const NO_LUCK: f64 = 0.999;

// =============================================================================
// Tracing
// =============================================================================

/// Routes engine logs to the test harness output.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Fleets
// =============================================================================

/// The classic five-ship fleet.
///
/// | id | class      | size |
/// |----|------------|------|
/// | 1  | Carrier    | 5    |
/// | 2  | Battleship | 4    |
/// | 3  | Cruiser    | 3    |
/// | 4  | Submarine  | 3    |
/// | 5  | Destroyer  | 2    |
pub fn standard_fleet() -> Vec<ShipSpec> {
    vec![
        ShipSpec::new(1, "Carrier", ShipClass::Carrier, 5),
        ShipSpec::new(2, "Battleship", ShipClass::Battleship, 4),
        ShipSpec::new(3, "Cruiser", ShipClass::Cruiser, 3),
        ShipSpec::new(4, "Submarine", ShipClass::Submarine, 3),
        ShipSpec::new(5, "Destroyer", ShipClass::Destroyer, 2),
    ]
}

/// Where [`place_fleet`] puts a ship: horizontal, flush left, on every
/// other row starting at row 0.
pub fn fleet_origin(ship: ShipId) -> Coordinate {
    let index = i32::try_from(ship.get()).unwrap_or(1) - 1;
    Coordinate::new(0, 2 * index)
}

/// Cells `ship` covers under [`place_fleet`].
pub fn fleet_cells(ship: ShipId, size: u8) -> Vec<Coordinate> {
    let origin = fleet_origin(ship);
    (0..i32::from(size))
        .filter_map(|i| origin.step(Orientation::Horizontal, i))
        .collect()
}

/// The `n`th open-water cell under [`place_fleet`] on a 10x10 board.
///
/// Odd rows stay empty, giving 50 guaranteed misses.
pub fn water(n: u32) -> Coordinate {
    let n = i32::try_from(n % 50).unwrap_or(0);
    Coordinate::new(n % 10, 2 * (n / 10) + 1)
}

// =============================================================================
// Match Setup
// =============================================================================

/// Creates an empty match with a manual clock and rolls that never crit.
pub fn new_match(config: GameConfiguration) -> (GameState, Arc<ManualClock>) {
    new_match_with_rolls(config, Box::new(ScriptedRolls::always(NO_LUCK)))
}

/// Creates an empty match with a manual clock and the given rolls.
pub fn new_match_with_rolls(
    config: GameConfiguration,
    rolls: Box<dyn RollSource>,
) -> (GameState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let game = GameState::with_sources(MatchId::new(1), config, rolls, clock.clone())
        .expect("test configuration is valid");
    (game, clock)
}

/// Places every ship of `player` per [`fleet_origin`].
pub fn place_fleet(game: &mut GameState, player: PlayerId, fleet: &[ShipSpec]) {
    for spec in fleet {
        let result = game
            .place_ship(player, spec.id, fleet_origin(spec.id), Orientation::Horizontal)
            .expect("placement keeps integrity");
        assert!(result.is_valid(), "placement of {} rejected: {result:?}", spec.id);
    }
}

/// Drives a match from the lobby to the first battle turn.
pub fn advance_to_battle(game: &mut GameState, fleet: &[ShipSpec]) {
    for (player, name) in [(PLAYER_A, "Alice"), (PLAYER_B, "Bob")] {
        assert!(game.add_player(player, name, fleet).unwrap().is_valid());
    }
    for player in [PLAYER_A, PLAYER_B] {
        assert!(game.mark_ready(player).unwrap().is_valid());
    }
    for player in [PLAYER_A, PLAYER_B] {
        place_fleet(game, player, fleet);
        assert!(game.mark_ready(player).unwrap().is_valid());
    }
    assert_eq!(game.phase(), GamePhase::Battle);
}

/// A match in battle with the standard fleet, `PLAYER_A` to move.
pub fn battle_ready(config: GameConfiguration) -> (GameState, Arc<ManualClock>) {
    battle_ready_with(config, &standard_fleet(), Box::new(ScriptedRolls::always(NO_LUCK)))
}

/// A match in battle with a custom fleet and rolls.
pub fn battle_ready_with(
    config: GameConfiguration,
    fleet: &[ShipSpec],
    rolls: Box<dyn RollSource>,
) -> (GameState, Arc<ManualClock>) {
    let (mut game, clock) = new_match_with_rolls(config, rolls);
    advance_to_battle(&mut game, fleet);
    (game, clock)
}

/// Plays `turns` alternating misses, each player firing at fresh water.
pub fn play_misses(game: &mut GameState, turns: u32) {
    for _ in 0..turns {
        let player = game.current_player().expect("battle has a current player");
        let shot = water(game.turn_number() / 2);
        let outcome = game.make_move(player, shot).expect("miss keeps integrity");
        assert!(outcome.is_resolved(), "miss at {shot} rejected: {outcome:?}");
    }
}
