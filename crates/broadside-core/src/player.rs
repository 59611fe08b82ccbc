//! # Player Module
//!
//! A player owns exactly one [`Board`] and one fleet. Board occupancy and the
//! ships' coordinate lists are only ever written together, inside
//! [`Player::place_ship`] and [`Player::unplace_ship`], after every check has
//! passed. [`Player::verify_integrity`] audits the agreement.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Coordinate, Orientation};
use crate::error::{EngineError, ErrorCode, ValidationIssue};
use crate::ids::{PlayerId, ShipId};
use crate::powerup::PowerupInventory;
use crate::ship::{AbilityEffect, Ship, ShipSpec};

/// Whether a player's client is attached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Attached.
    Connected,
    /// Detached since the given time.
    Disconnected {
        /// Unix milliseconds of the disconnect.
        since: u64,
    },
}

/// Running combat statistics of a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Attacks made (a barrage counts once).
    pub shots_fired: u32,
    /// Attacks that hit a ship.
    pub shots_hit: u32,
    /// Attacks that were critical hits.
    pub critical_hits: u32,
    /// Hit points removed from enemy ships.
    pub damage_dealt: u32,
    /// Hit points lost by own ships.
    pub damage_taken: u32,
    /// Enemy ships sunk.
    pub ships_sunk: u32,
}

impl PlayerStats {
    /// Hits per shot, 0 before the first shot.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.shots_fired == 0 {
            0.0
        } else {
            f64::from(self.shots_hit) / f64::from(self.shots_fired)
        }
    }
}

/// One side of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    board: Board,
    fleet: Vec<Ship>,
    stats: PlayerStats,
    connection: ConnectionStatus,
    ready: bool,
    active: bool,
    powerups: PowerupInventory,
}

impl Player {
    /// Creates a player with an empty board and an unplaced fleet.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFleet`] for an empty fleet, duplicate
    /// ship ids, a ship longer than the board, more ship cells than the board
    /// holds, or an invalid ship entry.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        board: Board,
        fleet: &[ShipSpec],
        powerup_charges: u8,
    ) -> Result<Self, EngineError> {
        if fleet.is_empty() {
            return Err(EngineError::InvalidFleet(format!("player {id} has no ships")));
        }
        let longest_edge = board.width().max(board.height());
        let board_cells = usize::from(board.width()) * usize::from(board.height());
        let mut total_cells = 0usize;
        let mut ships = Vec::with_capacity(fleet.len());
        for (i, spec) in fleet.iter().enumerate() {
            if fleet[..i].iter().any(|other| other.id == spec.id) {
                return Err(EngineError::InvalidFleet(format!(
                    "player {id} lists ship {} twice",
                    spec.id
                )));
            }
            if spec.size > longest_edge {
                return Err(EngineError::InvalidFleet(format!(
                    "ship {} of size {} does not fit on the board",
                    spec.id, spec.size
                )));
            }
            total_cells += usize::from(spec.size);
            ships.push(Ship::from_spec(spec)?);
        }
        if total_cells > board_cells {
            return Err(EngineError::InvalidFleet(format!(
                "fleet needs {total_cells} cells, board has {board_cells}"
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            board,
            fleet: ships,
            stats: PlayerStats::default(),
            connection: ConnectionStatus::Connected,
            ready: false,
            active: true,
            powerups: PowerupInventory::new(powerup_charges),
        })
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The player's own board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The fleet, in catalog order.
    #[must_use]
    pub fn fleet(&self) -> &[Ship] {
        &self.fleet
    }

    /// Looks up a ship.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.fleet.iter().find(|s| s.id() == id)
    }

    /// Combat statistics.
    #[must_use]
    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Connection status.
    #[must_use]
    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    /// Whether the client is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self.connection, ConnectionStatus::Connected)
    }

    /// Whether the player confirmed the current phase.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// False once the player surrendered or left.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Powerup charges and cooldowns.
    #[must_use]
    pub fn powerups(&self) -> &PowerupInventory {
        &self.powerups
    }

    /// Ships not yet sunk.
    #[must_use]
    pub fn ships_remaining(&self) -> usize {
        self.fleet.iter().filter(|s| !s.is_sunk()).count()
    }

    /// Whether every ship is sunk.
    #[must_use]
    pub fn all_ships_sunk(&self) -> bool {
        !self.fleet.is_empty() && self.fleet.iter().all(Ship::is_sunk)
    }

    /// Whether every ship is on the board.
    #[must_use]
    pub fn fleet_placed(&self) -> bool {
        self.fleet.iter().all(Ship::is_placed)
    }

    /// Active effects of non-sunk ships that modify this player's attacks.
    #[must_use]
    pub fn offensive_effects(&self) -> Vec<AbilityEffect> {
        self.fleet
            .iter()
            .filter(|s| !s.is_sunk())
            .flat_map(Ship::active_effects)
            .filter(AbilityEffect::is_offensive)
            .collect()
    }

    // -------------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------------

    /// Checks a placement without applying it, returning the cells it covers.
    ///
    /// The ship's own current cells do not count as obstacles, so a placed
    /// ship can be moved.
    ///
    /// # Errors
    ///
    /// The first failing check: `SHIP_NOT_FOUND`, `OUT_OF_BOUNDS`,
    /// `SHIP_OVERLAP`, then `SHIP_ADJACENT` when adjacency is disallowed.
    pub fn check_placement(
        &self,
        ship_id: ShipId,
        origin: Coordinate,
        orientation: Orientation,
        allow_adjacent: bool,
    ) -> Result<Vec<Coordinate>, ValidationIssue> {
        let ship = self.ship(ship_id).ok_or_else(|| {
            ValidationIssue::new(ErrorCode::ShipNotFound, format!("no ship {ship_id} in fleet"))
                .with_field("ship_id")
                .with_value(ship_id)
        })?;
        let cells = self
            .board
            .footprint(origin, orientation, ship.size())
            .ok_or_else(|| {
                ValidationIssue::new(
                    ErrorCode::OutOfBounds,
                    format!("ship {ship_id} does not fit at {origin}"),
                )
                .with_field("coordinate")
                .with_value(origin)
            })?;

        let blocker = |c: Coordinate| self.board.occupant(c).filter(|&other| other != ship_id);
        if let Some(c) = cells.iter().copied().find(|&c| blocker(c).is_some()) {
            return Err(ValidationIssue::new(
                ErrorCode::ShipOverlap,
                format!("ship {ship_id} would overlap another ship at {c}"),
            )
            .with_field("coordinate")
            .with_value(c));
        }
        if !allow_adjacent {
            let touching = cells.iter().flat_map(|&c| self.board.area(c, 1)).find(|&n| blocker(n).is_some());
            if let Some(n) = touching {
                return Err(ValidationIssue::new(
                    ErrorCode::ShipAdjacent,
                    format!("ship {ship_id} would touch another ship at {n}"),
                )
                .with_field("coordinate")
                .with_value(n));
            }
        }
        Ok(cells)
    }

    /// Moves a ship onto `cells`, vacating its previous cells first.
    ///
    /// Callers pass the cells returned by [`Player::check_placement`].
    pub(crate) fn place_ship(
        &mut self,
        ship_id: ShipId,
        origin: Coordinate,
        orientation: Orientation,
        cells: Vec<Coordinate>,
    ) {
        let Some(ship) = self.fleet.iter_mut().find(|s| s.id() == ship_id) else {
            return;
        };
        self.board.vacate(ship.coordinates());
        self.board.occupy(&cells, ship_id);
        ship.place(origin, orientation, cells);
    }

    /// Takes a ship off the board.
    ///
    /// # Errors
    ///
    /// `SHIP_NOT_FOUND` if the fleet has no such ship.
    pub(crate) fn unplace_ship(&mut self, ship_id: ShipId) -> Result<(), ValidationIssue> {
        let ship = self
            .fleet
            .iter_mut()
            .find(|s| s.id() == ship_id)
            .ok_or_else(|| {
                ValidationIssue::new(ErrorCode::ShipNotFound, format!("no ship {ship_id} in fleet"))
                    .with_field("ship_id")
                    .with_value(ship_id)
            })?;
        self.board.vacate(ship.coordinates());
        ship.unplace();
        Ok(())
    }

    /// Audits that board occupancy and ship coordinates agree.
    ///
    /// # Errors
    ///
    /// A description of the first disagreement.
    pub fn verify_integrity(&self) -> Result<(), String> {
        for ship in &self.fleet {
            if ship.is_placed() && ship.coordinates().len() != usize::from(ship.size()) {
                return Err(format!(
                    "ship {} has {} cells, size {}",
                    ship.id(),
                    ship.coordinates().len(),
                    ship.size()
                ));
            }
            for &c in ship.coordinates() {
                if self.board.occupant(c) != Some(ship.id()) {
                    return Err(format!("ship {} lists {c} but the board disagrees", ship.id()));
                }
            }
            if ship.is_sunk() && ship.hit_points() != 0 {
                return Err(format!("ship {} is sunk with hit points left", ship.id()));
            }
        }
        for cell in self.board.cells() {
            if let Some(id) = cell.occupant {
                let listed = self.ship(id).is_some_and(|s| s.occupies(cell.coordinate));
                if !listed {
                    return Err(format!(
                        "cell {} claims ship {id} which does not list it",
                        cell.coordinate
                    ));
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Crate-internal mutation
    // -------------------------------------------------------------------------

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub(crate) fn ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.fleet.iter_mut().find(|s| s.id() == id)
    }

    /// Board and fleet borrowed together, for attack resolution.
    pub(crate) fn board_and_fleet_mut(&mut self) -> (&mut Board, &mut [Ship]) {
        (&mut self.board, &mut self.fleet)
    }

    pub(crate) fn stats_mut(&mut self) -> &mut PlayerStats {
        &mut self.stats
    }

    pub(crate) fn powerups_mut(&mut self) -> &mut PowerupInventory {
        &mut self.powerups
    }

    pub(crate) fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionStatus) {
        self.connection = connection;
    }

    /// Ticks ability and powerup timers at the start of this player's turn.
    pub(crate) fn begin_turn(&mut self) {
        for ship in &mut self.fleet {
            ship.tick_abilities();
        }
        self.powerups.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::{AbilitySpec, ShipClass};

    fn fleet() -> Vec<ShipSpec> {
        vec![
            ShipSpec::new(1, "Carrier", ShipClass::Carrier, 5),
            ShipSpec::new(2, "Destroyer", ShipClass::Destroyer, 2),
        ]
    }

    fn player() -> Player {
        Player::new(PlayerId::new(1), "Ada", Board::new(10, 10), &fleet(), 1).unwrap()
    }

    fn place(player: &mut Player, ship: u32, x: i32, y: i32, orientation: Orientation, adjacent: bool) -> Result<(), ErrorCode> {
        let id = ShipId::new(ship);
        let origin = Coordinate::new(x, y);
        let cells = player
            .check_placement(id, origin, orientation, adjacent)
            .map_err(|issue| issue.code)?;
        player.place_ship(id, origin, orientation, cells);
        Ok(())
    }

    mod fleet_tests {
        use super::*;

        #[test]
        fn rejects_invalid_fleets() {
            let board = || Board::new(4, 4);
            assert!(Player::new(PlayerId::new(1), "x", board(), &[], 0).is_err());

            let dup = vec![
                ShipSpec::new(1, "a", ShipClass::Cruiser, 2),
                ShipSpec::new(1, "b", ShipClass::Cruiser, 2),
            ];
            assert!(Player::new(PlayerId::new(1), "x", board(), &dup, 0).is_err());

            let long = vec![ShipSpec::new(1, "a", ShipClass::Carrier, 5)];
            assert!(Player::new(PlayerId::new(1), "x", board(), &long, 0).is_err());

            let crowded: Vec<_> = (0..5)
                .map(|i| ShipSpec::new(i, "c", ShipClass::Battleship, 4))
                .collect();
            assert!(Player::new(PlayerId::new(1), "x", board(), &crowded, 0).is_err());
        }

        #[test]
        fn starts_connected_active_unready() {
            let player = player();
            assert!(player.is_connected());
            assert!(player.is_active());
            assert!(!player.is_ready());
            assert!(!player.fleet_placed());
            assert_eq!(player.ships_remaining(), 2);
            assert!(!player.all_ships_sunk());
        }
    }

    mod placement_tests {
        use super::*;

        #[test]
        fn place_writes_board_and_ship_together() {
            let mut player = player();
            place(&mut player, 1, 0, 0, Orientation::Horizontal, true).unwrap();
            let ship = player.ship(ShipId::new(1)).unwrap();
            assert_eq!(ship.coordinates().len(), 5);
            assert_eq!(player.board().occupant(Coordinate::new(4, 0)), Some(ShipId::new(1)));
            assert!(player.verify_integrity().is_ok());
        }

        #[test]
        fn rejects_out_of_bounds_and_overlap() {
            let mut player = player();
            assert_eq!(
                place(&mut player, 1, 6, 0, Orientation::Horizontal, true),
                Err(ErrorCode::OutOfBounds)
            );
            place(&mut player, 1, 0, 0, Orientation::Horizontal, true).unwrap();
            assert_eq!(
                place(&mut player, 2, 2, 0, Orientation::Vertical, true),
                Err(ErrorCode::ShipOverlap)
            );
            assert_eq!(
                place(&mut player, 9, 0, 5, Orientation::Vertical, true),
                Err(ErrorCode::ShipNotFound)
            );
        }

        #[test]
        fn adjacency_rule_is_configurable() {
            let mut player = player();
            place(&mut player, 1, 0, 0, Orientation::Horizontal, true).unwrap();
            assert_eq!(
                place(&mut player, 2, 5, 1, Orientation::Horizontal, false),
                Err(ErrorCode::ShipAdjacent)
            );
            assert!(place(&mut player, 2, 5, 1, Orientation::Horizontal, true).is_ok());
        }

        #[test]
        fn moving_a_ship_ignores_its_own_cells() {
            let mut player = player();
            place(&mut player, 1, 0, 0, Orientation::Horizontal, true).unwrap();
            place(&mut player, 1, 1, 0, Orientation::Horizontal, false).unwrap();
            assert_eq!(player.board().occupant(Coordinate::new(0, 0)), None);
            assert_eq!(player.board().occupied_count(), 5);
            assert!(player.verify_integrity().is_ok());
        }

        #[test]
        fn unplace_clears_board() {
            let mut player = player();
            place(&mut player, 2, 3, 3, Orientation::Vertical, true).unwrap();
            player.unplace_ship(ShipId::new(2)).unwrap();
            assert!(!player.ship(ShipId::new(2)).unwrap().is_placed());
            assert_eq!(player.board().occupied_count(), 0);
            assert!(player.unplace_ship(ShipId::new(8)).is_err());
        }
    }

    mod integrity_tests {
        use super::*;

        #[test]
        fn detects_torn_occupancy() {
            let mut player = player();
            place(&mut player, 2, 0, 0, Orientation::Horizontal, true).unwrap();
            player.board_mut().occupy(&[Coordinate::new(7, 7)], ShipId::new(2));
            let err = player.verify_integrity().unwrap_err();
            assert!(err.contains("(7, 7)"));
        }
    }

    #[test]
    fn offensive_effects_skip_sunk_ships() {
        let specs = vec![ShipSpec::new(1, "d", ShipClass::Destroyer, 1)
            .with_ability(AbilitySpec::new(1, "power", AbilityEffect::DAMAGE_BOOST))];
        let mut player = Player::new(PlayerId::new(1), "x", Board::new(3, 3), &specs, 0).unwrap();
        place(&mut player, 1, 0, 0, Orientation::Horizontal, true).unwrap();
        let ship = player.ship_mut(ShipId::new(1)).unwrap();
        ship.ability_mut(crate::ids::AbilityId::new(1)).unwrap().activate();
        assert_eq!(player.offensive_effects(), vec![AbilityEffect::DAMAGE_BOOST]);

        player.ship_mut(ShipId::new(1)).unwrap().apply_damage(Coordinate::new(0, 0), 1, 1);
        assert!(player.offensive_effects().is_empty());
    }

    #[test]
    fn accuracy_handles_zero_shots() {
        let mut stats = PlayerStats::default();
        assert!(stats.accuracy().abs() < f64::EPSILON);
        stats.shots_fired = 4;
        stats.shots_hit = 1;
        assert!((stats.accuracy() - 0.25).abs() < f64::EPSILON);
    }
}
