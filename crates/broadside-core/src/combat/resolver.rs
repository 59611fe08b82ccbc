//! Attack resolution.
//!
//! Applies a validated attack to the defending player's board and fleet. The
//! resolver is the last line of the coordinate guard: a cell already hit is
//! rejected here too, so a retried attack can never land twice.
//!
//! # Chain Reaction
//!
//! Area attacks run a secondary pass after the primary hit. Every cell within
//! Chebyshev distance `d` in `1..=r` of the primary cell that holds an unhit
//! part of a floating ship takes `max(1, floor(base * (r + 1 - d) / (r + 1)))`
//! damage. Chain damage bypasses armor and abilities. `r` is capped at
//! [`MAX_CHAIN_RADIUS`].

use serde::{Deserialize, Serialize};

use crate::board::{Board, Coordinate};
use crate::combat::damage::{AttackModifiers, DamageBreakdown, DamageCalculator, MIN_DAMAGE};
use crate::config::MAX_CHAIN_RADIUS;
use crate::error::{ErrorCode, ValidationIssue};
use crate::ids::ShipId;
use crate::player::Player;
use crate::rolls::RollSource;
use crate::ship::Ship;

/// What an attack did at its primary cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackOutcome {
    /// Open water.
    Miss,
    /// A ship was hit.
    Hit,
    /// A ship was hit and sank.
    Sunk,
    /// A ship was hit critically and stayed afloat.
    CriticalHit,
}

/// Damage dealt to one cell by a chain reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHit {
    /// Cell struck.
    pub coordinate: Coordinate,
    /// Ship struck.
    pub ship_id: ShipId,
    /// Damage before the ship's remaining hit points cap it.
    pub damage: u32,
    /// Hit points actually lost.
    pub hit_points_lost: u32,
    /// Whether this hit sank the ship.
    pub sunk: bool,
}

/// Result of one attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    /// Primary cell.
    pub coordinate: Coordinate,
    /// Outcome at the primary cell.
    pub outcome: AttackOutcome,
    /// Ship at the primary cell.
    pub ship_id: Option<ShipId>,
    /// Computed damage at the primary cell. Zero on a miss or a wreck.
    pub damage: u32,
    /// Hit points lost at the primary cell.
    pub hit_points_lost: u32,
    /// Whether the primary hit was critical.
    pub critical: bool,
    /// Damage pipeline of the primary hit.
    pub breakdown: Option<DamageBreakdown>,
    /// Secondary hits of an area attack.
    pub chain: Vec<ChainHit>,
    /// Ships sunk by the whole attack, primary first.
    pub sunk_ships: Vec<ShipId>,
}

impl AttackResult {
    fn miss(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            outcome: AttackOutcome::Miss,
            ship_id: None,
            damage: 0,
            hit_points_lost: 0,
            critical: false,
            breakdown: None,
            chain: Vec::new(),
            sunk_ships: Vec::new(),
        }
    }

    /// Hit points lost across the primary hit and the chain.
    #[must_use]
    pub fn total_hit_points_lost(&self) -> u32 {
        self.hit_points_lost + self.chain.iter().map(|c| c.hit_points_lost).sum::<u32>()
    }

    /// Whether a floating ship took damage.
    ///
    /// A strike on the wreck of a sunk ship reports [`AttackOutcome::Hit`] but
    /// does not count: it neither scores for accuracy nor breaks a stalemate.
    #[must_use]
    pub fn struck_ship(&self) -> bool {
        self.total_hit_points_lost() > 0
    }
}

/// Applies attacks to a defending player.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackResolver;

impl AttackResolver {
    /// Resolves an attack on `coordinate`.
    ///
    /// Hitting the wreck of a sunk ship marks the cell, reports a `Hit` and
    /// deals nothing.
    ///
    /// # Errors
    ///
    /// `OUT_OF_BOUNDS` off the board, `ALREADY_HIT` on a cell already
    /// attacked. The board is untouched in both cases.
    pub fn resolve(
        defender: &mut Player,
        coordinate: Coordinate,
        base_damage: u32,
        modifiers: &AttackModifiers,
        rolls: &mut dyn RollSource,
        now_ms: u64,
    ) -> Result<AttackResult, ValidationIssue> {
        let (board, fleet) = defender.board_and_fleet_mut();
        if !board.contains(coordinate) {
            return Err(ValidationIssue::new(
                ErrorCode::OutOfBounds,
                format!("{coordinate} is outside the board"),
            )
            .with_field("coordinate")
            .with_value(coordinate));
        }
        if board.is_hit(coordinate) {
            return Err(ValidationIssue::new(
                ErrorCode::AlreadyHit,
                format!("{coordinate} was already attacked"),
            )
            .with_field("coordinate")
            .with_value(coordinate));
        }
        board.mark_hit(coordinate);

        let Some(ship_id) = board.occupant(coordinate) else {
            return Ok(AttackResult::miss(coordinate));
        };
        let Some(ship) = fleet.iter_mut().find(|s| s.id() == ship_id) else {
            return Ok(AttackResult::miss(coordinate));
        };

        if ship.is_sunk() {
            return Ok(AttackResult {
                outcome: AttackOutcome::Hit,
                ship_id: Some(ship_id),
                ..AttackResult::miss(coordinate)
            });
        }

        let breakdown =
            DamageCalculator::calculate(ship, coordinate, base_damage, modifiers, rolls);
        let applied = ship.apply_damage(coordinate, breakdown.total_damage, now_ms);
        let mut sunk_ships = Vec::new();
        let outcome = if applied.sunk {
            reveal_wreck(board, ship);
            sunk_ships.push(ship_id);
            AttackOutcome::Sunk
        } else if breakdown.critical_hit {
            AttackOutcome::CriticalHit
        } else {
            AttackOutcome::Hit
        };

        Ok(AttackResult {
            coordinate,
            outcome,
            ship_id: Some(ship_id),
            damage: breakdown.total_damage,
            hit_points_lost: applied.hit_points_lost,
            critical: breakdown.critical_hit,
            breakdown: Some(breakdown),
            chain: Vec::new(),
            sunk_ships,
        })
    }

    /// Runs the chain-reaction pass around `center` and returns its hits.
    pub fn chain_reaction(
        defender: &mut Player,
        center: Coordinate,
        base_damage: u32,
        radius: u8,
        now_ms: u64,
    ) -> Vec<ChainHit> {
        let radius = radius.min(MAX_CHAIN_RADIUS);
        if radius == 0 {
            return Vec::new();
        }
        let (board, fleet) = defender.board_and_fleet_mut();
        let span = u32::from(radius) + 1;
        let mut hits = Vec::new();

        for coordinate in board.area(center, radius) {
            let distance = coordinate.distance(center);
            if distance == 0 || board.is_hit(coordinate) {
                continue;
            }
            let Some(ship_id) = board.occupant(coordinate) else {
                continue;
            };
            let Some(ship) = fleet.iter_mut().find(|s| s.id() == ship_id && !s.is_sunk()) else {
                continue;
            };

            let scaled = u64::from(base_damage) * u64::from(span - distance) / u64::from(span);
            let damage = u32::try_from(scaled).unwrap_or(u32::MAX).max(MIN_DAMAGE);
            board.mark_hit(coordinate);
            let applied = ship.apply_damage(coordinate, damage, now_ms);
            if applied.sunk {
                reveal_wreck(board, ship);
            }
            hits.push(ChainHit {
                coordinate,
                ship_id,
                damage,
                hit_points_lost: applied.hit_points_lost,
                sunk: applied.sunk,
            });
        }
        hits
    }
}

fn reveal_wreck(board: &mut Board, ship: &Ship) {
    for &c in ship.coordinates() {
        board.reveal(c);
    }
}
