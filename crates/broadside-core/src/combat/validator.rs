//! Action validation.
//!
//! [`CombatValidator`] decides whether a proposed action may run. It reads
//! the state and never writes it, so it is safe to call speculatively.
//!
//! # Check Order
//!
//! Checks short-circuit on the first hard failure:
//!
//! 1. Phase and status (`GAME_ALREADY_FINISHED`, `GAME_PAUSED`,
//!    `GAME_NOT_IN_BATTLE`)
//! 2. Actor exists and is active
//! 3. Connections: a disconnected opponent is a warning, or an error when
//!    reconnection is disallowed
//! 4. Turn ownership
//! 5. Target player is not the actor and exists
//! 6. Coordinate within bounds and not yet attacked
//! 7. Resources (abilities, powerups)
//! 8. Turn time limit
//!
//! Placement has its own, shorter chain in [`CombatValidator::validate_placement`].

use serde::{Deserialize, Serialize};

use crate::board::{Coordinate, Orientation};
use crate::error::{ErrorCode, ValidationIssue, ValidationResult};
use crate::ids::{AbilityId, PlayerId, ShipId};
use crate::player::Player;
use crate::powerup::PowerupKind;
use crate::state::{GamePhase, GameStateData};

/// An action a player wants to take during battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProposedAction {
    /// Taking the turn at all.
    TurnStart {
        /// Acting player.
        player: PlayerId,
    },
    /// Attacking a cell.
    Attack {
        /// Acting player.
        player: PlayerId,
        /// Player whose board is attacked.
        target: PlayerId,
        /// Cell attacked.
        coordinate: Coordinate,
    },
    /// Activating a ship ability.
    Ability {
        /// Acting player.
        player: PlayerId,
        /// Ship carrying the ability.
        ship: ShipId,
        /// Ability to activate.
        ability: AbilityId,
    },
    /// Using a powerup.
    Powerup {
        /// Acting player.
        player: PlayerId,
        /// Player whose board is affected.
        target: PlayerId,
        /// Powerup kind.
        kind: PowerupKind,
        /// Target cell.
        coordinate: Option<Coordinate>,
    },
}

impl ProposedAction {
    /// The acting player.
    #[must_use]
    pub fn player(&self) -> PlayerId {
        match *self {
            Self::TurnStart { player }
            | Self::Attack { player, .. }
            | Self::Ability { player, .. }
            | Self::Powerup { player, .. } => player,
        }
    }

    fn target(&self) -> Option<PlayerId> {
        match *self {
            Self::Attack { target, .. } | Self::Powerup { target, .. } => Some(target),
            Self::TurnStart { .. } | Self::Ability { .. } => None,
        }
    }
}

/// Stateless validation of proposed actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatValidator;

impl CombatValidator {
    /// Validates a battle action against the current state.
    #[must_use]
    pub fn validate(data: &GameStateData, action: &ProposedAction, now_ms: u64) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if let Err(issue) = Self::run(data, action, now_ms, &mut result) {
            result.push_error(issue);
        }
        result
    }

    fn run(
        data: &GameStateData,
        action: &ProposedAction,
        now_ms: u64,
        result: &mut ValidationResult,
    ) -> Result<(), ValidationIssue> {
        Self::check_battle_phase(data)?;

        let actor_id = action.player();
        let actor = Self::check_actor(data, actor_id)?;
        Self::check_connections(data, actor, result)?;

        if data.current_player != Some(actor_id) {
            return Err(ValidationIssue::new(
                ErrorCode::NotYourTurn,
                format!("it is not player {actor_id}'s turn"),
            )
            .with_field("player_id")
            .with_value(actor_id));
        }

        let target = match action.target() {
            Some(target_id) => Some(Self::check_target(data, actor_id, target_id)?),
            None => None,
        };

        match *action {
            ProposedAction::TurnStart { .. } => {}
            ProposedAction::Attack { coordinate, .. } => {
                if let Some(target) = target {
                    Self::check_coordinate(target, coordinate)?;
                }
            }
            ProposedAction::Ability { ship, ability, .. } => {
                Self::check_ability(actor, ship, ability)?;
            }
            ProposedAction::Powerup {
                kind, coordinate, ..
            } => {
                let coordinate = coordinate.ok_or_else(|| {
                    ValidationIssue::new(
                        ErrorCode::PowerupTargetRequired,
                        format!("{kind} needs a target cell"),
                    )
                    .with_field("coordinate")
                })?;
                if let Some(target) = target {
                    if kind == PowerupKind::Barrage {
                        Self::check_coordinate(target, coordinate)?;
                    } else if !target.board().contains(coordinate) {
                        return Err(Self::out_of_bounds(coordinate));
                    }
                }
                Self::check_powerup(data, actor, kind)?;
            }
        }

        if let Some(limit) = data.config.turn_time_limit_ms {
            let elapsed = data.timers.turn_elapsed(now_ms);
            if elapsed > limit {
                return Err(ValidationIssue::new(
                    ErrorCode::TurnTimeout,
                    format!("turn time limit of {limit} ms exceeded"),
                )
                .with_field("elapsed_ms")
                .with_value(elapsed));
            }
        }
        Ok(())
    }

    /// Validates a ship placement.
    ///
    /// Returns the covered cells alongside the result so the caller does not
    /// recompute them.
    #[must_use]
    pub fn validate_placement(
        data: &GameStateData,
        player_id: PlayerId,
        ship: ShipId,
        origin: Coordinate,
        orientation: Orientation,
    ) -> (ValidationResult, Option<Vec<Coordinate>>) {
        let checked = Self::check_placement_phase(data)
            .and_then(|()| Self::check_actor(data, player_id))
            .and_then(|player| {
                if player.is_ready() {
                    return Err(ValidationIssue::new(
                        ErrorCode::PlacementLocked,
                        format!("player {player_id} already confirmed the fleet"),
                    ));
                }
                player.check_placement(ship, origin, orientation, data.config.allow_adjacent_ships)
            });
        match checked {
            Ok(cells) => (ValidationResult::ok(), Some(cells)),
            Err(issue) => (ValidationResult::rejected(issue), None),
        }
    }

    /// Checks that the match is in the placement phase.
    ///
    /// # Errors
    ///
    /// `GAME_ALREADY_FINISHED` once finished, `WRONG_PHASE` otherwise.
    pub fn check_placement_phase(data: &GameStateData) -> Result<(), ValidationIssue> {
        match data.phase {
            GamePhase::ShipPlacement => Ok(()),
            GamePhase::Finished => Err(Self::finished()),
            phase => Err(ValidationIssue::new(
                ErrorCode::WrongPhase,
                format!("ships cannot be placed during {phase}"),
            )
            .with_field("phase")
            .with_value(phase)),
        }
    }

    fn finished() -> ValidationIssue {
        ValidationIssue::new(ErrorCode::GameAlreadyFinished, "the match is over")
    }

    fn out_of_bounds(coordinate: Coordinate) -> ValidationIssue {
        ValidationIssue::new(
            ErrorCode::OutOfBounds,
            format!("{coordinate} is outside the board"),
        )
        .with_field("coordinate")
        .with_value(coordinate)
    }

    fn check_battle_phase(data: &GameStateData) -> Result<(), ValidationIssue> {
        if data.is_finished() {
            return Err(Self::finished());
        }
        if data.is_paused() {
            return Err(ValidationIssue::new(ErrorCode::GamePaused, "the battle is paused"));
        }
        if data.phase != GamePhase::Battle {
            return Err(ValidationIssue::new(
                ErrorCode::GameNotInBattle,
                format!("no battle actions during {}", data.phase),
            )
            .with_field("phase")
            .with_value(data.phase));
        }
        Ok(())
    }

    fn check_actor(data: &GameStateData, id: PlayerId) -> Result<&Player, ValidationIssue> {
        let player = data.player(id).ok_or_else(|| {
            ValidationIssue::new(ErrorCode::PlayerNotFound, format!("no player {id}"))
                .with_field("player_id")
                .with_value(id)
        })?;
        if !player.is_active() {
            return Err(ValidationIssue::new(
                ErrorCode::PlayerInactive,
                format!("player {id} is no longer active"),
            )
            .with_field("player_id")
            .with_value(id));
        }
        Ok(player)
    }

    fn check_connections(
        data: &GameStateData,
        actor: &Player,
        result: &mut ValidationResult,
    ) -> Result<(), ValidationIssue> {
        let allowed = data.config.reconnection.allowed;
        if !actor.is_connected() && !allowed {
            return Err(ValidationIssue::new(
                ErrorCode::PlayerDisconnected,
                format!("player {} is disconnected", actor.id()),
            )
            .with_field("player_id")
            .with_value(actor.id()));
        }
        if let Some(opponent) = data.opponent_of(actor.id()) {
            if !opponent.is_connected() {
                let issue = ValidationIssue::new(
                    ErrorCode::OpponentDisconnected,
                    format!("player {} is disconnected", opponent.id()),
                )
                .with_field("player_id")
                .with_value(opponent.id());
                if allowed {
                    result.push_warning(issue);
                } else {
                    return Err(ValidationIssue {
                        code: ErrorCode::PlayerDisconnected,
                        ..issue
                    });
                }
            }
        }
        Ok(())
    }

    fn check_target(
        data: &GameStateData,
        actor: PlayerId,
        target: PlayerId,
    ) -> Result<&Player, ValidationIssue> {
        if target == actor {
            return Err(ValidationIssue::new(
                ErrorCode::CannotTargetSelf,
                "players cannot target their own board",
            )
            .with_field("target_id")
            .with_value(target));
        }
        data.player(target).ok_or_else(|| {
            ValidationIssue::new(ErrorCode::PlayerNotFound, format!("no player {target}"))
                .with_field("target_id")
                .with_value(target)
        })
    }

    fn check_coordinate(target: &Player, coordinate: Coordinate) -> Result<(), ValidationIssue> {
        if !target.board().contains(coordinate) {
            return Err(Self::out_of_bounds(coordinate));
        }
        if target.board().is_hit(coordinate) {
            return Err(ValidationIssue::new(
                ErrorCode::AlreadyHit,
                format!("{coordinate} was already attacked"),
            )
            .with_field("coordinate")
            .with_value(coordinate));
        }
        Ok(())
    }

    fn check_ability(actor: &Player, ship_id: ShipId, ability_id: AbilityId) -> Result<(), ValidationIssue> {
        let ship = actor.ship(ship_id).ok_or_else(|| {
            ValidationIssue::new(ErrorCode::ShipNotFound, format!("no ship {ship_id} in fleet"))
                .with_field("ship_id")
                .with_value(ship_id)
        })?;
        if ship.is_sunk() {
            return Err(ValidationIssue::new(
                ErrorCode::ShipSunk,
                format!("ship {ship_id} is sunk"),
            )
            .with_field("ship_id")
            .with_value(ship_id));
        }
        let ability = ship.ability(ability_id).ok_or_else(|| {
            ValidationIssue::new(
                ErrorCode::AbilityNotFound,
                format!("ship {ship_id} has no ability {ability_id}"),
            )
            .with_field("ability_id")
            .with_value(ability_id)
        })?;
        ability.check_ready().map_err(|code| {
            let message = match code {
                ErrorCode::AbilityOnCooldown => format!(
                    "{} is cooling down for {} more turns",
                    ability.name(),
                    ability.cooldown_remaining()
                ),
                _ => format!("{} cannot be used", ability.name()),
            };
            ValidationIssue::new(code, message)
                .with_field("ability_id")
                .with_value(ability_id)
        })
    }

    fn check_powerup(data: &GameStateData, actor: &Player, kind: PowerupKind) -> Result<(), ValidationIssue> {
        if !data.config.powerups_enabled {
            return Err(ValidationIssue::new(
                ErrorCode::PowerupsDisabled,
                "powerups are disabled in this match",
            ));
        }
        actor.powerups().check_available(kind).map_err(|code| {
            ValidationIssue::new(code, format!("{kind} is not available"))
                .with_field("kind")
                .with_value(kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::{GameConfiguration, ReconnectionPolicy};
    use crate::ids::MatchId;
    use crate::player::ConnectionStatus;
    use crate::ship::{AbilityEffect, AbilitySpec, ShipClass, ShipSpec};
    use crate::state::GameStatus;

    const A: PlayerId = PlayerId::new(1);
    const B: PlayerId = PlayerId::new(2);

    fn player(id: PlayerId) -> Player {
        let fleet = [ShipSpec::new(1, "Cruiser", ShipClass::Cruiser, 3)
            .with_ability(AbilitySpec::new(1, "shield", AbilityEffect::Shield { reduction: 1 }).with_cooldown(2))];
        let mut player = Player::new(id, "p", Board::new(10, 10), &fleet, 1).unwrap();
        let origin = Coordinate::new(0, 0);
        let cells = player
            .check_placement(ShipId::new(1), origin, Orientation::Horizontal, true)
            .unwrap();
        player.place_ship(ShipId::new(1), origin, Orientation::Horizontal, cells);
        player
    }

    fn battle() -> GameStateData {
        let mut data = GameStateData::new(MatchId::new(1), GameConfiguration::default(), 0);
        data.players = vec![player(A), player(B)];
        data.phase = GamePhase::Battle;
        data.status = GameStatus::Playing;
        data.current_player = Some(A);
        data.timers.turn_started_at = Some(0);
        data
    }

    fn attack(player: PlayerId, target: PlayerId, x: i32, y: i32) -> ProposedAction {
        ProposedAction::Attack {
            player,
            target,
            coordinate: Coordinate::new(x, y),
        }
    }

    mod order_tests {
        use super::*;

        #[test]
        fn valid_attack_passes() {
            let result = CombatValidator::validate(&battle(), &attack(A, B, 3, 3), 10);
            assert!(result.is_valid());
            assert!(result.warnings.is_empty());
        }

        #[test]
        fn finished_beats_everything() {
            let mut data = battle();
            data.phase = GamePhase::Finished;
            let result = CombatValidator::validate(&data, &attack(B, B, 99, 99), 10);
            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.first_error(), Some(ErrorCode::GameAlreadyFinished));
        }

        #[test]
        fn paused_and_wrong_phase() {
            let mut data = battle();
            data.status = GameStatus::Paused;
            assert_eq!(
                CombatValidator::validate(&data, &attack(A, B, 0, 0), 0).first_error(),
                Some(ErrorCode::GamePaused)
            );
            data.status = GameStatus::Waiting;
            data.phase = GamePhase::ShipPlacement;
            assert_eq!(
                CombatValidator::validate(&data, &attack(A, B, 0, 0), 0).first_error(),
                Some(ErrorCode::GameNotInBattle)
            );
        }

        #[test]
        fn turn_checked_before_target_and_bounds() {
            let result = CombatValidator::validate(&battle(), &attack(B, B, 50, 50), 0);
            assert_eq!(result.first_error(), Some(ErrorCode::NotYourTurn));
        }

        #[test]
        fn self_target_and_unknown_target() {
            let data = battle();
            assert_eq!(
                CombatValidator::validate(&data, &attack(A, A, 0, 0), 0).first_error(),
                Some(ErrorCode::CannotTargetSelf)
            );
            assert_eq!(
                CombatValidator::validate(&data, &attack(A, PlayerId::new(9), 0, 0), 0).first_error(),
                Some(ErrorCode::PlayerNotFound)
            );
            assert_eq!(
                CombatValidator::validate(&data, &attack(PlayerId::new(9), B, 0, 0), 0).first_error(),
                Some(ErrorCode::PlayerNotFound)
            );
        }

        #[test]
        fn bounds_carry_field_and_value() {
            let result = CombatValidator::validate(&battle(), &attack(A, B, 10, 0), 0);
            let issue = &result.errors[0];
            assert_eq!(issue.code, ErrorCode::OutOfBounds);
            assert_eq!(issue.field.as_deref(), Some("coordinate"));
            assert_eq!(issue.value, Some(serde_json::json!({"x": 10, "y": 0})));
        }

        #[test]
        fn already_hit_cell() {
            let mut data = battle();
            data.player_mut(B).unwrap().board_mut().mark_hit(Coordinate::new(4, 4));
            assert_eq!(
                CombatValidator::validate(&data, &attack(A, B, 4, 4), 0).first_error(),
                Some(ErrorCode::AlreadyHit)
            );
        }

        #[test]
        fn timeout_is_reported() {
            let data = battle();
            assert!(CombatValidator::validate(&data, &attack(A, B, 1, 1), 60_000).is_valid());
            assert_eq!(
                CombatValidator::validate(&data, &attack(A, B, 1, 1), 60_001).first_error(),
                Some(ErrorCode::TurnTimeout)
            );
        }

        #[test]
        fn validation_does_not_mutate() {
            let data = battle();
            let before = data.clone();
            let _ = CombatValidator::validate(&data, &attack(A, B, 3, 3), 10);
            assert_eq!(data, before);
        }
    }

    mod connection_tests {
        use super::*;

        #[test]
        fn disconnected_opponent_warns() {
            let mut data = battle();
            data.player_mut(B)
                .unwrap()
                .set_connection(ConnectionStatus::Disconnected { since: 0 });
            let result = CombatValidator::validate(&data, &attack(A, B, 1, 1), 0);
            assert!(result.is_valid());
            assert!(result.has_warning(ErrorCode::OpponentDisconnected));
        }

        #[test]
        fn disconnection_fails_when_reconnection_disallowed() {
            let mut data = battle();
            data.config.reconnection = ReconnectionPolicy {
                allowed: false,
                grace_period_ms: None,
            };
            data.player_mut(B)
                .unwrap()
                .set_connection(ConnectionStatus::Disconnected { since: 0 });
            let result = CombatValidator::validate(&data, &attack(A, B, 1, 1), 0);
            assert_eq!(result.first_error(), Some(ErrorCode::PlayerDisconnected));
        }

        #[test]
        fn inactive_actor_rejected() {
            let mut data = battle();
            data.player_mut(A).unwrap().deactivate();
            assert_eq!(
                CombatValidator::validate(&data, &attack(A, B, 1, 1), 0).first_error(),
                Some(ErrorCode::PlayerInactive)
            );
        }
    }

    mod resource_tests {
        use super::*;

        fn ability(ship: u32, ability: u32) -> ProposedAction {
            ProposedAction::Ability {
                player: A,
                ship: ShipId::new(ship),
                ability: AbilityId::new(ability),
            }
        }

        #[test]
        fn ability_checks() {
            let mut data = battle();
            assert!(CombatValidator::validate(&data, &ability(1, 1), 0).is_valid());
            assert_eq!(
                CombatValidator::validate(&data, &ability(7, 1), 0).first_error(),
                Some(ErrorCode::ShipNotFound)
            );
            assert_eq!(
                CombatValidator::validate(&data, &ability(1, 7), 0).first_error(),
                Some(ErrorCode::AbilityNotFound)
            );

            data.player_mut(A)
                .unwrap()
                .ship_mut(ShipId::new(1))
                .unwrap()
                .ability_mut(AbilityId::new(1))
                .unwrap()
                .activate();
            assert_eq!(
                CombatValidator::validate(&data, &ability(1, 1), 0).first_error(),
                Some(ErrorCode::AbilityOnCooldown)
            );
        }

        #[test]
        fn powerup_checks() {
            let mut data = battle();
            let radar = |coordinate| ProposedAction::Powerup {
                player: A,
                target: B,
                kind: PowerupKind::Radar,
                coordinate,
            };
            assert!(CombatValidator::validate(&data, &radar(Some(Coordinate::new(5, 5))), 0).is_valid());
            assert_eq!(
                CombatValidator::validate(&data, &radar(None), 0).first_error(),
                Some(ErrorCode::PowerupTargetRequired)
            );

            data.player_mut(A).unwrap().powerups_mut().consume(PowerupKind::Radar, 0);
            assert_eq!(
                CombatValidator::validate(&data, &radar(Some(Coordinate::new(5, 5))), 0).first_error(),
                Some(ErrorCode::PowerupUnavailable)
            );

            data.config.powerups_enabled = false;
            assert_eq!(
                CombatValidator::validate(&data, &radar(Some(Coordinate::new(5, 5))), 0).first_error(),
                Some(ErrorCode::PowerupsDisabled)
            );
        }
    }

    mod placement_tests {
        use super::*;

        #[test]
        fn placement_needs_phase_and_unlocked_player() {
            let mut data = battle();
            let (result, cells) = CombatValidator::validate_placement(
                &data,
                A,
                ShipId::new(1),
                Coordinate::new(0, 5),
                Orientation::Horizontal,
            );
            assert_eq!(result.first_error(), Some(ErrorCode::WrongPhase));
            assert!(cells.is_none());

            data.phase = GamePhase::ShipPlacement;
            let (result, cells) = CombatValidator::validate_placement(
                &data,
                A,
                ShipId::new(1),
                Coordinate::new(0, 5),
                Orientation::Horizontal,
            );
            assert!(result.is_valid());
            assert_eq!(cells.map(|c| c.len()), Some(3));

            data.player_mut(A).unwrap().set_ready(true);
            let (result, _) = CombatValidator::validate_placement(
                &data,
                A,
                ShipId::new(1),
                Coordinate::new(0, 5),
                Orientation::Horizontal,
            );
            assert_eq!(result.first_error(), Some(ErrorCode::PlacementLocked));
        }
    }
}
