//! # Game State
//!
//! [`GameState`] is the per-match state machine and the only writer of
//! [`GameStateData`]. One instance exists per match; there is no global
//! controller.
//!
//! ## Lifecycle
//!
//! ```text
//! waiting ──(2nd player joins)──► setup ──(all ready)──► ship_placement
//!    ──(fleets placed, all ready)──► battle{playing ⇄ paused} ──► finished
//! ```
//!
//! ## Mutation Sequence
//!
//! Every mutator runs the same steps:
//!
//! 1. Validate (a rejection returns as data and changes nothing)
//! 2. Mutate (resolver, placement, ability or powerup)
//! 3. Record events
//! 4. Check board/fleet integrity (a violation aborts the match)
//! 5. Evaluate win/draw conditions
//!
//! A resolved attack or barrage completes the turn: the turn counter goes up
//! by one and the turn passes to the opponent. Abilities and radar sweeps are
//! free actions.
//!
//! ## Concurrency
//!
//! `GameState` is `Send + Sync` but not internally synchronized. Serialize
//! mutations per match, for example through
//! [`MatchRegistry`](crate::registry::MatchRegistry).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use broadside_history::{EventMemoryManager, HistoryConfig, MemoryStats};

use crate::board::{Board, BoardView, Coordinate, Orientation};
use crate::clock::{Clock, SystemClock};
use crate::combat::{AttackModifiers, AttackResolver, AttackResult, CombatValidator, ProposedAction};
use crate::config::GameConfiguration;
use crate::error::{EngineError, ErrorCode, ValidationIssue, ValidationResult};
use crate::event::{GameEvent, GameEventKind};
use crate::ids::{AbilityId, EventId, MatchId, PlayerId, ShipId};
use crate::outcome::{EndGameStatistics, GameOutcome, WinDrawEvaluator};
use crate::player::{ConnectionStatus, Player};
use crate::powerup::{PowerupKind, RADAR_RADIUS};
use crate::rolls::{RollSource, SeededRolls};
use crate::ship::{Ship, ShipSpec};
use crate::snapshot::{SnapshotRing, StateSnapshot};
use crate::state::{GamePhase, GameStateData, GameStatus, TurnAction, TurnRecord};

// =============================================================================
// Results
// =============================================================================

/// A resolved attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReport {
    /// What the attack did.
    pub attack: AttackResult,
    /// Non-blocking advisories from validation.
    pub warnings: Vec<ValidationIssue>,
    /// Final outcome if this move ended the match.
    pub game_over: Option<GameOutcome>,
}

/// Result of [`GameState::make_move`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The attack ran.
    Resolved(MoveReport),
    /// The attack was refused; nothing changed.
    Rejected(ValidationResult),
}

impl MoveOutcome {
    /// Whether the attack ran.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The report of a resolved attack.
    #[must_use]
    pub fn report(&self) -> Option<&MoveReport> {
        match self {
            Self::Resolved(report) => Some(report),
            Self::Rejected(_) => None,
        }
    }

    /// Code of the first error of a rejection.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Resolved(_) => None,
            Self::Rejected(result) => result.first_error(),
        }
    }
}

/// What a powerup did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PowerupEffect {
    /// Cells exposed by a radar sweep.
    Radar {
        /// Sweep center.
        center: Coordinate,
        /// Cells newly revealed.
        revealed: Vec<Coordinate>,
        /// Swept cells holding a ship.
        contacts: Vec<Coordinate>,
    },
    /// A barrage strike.
    Barrage {
        /// Primary hit and chain reaction.
        attack: AttackResult,
    },
}

impl PowerupEffect {
    /// Whether the effect damaged a ship. Radar never does.
    #[must_use]
    pub fn struck_ship(&self) -> bool {
        match self {
            Self::Radar { .. } => false,
            Self::Barrage { attack } => attack.struck_ship(),
        }
    }
}

/// A used powerup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupReport {
    /// Which powerup.
    pub kind: PowerupKind,
    /// What it did.
    pub effect: PowerupEffect,
    /// Non-blocking advisories from validation.
    pub warnings: Vec<ValidationIssue>,
    /// Final outcome if this powerup ended the match.
    pub game_over: Option<GameOutcome>,
}

/// Result of [`GameState::use_powerup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PowerupOutcome {
    /// The powerup ran.
    Applied(PowerupReport),
    /// The powerup was refused; nothing changed.
    Rejected(ValidationResult),
}

impl PowerupOutcome {
    /// The report of an applied powerup.
    #[must_use]
    pub fn report(&self) -> Option<&PowerupReport> {
        match self {
            Self::Applied(report) => Some(report),
            Self::Rejected(_) => None,
        }
    }

    /// Code of the first error of a rejection.
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Applied(_) => None,
            Self::Rejected(result) => result.first_error(),
        }
    }
}

/// The opponent as seen by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentView {
    /// Opponent id.
    pub player: PlayerId,
    /// Opponent name.
    pub name: String,
    /// Opponent board, fogged when fog of war is on.
    pub board: BoardView,
    /// Opponent ships afloat.
    pub ships_remaining: usize,
    /// Opponent connection.
    pub connection: ConnectionStatus,
}

/// What one player may see of the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// The viewer.
    pub player: PlayerId,
    /// Current phase.
    pub phase: GamePhase,
    /// Current status.
    pub status: GameStatus,
    /// Player holding the turn.
    pub current_player: Option<PlayerId>,
    /// Completed turns.
    pub turn_number: u32,
    /// The viewer's own board, unfogged.
    pub own_board: BoardView,
    /// The viewer's own fleet.
    pub own_fleet: Vec<Ship>,
    /// The opponent, once joined.
    pub opponent: Option<OpponentView>,
    /// Final outcome once finished.
    pub outcome: Option<GameOutcome>,
}

// =============================================================================
// GameState
// =============================================================================

/// Orchestrator of one match.
#[derive(Debug)]
pub struct GameState {
    data: GameStateData,
    history: EventMemoryManager<GameEvent>,
    snapshots: SnapshotRing,
    rolls: Box<dyn RollSource>,
    clock: Arc<dyn Clock>,
    next_event_id: u64,
}

impl GameState {
    /// Creates a match with seeded rolls and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the configuration is invalid.
    pub fn new(match_id: MatchId, config: GameConfiguration) -> Result<Self, EngineError> {
        let rolls = Box::new(SeededRolls::new(config.seed));
        Self::with_sources(match_id, config, rolls, Arc::new(SystemClock))
    }

    /// Creates a match with explicit roll and time sources.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the configuration is invalid.
    pub fn with_sources(
        match_id: MatchId,
        config: GameConfiguration,
        rolls: Box<dyn RollSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let history = EventMemoryManager::new(config.history)?;
        let snapshots = SnapshotRing::new(config.max_snapshots);
        let now = clock.now_ms();

        let mut game = Self {
            data: GameStateData::new(match_id, config, now),
            history,
            snapshots,
            rolls,
            clock,
            next_event_id: 0,
        };
        let payload = json!({
            "board_width": game.data.config.board_width,
            "board_height": game.data.config.board_height,
        });
        game.record(GameEventKind::GameCreated, None, payload, now);
        info!(match_id = %match_id, "match created");
        Ok(game)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Match identifier.
    #[must_use]
    pub fn match_id(&self) -> MatchId {
        self.data.match_id
    }

    /// Read access to the full state.
    #[must_use]
    pub fn data(&self) -> &GameStateData {
        &self.data
    }

    /// Settings of this match.
    #[must_use]
    pub fn config(&self) -> &GameConfiguration {
        &self.data.config
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.data.phase
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.data.status
    }

    /// Player holding the turn.
    #[must_use]
    pub fn current_player(&self) -> Option<PlayerId> {
        self.data.current_player
    }

    /// Completed turns.
    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.data.turn_number
    }

    /// Looks up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.data.player(id)
    }

    /// Final outcome once finished.
    #[must_use]
    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.data.outcome.as_ref()
    }

    /// Owned copy of the full state, for rendering or persistence.
    #[must_use]
    pub fn state_snapshot(&self) -> GameStateData {
        self.data.clone()
    }

    /// What `player` may see. `None` for an unknown player.
    #[must_use]
    pub fn view_for(&self, player: PlayerId) -> Option<PlayerView> {
        let me = self.data.player(player)?;
        let fog = self.data.config.fog_of_war;
        let opponent = self.data.opponent_of(player).map(|other| OpponentView {
            player: other.id(),
            name: other.name().to_string(),
            board: other.board().view(fog),
            ships_remaining: other.ships_remaining(),
            connection: other.connection(),
        });
        Some(PlayerView {
            player,
            phase: self.data.phase,
            status: self.data.status,
            current_player: self.data.current_player,
            turn_number: self.data.turn_number,
            own_board: me.board().view(false),
            own_fleet: me.fleet().to_vec(),
            opponent,
            outcome: self.data.outcome.clone(),
        })
    }

    /// Previews an action without running it.
    #[must_use]
    pub fn validate(&self, action: &ProposedAction) -> ValidationResult {
        CombatValidator::validate(&self.data, action, self.clock.now_ms())
    }

    // -------------------------------------------------------------------------
    // History and snapshots
    // -------------------------------------------------------------------------

    /// Every retained event, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<GameEvent> {
        self.history.all_events()
    }

    /// The `n` most recent buffered events, oldest first.
    #[must_use]
    pub fn recent_events(&self, n: usize) -> Vec<GameEvent> {
        self.history.recent(n)
    }

    /// Retained events of one kind, oldest first.
    #[must_use]
    pub fn events_of_kind(&self, kind: GameEventKind) -> Vec<GameEvent> {
        self.history.events_where(|e| e.kind == kind)
    }

    /// Memory figures of the event history.
    #[must_use]
    pub fn memory_stats(&self) -> MemoryStats {
        self.history.memory_stats()
    }

    /// Resizes the event history at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::History`] for a zero capacity.
    pub fn update_history_config(&mut self, config: HistoryConfig) -> Result<(), EngineError> {
        self.history.update_config(config)?;
        self.data.config.history = config;
        debug!(
            match_id = %self.data.match_id,
            max_events = config.max_events,
            max_critical_events = config.max_critical_events,
            "history resized"
        );
        Ok(())
    }

    /// Drops every recorded event.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Takes a snapshot now.
    pub fn take_snapshot(&mut self) {
        let now = self.clock.now_ms();
        self.snapshot_at(now);
    }

    /// Retained snapshots, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> Vec<&StateSnapshot> {
        self.snapshots.iter().collect()
    }

    /// Newest snapshot.
    #[must_use]
    pub fn latest_snapshot(&self) -> Option<&StateSnapshot> {
        self.snapshots.latest()
    }

    // -------------------------------------------------------------------------
    // Lobby and placement
    // -------------------------------------------------------------------------

    /// Seats a player. The second join moves the match to setup.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFleet`] if the fleet cannot be built.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
        fleet: &[ShipSpec],
    ) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        if let Err(issue) = self.check_join(id) {
            return Ok(self.reject("add_player", id, issue));
        }
        let board = Board::new(self.data.config.board_width, self.data.config.board_height);
        let player = Player::new(id, name, board, fleet, self.data.config.powerup_charges)?;
        let payload = json!({ "name": player.name(), "ships": player.fleet().len() });
        self.data.players.push(player);
        self.record(GameEventKind::PlayerJoined, Some(id), payload, now);
        info!(match_id = %self.data.match_id, player = %id, "player joined");

        if self.data.players.len() == 2 {
            self.advance_phase(GamePhase::Setup, now);
        }
        Ok(ValidationResult::ok())
    }

    fn check_join(&self, id: PlayerId) -> Result<(), ValidationIssue> {
        if self.data.is_finished() {
            return Err(ValidationIssue::new(ErrorCode::GameAlreadyFinished, "the match is over"));
        }
        if self.data.players.len() >= 2 {
            return Err(ValidationIssue::new(ErrorCode::GameFull, "both seats are taken"));
        }
        if self.data.player(id).is_some() {
            return Err(ValidationIssue::new(
                ErrorCode::DuplicatePlayer,
                format!("player {id} already joined"),
            )
            .with_field("player_id")
            .with_value(id));
        }
        if self.data.phase != GamePhase::Waiting {
            return Err(ValidationIssue::new(
                ErrorCode::WrongPhase,
                format!("players cannot join during {}", self.data.phase),
            ));
        }
        Ok(())
    }

    /// Confirms the current phase for `player`.
    ///
    /// In setup, once both are ready the match moves to ship placement. In
    /// ship placement a player may only confirm a fully placed fleet; once
    /// both confirm, the battle starts with the first seated player.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if the fleets are torn when
    /// the battle would start.
    pub fn mark_ready(&mut self, player: PlayerId) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        if let Err(issue) = self.check_ready(player) {
            return Ok(self.reject("mark_ready", player, issue));
        }
        if let Some(p) = self.data.player_mut(player) {
            p.set_ready(true);
        }
        self.record(
            GameEventKind::PlayerReady,
            Some(player),
            json!({ "phase": self.data.phase }),
            now,
        );

        let all_ready = self.data.players.len() == 2 && self.data.players.iter().all(Player::is_ready);
        if all_ready {
            match self.data.phase {
                GamePhase::Setup => {
                    for p in &mut self.data.players {
                        p.set_ready(false);
                    }
                    self.advance_phase(GamePhase::ShipPlacement, now);
                }
                GamePhase::ShipPlacement => {
                    self.check_integrity(now)?;
                    self.start_battle(now);
                }
                _ => {}
            }
        }
        Ok(ValidationResult::ok())
    }

    fn check_ready(&self, id: PlayerId) -> Result<(), ValidationIssue> {
        if self.data.is_finished() {
            return Err(ValidationIssue::new(ErrorCode::GameAlreadyFinished, "the match is over"));
        }
        let player = self.data.player(id).ok_or_else(|| {
            ValidationIssue::new(ErrorCode::PlayerNotFound, format!("no player {id}"))
                .with_field("player_id")
                .with_value(id)
        })?;
        if !player.is_active() {
            return Err(ValidationIssue::new(
                ErrorCode::PlayerInactive,
                format!("player {id} is no longer active"),
            ));
        }
        match self.data.phase {
            GamePhase::Setup => Ok(()),
            GamePhase::ShipPlacement if player.fleet_placed() => Ok(()),
            GamePhase::ShipPlacement => Err(ValidationIssue::new(
                ErrorCode::FleetIncomplete,
                format!("player {id} has ships left to place"),
            )),
            phase => Err(ValidationIssue::new(
                ErrorCode::WrongPhase,
                format!("nothing to confirm during {phase}"),
            )
            .with_field("phase")
            .with_value(phase)),
        }
    }

    /// Places (or moves) a ship on the player's own board.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if the board and fleet
    /// disagree afterwards; the match is aborted.
    pub fn place_ship(
        &mut self,
        player: PlayerId,
        ship: ShipId,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        let (result, cells) =
            CombatValidator::validate_placement(&self.data, player, ship, origin, orientation);
        let Some(cells) = cells else {
            if let Some(issue) = result.errors.first() {
                warn!(match_id = %self.data.match_id, player = %player, code = %issue.code, "placement rejected");
            }
            return Ok(result);
        };
        if let Some(p) = self.data.player_mut(player) {
            p.place_ship(ship, origin, orientation, cells);
        }
        self.record(
            GameEventKind::ShipPlaced,
            Some(player),
            json!({ "ship": ship, "origin": origin, "orientation": orientation }),
            now,
        );
        self.check_integrity(now)?;
        Ok(result)
    }

    /// Takes a ship off the player's own board.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if the board and fleet
    /// disagree afterwards; the match is aborted.
    pub fn unplace_ship(&mut self, player: PlayerId, ship: ShipId) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        let checked = CombatValidator::check_placement_phase(&self.data).and_then(|()| {
            let p = self.data.player(player).ok_or_else(|| {
                ValidationIssue::new(ErrorCode::PlayerNotFound, format!("no player {player}"))
            })?;
            if p.is_ready() {
                return Err(ValidationIssue::new(
                    ErrorCode::PlacementLocked,
                    format!("player {player} already confirmed the fleet"),
                ));
            }
            Ok(())
        });
        if let Err(issue) = checked {
            return Ok(self.reject("unplace_ship", player, issue));
        }
        if let Some(p) = self.data.player_mut(player) {
            if let Err(issue) = p.unplace_ship(ship) {
                return Ok(self.reject("unplace_ship", player, issue));
            }
        }
        self.record(GameEventKind::ShipRemoved, Some(player), json!({ "ship": ship }), now);
        self.check_integrity(now)?;
        Ok(ValidationResult::ok())
    }

    // -------------------------------------------------------------------------
    // Battle
    // -------------------------------------------------------------------------

    /// Attacks a cell on the opponent's board.
    ///
    /// On success the turn passes to the opponent, even when the match ends.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if the attack left a torn
    /// state; the match is aborted.
    pub fn make_move(&mut self, player: PlayerId, coordinate: Coordinate) -> Result<MoveOutcome, EngineError> {
        let now = self.clock.now_ms();
        let target = self.data.opponent_id(player).unwrap_or(player);
        let action = ProposedAction::Attack {
            player,
            target,
            coordinate,
        };
        let validation = CombatValidator::validate(&self.data, &action, now);
        if !validation.is_valid() {
            self.log_rejection("make_move", player, &validation);
            return Ok(MoveOutcome::Rejected(validation));
        }

        let attack = match self.strike(player, target, coordinate, None, now) {
            Ok(attack) => attack,
            Err(issue) => return Ok(MoveOutcome::Rejected(self.reject("make_move", player, issue))),
        };
        let hit = attack.struck_ship();
        self.complete_turn(player, TurnAction::Attack { coordinate, hit }, hit, now)?;
        let outcome = self.evaluate_at(now);

        Ok(MoveOutcome::Resolved(MoveReport {
            attack,
            warnings: validation.warnings,
            game_over: outcome.is_game_over.then_some(outcome),
        }))
    }

    /// Activates a ship ability. A free action: the turn does not pass.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches the other mutators.
    pub fn use_ability(
        &mut self,
        player: PlayerId,
        ship: ShipId,
        ability: AbilityId,
    ) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        let action = ProposedAction::Ability {
            player,
            ship,
            ability,
        };
        let validation = CombatValidator::validate(&self.data, &action, now);
        if !validation.is_valid() {
            self.log_rejection("use_ability", player, &validation);
            return Ok(validation);
        }

        let effect = self
            .data
            .player_mut(player)
            .and_then(|p| p.ship_mut(ship))
            .and_then(|s| s.ability_mut(ability))
            .map(|a| {
                a.activate();
                a.effect()
            });
        self.record(
            GameEventKind::AbilityUsed,
            Some(player),
            json!({ "ship": ship, "ability": ability, "effect": effect }),
            now,
        );
        debug!(match_id = %self.data.match_id, player = %player, ship = %ship, ability = %ability, "ability activated");
        Ok(validation)
    }

    /// Uses a powerup against the opponent.
    ///
    /// Radar is a free action; a barrage completes the turn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if a barrage left a torn
    /// state; the match is aborted.
    pub fn use_powerup(
        &mut self,
        player: PlayerId,
        kind: PowerupKind,
        target: Option<Coordinate>,
    ) -> Result<PowerupOutcome, EngineError> {
        let now = self.clock.now_ms();
        let opponent = self.data.opponent_id(player).unwrap_or(player);
        let action = ProposedAction::Powerup {
            player,
            target: opponent,
            kind,
            coordinate: target,
        };
        let validation = CombatValidator::validate(&self.data, &action, now);
        let Some(center) = target.filter(|_| validation.is_valid()) else {
            self.log_rejection("use_powerup", player, &validation);
            return Ok(PowerupOutcome::Rejected(validation));
        };

        let cooldown = self.data.config.powerup_cooldown_turns;
        if let Some(p) = self.data.player_mut(player) {
            p.powerups_mut().consume(kind, cooldown);
        }

        let effect = match kind {
            PowerupKind::Radar => self.radar(opponent, center),
            PowerupKind::Barrage => {
                let radius = self.data.config.effective_barrage_radius();
                let attack = match self.strike(player, opponent, center, Some(radius), now) {
                    Ok(attack) => attack,
                    Err(issue) => {
                        return Ok(PowerupOutcome::Rejected(self.reject("use_powerup", player, issue)))
                    }
                };
                PowerupEffect::Barrage { attack }
            }
        };
        self.record(
            GameEventKind::PowerupUsed,
            Some(player),
            json!({ "kind": kind, "target": center }),
            now,
        );
        debug!(match_id = %self.data.match_id, player = %player, kind = %kind, "powerup used");

        let game_over = if kind.ends_turn() {
            let hit = effect.struck_ship();
            self.complete_turn(player, TurnAction::Powerup { kind, coordinate: center, hit }, hit, now)?;
            let outcome = self.evaluate_at(now);
            outcome.is_game_over.then_some(outcome)
        } else {
            None
        };

        Ok(PowerupOutcome::Applied(PowerupReport {
            kind,
            effect,
            warnings: validation.warnings,
            game_over,
        }))
    }

    /// Pauses the battle. False unless the battle is running.
    pub fn pause(&mut self) -> bool {
        if self.data.phase != GamePhase::Battle || self.data.status != GameStatus::Playing {
            return false;
        }
        let now = self.clock.now_ms();
        self.data.status = GameStatus::Paused;
        self.data.timers.paused_at = Some(now);
        self.record(GameEventKind::GamePaused, None, Value::Null, now);
        info!(match_id = %self.data.match_id, "battle paused");
        true
    }

    /// Resumes a paused battle. False unless paused.
    pub fn resume(&mut self) -> bool {
        if self.data.status != GameStatus::Paused {
            return false;
        }
        let now = self.clock.now_ms();
        self.fold_pause(now);
        self.data.status = GameStatus::Playing;
        self.record(GameEventKind::GameResumed, None, Value::Null, now);
        info!(match_id = %self.data.match_id, "battle resumed");
        true
    }

    /// Concedes the match. The opponent wins by surrender.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches the other mutators.
    pub fn surrender(&mut self, player: PlayerId) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        if let Err(issue) = self.check_departure(player) {
            return Ok(self.reject("surrender", player, issue));
        }
        if self.data.phase == GamePhase::Waiting {
            return Ok(self.reject(
                "surrender",
                player,
                ValidationIssue::new(ErrorCode::WrongPhase, "nothing to surrender before the match starts"),
            ));
        }
        if let Some(p) = self.data.player_mut(player) {
            p.deactivate();
        }
        self.record(GameEventKind::PlayerSurrendered, Some(player), Value::Null, now);
        warn!(match_id = %self.data.match_id, player = %player, "player surrendered");
        self.evaluate_at(now);
        Ok(ValidationResult::ok())
    }

    /// Leaves the match. Before it starts this frees the seat; afterwards
    /// it counts as a surrender.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches the other mutators.
    pub fn leave(&mut self, player: PlayerId) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        if let Err(issue) = self.check_departure(player) {
            return Ok(self.reject("leave", player, issue));
        }
        if self.data.phase == GamePhase::Waiting {
            self.data.players.retain(|p| p.id() != player);
        } else if let Some(p) = self.data.player_mut(player) {
            p.deactivate();
        }
        self.record(GameEventKind::PlayerLeft, Some(player), Value::Null, now);
        info!(match_id = %self.data.match_id, player = %player, "player left");
        self.evaluate_at(now);
        Ok(ValidationResult::ok())
    }

    fn check_departure(&self, id: PlayerId) -> Result<(), ValidationIssue> {
        if self.data.is_finished() {
            return Err(ValidationIssue::new(ErrorCode::GameAlreadyFinished, "the match is over"));
        }
        match self.data.player(id) {
            None => Err(ValidationIssue::new(ErrorCode::PlayerNotFound, format!("no player {id}"))
                .with_field("player_id")
                .with_value(id)),
            Some(p) if !p.is_active() => Err(ValidationIssue::new(
                ErrorCode::PlayerInactive,
                format!("player {id} is no longer active"),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Records a client attaching or detaching.
    ///
    /// When reconnection is disallowed a disconnect forfeits the match.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches the other mutators.
    pub fn set_connection(&mut self, player: PlayerId, connected: bool) -> Result<ValidationResult, EngineError> {
        let now = self.clock.now_ms();
        if let Err(issue) = self.check_departure(player) {
            return Ok(self.reject("set_connection", player, issue));
        }
        let Some(p) = self.data.player_mut(player) else {
            return Ok(ValidationResult::ok());
        };
        let kind = match (p.is_connected(), connected) {
            (true, false) => {
                p.set_connection(ConnectionStatus::Disconnected { since: now });
                GameEventKind::PlayerDisconnected
            }
            (false, true) => {
                p.set_connection(ConnectionStatus::Connected);
                GameEventKind::PlayerReconnected
            }
            _ => return Ok(ValidationResult::ok()),
        };
        self.record(kind, Some(player), Value::Null, now);
        if connected {
            info!(match_id = %self.data.match_id, player = %player, "player reconnected");
        } else {
            warn!(match_id = %self.data.match_id, player = %player, "player disconnected");
        }
        self.evaluate_at(now);
        Ok(ValidationResult::ok())
    }

    /// Forfeits the current turn if its time limit has passed.
    ///
    /// Returns true if a turn expired. A timed-out turn counts toward the
    /// stalemate window and the turn ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if the state is torn; the
    /// match is aborted.
    pub fn expire_turn(&mut self) -> Result<bool, EngineError> {
        let now = self.clock.now_ms();
        if self.data.phase != GamePhase::Battle || self.data.status != GameStatus::Playing {
            return Ok(false);
        }
        let (Some(limit), Some(player)) = (self.data.config.turn_time_limit_ms, self.data.current_player)
        else {
            return Ok(false);
        };
        let elapsed = self.data.timers.turn_elapsed(now);
        if elapsed <= limit {
            return Ok(false);
        }
        self.record(
            GameEventKind::TurnTimedOut,
            Some(player),
            json!({ "elapsed_ms": elapsed, "limit_ms": limit }),
            now,
        );
        warn!(match_id = %self.data.match_id, player = %player, elapsed, "turn timed out");
        self.complete_turn(player, TurnAction::TimedOut, false, now)?;
        self.evaluate_at(now);
        Ok(true)
    }

    /// Runs the win/draw evaluator, finalizing the match if it is over.
    pub fn evaluate(&mut self) -> GameOutcome {
        let now = self.clock.now_ms();
        self.evaluate_at(now)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Resolves a strike on `target`'s board, with a chain pass when `chain`
    /// is set, and books stats and events.
    fn strike(
        &mut self,
        attacker: PlayerId,
        target: PlayerId,
        coordinate: Coordinate,
        chain: Option<u8>,
        now: u64,
    ) -> Result<AttackResult, ValidationIssue> {
        let modifiers = self
            .data
            .player(attacker)
            .map(|p| AttackModifiers::from_effects(&p.offensive_effects()))
            .unwrap_or_default();
        let base = self.data.config.base_damage;
        let Some(defender) = self.data.player_mut(target) else {
            return Err(ValidationIssue::new(ErrorCode::PlayerNotFound, format!("no player {target}")));
        };

        let mut attack = AttackResolver::resolve(defender, coordinate, base, &modifiers, self.rolls.as_mut(), now)?;
        if let Some(radius) = chain {
            attack.chain = AttackResolver::chain_reaction(defender, coordinate, base, radius, now);
            attack
                .sunk_ships
                .extend(attack.chain.iter().filter(|h| h.sunk).map(|h| h.ship_id));
        }

        let lost = attack.total_hit_points_lost();
        if let Some(p) = self.data.player_mut(attacker) {
            let stats = p.stats_mut();
            stats.shots_fired += 1;
            if attack.struck_ship() {
                stats.shots_hit += 1;
            }
            if attack.critical {
                stats.critical_hits += 1;
            }
            stats.damage_dealt += lost;
            stats.ships_sunk += u32::try_from(attack.sunk_ships.len()).unwrap_or(u32::MAX);
        }
        if let Some(p) = self.data.player_mut(target) {
            p.stats_mut().damage_taken += lost;
        }

        self.record(
            GameEventKind::AttackResolved,
            Some(attacker),
            json!({
                "target": target,
                "coordinate": coordinate,
                "outcome": attack.outcome,
                "ship": attack.ship_id,
                "damage": attack.damage,
                "critical": attack.critical,
                "chain_hits": attack.chain.len(),
            }),
            now,
        );
        for ship in &attack.sunk_ships {
            self.record(
                GameEventKind::ShipSunk,
                Some(target),
                json!({ "ship": ship, "by": attacker }),
                now,
            );
            info!(match_id = %self.data.match_id, owner = %target, ship = %ship, "ship sunk");
        }
        debug!(
            match_id = %self.data.match_id,
            player = %attacker,
            x = coordinate.x,
            y = coordinate.y,
            outcome = ?attack.outcome,
            damage = attack.damage,
            "attack resolved"
        );
        Ok(attack)
    }

    fn radar(&mut self, opponent: PlayerId, center: Coordinate) -> PowerupEffect {
        let mut revealed = Vec::new();
        let mut contacts = Vec::new();
        if let Some(p) = self.data.player_mut(opponent) {
            let board = p.board_mut();
            for c in board.area(center, RADAR_RADIUS) {
                if board.reveal(c) {
                    revealed.push(c);
                }
                if board.occupant(c).is_some() {
                    contacts.push(c);
                }
            }
        }
        PowerupEffect::Radar {
            center,
            revealed,
            contacts,
        }
    }

    /// Books a completed turn and passes it to the opponent.
    fn complete_turn(&mut self, player: PlayerId, action: TurnAction, hit: bool, now: u64) -> Result<(), EngineError> {
        self.check_integrity(now)?;

        self.data.turn_number += 1;
        self.data.turn_history.push(TurnRecord {
            turn: self.data.turn_number,
            player,
            action,
            at: now,
        });
        self.data.turns_since_last_hit = if hit { 0 } else { self.data.turns_since_last_hit + 1 };

        let next = self.data.opponent_id(player).unwrap_or(player);
        self.data.current_player = Some(next);
        self.data.timers.turn_started_at = Some(now);
        self.data.timers.turn_paused_ms = 0;
        if let Some(p) = self.data.player_mut(next) {
            p.begin_turn();
        }
        self.record(
            GameEventKind::TurnAdvanced,
            Some(next),
            json!({ "turn": self.data.turn_number }),
            now,
        );

        let interval = self.data.config.snapshot_interval;
        if interval > 0 && self.data.turn_number % interval == 0 {
            self.snapshot_at(now);
        }
        Ok(())
    }

    fn start_battle(&mut self, now: u64) {
        self.advance_phase(GamePhase::Battle, now);
        self.data.status = GameStatus::Playing;
        self.data.timers.battle_started_at = Some(now);
        self.data.timers.turn_started_at = Some(now);
        self.data.current_player = self.data.players.first().map(Player::id);
    }

    fn advance_phase(&mut self, next: GamePhase, now: u64) {
        let from = self.data.phase;
        if next <= from {
            return;
        }
        self.data.phase = next;
        self.data.timers.phase_started_at = now;
        self.record(GameEventKind::PhaseChanged, None, json!({ "from": from, "to": next }), now);
        info!(match_id = %self.data.match_id, from = %from, to = %next, "phase changed");
    }

    fn evaluate_at(&mut self, now: u64) -> GameOutcome {
        if let Some(outcome) = &self.data.outcome {
            return outcome.clone();
        }
        let outcome = WinDrawEvaluator::evaluate(&self.data, now);
        if outcome.is_game_over {
            self.finish(outcome, now)
        } else {
            outcome
        }
    }

    /// Freezes the outcome and statistics and enters the terminal phase.
    fn finish(&mut self, mut outcome: GameOutcome, now: u64) -> GameOutcome {
        if self.data.status == GameStatus::Paused {
            self.fold_pause(now);
        }
        self.data.timers.ended_at = Some(now);
        outcome.statistics = Some(EndGameStatistics::collect(&self.data, now));
        self.data.outcome = Some(outcome.clone());
        self.data.status = GameStatus::Finished;
        self.advance_phase(GamePhase::Finished, now);
        self.record(
            GameEventKind::GameEnded,
            outcome.winner,
            json!({
                "reason": outcome.reason,
                "winner": outcome.winner,
                "draw": outcome.is_draw,
                "turns": self.data.turn_number,
            }),
            now,
        );
        info!(
            match_id = %self.data.match_id,
            reason = ?outcome.reason,
            winner = ?outcome.winner,
            turns = self.data.turn_number,
            "match finished"
        );
        self.snapshot_at(now);
        outcome
    }

    fn fold_pause(&mut self, now: u64) {
        if let Some(paused_at) = self.data.timers.paused_at.take() {
            let paused = now.saturating_sub(paused_at);
            self.data.timers.total_paused_ms += paused;
            self.data.timers.turn_paused_ms += paused;
        }
    }

    fn check_integrity(&mut self, now: u64) -> Result<(), EngineError> {
        let failure = self.data.players.iter().find_map(|p| {
            p.verify_integrity()
                .err()
                .map(|detail| format!("player {}: {detail}", p.id()))
        });
        match failure {
            None => Ok(()),
            Some(detail) => Err(self.abort(detail, now)),
        }
    }

    fn abort(&mut self, detail: String, now: u64) -> EngineError {
        let match_id = self.data.match_id;
        error!(match_id = %match_id, detail = %detail, "invariant violated, aborting match");
        if self.data.outcome.is_none() {
            self.finish(GameOutcome::aborted(), now);
        }
        EngineError::InvariantViolation { match_id, detail }
    }

    fn snapshot_at(&mut self, now: u64) {
        let turn = self.data.turn_number;
        self.snapshots.push(StateSnapshot {
            turn,
            taken_at: now,
            data: self.data.clone(),
        });
        self.record(GameEventKind::SnapshotTaken, None, json!({ "turn": turn }), now);
    }

    fn record(&mut self, kind: GameEventKind, player: Option<PlayerId>, payload: Value, now: u64) {
        self.next_event_id += 1;
        self.history.record_event(GameEvent {
            id: EventId::new(self.next_event_id),
            kind,
            timestamp: now,
            player,
            payload,
        });
    }

    fn reject(&self, operation: &'static str, player: PlayerId, issue: ValidationIssue) -> ValidationResult {
        let result = ValidationResult::rejected(issue);
        self.log_rejection(operation, player, &result);
        result
    }

    fn log_rejection(&self, operation: &'static str, player: PlayerId, result: &ValidationResult) {
        if let Some(issue) = result.errors.first() {
            warn!(
                match_id = %self.data.match_id,
                operation,
                player = %player,
                code = %issue.code,
                "action rejected"
            );
        }
    }
}
