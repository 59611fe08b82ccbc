//! Error taxonomy.
//!
//! Two kinds of failure leave the engine:
//!
//! - **Validation failures** are expected and returned as data: a
//!   [`ValidationResult`] listing [`ValidationIssue`]s, each carrying a stable
//!   [`ErrorCode`]. Callers branch on the code, never on the message.
//! - **Engine errors** ([`EngineError`]) are construction failures and
//!   invariant violations. An invariant violation aborts the match.
//!
//! Warnings share the issue shape and ride alongside successful results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use broadside_history::HistoryError;

use crate::ids::MatchId;

/// Stable machine-readable code of a validation issue.
///
/// Serialized as `SCREAMING_SNAKE_CASE`, e.g. `NOT_YOUR_TURN`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The match has ended; no further mutation is accepted.
    GameAlreadyFinished,
    /// The action needs the battle phase.
    GameNotInBattle,
    /// The battle is paused.
    GamePaused,
    /// The action is not allowed in the current phase.
    WrongPhase,
    /// Both seats are taken.
    GameFull,
    /// No player with that id is in the match.
    PlayerNotFound,
    /// A player with that id already joined.
    DuplicatePlayer,
    /// The player surrendered or left.
    PlayerInactive,
    /// The player is disconnected and reconnection is not allowed.
    PlayerDisconnected,
    /// The opposing player is disconnected (warning).
    OpponentDisconnected,
    /// Another player holds the turn.
    NotYourTurn,
    /// The action targets its own actor.
    CannotTargetSelf,
    /// The coordinate lies outside the board.
    OutOfBounds,
    /// The cell was already attacked.
    AlreadyHit,
    /// No ship with that id in the player's fleet.
    ShipNotFound,
    /// The placement overlaps another ship.
    ShipOverlap,
    /// The placement touches another ship and adjacency is disallowed.
    ShipAdjacent,
    /// The ship is sunk.
    ShipSunk,
    /// Placement is locked after the player confirmed it.
    PlacementLocked,
    /// Not every ship of the fleet is placed.
    FleetIncomplete,
    /// No ability with that id on the ship.
    AbilityNotFound,
    /// The ability is disabled (its ship sank).
    AbilityDisabled,
    /// The ability has no uses left.
    AbilityExhausted,
    /// The ability is cooling down.
    AbilityOnCooldown,
    /// Powerups are disabled for this match.
    PowerupsDisabled,
    /// No charges of that powerup left.
    PowerupUnavailable,
    /// The powerup is cooling down.
    PowerupOnCooldown,
    /// The powerup needs a target coordinate.
    PowerupTargetRequired,
    /// The turn time limit has passed.
    TurnTimeout,
}

impl ErrorCode {
    /// The serialized form, e.g. `"NOT_YOUR_TURN"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameAlreadyFinished => "GAME_ALREADY_FINISHED",
            Self::GameNotInBattle => "GAME_NOT_IN_BATTLE",
            Self::GamePaused => "GAME_PAUSED",
            Self::WrongPhase => "WRONG_PHASE",
            Self::GameFull => "GAME_FULL",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::DuplicatePlayer => "DUPLICATE_PLAYER",
            Self::PlayerInactive => "PLAYER_INACTIVE",
            Self::PlayerDisconnected => "PLAYER_DISCONNECTED",
            Self::OpponentDisconnected => "OPPONENT_DISCONNECTED",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::CannotTargetSelf => "CANNOT_TARGET_SELF",
            Self::OutOfBounds => "OUT_OF_BOUNDS",
            Self::AlreadyHit => "ALREADY_HIT",
            Self::ShipNotFound => "SHIP_NOT_FOUND",
            Self::ShipOverlap => "SHIP_OVERLAP",
            Self::ShipAdjacent => "SHIP_ADJACENT",
            Self::ShipSunk => "SHIP_SUNK",
            Self::PlacementLocked => "PLACEMENT_LOCKED",
            Self::FleetIncomplete => "FLEET_INCOMPLETE",
            Self::AbilityNotFound => "ABILITY_NOT_FOUND",
            Self::AbilityDisabled => "ABILITY_DISABLED",
            Self::AbilityExhausted => "ABILITY_EXHAUSTED",
            Self::AbilityOnCooldown => "ABILITY_ON_COOLDOWN",
            Self::PowerupsDisabled => "POWERUPS_DISABLED",
            Self::PowerupUnavailable => "POWERUP_UNAVAILABLE",
            Self::PowerupOnCooldown => "POWERUP_ON_COOLDOWN",
            Self::PowerupTargetRequired => "POWERUP_TARGET_REQUIRED",
            Self::TurnTimeout => "TURN_TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation error or warning: `{code, message, field?, value?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable explanation.
    pub message: String,
    /// Name of the offending input, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The offending value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ValidationIssue {
    /// Creates an issue without field or value.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            value: None,
        }
    }

    /// Names the offending input.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attaches the offending value.
    #[must_use]
    pub fn with_value(mut self, value: impl Serialize) -> Self {
        self.value = serde_json::to_value(value).ok();
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Outcome of a validation pass.
///
/// `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the action may proceed.
    pub valid: bool,
    /// Hard failures.
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking advisories.
    pub warnings: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl ValidationResult {
    /// A passing result with no warnings.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A failing result with a single error.
    #[must_use]
    pub fn rejected(issue: ValidationIssue) -> Self {
        let mut result = Self::ok();
        result.push_error(issue);
        result
    }

    /// Adds an error and marks the result invalid.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.valid = false;
        self.errors.push(issue);
    }

    /// Adds a warning.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Whether the action may proceed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Code of the first error, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<ErrorCode> {
        self.errors.first().map(|issue| issue.code)
    }

    /// Whether any error carries `code`.
    #[must_use]
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    /// Whether any warning carries `code`.
    #[must_use]
    pub fn has_warning(&self, code: ErrorCode) -> bool {
        self.warnings.iter().any(|issue| issue.code == code)
    }
}

impl From<ValidationIssue> for ValidationResult {
    fn from(issue: ValidationIssue) -> Self {
        Self::rejected(issue)
    }
}

/// Failures that are not ordinary validation results.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A configuration document could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigurationParse(#[from] serde_json::Error),

    /// A fleet definition is unusable.
    #[error("invalid fleet: {0}")]
    InvalidFleet(String),

    /// Internal state is inconsistent; the match was aborted.
    #[error("invariant violated in match {match_id}: {detail}")]
    InvariantViolation {
        /// The aborted match.
        match_id: MatchId,
        /// What was inconsistent.
        detail: String,
    },

    /// The event history rejected its configuration.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// No match with that id is registered.
    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    /// A match with that id is already registered.
    #[error("match {0} already registered")]
    DuplicateMatch(MatchId),
}
