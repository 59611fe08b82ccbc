//! Per-match configuration.
//!
//! A [`GameConfiguration`] is fixed when the match is created. Only the
//! history capacities can be changed afterwards, through
//! [`GameState::update_history_config`](crate::game::GameState::update_history_config).

use serde::{Deserialize, Serialize};

use broadside_history::HistoryConfig;

use crate::error::EngineError;

/// Largest supported board edge.
pub const MAX_BOARD_SIZE: u8 = 26;

/// Hard cap on the chain-reaction radius.
pub const MAX_CHAIN_RADIUS: u8 = 3;

/// What happens when a player drops their connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectionPolicy {
    /// Whether a disconnected player may come back.
    ///
    /// When false, a disconnection forfeits the match immediately.
    pub allowed: bool,
    /// How long a disconnected player may stay away before forfeiting.
    /// `None` waits forever.
    pub grace_period_ms: Option<u64>,
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self {
            allowed: true,
            grace_period_ms: Some(60_000),
        }
    }
}

/// Immutable settings of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfiguration {
    /// Board columns.
    pub board_width: u8,
    /// Board rows.
    pub board_height: u8,
    /// Damage of an ordinary shot before modifiers.
    pub base_damage: u32,
    /// Time a player has for one turn. `None` disables the limit.
    pub turn_time_limit_ms: Option<u64>,
    /// Whether powerups may be used.
    pub powerups_enabled: bool,
    /// Starting charges of each powerup kind.
    pub powerup_charges: u8,
    /// Turns a powerup kind stays unavailable after use.
    pub powerup_cooldown_turns: u32,
    /// Chain-reaction radius of a barrage (capped at [`MAX_CHAIN_RADIUS`]).
    pub barrage_radius: u8,
    /// Whether opponents see only revealed cells.
    pub fog_of_war: bool,
    /// Disconnection handling.
    pub reconnection: ReconnectionPolicy,
    /// Completed turns after which the match is drawn. `None` disables it.
    pub max_turns: Option<u32>,
    /// Consecutive turns without a hit after which the match is drawn.
    pub stalemate_turns: u32,
    /// Whether ships may occupy neighbouring cells.
    pub allow_adjacent_ships: bool,
    /// Completed turns between automatic snapshots. 0 disables them.
    pub snapshot_interval: u32,
    /// Snapshots retained (oldest evicted first).
    pub max_snapshots: usize,
    /// Event history capacities.
    pub history: HistoryConfig,
    /// Seed of the combat roll stream.
    pub seed: u64,
}

impl Default for GameConfiguration {
    fn default() -> Self {
        Self {
            board_width: 10,
            board_height: 10,
            base_damage: 1,
            turn_time_limit_ms: Some(60_000),
            powerups_enabled: true,
            powerup_charges: 1,
            powerup_cooldown_turns: 3,
            barrage_radius: 1,
            fog_of_war: true,
            reconnection: ReconnectionPolicy::default(),
            max_turns: Some(400),
            stalemate_turns: 20,
            allow_adjacent_ships: true,
            snapshot_interval: 10,
            max_snapshots: 10,
            history: HistoryConfig::default(),
            seed: 0,
        }
    }
}

impl GameConfiguration {
    /// Default settings on a `width` x `height` board.
    #[must_use]
    pub fn with_board(width: u8, height: u8) -> Self {
        Self {
            board_width: width,
            board_height: height,
            ..Default::default()
        }
    }

    /// Default settings with a given roll seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Parses a JSON document and validates it. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigurationParse`] for malformed JSON and
    /// [`EngineError::InvalidConfiguration`] for unusable values.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective barrage radius after the chain-reaction cap.
    #[must_use]
    pub fn effective_barrage_radius(&self) -> u8 {
        self.barrage_radius.min(MAX_CHAIN_RADIUS)
    }

    /// Rejects settings the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfiguration`] describing the first
    /// unusable value.
    pub fn validate(&self) -> Result<(), EngineError> {
        let board_ok = |edge: u8| (1..=MAX_BOARD_SIZE).contains(&edge);
        if !board_ok(self.board_width) || !board_ok(self.board_height) {
            return Err(EngineError::InvalidConfiguration(format!(
                "board must be between 1x1 and {MAX_BOARD_SIZE}x{MAX_BOARD_SIZE}, got {}x{}",
                self.board_width, self.board_height
            )));
        }
        if self.base_damage == 0 {
            return Err(EngineError::InvalidConfiguration(
                "base_damage must be at least 1".into(),
            ));
        }
        if self.stalemate_turns == 0 {
            return Err(EngineError::InvalidConfiguration(
                "stalemate_turns must be at least 1".into(),
            ));
        }
        if self.max_turns == Some(0) {
            return Err(EngineError::InvalidConfiguration(
                "max_turns must be at least 1 when set".into(),
            ));
        }
        if self.turn_time_limit_ms == Some(0) {
            return Err(EngineError::InvalidConfiguration(
                "turn_time_limit_ms must be positive when set".into(),
            ));
        }
        if self.max_snapshots == 0 {
            return Err(EngineError::InvalidConfiguration(
                "max_snapshots must be at least 1".into(),
            ));
        }
        self.history.validate()?;
        Ok(())
    }
}
