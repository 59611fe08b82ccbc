//! Registry of live matches.
//!
//! Each match sits behind its own `RwLock`, so different matches never
//! contend. The map itself is a [`DashMap`]; locks are never held across
//! map operations.

use dashmap::DashMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::GameConfiguration;
use crate::error::EngineError;
use crate::game::GameState;
use crate::ids::MatchId;

/// Shared handle to one match.
pub type MatchHandle = Arc<RwLock<GameState>>;

/// Registry of all live matches.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: DashMap<MatchId, MatchHandle>,
}

impl MatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a match with seeded rolls and the system clock.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateMatch`] if the id is taken, or the
    /// configuration error from [`GameState::new`].
    pub fn create(&self, id: MatchId, config: GameConfiguration) -> Result<MatchHandle, EngineError> {
        if self.matches.contains_key(&id) {
            return Err(EngineError::DuplicateMatch(id));
        }
        let game = GameState::new(id, config)?;
        self.insert(game)
    }

    /// Registers an existing match.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateMatch`] if the id is taken.
    pub fn insert(&self, game: GameState) -> Result<MatchHandle, EngineError> {
        let id = game.match_id();
        match self.matches.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(EngineError::DuplicateMatch(id)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let handle = Arc::new(RwLock::new(game));
                slot.insert(Arc::clone(&handle));
                info!(match_id = %id, "match registered");
                Ok(handle)
            }
        }
    }

    /// Handle of a match.
    #[must_use]
    pub fn get(&self, id: MatchId) -> Option<MatchHandle> {
        self.matches.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Unregisters a match.
    pub fn remove(&self, id: MatchId) -> Option<MatchHandle> {
        self.matches.remove(&id).map(|(_, handle)| handle)
    }

    /// Runs `f` with shared access to a match.
    ///
    /// # Errors
    ///
    /// [`EngineError::MatchNotFound`] for an unknown id.
    pub fn with_game<R>(&self, id: MatchId, f: impl FnOnce(&GameState) -> R) -> Result<R, EngineError> {
        let handle = self.get(id).ok_or(EngineError::MatchNotFound(id))?;
        let game = handle.read();
        Ok(f(&game))
    }

    /// Runs `f` with exclusive access to a match.
    ///
    /// # Errors
    ///
    /// [`EngineError::MatchNotFound`] for an unknown id.
    pub fn with_game_mut<R>(
        &self,
        id: MatchId,
        f: impl FnOnce(&mut GameState) -> R,
    ) -> Result<R, EngineError> {
        let handle = self.get(id).ok_or(EngineError::MatchNotFound(id))?;
        let mut game = handle.write();
        Ok(f(&mut game))
    }

    /// Number of registered matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether no match is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Registered ids, ascending.
    #[must_use]
    pub fn match_ids(&self) -> Vec<MatchId> {
        let mut ids: Vec<MatchId> = self.matches.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Expires overdue turns across all matches in parallel.
    ///
    /// Returns the ids of matches whose turn expired, ascending. A match that
    /// aborts on an integrity failure is logged and skipped.
    pub fn sweep_turn_timeouts(&self) -> Vec<MatchId> {
        let handles: Vec<(MatchId, MatchHandle)> = self
            .matches
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut expired: Vec<MatchId> = handles
            .par_iter()
            .filter_map(|(id, handle)| match handle.write().expire_turn() {
                Ok(true) => Some(*id),
                Ok(false) => None,
                Err(err) => {
                    error!(match_id = %id, error = %err, "turn sweep failed");
                    None
                }
            })
            .collect();
        expired.sort_unstable();
        expired
    }

    /// Unregisters finished matches and returns their ids, ascending.
    pub fn remove_finished(&self) -> Vec<MatchId> {
        let mut finished: Vec<MatchId> = self
            .matches
            .iter()
            .filter(|entry| entry.value().read().data().is_finished())
            .map(|entry| *entry.key())
            .collect();
        finished.sort_unstable();
        for id in &finished {
            self.matches.remove(id);
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_lookup() {
        let registry = MatchRegistry::new();
        assert!(registry.is_empty());
        registry.create(MatchId::new(2), GameConfiguration::default()).unwrap();
        registry.create(MatchId::new(1), GameConfiguration::default()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.match_ids(), vec![MatchId::new(1), MatchId::new(2)]);
        assert!(matches!(
            registry.create(MatchId::new(1), GameConfiguration::default()),
            Err(EngineError::DuplicateMatch(_))
        ));
    }

    #[test]
    fn unknown_match() {
        let registry = MatchRegistry::new();
        let err = registry.with_game(MatchId::new(9), GameState::turn_number).unwrap_err();
        assert!(matches!(err, EngineError::MatchNotFound(id) if id == MatchId::new(9)));
    }

    #[test]
    fn invalid_config_is_not_registered() {
        let registry = MatchRegistry::new();
        let config = GameConfiguration::with_board(0, 10);
        assert!(registry.create(MatchId::new(1), config).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_returns_handle() {
        let registry = MatchRegistry::new();
        registry.create(MatchId::new(3), GameConfiguration::default()).unwrap();
        let handle = registry.remove(MatchId::new(3)).unwrap();
        assert_eq!(handle.read().match_id(), MatchId::new(3));
        assert!(registry.get(MatchId::new(3)).is_none());
    }
}
