//! Powerups and per-player powerup inventory.
//!
//! Every player starts with the configured number of charges of each kind.
//! Using a powerup spends a charge and puts that kind on cooldown; cooldowns
//! tick down when the turn passes back to the owner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ErrorCode;

/// Radius of the area revealed by a radar sweep.
pub const RADAR_RADIUS: u8 = 1;

/// Kinds of powerup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    /// Reveals the cells around a target on the opponent's board.
    /// Free action.
    Radar,
    /// Attacks a target and damages ships around it. Ends the turn.
    Barrage,
}

impl PowerupKind {
    /// Every kind, in inventory order.
    pub const ALL: [Self; 2] = [Self::Radar, Self::Barrage];

    /// Whether using this kind ends the turn.
    #[must_use]
    pub fn ends_turn(self) -> bool {
        matches!(self, Self::Barrage)
    }
}

impl fmt::Display for PowerupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radar => f.write_str("radar"),
            Self::Barrage => f.write_str("barrage"),
        }
    }
}

/// Charges and cooldowns held by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerupInventory {
    charges: BTreeMap<PowerupKind, u8>,
    cooldowns: BTreeMap<PowerupKind, u32>,
}

impl PowerupInventory {
    /// `charges` of every kind, none cooling down.
    #[must_use]
    pub fn new(charges: u8) -> Self {
        Self {
            charges: PowerupKind::ALL.iter().map(|k| (*k, charges)).collect(),
            cooldowns: BTreeMap::new(),
        }
    }

    /// Charges left of `kind`.
    #[must_use]
    pub fn charges(&self, kind: PowerupKind) -> u8 {
        self.charges.get(&kind).copied().unwrap_or(0)
    }

    /// Owner turns until `kind` can be used again.
    #[must_use]
    pub fn cooldown(&self, kind: PowerupKind) -> u32 {
        self.cooldowns.get(&kind).copied().unwrap_or(0)
    }

    /// Checks that `kind` can be used now.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::PowerupUnavailable`] without charges,
    /// [`ErrorCode::PowerupOnCooldown`] while cooling down.
    pub fn check_available(&self, kind: PowerupKind) -> Result<(), ErrorCode> {
        if self.charges(kind) == 0 {
            return Err(ErrorCode::PowerupUnavailable);
        }
        if self.cooldown(kind) > 0 {
            return Err(ErrorCode::PowerupOnCooldown);
        }
        Ok(())
    }

    /// Spends a charge of `kind` and starts its cooldown.
    pub(crate) fn consume(&mut self, kind: PowerupKind, cooldown_turns: u32) {
        if let Some(charges) = self.charges.get_mut(&kind) {
            *charges = charges.saturating_sub(1);
        }
        if cooldown_turns > 0 {
            self.cooldowns.insert(kind, cooldown_turns);
        }
    }

    /// Advances every cooldown by one owner turn.
    pub(crate) fn tick(&mut self) {
        self.cooldowns.retain(|_, turns| {
            *turns = turns.saturating_sub(1);
            *turns > 0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_spends_charge_and_cools_down() {
        let mut inventory = PowerupInventory::new(2);
        assert_eq!(inventory.check_available(PowerupKind::Radar), Ok(()));

        inventory.consume(PowerupKind::Radar, 2);
        assert_eq!(inventory.charges(PowerupKind::Radar), 1);
        assert_eq!(
            inventory.check_available(PowerupKind::Radar),
            Err(ErrorCode::PowerupOnCooldown)
        );
        assert_eq!(inventory.check_available(PowerupKind::Barrage), Ok(()));

        inventory.tick();
        assert_eq!(inventory.cooldown(PowerupKind::Radar), 1);
        inventory.tick();
        assert_eq!(inventory.check_available(PowerupKind::Radar), Ok(()));
    }

    #[test]
    fn empty_inventory_is_unavailable() {
        let mut inventory = PowerupInventory::new(1);
        inventory.consume(PowerupKind::Barrage, 0);
        assert_eq!(
            inventory.check_available(PowerupKind::Barrage),
            Err(ErrorCode::PowerupUnavailable)
        );
        assert_eq!(
            PowerupInventory::new(0).check_available(PowerupKind::Radar),
            Err(ErrorCode::PowerupUnavailable)
        );
    }

    #[test]
    fn only_barrage_ends_turn() {
        assert!(PowerupKind::Barrage.ends_turn());
        assert!(!PowerupKind::Radar.ends_turn());
    }

    #[test]
    fn inventory_serializes_with_named_keys() {
        let json = serde_json::to_value(PowerupInventory::new(1)).unwrap();
        assert_eq!(json["charges"]["radar"], 1);
        assert_eq!(json["charges"]["barrage"], 1);
    }
}
