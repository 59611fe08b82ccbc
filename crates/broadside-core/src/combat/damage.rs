//! Damage calculation.
//!
//! The pipeline order is fixed; reordering changes outcomes:
//!
//! 1. Armor: subtract the ship's armor (halved, rounded down, at or below
//!    25% health), never below zero
//! 2. Critical hit: roll against 5% (+10% at or below 25% health, plus the
//!    vulnerability-zone bonus, plus attacker critical boosts); a critical
//!    hit doubles the damage, rounded up
//! 3. Defender abilities: active armor/shield boosts subtract; an active
//!    evasion rolls again and, on success, drops the damage to the floor
//! 4. Attacker damage boosts multiply, rounded up
//! 5. Class multiplier, rounded to nearest
//! 6. Floor at [`MIN_DAMAGE`]
//!
//! Rolls are drawn from the injected [`RollSource`] in this order: the
//! critical roll always, then the evasion roll only when evasion is active.

use serde::{Deserialize, Serialize};

use crate::board::Coordinate;
use crate::rolls::RollSource;
use crate::ship::{AbilityEffect, Ship};

/// Critical chance of any hit.
pub const BASE_CRITICAL_CHANCE: f64 = 0.05;

/// Extra critical chance against a critically damaged ship.
pub const CRITICALLY_DAMAGED_BONUS: f64 = 0.10;

/// Damage multiplier of a critical hit.
pub const CRITICAL_MULTIPLIER: f64 = 2.0;

/// Lowest damage any hit deals.
pub const MIN_DAMAGE: u32 = 1;

/// Attacker-side modifiers, folded from the attacker's active abilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackModifiers {
    /// Product of active damage boosts.
    pub damage_multiplier: f64,
    /// Sum of active critical boosts.
    pub critical_bonus: f64,
}

impl Default for AttackModifiers {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            critical_bonus: 0.0,
        }
    }
}

impl AttackModifiers {
    /// Folds offensive effects. Defensive effects are ignored.
    #[must_use]
    pub fn from_effects(effects: &[AbilityEffect]) -> Self {
        effects
            .iter()
            .fold(Self::default(), |mut acc, effect| {
                match *effect {
                    AbilityEffect::DamageBoost { multiplier } => acc.damage_multiplier *= multiplier,
                    AbilityEffect::CriticalBoost { bonus } => acc.critical_bonus += bonus,
                    AbilityEffect::ArmorBoost { .. }
                    | AbilityEffect::Shield { .. }
                    | AbilityEffect::Evasion { .. } => {}
                }
                acc
            })
    }
}

/// How a hit's damage was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageBreakdown {
    /// Damage before modifiers.
    pub base_damage: u32,
    /// Damage removed by armor.
    pub armor_reduction: u32,
    /// Net change from defender and attacker abilities.
    pub ability_modifier: i64,
    /// Whether the hit was critical.
    pub critical_hit: bool,
    /// Whether the defender evaded.
    pub evaded: bool,
    /// Final damage, at least [`MIN_DAMAGE`].
    pub total_damage: u32,
    /// Human-readable summary.
    pub description: String,
}

/// Stateless damage pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageCalculator;

impl DamageCalculator {
    /// Computes the damage of a hit on `ship` at `coordinate`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn calculate(
        ship: &Ship,
        coordinate: Coordinate,
        base_damage: u32,
        modifiers: &AttackModifiers,
        rolls: &mut dyn RollSource,
    ) -> DamageBreakdown {
        let critically_damaged = ship.is_critically_damaged();
        let mut notes = Vec::new();

        // 1. armor
        let armor = if critically_damaged {
            ship.armor() / 2
        } else {
            ship.armor()
        };
        let armor_reduction = armor.min(base_damage);
        let mut damage = f64::from(base_damage - armor_reduction);
        if armor_reduction > 0 {
            notes.push(format!("armor -{armor_reduction}"));
        }

        // 2. critical
        let mut chance = BASE_CRITICAL_CHANCE + ship.vulnerability_bonus_at(coordinate);
        if critically_damaged {
            chance += CRITICALLY_DAMAGED_BONUS;
        }
        chance = (chance + modifiers.critical_bonus).clamp(0.0, 1.0);
        let critical_hit = rolls.roll() < chance;
        if critical_hit {
            damage = (damage * CRITICAL_MULTIPLIER).ceil();
            notes.push("critical x2".to_string());
        }

        let before_abilities = damage;

        // 3. defender
        let mut evasion: Option<f64> = None;
        for effect in ship.active_effects() {
            match effect {
                AbilityEffect::ArmorBoost { reduction } | AbilityEffect::Shield { reduction } => {
                    damage = (damage - f64::from(reduction)).max(0.0);
                }
                AbilityEffect::Evasion { chance } => {
                    evasion = Some(evasion.map_or(chance, |c| c.max(chance)));
                }
                AbilityEffect::DamageBoost { .. } | AbilityEffect::CriticalBoost { .. } => {}
            }
        }
        let evaded = evasion.is_some_and(|chance| rolls.roll() < chance);
        if evaded {
            damage = 0.0;
            notes.push("evaded".to_string());
        }

        // 4. attacker
        if (modifiers.damage_multiplier - 1.0).abs() > f64::EPSILON {
            damage = (damage * modifiers.damage_multiplier).ceil();
            notes.push(format!("boost x{}", modifiers.damage_multiplier));
        }
        let ability_modifier = (damage - before_abilities) as i64;
        if ability_modifier < 0 && !evaded {
            notes.push(format!("abilities {ability_modifier}"));
        }

        // 5. class
        let class_multiplier = ship.damage_multiplier();
        damage = (damage * class_multiplier).round();

        // 6. floor
        let total_damage = (damage.max(0.0) as u32).max(MIN_DAMAGE);

        let mut description = format!("{total_damage} damage to {}", ship.name());
        if !notes.is_empty() {
            description.push_str(" (");
            description.push_str(&notes.join(", "));
            description.push(')');
        }

        DamageBreakdown {
            base_damage,
            armor_reduction,
            ability_modifier,
            critical_hit,
            evaded,
            total_damage,
            description,
        }
    }
}
