//! # Ship Module
//!
//! Ships, their class traits and their abilities.
//!
//! ## Hit Points
//!
//! Hit points only ever decrease. A ship sinks when its hit points reach zero
//! or when every cell it occupies has been hit (it founders; hit points are
//! then forced to zero). Sinking is one-way: it stamps the sinking time and
//! disables every ability. A sunk ship stays in its fleet.
//!
//! ## Abilities
//!
//! Each [`Ability`] carries a typed [`AbilityEffect`]. Activation starts the
//! effect for `duration_turns` of its owner's turns and puts the ability on
//! cooldown. Durations and cooldowns tick down when the turn passes back to
//! the owner.

use serde::{Deserialize, Serialize};

use crate::board::{Coordinate, Orientation};
use crate::error::{EngineError, ErrorCode};
use crate::ids::{AbilityId, ShipId};

// =============================================================================
// Ship Class
// =============================================================================

/// Hull class. Decides default armor, damage multiplier and vulnerability zone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipClass {
    /// Carrier. Vulnerable at the flight deck (middle cell).
    Carrier,
    /// Battleship. Vulnerable at the bow (first cell).
    Battleship,
    /// Cruiser. Vulnerable at the stern (last cell).
    Cruiser,
    /// Submarine. Every cell is vulnerable.
    Submarine,
    /// Destroyer. Vulnerable at the stern (last cell).
    Destroyer,
}

impl ShipClass {
    /// Armor value used when the [`ShipSpec`] gives none.
    #[must_use]
    pub fn default_armor(self) -> u32 {
        match self {
            Self::Battleship => 2,
            Self::Carrier | Self::Cruiser => 1,
            Self::Submarine | Self::Destroyer => 0,
        }
    }

    /// Multiplier applied as the last damage step.
    #[must_use]
    pub fn damage_multiplier(self) -> f64 {
        match self {
            Self::Submarine => 1.3,
            Self::Battleship => 1.2,
            Self::Destroyer => 0.9,
            Self::Carrier | Self::Cruiser => 1.0,
        }
    }

    /// Critical-hit bonus inside the vulnerability zone.
    #[must_use]
    pub fn vulnerability_bonus(self) -> f64 {
        match self {
            Self::Carrier => 0.15,
            Self::Submarine => 0.20,
            Self::Battleship => 0.12,
            Self::Cruiser | Self::Destroyer => 0.10,
        }
    }

    /// Indices into a placed ship's coordinate list that form the zone.
    fn vulnerable_indices(self, len: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        match self {
            Self::Carrier => vec![len / 2],
            Self::Submarine => (0..len).collect(),
            Self::Battleship => vec![0],
            Self::Cruiser | Self::Destroyer => vec![len - 1],
        }
    }
}

// =============================================================================
// Abilities
// =============================================================================

/// What an active ability does.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Flat reduction of damage taken by this ship.
    ArmorBoost {
        /// Damage points removed.
        reduction: u32,
    },
    /// Flat reduction of damage taken by this ship.
    Shield {
        /// Damage points removed.
        reduction: u32,
    },
    /// Chance to shrug off a hit on this ship (damage drops to the floor).
    Evasion {
        /// Probability in `[0, 1]`.
        chance: f64,
    },
    /// Multiplies damage dealt by the owner's attacks.
    DamageBoost {
        /// Damage multiplier.
        multiplier: f64,
    },
    /// Adds to the critical chance of the owner's attacks.
    CriticalBoost {
        /// Absolute chance added.
        bonus: f64,
    },
}

impl AbilityEffect {
    /// Default evasion effect (20%).
    pub const EVASION: Self = Self::Evasion { chance: 0.2 };

    /// Default damage boost (+50%).
    pub const DAMAGE_BOOST: Self = Self::DamageBoost { multiplier: 1.5 };

    /// Whether the effect protects the ship that carries it.
    #[must_use]
    pub fn is_defensive(&self) -> bool {
        matches!(
            self,
            Self::ArmorBoost { .. } | Self::Shield { .. } | Self::Evasion { .. }
        )
    }

    /// Whether the effect modifies the owner's attacks.
    #[must_use]
    pub fn is_offensive(&self) -> bool {
        !self.is_defensive()
    }
}

/// Catalog entry of an ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySpec {
    /// Identifier, unique within the ship.
    pub id: AbilityId,
    /// Display name.
    pub name: String,
    /// Effect while active.
    pub effect: AbilityEffect,
    /// Owner turns before it can be used again.
    pub cooldown_turns: u32,
    /// Number of uses. `None` is unlimited.
    pub max_uses: Option<u32>,
    /// Owner turns the effect stays active.
    pub duration_turns: u32,
}

impl AbilitySpec {
    /// A single-turn ability with no cooldown and unlimited uses.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, effect: AbilityEffect) -> Self {
        Self {
            id: AbilityId::new(id),
            name: name.into(),
            effect,
            cooldown_turns: 0,
            max_uses: None,
            duration_turns: 1,
        }
    }

    /// Sets the cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, turns: u32) -> Self {
        self.cooldown_turns = turns;
        self
    }

    /// Limits the number of uses.
    #[must_use]
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.max_uses = Some(uses);
        self
    }

    /// Sets how long the effect stays active.
    #[must_use]
    pub fn with_duration(mut self, turns: u32) -> Self {
        self.duration_turns = turns;
        self
    }
}

/// A ship's ability instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    id: AbilityId,
    name: String,
    effect: AbilityEffect,
    cooldown_turns: u32,
    cooldown_remaining: u32,
    uses_remaining: Option<u32>,
    duration_turns: u32,
    active_turns_remaining: u32,
    disabled: bool,
}

impl Ability {
    fn from_spec(spec: &AbilitySpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name.clone(),
            effect: spec.effect,
            cooldown_turns: spec.cooldown_turns,
            cooldown_remaining: 0,
            uses_remaining: spec.max_uses,
            duration_turns: spec.duration_turns.max(1),
            active_turns_remaining: 0,
            disabled: false,
        }
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> AbilityId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effect while active.
    #[must_use]
    pub fn effect(&self) -> AbilityEffect {
        self.effect
    }

    /// Owner turns until it can be used again.
    #[must_use]
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    /// Uses left. `None` is unlimited.
    #[must_use]
    pub fn uses_remaining(&self) -> Option<u32> {
        self.uses_remaining
    }

    /// Whether the effect currently applies.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.disabled && self.active_turns_remaining > 0
    }

    /// Whether the ability was disabled by sinking.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Checks that the ability can be activated now.
    ///
    /// # Errors
    ///
    /// The [`ErrorCode`] of the first failing precondition: disabled,
    /// exhausted, then cooling down.
    pub fn check_ready(&self) -> Result<(), ErrorCode> {
        if self.disabled {
            return Err(ErrorCode::AbilityDisabled);
        }
        if self.uses_remaining == Some(0) {
            return Err(ErrorCode::AbilityExhausted);
        }
        if self.cooldown_remaining > 0 {
            return Err(ErrorCode::AbilityOnCooldown);
        }
        Ok(())
    }

    /// Starts the effect. Callers check [`Ability::check_ready`] first.
    pub(crate) fn activate(&mut self) {
        self.active_turns_remaining = self.duration_turns;
        self.cooldown_remaining = self.cooldown_turns;
        if let Some(uses) = self.uses_remaining.as_mut() {
            *uses = uses.saturating_sub(1);
        }
    }

    fn tick(&mut self) {
        self.active_turns_remaining = self.active_turns_remaining.saturating_sub(1);
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
    }

    fn disable(&mut self) {
        self.disabled = true;
        self.active_turns_remaining = 0;
    }
}

// =============================================================================
// Ship
// =============================================================================

/// Catalog entry of a ship, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSpec {
    /// Identifier, unique within the fleet.
    pub id: ShipId,
    /// Display name.
    pub name: String,
    /// Hull class.
    pub class: ShipClass,
    /// Cells occupied.
    pub size: u8,
    /// Hit points. Defaults to `size`.
    #[serde(default)]
    pub max_hit_points: Option<u32>,
    /// Armor. Defaults to the class value.
    #[serde(default)]
    pub armor: Option<u32>,
    /// Damage multiplier. Defaults to the class value.
    #[serde(default)]
    pub damage_multiplier: Option<f64>,
    /// Abilities.
    #[serde(default)]
    pub abilities: Vec<AbilitySpec>,
}

impl ShipSpec {
    /// A ship with class defaults and no abilities.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, class: ShipClass, size: u8) -> Self {
        Self {
            id: ShipId::new(id),
            name: name.into(),
            class,
            size,
            max_hit_points: None,
            armor: None,
            damage_multiplier: None,
            abilities: Vec::new(),
        }
    }

    /// Overrides the hit points.
    #[must_use]
    pub fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.max_hit_points = Some(hit_points);
        self
    }

    /// Overrides the armor.
    #[must_use]
    pub fn with_armor(mut self, armor: u32) -> Self {
        self.armor = Some(armor);
        self
    }

    /// Overrides the damage multiplier.
    #[must_use]
    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = Some(multiplier);
        self
    }

    /// Adds an ability.
    #[must_use]
    pub fn with_ability(mut self, ability: AbilitySpec) -> Self {
        self.abilities.push(ability);
        self
    }
}

/// Where a ship is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Placement {
    /// Not on the board yet.
    Unplaced,
    /// On the board.
    Placed {
        /// First cell.
        origin: Coordinate,
        /// Direction from the origin.
        orientation: Orientation,
        /// Occupied cells, origin first. Length equals the ship size.
        coordinates: Vec<Coordinate>,
    },
}

/// Damage taken by a ship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRecord {
    /// Distinct cells hit, in hit order.
    pub hits: Vec<Coordinate>,
    /// Number of damaging hits, chain damage included.
    pub total_hits: u32,
    /// Hit points lost.
    pub total_damage: u32,
    /// When the ship sank.
    pub sunk_at: Option<u64>,
}

/// What one damage application did to a ship.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShipDamage {
    /// Hit points lost.
    pub hit_points_lost: u32,
    /// Whether this application sank the ship.
    pub sunk: bool,
}

/// A ship in a fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    id: ShipId,
    name: String,
    class: ShipClass,
    size: u8,
    max_hit_points: u32,
    hit_points: u32,
    armor: u32,
    damage_multiplier: f64,
    placement: Placement,
    damage: DamageRecord,
    abilities: Vec<Ability>,
}

impl Ship {
    /// Builds a ship from its catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFleet`] for a zero size, zero hit
    /// points, a non-positive multiplier or duplicate ability ids.
    pub fn from_spec(spec: &ShipSpec) -> Result<Self, EngineError> {
        if spec.size == 0 {
            return Err(EngineError::InvalidFleet(format!(
                "ship {} has size 0",
                spec.id
            )));
        }
        let max_hit_points = spec.max_hit_points.unwrap_or(u32::from(spec.size));
        if max_hit_points == 0 {
            return Err(EngineError::InvalidFleet(format!(
                "ship {} has no hit points",
                spec.id
            )));
        }
        let damage_multiplier = spec
            .damage_multiplier
            .unwrap_or_else(|| spec.class.damage_multiplier());
        if !(damage_multiplier.is_finite() && damage_multiplier > 0.0) {
            return Err(EngineError::InvalidFleet(format!(
                "ship {} has damage multiplier {damage_multiplier}",
                spec.id
            )));
        }
        for (i, ability) in spec.abilities.iter().enumerate() {
            if spec.abilities[..i].iter().any(|a| a.id == ability.id) {
                return Err(EngineError::InvalidFleet(format!(
                    "ship {} lists ability {} twice",
                    spec.id, ability.id
                )));
            }
        }

        Ok(Self {
            id: spec.id,
            name: spec.name.clone(),
            class: spec.class,
            size: spec.size,
            max_hit_points,
            hit_points: max_hit_points,
            armor: spec.armor.unwrap_or_else(|| spec.class.default_armor()),
            damage_multiplier,
            placement: Placement::Unplaced,
            damage: DamageRecord::default(),
            abilities: spec.abilities.iter().map(Ability::from_spec).collect(),
        })
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> ShipId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hull class.
    #[must_use]
    pub fn class(&self) -> ShipClass {
        self.class
    }

    /// Cells occupied once placed.
    #[must_use]
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Current hit points.
    #[must_use]
    pub fn hit_points(&self) -> u32 {
        self.hit_points
    }

    /// Starting hit points.
    #[must_use]
    pub fn max_hit_points(&self) -> u32 {
        self.max_hit_points
    }

    /// Armor value.
    #[must_use]
    pub fn armor(&self) -> u32 {
        self.armor
    }

    /// Class damage multiplier (or its override).
    #[must_use]
    pub fn damage_multiplier(&self) -> f64 {
        self.damage_multiplier
    }

    /// Where the ship is.
    #[must_use]
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Occupied cells, empty while unplaced.
    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        match &self.placement {
            Placement::Unplaced => &[],
            Placement::Placed { coordinates, .. } => coordinates,
        }
    }

    /// Whether the ship is on the board.
    #[must_use]
    pub fn is_placed(&self) -> bool {
        matches!(self.placement, Placement::Placed { .. })
    }

    /// Whether the ship occupies `coordinate`.
    #[must_use]
    pub fn occupies(&self, coordinate: Coordinate) -> bool {
        self.coordinates().contains(&coordinate)
    }

    /// Damage taken so far.
    #[must_use]
    pub fn damage(&self) -> &DamageRecord {
        &self.damage
    }

    /// Whether the ship sank.
    #[must_use]
    pub fn is_sunk(&self) -> bool {
        self.damage.sunk_at.is_some()
    }

    /// When the ship sank.
    #[must_use]
    pub fn sunk_at(&self) -> Option<u64> {
        self.damage.sunk_at
    }

    /// Remaining hit points as a fraction of the maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        f64::from(self.hit_points) / f64::from(self.max_hit_points)
    }

    /// Whether the ship is at or below 25% health.
    #[must_use]
    pub fn is_critically_damaged(&self) -> bool {
        self.health_fraction() <= 0.25
    }

    /// Cells of the vulnerability zone, empty while unplaced.
    #[must_use]
    pub fn vulnerability_zone(&self) -> Vec<Coordinate> {
        let coords = self.coordinates();
        self.class
            .vulnerable_indices(coords.len())
            .into_iter()
            .map(|i| coords[i])
            .collect()
    }

    /// Critical-chance bonus for a hit at `coordinate`.
    #[must_use]
    pub fn vulnerability_bonus_at(&self, coordinate: Coordinate) -> f64 {
        if self.vulnerability_zone().contains(&coordinate) {
            self.class.vulnerability_bonus()
        } else {
            0.0
        }
    }

    /// Abilities.
    #[must_use]
    pub fn abilities(&self) -> &[Ability] {
        &self.abilities
    }

    /// Looks up an ability.
    #[must_use]
    pub fn ability(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.id == id)
    }

    pub(crate) fn ability_mut(&mut self, id: AbilityId) -> Option<&mut Ability> {
        self.abilities.iter_mut().find(|a| a.id == id)
    }

    /// Effects currently in force.
    pub fn active_effects(&self) -> impl Iterator<Item = AbilityEffect> + '_ {
        self.abilities
            .iter()
            .filter(|a| a.is_active())
            .map(Ability::effect)
    }

    pub(crate) fn place(&mut self, origin: Coordinate, orientation: Orientation, coordinates: Vec<Coordinate>) {
        self.placement = Placement::Placed {
            origin,
            orientation,
            coordinates,
        };
    }

    pub(crate) fn unplace(&mut self) {
        self.placement = Placement::Unplaced;
    }

    /// Applies `amount` damage from a hit at `coordinate`.
    ///
    /// A sunk ship takes no further damage.
    pub(crate) fn apply_damage(&mut self, coordinate: Coordinate, amount: u32, now_ms: u64) -> ShipDamage {
        if self.is_sunk() {
            return ShipDamage {
                hit_points_lost: 0,
                sunk: false,
            };
        }
        if !self.damage.hits.contains(&coordinate) {
            self.damage.hits.push(coordinate);
        }
        self.damage.total_hits += 1;

        let before = self.hit_points;
        self.hit_points = self.hit_points.saturating_sub(amount);

        let foundered = {
            let hits = &self.damage.hits;
            let coords = self.coordinates();
            !coords.is_empty() && coords.iter().all(|c| hits.contains(c))
        };
        if foundered {
            self.hit_points = 0;
        }

        let hit_points_lost = before - self.hit_points;
        self.damage.total_damage += hit_points_lost;

        let sunk = self.hit_points == 0;
        if sunk {
            self.sink(now_ms);
        }
        ShipDamage {
            hit_points_lost,
            sunk,
        }
    }

    fn sink(&mut self, now_ms: u64) {
        self.damage.sunk_at = Some(now_ms);
        for ability in &mut self.abilities {
            ability.disable();
        }
    }

    /// Advances ability durations and cooldowns by one owner turn.
    pub(crate) fn tick_abilities(&mut self) {
        for ability in &mut self.abilities {
            ability.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(spec: &ShipSpec, origin: Coordinate, orientation: Orientation) -> Ship {
        let mut ship = Ship::from_spec(spec).unwrap();
        let coords = (0..i32::from(spec.size))
            .filter_map(|i| origin.step(orientation, i))
            .collect();
        ship.place(origin, orientation, coords);
        ship
    }

    mod spec_tests {
        use super::*;

        #[test]
        fn class_defaults_apply() {
            let ship = Ship::from_spec(&ShipSpec::new(1, "Hood", ShipClass::Battleship, 4)).unwrap();
            assert_eq!(ship.armor(), 2);
            assert_eq!(ship.max_hit_points(), 4);
            assert!((ship.damage_multiplier() - 1.2).abs() < f64::EPSILON);
            assert!(!ship.is_placed());
            assert!(ship.coordinates().is_empty());
        }

        #[test]
        fn overrides_win() {
            let spec = ShipSpec::new(1, "Ark", ShipClass::Carrier, 5)
                .with_armor(0)
                .with_hit_points(9)
                .with_damage_multiplier(2.0);
            let ship = Ship::from_spec(&spec).unwrap();
            assert_eq!(ship.armor(), 0);
            assert_eq!(ship.hit_points(), 9);
            assert!((ship.damage_multiplier() - 2.0).abs() < f64::EPSILON);
        }

        #[test]
        fn rejects_bad_specs() {
            assert!(Ship::from_spec(&ShipSpec::new(1, "x", ShipClass::Cruiser, 0)).is_err());
            assert!(
                Ship::from_spec(&ShipSpec::new(1, "x", ShipClass::Cruiser, 3).with_hit_points(0))
                    .is_err()
            );
            let dup = ShipSpec::new(1, "x", ShipClass::Cruiser, 3)
                .with_ability(AbilitySpec::new(1, "a", AbilityEffect::EVASION))
                .with_ability(AbilitySpec::new(1, "b", AbilityEffect::DAMAGE_BOOST));
            assert!(matches!(Ship::from_spec(&dup), Err(EngineError::InvalidFleet(_))));
        }
    }

    mod zone_tests {
        use super::*;

        #[test]
        fn zones_follow_class() {
            let origin = Coordinate::new(0, 0);
            let carrier = placed(&ShipSpec::new(1, "c", ShipClass::Carrier, 5), origin, Orientation::Horizontal);
            assert_eq!(carrier.vulnerability_zone(), vec![Coordinate::new(2, 0)]);

            let battleship = placed(&ShipSpec::new(2, "b", ShipClass::Battleship, 4), origin, Orientation::Vertical);
            assert_eq!(battleship.vulnerability_zone(), vec![Coordinate::new(0, 0)]);

            let destroyer = placed(&ShipSpec::new(3, "d", ShipClass::Destroyer, 2), origin, Orientation::Horizontal);
            assert_eq!(destroyer.vulnerability_zone(), vec![Coordinate::new(1, 0)]);

            let sub = placed(&ShipSpec::new(4, "s", ShipClass::Submarine, 3), origin, Orientation::Horizontal);
            assert_eq!(sub.vulnerability_zone().len(), 3);
            assert!((sub.vulnerability_bonus_at(Coordinate::new(1, 0)) - 0.20).abs() < 1e-12);
            assert!(sub.vulnerability_bonus_at(Coordinate::new(5, 5)).abs() < 1e-12);
        }
    }

    mod damage_tests {
        use super::*;

        #[test]
        fn damage_is_monotonic_and_saturates() {
            let spec = ShipSpec::new(1, "c", ShipClass::Carrier, 5).with_hit_points(3);
            let mut ship = placed(&spec, Coordinate::new(0, 0), Orientation::Horizontal);
            let hit = ship.apply_damage(Coordinate::new(0, 0), 2, 10);
            assert_eq!(hit.hit_points_lost, 2);
            assert!(!hit.sunk);
            let hit = ship.apply_damage(Coordinate::new(1, 0), 5, 20);
            assert_eq!(hit.hit_points_lost, 1);
            assert!(hit.sunk);
            assert_eq!(ship.hit_points(), 0);
            assert_eq!(ship.sunk_at(), Some(20));

            let after = ship.apply_damage(Coordinate::new(2, 0), 5, 30);
            assert_eq!(after.hit_points_lost, 0);
            assert_eq!(ship.sunk_at(), Some(20));
        }

        #[test]
        fn founders_when_every_cell_hit() {
            let spec = ShipSpec::new(1, "d", ShipClass::Destroyer, 2).with_hit_points(10);
            let mut ship = placed(&spec, Coordinate::new(3, 3), Orientation::Vertical);
            ship.apply_damage(Coordinate::new(3, 3), 1, 1);
            assert!(!ship.is_sunk());
            let last = ship.apply_damage(Coordinate::new(3, 4), 1, 2);
            assert!(last.sunk);
            assert_eq!(last.hit_points_lost, 9);
            assert_eq!(ship.hit_points(), 0);
            assert_eq!(ship.damage().hits.len(), 2);
        }

        #[test]
        fn sinking_disables_abilities() {
            let spec = ShipSpec::new(1, "s", ShipClass::Submarine, 1)
                .with_ability(AbilitySpec::new(7, "dive", AbilityEffect::EVASION).with_duration(3));
            let mut ship = placed(&spec, Coordinate::new(0, 0), Orientation::Horizontal);
            ship.ability_mut(AbilityId::new(7)).unwrap().activate();
            assert_eq!(ship.active_effects().count(), 1);

            ship.apply_damage(Coordinate::new(0, 0), 1, 5);
            let ability = ship.ability(AbilityId::new(7)).unwrap();
            assert!(ability.is_disabled());
            assert!(!ability.is_active());
            assert_eq!(ability.check_ready(), Err(ErrorCode::AbilityDisabled));
        }
    }

    mod ability_tests {
        use super::*;

        #[test]
        fn cooldown_and_duration_tick() {
            let spec = AbilitySpec::new(1, "shield", AbilityEffect::Shield { reduction: 2 })
                .with_cooldown(2)
                .with_duration(1);
            let mut ability = Ability::from_spec(&spec);
            assert_eq!(ability.check_ready(), Ok(()));

            ability.activate();
            assert!(ability.is_active());
            assert_eq!(ability.check_ready(), Err(ErrorCode::AbilityOnCooldown));

            ability.tick();
            assert!(!ability.is_active());
            assert_eq!(ability.cooldown_remaining(), 1);
            ability.tick();
            assert_eq!(ability.check_ready(), Ok(()));
        }

        #[test]
        fn uses_run_out() {
            let spec = AbilitySpec::new(1, "power", AbilityEffect::DAMAGE_BOOST).with_uses(1);
            let mut ability = Ability::from_spec(&spec);
            ability.activate();
            ability.tick();
            assert_eq!(ability.uses_remaining(), Some(0));
            assert_eq!(ability.check_ready(), Err(ErrorCode::AbilityExhausted));
        }

        #[test]
        fn effect_roles() {
            assert!(AbilityEffect::Shield { reduction: 1 }.is_defensive());
            assert!(AbilityEffect::EVASION.is_defensive());
            assert!(AbilityEffect::DAMAGE_BOOST.is_offensive());
            assert!(AbilityEffect::CriticalBoost { bonus: 0.1 }.is_offensive());
        }

        #[test]
        fn effect_json_is_tagged() {
            let json = serde_json::to_value(AbilityEffect::Shield { reduction: 2 }).unwrap();
            assert_eq!(json, serde_json::json!({"effect": "shield", "reduction": 2}));
        }
    }
}
