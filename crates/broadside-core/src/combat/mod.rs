//! # Combat
//!
//! Validation, damage and attack resolution.
//!
//! An action flows through the three parts in order:
//!
//! ```text
//! ProposedAction ──► CombatValidator ──► AttackResolver ──► AttackResult
//!                                           │
//!                                           └─► DamageCalculator
//! ```
//!
//! - [`CombatValidator`] gates the action without touching state
//! - [`AttackResolver`] marks the cell, finds the ship and applies damage
//! - [`DamageCalculator`] turns a hit into a number
//!
//! All three are stateless; randomness comes in through a
//! [`RollSource`](crate::rolls::RollSource).

pub mod damage;
pub mod resolver;
pub mod validator;

pub use damage::{AttackModifiers, DamageBreakdown, DamageCalculator, MIN_DAMAGE};
pub use resolver::{AttackOutcome, AttackResolver, AttackResult, ChainHit};
pub use validator::{CombatValidator, ProposedAction};
