//! Complete per-tick snapshot of one character

use serde::{Deserialize, Serialize};

use crate::fsm::StateId;
use crate::util::Vec2;

use super::stage::LedgeId;

/// Everything the simulation knows about a character at one tick.
///
/// Plain `Copy` value: it is what the server publishes, what reconciliation
/// resumes from, and what two peers compare for convergence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterStateSummary {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Facing right when true
    pub direction: bool,
    pub is_fast_falling: bool,
    /// Ledge currently held, resolved through the stage registry
    pub ledge: Option<LedgeId>,
    /// Jumps left, within `[0, max_jump_count]`
    pub jump_count: u32,
    pub is_grounded: bool,
    /// Hash of the active state's name
    pub state_hash: StateId,
    /// Seconds spent in the active state
    pub state_time: f32,
    /// Accumulated damage, within `[0, max_damage]`
    pub damage: f32,
    /// Remaining hitstun in ticks
    pub hitstun: u32,
    /// Within `[0, max_shield]`
    pub shield_health: f32,
}

impl CharacterStateSummary {
    /// Fresh grounded character standing at `position`
    pub fn spawn(
        position: Vec2,
        state_hash: StateId,
        max_jump_count: u32,
        max_shield: f32,
    ) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            direction: true,
            is_fast_falling: false,
            ledge: None,
            jump_count: max_jump_count,
            is_grounded: true,
            state_hash,
            state_time: 0.0,
            damage: 0.0,
            hitstun: 0,
            shield_health: max_shield,
        }
    }

    /// Whether every float field is finite
    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite()
            && self.position.y.is_finite()
            && self.velocity.x.is_finite()
            && self.velocity.y.is_finite()
            && self.acceleration.x.is_finite()
            && self.acceleration.y.is_finite()
            && self.state_time.is_finite()
            && self.damage.is_finite()
            && self.shield_health.is_finite()
    }

    /// Exact equality on the bit patterns of every float.
    ///
    /// Stricter than `==` (distinguishes `0.0` from `-0.0`), used to check
    /// that two peers produced identical results.
    pub fn bit_identical(&self, other: &Self) -> bool {
        fn v(a: Vec2, b: Vec2) -> bool {
            a.x.to_bits() == b.x.to_bits() && a.y.to_bits() == b.y.to_bits()
        }
        v(self.position, other.position)
            && v(self.velocity, other.velocity)
            && v(self.acceleration, other.acceleration)
            && self.direction == other.direction
            && self.is_fast_falling == other.is_fast_falling
            && self.ledge == other.ledge
            && self.jump_count == other.jump_count
            && self.is_grounded == other.is_grounded
            && self.state_hash == other.state_hash
            && self.state_time.to_bits() == other.state_time.to_bits()
            && self.damage.to_bits() == other.damage.to_bits()
            && self.hitstun == other.hitstun
            && self.shield_health.to_bits() == other.shield_health.to_bits()
    }
}
