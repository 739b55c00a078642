//! Damage accumulation

use crate::character::events::Pose;
use crate::character::summary::CharacterStateSummary;
use super::{HitEvent, SimEnv};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageComponent;

impl DamageComponent {
    /// Keep the accumulator inside `[0, max_damage]`
    pub fn simulate(&self, env: &SimEnv<'_>, summary: &mut CharacterStateSummary) {
        summary.damage = clamp_damage(summary.damage, env.profile.max_damage);
    }

    pub fn receive_hit(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        hit: &HitEvent,
        absorbed: bool,
    ) {
        if absorbed {
            return;
        }
        summary.damage = clamp_damage(summary.damage + hit.damage, env.profile.max_damage);
    }

    pub fn apply_state(&self, summary: &CharacterStateSummary, pose: &mut Pose) {
        pose.damage = summary.damage;
    }

    pub fn reset_state(&self, summary: &mut CharacterStateSummary) {
        summary.damage = 0.0;
    }
}

fn clamp_damage(damage: f32, max: f32) -> f32 {
    if damage.is_finite() {
        damage.clamp(0.0, max)
    } else {
        0.0
    }
}
