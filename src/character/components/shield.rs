//! Shield depletion, regeneration and hit absorption

use crate::character::context::CharacterContext;
use crate::character::events::{Pose, SimEvent, SimEvents};
use crate::character::summary::CharacterStateSummary;
use super::{HitEvent, SimEnv};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShieldComponent;

impl ShieldComponent {
    pub fn simulate(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        events: &mut SimEvents,
    ) {
        let profile = env.profile;
        let before = summary.shield_health;
        let rate = if env.behavior.shielding {
            -profile.shield_depletion
        } else {
            profile.shield_regen
        };
        summary.shield_health = clamp_shield(before + rate * env.dt, profile.max_shield);
        if before > 0.0 && summary.shield_health <= 0.0 {
            events.push(SimEvent::ShieldBroken);
        }
    }

    pub fn update_context(&self, summary: &CharacterStateSummary, context: &mut CharacterContext) {
        context.shield_broken = summary.shield_health <= 0.0;
    }

    /// Whether a hit landing now is absorbed instead of dealing damage
    pub fn absorbs(&self, env: &SimEnv<'_>, summary: &CharacterStateSummary) -> bool {
        env.behavior.shielding && summary.shield_health > 0.0
    }

    pub fn receive_hit(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        hit: &HitEvent,
        absorbed: bool,
    ) {
        if absorbed {
            summary.shield_health =
                clamp_shield(summary.shield_health - hit.damage, env.profile.max_shield);
        }
    }

    pub fn apply_state(&self, summary: &CharacterStateSummary, pose: &mut Pose) {
        pose.shield_health = summary.shield_health;
    }

    pub fn reset_state(&self, env: &SimEnv<'_>, summary: &mut CharacterStateSummary) {
        summary.shield_health = env.profile.max_shield;
    }
}

fn clamp_shield(health: f32, max: f32) -> f32 {
    if health.is_finite() {
        health.clamp(0.0, max)
    } else {
        0.0
    }
}
