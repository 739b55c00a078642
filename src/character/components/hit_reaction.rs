//! Hitstun countdown and knockback

use crate::character::context::CharacterContext;
use crate::character::events::{Pose, SimEvent, SimEvents};
use crate::character::summary::CharacterStateSummary;
use crate::util::Vec2;

use super::HitEvent;

/// Accumulated damage at which knockback is doubled
const KNOCKBACK_DAMAGE_SCALE: f32 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitReactionComponent;

impl HitReactionComponent {
    pub fn simulate(&self, summary: &mut CharacterStateSummary, events: &mut SimEvents) {
        if summary.hitstun > 0 {
            summary.hitstun -= 1;
            if summary.hitstun == 0 {
                events.push(SimEvent::HitstunEnded);
            }
        }
    }

    pub fn update_context(&self, summary: &CharacterStateSummary, context: &mut CharacterContext) {
        context.is_hit = summary.hitstun > 0;
    }

    /// Runs after damage, so knockback scales with the updated total
    pub fn receive_hit(&self, summary: &mut CharacterStateSummary, hit: &HitEvent, absorbed: bool) {
        if absorbed {
            return;
        }
        summary.hitstun = summary.hitstun.max(hit.hitstun);
        summary.velocity = hit.knockback * (1.0 + summary.damage / KNOCKBACK_DAMAGE_SCALE);
        summary.acceleration = Vec2::ZERO;
        summary.ledge = None;
        summary.is_fast_falling = false;
        if summary.velocity.y > 0.0 {
            summary.is_grounded = false;
        }
    }

    pub fn apply_state(&self, summary: &CharacterStateSummary, pose: &mut Pose) {
        pose.in_hitstun = summary.hitstun > 0;
    }

    pub fn reset_state(&self, summary: &mut CharacterStateSummary) {
        summary.hitstun = 0;
    }
}
