//! Time spent in the active state

use crate::character::context::CharacterContext;
use crate::character::events::Pose;
use crate::character::summary::CharacterStateSummary;
use super::SimEnv;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationTimeComponent;

impl AnimationTimeComponent {
    pub fn simulate(&self, env: &SimEnv<'_>, summary: &mut CharacterStateSummary) {
        summary.state_time += env.dt;
    }

    pub fn update_context(
        &self,
        env: &SimEnv<'_>,
        summary: &CharacterStateSummary,
        context: &mut CharacterContext,
    ) {
        context.normalized_time = normalized(summary.state_time, env.behavior.length);
    }

    pub fn on_state_changed(&self, summary: &mut CharacterStateSummary) {
        summary.state_time = 0.0;
    }

    pub fn apply_state(&self, env: &SimEnv<'_>, summary: &CharacterStateSummary, pose: &mut Pose) {
        pose.state = summary.state_hash;
        pose.normalized_time = normalized(summary.state_time, env.behavior.length);
    }

    pub fn reset_state(&self, summary: &mut CharacterStateSummary) {
        summary.state_time = 0.0;
    }
}

fn normalized(state_time: f32, length: f32) -> f32 {
    if length > 0.0 {
        state_time / length
    } else {
        0.0
    }
}
