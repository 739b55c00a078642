//! Gravity, integration and stage collision

use crate::input::{Direction, InputContext};
use crate::util::Vec2;

use crate::character::context::CharacterContext;
use crate::character::events::{Pose, SimEvent, SimEvents};
use crate::character::summary::CharacterStateSummary;
use super::SimEnv;

/// Integrates the intent left by movement and resolves ground/ledge contact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsComponent;

impl PhysicsComponent {
    pub fn simulate(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        input: &InputContext,
        events: &mut SimEvents,
    ) {
        if summary.ledge.is_some() {
            summary.velocity = Vec2::ZERO;
            return;
        }

        let profile = env.profile;
        let stage = env.stage;
        let dt = env.dt;

        summary.velocity += summary.acceleration * dt;

        if !summary.is_grounded {
            if summary.is_fast_falling {
                summary.velocity.y = -profile.fast_fall_speed;
            } else {
                summary.velocity.y =
                    (summary.velocity.y - profile.gravity * dt).max(-profile.max_fall_speed);
            }
        }

        let previous_y = summary.position.y;
        summary.position += summary.velocity * dt;

        if summary.is_grounded {
            if summary.velocity.y > 0.0 {
                // Jump or launch
                summary.is_grounded = false;
            } else if !stage.is_over_ground(summary.position.x) {
                // Walked off the edge
                summary.is_grounded = false;
                summary.velocity.y = 0.0;
            } else {
                summary.position.y = stage.ground_height;
                summary.velocity.y = 0.0;
            }
            return;
        }

        if previous_y >= stage.ground_height
            && summary.position.y <= stage.ground_height
            && stage.is_over_ground(summary.position.x)
        {
            summary.position.y = stage.ground_height;
            summary.velocity.y = 0.0;
            summary.is_grounded = true;
            summary.is_fast_falling = false;
            summary.jump_count = profile.max_jump_count();
            events.push(SimEvent::Landed);
            return;
        }

        let can_grab = summary.velocity.y <= 0.0
            && summary.hitstun == 0
            && input.movement.direction != Direction::Down;
        if can_grab {
            if let Some(ledge) = stage.grabbable_ledge(summary.position, profile.ledge_grab_radius)
            {
                summary.ledge = Some(ledge.id);
                summary.position = ledge.position;
                summary.velocity = Vec2::ZERO;
                summary.acceleration = Vec2::ZERO;
                summary.direction = ledge.facing_right;
                summary.is_fast_falling = false;
                summary.jump_count = profile.max_jump_count();
                events.push(SimEvent::LedgeGrabbed { ledge: ledge.id });
            }
        }
    }

    pub fn update_context(&self, summary: &CharacterStateSummary, context: &mut CharacterContext) {
        context.is_grounded = summary.is_grounded;
        context.rising = summary.velocity.y > 0.0;
        context.is_grabbing_ledge = summary.ledge.is_some();
    }

    pub fn apply_state(&self, summary: &CharacterStateSummary, pose: &mut Pose) {
        pose.position = summary.position;
    }

    pub fn reset_state(&self, env: &SimEnv<'_>, summary: &mut CharacterStateSummary) {
        summary.position = env.stage.spawn_point;
        summary.velocity = Vec2::ZERO;
        summary.is_grounded = true;
    }
}
