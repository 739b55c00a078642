//! Horizontal intent, facing, jumps and fast-fall

use crate::input::{Direction, InputContext};
use crate::util::Vec2;

use crate::character::context::CharacterContext;
use crate::character::events::{Pose, SimEvent, SimEvents};
use crate::character::states::MovementKind;
use crate::character::summary::CharacterStateSummary;
use super::SimEnv;

/// Offset applied when letting go of a ledge (outwards, downwards)
const LEDGE_RELEASE_OFFSET: Vec2 = Vec2::new(1.5, -1.0);

/// Converts input into velocity/acceleration intent for the physics step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementComponent;

impl MovementComponent {
    pub fn simulate(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        input: &InputContext,
        events: &mut SimEvents,
    ) {
        summary.jump_count = summary.jump_count.min(env.profile.max_jump_count());
        if summary.ledge.is_some() {
            self.simulate_ledge(env, summary, input, events);
            return;
        }

        if env.behavior.allows_jump && input.jump.was_pressed() {
            Self::jump(env, summary, events);
        }

        let profile = env.profile;
        let stick_x = input.movement.value.x;
        let accel_x = match env.behavior.movement {
            MovementKind::Walk => {
                summary.velocity.x = stick_x * profile.walk_speed;
                0.0
            }
            MovementKind::Run => {
                let sign = if stick_x != 0.0 {
                    stick_x.signum()
                } else if summary.direction {
                    1.0
                } else {
                    -1.0
                };
                summary.velocity.x = sign * profile.run_speed;
                0.0
            }
            MovementKind::Air => approach(
                summary.velocity.x,
                stick_x * profile.air_speed,
                profile.air_acceleration,
                env.dt,
            ),
            MovementKind::Stationary if summary.is_grounded => {
                approach(summary.velocity.x, 0.0, profile.ground_friction, env.dt)
            }
            MovementKind::Stationary | MovementKind::None => 0.0,
        };
        summary.acceleration = Vec2::new(accel_x, 0.0);

        if summary.is_grounded && !env.behavior.locks_direction {
            match input.movement.direction {
                Direction::Left => summary.direction = false,
                Direction::Right => summary.direction = true,
                _ => {}
            }
        }

        if !summary.is_grounded
            && !summary.is_fast_falling
            && summary.velocity.y <= 0.0
            && input.movement.entered(Direction::Down)
        {
            summary.is_fast_falling = true;
        }
    }

    fn simulate_ledge(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        input: &InputContext,
        events: &mut SimEvents,
    ) {
        summary.acceleration = Vec2::ZERO;
        let Some(id) = summary.ledge else {
            return;
        };
        let Some(ledge) = env.stage.ledge(id) else {
            // Ledge missing from this stage's registry: let go.
            summary.ledge = None;
            events.push(SimEvent::LedgeReleased { ledge: id });
            return;
        };

        if input.jump.was_pressed() {
            summary.ledge = None;
            events.push(SimEvent::LedgeReleased { ledge: id });
            Self::jump(env, summary, events);
        } else if input.movement.entered(Direction::Down) {
            let outward = if ledge.facing_right { -1.0 } else { 1.0 };
            summary.ledge = None;
            summary.position += Vec2::new(
                LEDGE_RELEASE_OFFSET.x * outward,
                LEDGE_RELEASE_OFFSET.y,
            );
            events.push(SimEvent::LedgeReleased { ledge: id });
        }
    }

    fn jump(env: &SimEnv<'_>, summary: &mut CharacterStateSummary, events: &mut SimEvents) {
        if summary.jump_count == 0 {
            return;
        }
        let Some(power) = env.profile.jump_power_for(summary.jump_count) else {
            return;
        };
        summary.velocity.y = power;
        summary.jump_count -= 1;
        summary.is_fast_falling = false;
        events.push(SimEvent::Jumped {
            remaining: summary.jump_count,
        });
    }

    pub fn update_context(&self, summary: &CharacterStateSummary, context: &mut CharacterContext) {
        context.direction = summary.direction;
        context.can_jump = summary.jump_count > 0;
    }

    pub fn apply_state(&self, summary: &CharacterStateSummary, pose: &mut Pose) {
        pose.facing_right = summary.direction;
    }

    pub fn reset_state(&self, env: &SimEnv<'_>, summary: &mut CharacterStateSummary) {
        summary.jump_count = env.profile.max_jump_count();
        summary.is_fast_falling = false;
        summary.ledge = None;
        summary.direction = true;
        summary.acceleration = Vec2::ZERO;
    }
}

/// Acceleration that moves `current` towards `target` within one step,
/// capped at `max_accel`
fn approach(current: f32, target: f32, max_accel: f32, dt: f32) -> f32 {
    if dt <= 0.0 || current == target {
        return 0.0;
    }
    ((target - current) / dt).clamp(-max_accel, max_accel)
}
