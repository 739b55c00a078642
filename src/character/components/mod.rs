//! Simulation components
//!
//! Each component is a stateless behavior that mutates the externally owned
//! [`CharacterStateSummary`]. They are dispatched through
//! [`SimulationComponent`] in the fixed order of [`STANDARD_COMPONENTS`]:
//! later components consume the intent written by earlier ones.

mod animation;
mod damage;
mod hit_reaction;
mod movement;
mod physics;
mod shield;

pub use animation::AnimationTimeComponent;
pub use damage::DamageComponent;
pub use hit_reaction::HitReactionComponent;
pub use movement::MovementComponent;
pub use physics::PhysicsComponent;
pub use shield::ShieldComponent;

use serde::{Deserialize, Serialize};

use crate::fsm::StateChange;
use crate::input::InputContext;
use crate::util::Vec2;

use super::context::CharacterContext;
use super::events::{Pose, SimEvents};
use super::profile::CharacterProfile;
use super::stage::Stage;
use super::states::StateBehavior;
use super::summary::CharacterStateSummary;

/// Static inputs shared by every component for one call
#[derive(Debug, Clone, Copy)]
pub struct SimEnv<'a> {
    /// Fixed tick interval in seconds
    pub dt: f32,
    pub profile: &'a CharacterProfile,
    pub stage: &'a Stage,
    /// Data of the state active while the call runs
    pub behavior: StateBehavior,
}

/// A hit landing on a character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    pub damage: f32,
    /// Launch velocity before damage scaling
    pub knockback: Vec2,
    /// Stun duration in ticks
    pub hitstun: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationComponent {
    Movement(MovementComponent),
    Physics(PhysicsComponent),
    Damage(DamageComponent),
    HitReaction(HitReactionComponent),
    Shield(ShieldComponent),
    AnimationTime(AnimationTimeComponent),
}

/// Registration order used by every character
pub const STANDARD_COMPONENTS: [SimulationComponent; 6] = [
    SimulationComponent::Movement(MovementComponent),
    SimulationComponent::Physics(PhysicsComponent),
    SimulationComponent::Damage(DamageComponent),
    SimulationComponent::HitReaction(HitReactionComponent),
    SimulationComponent::Shield(ShieldComponent),
    SimulationComponent::AnimationTime(AnimationTimeComponent),
];

impl SimulationComponent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Movement(_) => "movement",
            Self::Physics(_) => "physics",
            Self::Damage(_) => "damage",
            Self::HitReaction(_) => "hit_reaction",
            Self::Shield(_) => "shield",
            Self::AnimationTime(_) => "animation_time",
        }
    }

    /// Advance this component's share of the summary by one tick
    pub fn simulate(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        input: &InputContext,
        events: &mut SimEvents,
    ) {
        match self {
            Self::Movement(c) => c.simulate(env, summary, input, events),
            Self::Physics(c) => c.simulate(env, summary, input, events),
            Self::Damage(c) => c.simulate(env, summary),
            Self::HitReaction(c) => c.simulate(summary, events),
            Self::Shield(c) => c.simulate(env, summary, events),
            Self::AnimationTime(c) => c.simulate(env, summary),
        }
    }

    /// Publish the facts transitions read
    pub fn update_context(
        &self,
        env: &SimEnv<'_>,
        summary: &CharacterStateSummary,
        context: &mut CharacterContext,
    ) {
        match self {
            Self::Movement(c) => c.update_context(summary, context),
            Self::Physics(c) => c.update_context(summary, context),
            Self::Damage(_) => {}
            Self::HitReaction(c) => c.update_context(summary, context),
            Self::Shield(c) => c.update_context(summary, context),
            Self::AnimationTime(c) => c.update_context(env, summary, context),
        }
    }

    pub fn on_state_changed(&self, summary: &mut CharacterStateSummary, _change: StateChange) {
        if let Self::AnimationTime(c) = self {
            c.on_state_changed(summary);
        }
    }

    /// Write observable effects for presentation
    pub fn apply_state(&self, env: &SimEnv<'_>, summary: &CharacterStateSummary, pose: &mut Pose) {
        match self {
            Self::Movement(c) => c.apply_state(summary, pose),
            Self::Physics(c) => c.apply_state(summary, pose),
            Self::Damage(c) => c.apply_state(summary, pose),
            Self::HitReaction(c) => c.apply_state(summary, pose),
            Self::Shield(c) => c.apply_state(summary, pose),
            Self::AnimationTime(c) => c.apply_state(env, summary, pose),
        }
    }

    /// Restore spawn values for this component's fields
    pub fn reset_state(&self, env: &SimEnv<'_>, summary: &mut CharacterStateSummary) {
        match self {
            Self::Movement(c) => c.reset_state(env, summary),
            Self::Physics(c) => c.reset_state(env, summary),
            Self::Damage(c) => c.reset_state(summary),
            Self::HitReaction(c) => c.reset_state(summary),
            Self::Shield(c) => c.reset_state(env, summary),
            Self::AnimationTime(c) => c.reset_state(summary),
        }
    }

    /// Whether this component turns a landing hit into shield damage
    pub fn absorbs(&self, env: &SimEnv<'_>, summary: &CharacterStateSummary) -> bool {
        match self {
            Self::Shield(c) => c.absorbs(env, summary),
            _ => false,
        }
    }

    pub fn receive_hit(
        &self,
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        hit: &HitEvent,
        absorbed: bool,
    ) {
        match self {
            Self::Damage(c) => c.receive_hit(env, summary, hit, absorbed),
            Self::HitReaction(c) => c.receive_hit(summary, hit, absorbed),
            Self::Shield(c) => c.receive_hit(env, summary, hit, absorbed),
            Self::Movement(_) | Self::Physics(_) | Self::AnimationTime(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::events::SimEvent;
    use crate::character::states::MovementKind;
    use crate::fsm::StateId;
    use crate::input::InputSlice;

    const DT: f32 = 1.0 / 60.0;

    fn behavior(movement: MovementKind) -> StateBehavior {
        StateBehavior {
            movement,
            allows_jump: true,
            shielding: false,
            locks_direction: false,
            length: 0.0,
        }
    }

    fn grounded(profile: &CharacterProfile) -> CharacterStateSummary {
        CharacterStateSummary::spawn(
            Vec2::ZERO,
            StateId::of("idle"),
            profile.max_jump_count(),
            profile.max_shield,
        )
    }

    fn run_all(
        env: &SimEnv<'_>,
        summary: &mut CharacterStateSummary,
        input: &InputContext,
        events: &mut SimEvents,
    ) {
        for component in STANDARD_COMPONENTS {
            component.simulate(env, summary, input, events);
        }
    }

    #[test]
    fn registration_order_is_fixed() {
        let names: Vec<_> = STANDARD_COMPONENTS.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            ["movement", "physics", "damage", "hit_reaction", "shield", "animation_time"]
        );
    }

    #[test]
    fn grounded_jump_uses_first_jump_power() {
        let profile = CharacterProfile::vanguard();
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: behavior(MovementKind::Stationary),
        };
        let mut summary = grounded(&profile);
        let jump = InputSlice {
            jump: true,
            ..InputSlice::NEUTRAL
        };
        let input = InputContext::new(&InputSlice::NEUTRAL, &jump);
        let mut events = SimEvents::new();
        run_all(&env, &mut summary, &input, &mut events);

        assert_eq!(summary.velocity.y, 22.0);
        assert_eq!(summary.jump_count, 1);
        assert!(!summary.is_grounded);
        assert!(events.iter().any(|e| *e == SimEvent::Jumped { remaining: 1 }));
    }

    #[test]
    fn airborne_character_lands_and_restores_jumps() {
        let profile = CharacterProfile::vanguard();
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: behavior(MovementKind::Air),
        };
        let mut summary = grounded(&profile);
        summary.is_grounded = false;
        summary.position = Vec2::new(0.0, 0.1);
        summary.velocity = Vec2::new(0.0, -10.0);
        summary.jump_count = 0;
        let input = InputContext::default();
        let mut events = SimEvents::new();
        run_all(&env, &mut summary, &input, &mut events);

        assert!(summary.is_grounded);
        assert_eq!(summary.position.y, 0.0);
        assert_eq!(summary.jump_count, 2);
        assert!(events.iter().any(|e| *e == SimEvent::Landed));
    }

    #[test]
    fn falling_near_a_ledge_grabs_it() {
        let profile = CharacterProfile::vanguard();
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: behavior(MovementKind::Air),
        };
        let mut summary = grounded(&profile);
        summary.is_grounded = false;
        summary.position = Vec2::new(61.5, -1.0);
        summary.velocity = Vec2::new(0.0, -5.0);
        let mut events = SimEvents::new();
        run_all(&env, &mut summary, &InputContext::default(), &mut events);

        let ledge = stage.ledge(crate::character::stage::LedgeId(1)).map(|l| l.position);
        assert_eq!(summary.ledge, Some(crate::character::stage::LedgeId(1)));
        assert_eq!(Some(summary.position), ledge);
        assert_eq!(summary.velocity, Vec2::ZERO);
        assert!(!summary.direction);
    }

    #[test]
    fn fast_fall_triggers_on_down_edge() {
        let profile = CharacterProfile::vanguard();
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: behavior(MovementKind::Air),
        };
        let mut summary = grounded(&profile);
        summary.is_grounded = false;
        summary.position = Vec2::new(0.0, 20.0);
        summary.velocity = Vec2::new(0.0, -1.0);
        let down = InputSlice {
            movement: Vec2::new(0.0, -1.0),
            ..InputSlice::NEUTRAL
        };
        let input = InputContext::new(&InputSlice::NEUTRAL, &down);
        let mut events = SimEvents::new();
        run_all(&env, &mut summary, &input, &mut events);

        assert!(summary.is_fast_falling);
        assert_eq!(summary.velocity.y, -profile.fast_fall_speed);
    }

    #[test]
    fn hitstun_counts_down_and_reports_end() {
        let profile = CharacterProfile::vanguard();
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: behavior(MovementKind::None),
        };
        let mut summary = grounded(&profile);
        summary.hitstun = 2;
        let mut events = SimEvents::new();
        run_all(&env, &mut summary, &InputContext::default(), &mut events);
        assert_eq!(summary.hitstun, 1);
        assert!(!events.iter().any(|e| *e == SimEvent::HitstunEnded));
        run_all(&env, &mut summary, &InputContext::default(), &mut events);
        assert_eq!(summary.hitstun, 0);
        assert!(events.iter().any(|e| *e == SimEvent::HitstunEnded));
    }

    #[test]
    fn shield_depletes_and_breaks() {
        let mut profile = CharacterProfile::vanguard();
        profile.max_shield = 0.2;
        profile.shield_depletion = 15.0;
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: StateBehavior {
                shielding: true,
                ..behavior(MovementKind::Stationary)
            },
        };
        let mut summary = grounded(&profile);
        let mut events = SimEvents::new();
        run_all(&env, &mut summary, &InputContext::default(), &mut events);
        assert_eq!(summary.shield_health, 0.0);
        assert!(events.iter().any(|e| *e == SimEvent::ShieldBroken));

        let mut context = CharacterContext::default();
        for component in STANDARD_COMPONENTS {
            component.update_context(&env, &summary, &mut context);
        }
        assert!(context.shield_broken);
    }

    #[test]
    fn hit_scales_knockback_with_damage() {
        let profile = CharacterProfile::vanguard();
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: behavior(MovementKind::Stationary),
        };
        let mut summary = grounded(&profile);
        summary.damage = 90.0;
        let hit = HitEvent {
            damage: 10.0,
            knockback: Vec2::new(5.0, 10.0),
            hitstun: 20,
        };
        for component in STANDARD_COMPONENTS {
            component.receive_hit(&env, &mut summary, &hit, false);
        }
        assert_eq!(summary.damage, 100.0);
        assert_eq!(summary.hitstun, 20);
        assert_eq!(summary.velocity, Vec2::new(10.0, 20.0));
        assert!(!summary.is_grounded);
    }

    #[test]
    fn absorbed_hit_only_costs_shield() {
        let profile = CharacterProfile::vanguard();
        let stage = Stage::battlefield();
        let env = SimEnv {
            dt: DT,
            profile: &profile,
            stage: &stage,
            behavior: behavior(MovementKind::Stationary),
        };
        let mut summary = grounded(&profile);
        let hit = HitEvent {
            damage: 12.0,
            knockback: Vec2::new(5.0, 10.0),
            hitstun: 20,
        };
        for component in STANDARD_COMPONENTS {
            component.receive_hit(&env, &mut summary, &hit, true);
        }
        assert_eq!(summary.damage, 0.0);
        assert_eq!(summary.hitstun, 0);
        assert_eq!(summary.shield_health, profile.max_shield - 12.0);
        assert!(summary.is_grounded);
    }
}
