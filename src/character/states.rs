//! The standard character state graph
//!
//! Every character type shares this topology; profiles only tune timeline
//! lengths. Transitions are listed in priority order per state.

use crate::fsm::{EntryPolicy, StateGraph, StateMachineBuilder, StateMachineError, Transition};
use crate::input::Direction;

use super::context::CharacterContext;
use super::profile::CharacterProfile;

pub const IDLE: &str = "idle";
pub const WALK: &str = "walk";
pub const RUN: &str = "run";
pub const JUMP: &str = "jump";
pub const FALL: &str = "fall";
pub const LAND: &str = "land";
pub const SHIELD: &str = "shield";
pub const SHIELD_BREAK: &str = "shield_break";
pub const ATTACK: &str = "attack";
pub const HITSTUN: &str = "hitstun";
pub const LEDGE_GRAB: &str = "ledge_grab";

/// Horizontal stick magnitude at which walking becomes running
pub const RUN_THRESHOLD: f32 = 0.8;

/// How the movement component treats horizontal input in a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    /// Grounded, decelerates with friction
    Stationary,
    Walk,
    Run,
    /// Air drift towards the stick
    Air,
    /// Keeps current velocity (knockback, ledge hang)
    None,
}

/// Per-state behavior consumed by the simulation components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateBehavior {
    pub movement: MovementKind,
    pub allows_jump: bool,
    pub shielding: bool,
    pub locks_direction: bool,
    /// Timeline length in seconds; 0 loops
    pub length: f32,
}

impl StateBehavior {
    const fn new(movement: MovementKind) -> Self {
        Self {
            movement,
            allows_jump: false,
            shielding: false,
            locks_direction: false,
            length: 0.0,
        }
    }

    const fn jumpable(mut self) -> Self {
        self.allows_jump = true;
        self
    }

    const fn locked(mut self) -> Self {
        self.locks_direction = true;
        self
    }

    fn timed(mut self, length: f32) -> Self {
        self.length = length;
        self
    }
}

pub type CharacterStateGraph = StateGraph<StateBehavior, CharacterContext>;

fn horizontal(ctx: &CharacterContext) -> bool {
    matches!(
        ctx.input.movement.direction,
        Direction::Left | Direction::Right
    )
}

fn running(ctx: &CharacterContext) -> bool {
    horizontal(ctx) && ctx.input.movement.value.x.abs() >= RUN_THRESHOLD
}

fn wants_shield(ctx: &CharacterContext) -> bool {
    ctx.is_grounded && ctx.input.shield.is_held() && !ctx.shield_broken
}

fn wants_attack(ctx: &CharacterContext) -> bool {
    ctx.is_grounded && ctx.input.attack.was_pressed()
}

fn shield_broken(ctx: &CharacterContext) -> bool {
    ctx.shield_broken
}

fn shield_released(ctx: &CharacterContext) -> bool {
    !ctx.input.shield.is_held()
}

fn recovered_on_ledge(ctx: &CharacterContext) -> bool {
    !ctx.is_hit && ctx.is_grabbing_ledge
}

fn recovered_grounded(ctx: &CharacterContext) -> bool {
    !ctx.is_hit && ctx.is_grounded
}

fn recovered_airborne(ctx: &CharacterContext) -> bool {
    !ctx.is_hit && ctx.is_airborne()
}

/// Build the shared graph for one character type
pub fn build_state_graph(
    profile: &CharacterProfile,
) -> Result<CharacterStateGraph, StateMachineError> {
    use MovementKind as M;

    let mut b = StateMachineBuilder::new();
    b.add_state(
        IDLE,
        EntryPolicy::Interrupt,
        StateBehavior::new(M::Stationary).jumpable(),
    )
    .add_state(WALK, EntryPolicy::Interrupt, StateBehavior::new(M::Walk).jumpable())
    .add_state(RUN, EntryPolicy::Interrupt, StateBehavior::new(M::Run).jumpable())
    .add_state(JUMP, EntryPolicy::Interrupt, StateBehavior::new(M::Air).jumpable())
    .add_state(FALL, EntryPolicy::Interrupt, StateBehavior::new(M::Air).jumpable())
    .add_state(
        LAND,
        EntryPolicy::Interrupt,
        StateBehavior::new(M::Stationary).timed(profile.state_length(LAND, 0.1)),
    )
    .add_state(
        SHIELD,
        EntryPolicy::Interrupt,
        StateBehavior {
            shielding: true,
            ..StateBehavior::new(M::Stationary).locked()
        },
    )
    .add_state(
        SHIELD_BREAK,
        EntryPolicy::Interrupt,
        StateBehavior::new(M::Stationary)
            .locked()
            .timed(profile.state_length(SHIELD_BREAK, 1.0)),
    )
    .add_state(
        ATTACK,
        EntryPolicy::Queue,
        StateBehavior::new(M::Stationary)
            .locked()
            .timed(profile.state_length(ATTACK, 0.3)),
    )
    .add_state(HITSTUN, EntryPolicy::Interrupt, StateBehavior::new(M::None).locked())
    .add_state(
        LEDGE_GRAB,
        EntryPolicy::Interrupt,
        StateBehavior::new(M::None).jumpable().locked(),
    )
    .default_state(IDLE);

    let hit = || Transition::to(HITSTUN, |c: &CharacterContext| c.is_hit);
    let rise = || Transition::to(JUMP, |c: &CharacterContext| c.is_airborne() && c.rising);
    let drop = || Transition::to(FALL, |c: &CharacterContext| c.is_airborne() && !c.rising);
    let ledge = || Transition::to(LEDGE_GRAB, |c: &CharacterContext| c.is_grabbing_ledge);
    let finished = || Transition::to(IDLE, |c: &CharacterContext| c.is_finished());

    b.add_transition(IDLE, hit())
        .add_transition(IDLE, rise())
        .add_transition(IDLE, drop())
        .add_transition(IDLE, Transition::to(ATTACK, wants_attack))
        .add_transition(IDLE, Transition::to(SHIELD, wants_shield))
        .add_transition(IDLE, Transition::to(RUN, running))
        .add_transition(IDLE, Transition::to(WALK, horizontal));

    b.add_transition(WALK, hit())
        .add_transition(WALK, rise())
        .add_transition(WALK, drop())
        .add_transition(WALK, Transition::to(ATTACK, wants_attack))
        .add_transition(WALK, Transition::to(SHIELD, wants_shield))
        .add_transition(WALK, Transition::to(RUN, running))
        .add_transition(WALK, Transition::to(IDLE, |c: &CharacterContext| !horizontal(c)));

    b.add_transition(RUN, hit())
        .add_transition(RUN, rise())
        .add_transition(RUN, drop())
        .add_transition(RUN, Transition::to(ATTACK, wants_attack))
        .add_transition(RUN, Transition::to(SHIELD, wants_shield))
        .add_transition(RUN, Transition::to(IDLE, |c: &CharacterContext| !horizontal(c)))
        .add_transition(RUN, Transition::to(WALK, |c: &CharacterContext| !running(c)));

    for air in [JUMP, FALL] {
        b.add_transition(air, hit())
            .add_transition(air, ledge())
            .add_transition(air, Transition::to(LAND, |c: &CharacterContext| c.is_grounded));
    }
    b.add_transition(JUMP, drop());
    b.add_transition(FALL, rise());

    b.add_transition(LAND, hit())
        .add_transition(LAND, rise())
        .add_transition(LAND, drop())
        .add_transition(LAND, finished());

    b.add_transition(SHIELD, hit())
        .add_transition(SHIELD, Transition::to(SHIELD_BREAK, shield_broken))
        .add_transition(SHIELD, drop())
        .add_transition(SHIELD, Transition::to(IDLE, shield_released));

    b.add_transition(SHIELD_BREAK, hit())
        .add_transition(SHIELD_BREAK, drop())
        .add_transition(SHIELD_BREAK, finished());

    b.add_transition(ATTACK, hit())
        .add_transition(ATTACK, drop())
        .add_transition(ATTACK, finished());

    b.add_transition(HITSTUN, Transition::to(LEDGE_GRAB, recovered_on_ledge))
        .add_transition(HITSTUN, Transition::to(IDLE, recovered_grounded))
        .add_transition(HITSTUN, Transition::to(FALL, recovered_airborne));

    b.add_transition(LEDGE_GRAB, hit())
        .add_transition(LEDGE_GRAB, rise())
        .add_transition(LEDGE_GRAB, drop());

    b.build_graph()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::{StateId, StateMachine};
    use crate::input::{InputContext, InputSlice};
    use crate::util::Vec2;
    use std::sync::Arc;

    fn machine() -> StateMachine<StateBehavior, CharacterContext> {
        let graph = build_state_graph(&CharacterProfile::vanguard()).unwrap();
        StateMachine::from_graph(Arc::new(graph))
    }

    fn ctx_with(input: InputSlice) -> CharacterContext {
        CharacterContext::new(InputContext::new(&InputSlice::NEUTRAL, &input))
    }

    #[test]
    fn graph_registers_every_state() {
        let m = machine();
        for name in [
            IDLE,
            WALK,
            RUN,
            JUMP,
            FALL,
            LAND,
            SHIELD,
            SHIELD_BREAK,
            ATTACK,
            HITSTUN,
            LEDGE_GRAB,
        ] {
            assert!(m.contains(StateId::of(name)), "{name} missing");
        }
        assert_eq!(m.default_state(), StateId::of(IDLE));
    }

    #[test]
    fn stick_picks_walk_or_run() {
        let mut m = machine();
        let walk = ctx_with(InputSlice {
            movement: Vec2::new(0.5, 0.0),
            ..InputSlice::NEUTRAL
        });
        assert_eq!(m.passthrough(&walk), StateId::of(WALK));

        let run = ctx_with(InputSlice {
            movement: Vec2::new(-1.0, 0.0),
            ..InputSlice::NEUTRAL
        });
        m.update_state(&run);
        assert_eq!(m.current(), StateId::of(RUN));
    }

    #[test]
    fn walking_off_an_edge_falls() {
        let mut m = machine();
        let mut ctx = ctx_with(InputSlice::NEUTRAL);
        ctx.is_grounded = false;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(FALL));
        ctx.is_grounded = true;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(LAND));
    }

    #[test]
    fn hit_overrides_input() {
        let mut m = machine();
        let mut ctx = ctx_with(InputSlice {
            attack: true,
            ..InputSlice::NEUTRAL
        });
        ctx.is_hit = true;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(HITSTUN));
    }

    #[test]
    fn attack_is_queued_for_a_tick() {
        let mut m = machine();
        let mut ctx = ctx_with(InputSlice {
            attack: true,
            ..InputSlice::NEUTRAL
        });
        // Even an already finished timeline cannot skip the attack state.
        ctx.normalized_time = 1.0;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(ATTACK));
        ctx.input = InputContext::default();
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(IDLE));
    }

    #[test]
    fn shield_breaks_and_recovers() {
        let mut m = machine();
        let mut ctx = ctx_with(InputSlice {
            shield: true,
            ..InputSlice::NEUTRAL
        });
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(SHIELD));
        ctx.shield_broken = true;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(SHIELD_BREAK));
        ctx.normalized_time = 1.0;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(IDLE));
    }

    #[test]
    fn hitstun_recovers_by_position() {
        let mut ctx = ctx_with(InputSlice::NEUTRAL);
        ctx.is_hit = true;
        let hit = |ctx: &CharacterContext| {
            let mut m = machine();
            m.update_state(ctx);
            assert_eq!(m.current(), StateId::of(HITSTUN));
            m
        };

        let mut m = hit(&ctx);
        ctx.is_hit = false;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(IDLE));

        ctx.is_hit = true;
        ctx.is_grounded = false;
        let mut m = hit(&ctx);
        ctx.is_hit = false;
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of(FALL));

        ctx.is_hit = true;
        ctx.is_grabbing_ledge = true;
        let mut m = hit(&ctx);
        ctx.is_hit = false;
        assert_eq!(m.evaluate_transitions(&ctx), Some(StateId::of(LEDGE_GRAB)));
        m.update_state(&ctx);
        assert_ne!(m.current(), StateId::of(HITSTUN));
    }

    #[test]
    fn state_lengths_come_from_profile() {
        let m = machine();
        let attack = m.state(StateId::of(ATTACK)).unwrap();
        assert_eq!(attack.data().length, 0.3);
        let shield_break = m.state(StateId::of(SHIELD_BREAK)).unwrap();
        assert_eq!(shield_break.data().length, 1.0);
    }
}
