//! The per-tick step function of one character
//!
//! [`Character::simulate`] is a pure function of the previous summary, the
//! fixed tick interval and the input context, plus the static profile and
//! stage. No wall clock, randomness or I/O is read while simulating.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::fsm::{StateId, StateMachine};
use crate::input::InputContext;
use crate::util::Vec2;

use super::components::{HitEvent, SimEnv, SimulationComponent, STANDARD_COMPONENTS};
use super::context::CharacterContext;
use super::events::{Pose, SimEvent, SimEvents};
use super::profile::{CharacterProfile, ProfileError};
use super::roster::CharacterType;
use super::stage::Stage;
use super::states::StateBehavior;
use super::summary::CharacterStateSummary;

/// Simulation instance of a character type on a stage.
///
/// Holds no per-tick state besides the state machine cursor, which is
/// re-seeded from the incoming summary at the start of every tick.
#[derive(Debug, Clone)]
pub struct Character {
    kind: Arc<CharacterType>,
    stage: Arc<Stage>,
    machine: StateMachine<StateBehavior, CharacterContext>,
    components: [SimulationComponent; 6],
}

impl Character {
    pub fn new(kind: Arc<CharacterType>, stage: Arc<Stage>) -> Self {
        let machine = StateMachine::from_graph(kind.graph().clone());
        Self {
            kind,
            stage,
            machine,
            components: STANDARD_COMPONENTS,
        }
    }

    /// Validate `profile` and build its graph for a one-off character
    pub fn from_profile(
        profile: CharacterProfile,
        stage: Arc<Stage>,
    ) -> Result<Self, ProfileError> {
        Ok(Self::new(Arc::new(CharacterType::new(profile)?), stage))
    }

    pub fn kind(&self) -> &Arc<CharacterType> {
        &self.kind
    }

    pub fn profile(&self) -> &CharacterProfile {
        self.kind.profile()
    }

    pub fn stage(&self) -> &Arc<Stage> {
        &self.stage
    }

    pub fn machine(&self) -> &StateMachine<StateBehavior, CharacterContext> {
        &self.machine
    }

    pub fn components(&self) -> &[SimulationComponent] {
        &self.components
    }

    /// Grounded summary in the default state with full jumps and shield
    pub fn spawn_summary(&self, position: Vec2) -> CharacterStateSummary {
        let profile = self.kind.profile();
        CharacterStateSummary::spawn(
            position,
            self.machine.default_state(),
            profile.max_jump_count(),
            profile.max_shield,
        )
    }

    /// Run components, refresh the context and take one machine step
    pub fn simulate(
        &mut self,
        previous: &CharacterStateSummary,
        dt: f32,
        input: &InputContext,
        events: &mut SimEvents,
    ) -> CharacterStateSummary {
        let mut summary = *previous;
        self.load_state(&mut summary);

        let env = SimEnv {
            dt,
            profile: self.kind.profile(),
            stage: &self.stage,
            behavior: *self.machine.current_data(),
        };
        for component in &self.components {
            component.simulate(&env, &mut summary, input, events);
        }

        if summary.position.y < self.stage.blast_zone_bottom {
            self.knock_out(&mut summary, events);
        }

        let env = SimEnv {
            dt,
            profile: self.kind.profile(),
            stage: &self.stage,
            behavior: *self.machine.current_data(),
        };
        let mut context = CharacterContext::new(*input);
        for component in &self.components {
            component.update_context(&env, &summary, &mut context);
        }

        if let Some(change) = self.machine.update_state(&context) {
            summary.state_hash = change.to;
            events.push(SimEvent::StateChanged {
                from: change.from,
                to: change.to,
            });
            for component in &self.components {
                component.on_state_changed(&mut summary, change);
            }
        }

        summary
    }

    /// Emit the pose for `summary`
    pub fn apply_state(&self, summary: &CharacterStateSummary, events: &mut SimEvents) {
        let behavior = self
            .machine
            .state(summary.state_hash)
            .unwrap_or_else(|| self.machine.graph().default_state())
            .data();
        let env = SimEnv {
            dt: 0.0,
            profile: self.kind.profile(),
            stage: &self.stage,
            behavior: *behavior,
        };
        let mut pose = Pose {
            position: Vec2::ZERO,
            facing_right: true,
            state: summary.state_hash,
            normalized_time: 0.0,
            damage: 0.0,
            shield_health: 0.0,
            in_hitstun: false,
        };
        for component in &self.components {
            component.apply_state(&env, summary, &mut pose);
        }
        events.push(SimEvent::Pose(pose));
    }

    /// One full tick: `simulate` followed by `apply_state`
    pub fn advance(
        &mut self,
        previous: &CharacterStateSummary,
        dt: f32,
        input: &InputContext,
        events: &mut SimEvents,
    ) -> CharacterStateSummary {
        let summary = self.simulate(previous, dt, input, events);
        self.apply_state(&summary, events);
        summary
    }

    /// Apply a hit to `summary`; returns whether the shield absorbed it.
    ///
    /// Hit detection lives outside the simulation: the collision layer calls
    /// this between ticks for every hit it resolves against this character.
    pub fn receive_hit(&self, summary: &mut CharacterStateSummary, hit: &HitEvent) -> bool {
        let behavior = self
            .machine
            .state(summary.state_hash)
            .unwrap_or_else(|| self.machine.graph().default_state())
            .data();
        let env = SimEnv {
            dt: 0.0,
            profile: self.kind.profile(),
            stage: &self.stage,
            behavior: *behavior,
        };
        let absorbed = self.components.iter().any(|c| c.absorbs(&env, summary));
        for component in &self.components {
            component.receive_hit(&env, summary, hit, absorbed);
        }
        absorbed
    }

    /// Return `summary` and the machine to spawn values
    pub fn reset_state(&mut self, summary: &mut CharacterStateSummary) {
        self.machine.reset();
        let env = SimEnv {
            dt: 0.0,
            profile: self.kind.profile(),
            stage: &self.stage,
            behavior: *self.machine.current_data(),
        };
        for component in &self.components {
            component.reset_state(&env, summary);
        }
        summary.state_hash = self.machine.current();
    }

    fn load_state(&mut self, summary: &mut CharacterStateSummary) {
        if self.machine.current() == summary.state_hash {
            return;
        }
        if !self.machine.set_state(summary.state_hash) {
            warn!(
                character = %self.kind.name(),
                state = %summary.state_hash,
                "Unknown state hash, falling back to default state"
            );
            summary.state_hash = self.machine.current();
            summary.state_time = 0.0;
        }
    }

    fn knock_out(&mut self, summary: &mut CharacterStateSummary, events: &mut SimEvents) {
        debug!(character = %self.kind.name(), y = summary.position.y, "Knocked out");
        let from = summary.state_hash;
        self.reset_state(summary);
        events.push(SimEvent::KnockedOut);
        if summary.state_hash != from {
            events.push(SimEvent::StateChanged {
                from,
                to: summary.state_hash,
            });
        }
    }
}

/// Hash of the state a summary resolves to on `character`
pub fn resolved_state(character: &Character, hash: StateId) -> StateId {
    if character.machine().contains(hash) {
        hash
    } else {
        character.machine().default_state()
    }
}
