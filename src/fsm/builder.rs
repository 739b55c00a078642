//! Build-time construction and validation of state graphs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::machine::{StateGraph, StateMachine, DEFAULT_MAX_CHAIN};
use super::state::{EntryPolicy, State, StateId, Transition};

/// State graph authoring errors. These abort character construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    #[error("No default state configured")]
    MissingDefaultState,

    #[error("Default state `{0}` is not registered")]
    UnknownDefaultState(String),

    #[error("State `{0}` is registered twice")]
    DuplicateState(String),

    #[error("State `{0}` hashes to the same id as `{1}`")]
    HashCollision(String, String),

    #[error("Transition declared on unregistered state `{0}`")]
    UnknownSource(String),

    #[error("Loop guard must allow at least one transition")]
    ZeroMaxChain,
}

/// Collects states and transitions, then freezes them into a [`StateGraph`]
pub struct StateMachineBuilder<D, C> {
    states: Vec<State<D, C>>,
    pending: Vec<(String, Transition<C>)>,
    default: Option<String>,
    max_chain: usize,
}

impl<D, C> StateMachineBuilder<D, C> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            pending: Vec::new(),
            default: None,
            max_chain: DEFAULT_MAX_CHAIN,
        }
    }

    pub fn add_state(&mut self, name: &str, policy: EntryPolicy, data: D) -> &mut Self {
        self.states.push(State {
            id: StateId::of(name),
            name: name.to_string(),
            policy,
            data,
            transitions: Vec::new(),
        });
        self
    }

    /// Append a transition to `from`. Evaluation follows declaration order.
    pub fn add_transition(&mut self, from: &str, transition: Transition<C>) -> &mut Self {
        self.pending.push((from.to_string(), transition));
        self
    }

    pub fn default_state(&mut self, name: &str) -> &mut Self {
        self.default = Some(name.to_string());
        self
    }

    pub fn max_chain(&mut self, max_chain: usize) -> &mut Self {
        self.max_chain = max_chain;
        self
    }

    /// Validate and freeze the graph without creating a machine
    pub fn build_graph(self) -> Result<StateGraph<D, C>, StateMachineError> {
        let Self {
            mut states,
            pending,
            default,
            max_chain,
        } = self;

        if max_chain == 0 {
            return Err(StateMachineError::ZeroMaxChain);
        }

        let mut index: HashMap<StateId, usize> = HashMap::with_capacity(states.len());
        for (i, state) in states.iter().enumerate() {
            if let Some(&existing) = index.get(&state.id) {
                let existing = &states[existing].name;
                return Err(if existing == &state.name {
                    StateMachineError::DuplicateState(state.name.clone())
                } else {
                    StateMachineError::HashCollision(state.name.clone(), existing.clone())
                });
            }
            index.insert(state.id, i);
        }

        for (from, transition) in pending {
            let Some(&i) = index.get(&StateId::of(&from)) else {
                return Err(StateMachineError::UnknownSource(from));
            };
            if let Some(target) = transition.declared_target() {
                if !index.contains_key(&target) {
                    warn!(
                        from = %from,
                        target = %target,
                        "Transition targets an unregistered state and will never fire"
                    );
                }
            }
            states[i].transitions.push(transition);
        }

        let default_name = default.ok_or(StateMachineError::MissingDefaultState)?;
        let default = *index
            .get(&StateId::of(&default_name))
            .ok_or(StateMachineError::UnknownDefaultState(default_name))?;

        Ok(StateGraph {
            states,
            index,
            default,
            max_chain,
        })
    }

    /// Validate the graph and return a machine in the default state
    pub fn build(self) -> Result<StateMachine<D, C>, StateMachineError> {
        Ok(StateMachine::from_graph(Arc::new(self.build_graph()?)))
    }
}

impl<D, C> Default for StateMachineBuilder<D, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_default_fails() {
        let mut b: StateMachineBuilder<(), ()> = StateMachineBuilder::new();
        b.add_state("a", EntryPolicy::Interrupt, ());
        assert_eq!(b.build().unwrap_err(), StateMachineError::MissingDefaultState);
    }

    #[test]
    fn unknown_default_fails() {
        let mut b: StateMachineBuilder<(), ()> = StateMachineBuilder::new();
        b.add_state("a", EntryPolicy::Interrupt, ()).default_state("b");
        assert_eq!(
            b.build().unwrap_err(),
            StateMachineError::UnknownDefaultState("b".into())
        );
    }

    #[test]
    fn duplicate_state_fails() {
        let mut b: StateMachineBuilder<(), ()> = StateMachineBuilder::new();
        b.add_state("a", EntryPolicy::Interrupt, ())
            .add_state("a", EntryPolicy::Queue, ())
            .default_state("a");
        assert_eq!(
            b.build().unwrap_err(),
            StateMachineError::DuplicateState("a".into())
        );
    }

    #[test]
    fn transition_on_unknown_source_fails() {
        let mut b: StateMachineBuilder<(), ()> = StateMachineBuilder::new();
        b.add_state("a", EntryPolicy::Interrupt, ())
            .add_transition("ghost", Transition::to("a", |_: &()| true))
            .default_state("a");
        assert_eq!(
            b.build().unwrap_err(),
            StateMachineError::UnknownSource("ghost".into())
        );
    }

    #[test]
    fn dangling_target_is_tolerated() {
        let mut b: StateMachineBuilder<(), ()> = StateMachineBuilder::new();
        b.add_state("a", EntryPolicy::Interrupt, ())
            .add_transition("a", Transition::to("ghost", |_: &()| true))
            .default_state("a");
        let graph = b.build_graph().unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.default_state().transitions().len(), 1);
    }

    #[test]
    fn zero_loop_guard_is_rejected() {
        let mut b: StateMachineBuilder<(), ()> = StateMachineBuilder::new();
        b.add_state("a", EntryPolicy::Interrupt, ())
            .default_state("a")
            .max_chain(0);
        assert_eq!(b.build().unwrap_err(), StateMachineError::ZeroMaxChain);
    }
}
