//! State machine evaluator over an immutable, shared state graph

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::state::{EntryPolicy, State, StateId};

/// Default cap on chained transitions evaluated in one update
pub const DEFAULT_MAX_CHAIN: usize = 8;

/// The registered states of one character type.
///
/// Built once, then shared read-only by every machine of that type.
#[derive(Debug)]
pub struct StateGraph<D, C> {
    pub(crate) states: Vec<State<D, C>>,
    pub(crate) index: HashMap<StateId, usize>,
    pub(crate) default: usize,
    pub(crate) max_chain: usize,
}

impl<D, C> StateGraph<D, C> {
    pub fn state(&self, id: StateId) -> Option<&State<D, C>> {
        self.index.get(&id).map(|&i| &self.states[i])
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn default_state(&self) -> &State<D, C> {
        &self.states[self.default]
    }

    pub fn states(&self) -> impl Iterator<Item = &State<D, C>> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// First accepted target among `from`'s transitions, in declaration order.
    ///
    /// Unregistered targets, self-targets and `Reject` states count as
    /// "no transition" and evaluation moves on to the next edge.
    fn evaluate_from(&self, from: usize, context: &C) -> Option<usize> {
        self.states[from]
            .transitions
            .iter()
            .filter_map(|t| t.evaluate(context))
            .filter_map(|target| self.index.get(&target).copied())
            .find(|&next| next != from && self.states[next].policy != EntryPolicy::Reject)
    }

    /// Follow chained transitions from `from` until none fires, a `Queue`
    /// state is entered, or the loop guard trips.
    fn resolve_chain(&self, from: usize, context: &C) -> usize {
        let mut current = from;
        for _ in 0..self.max_chain {
            match self.evaluate_from(current, context) {
                Some(next) => {
                    current = next;
                    if self.states[next].policy == EntryPolicy::Queue {
                        return current;
                    }
                }
                None => return current,
            }
        }
        if self.evaluate_from(current, context).is_some() {
            warn!(
                from = %self.states[from].name,
                stopped_at = %self.states[current].name,
                max_chain = self.max_chain,
                "Transition chain hit loop guard"
            );
        }
        current
    }
}

/// A state transition performed by [`StateMachine::update_state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: StateId,
    pub to: StateId,
}

/// One evaluator instance: a shared graph plus the active state
#[derive(Debug)]
pub struct StateMachine<D, C> {
    graph: Arc<StateGraph<D, C>>,
    current: usize,
}

impl<D, C> Clone for StateMachine<D, C> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            current: self.current,
        }
    }
}

impl<D, C> StateMachine<D, C> {
    /// New machine positioned at the graph's default state
    pub fn from_graph(graph: Arc<StateGraph<D, C>>) -> Self {
        let current = graph.default;
        Self { graph, current }
    }

    pub fn graph(&self) -> &Arc<StateGraph<D, C>> {
        &self.graph
    }

    pub fn current(&self) -> StateId {
        self.graph.states[self.current].id
    }

    pub fn current_state(&self) -> &State<D, C> {
        &self.graph.states[self.current]
    }

    pub fn current_data(&self) -> &D {
        &self.graph.states[self.current].data
    }

    pub fn default_state(&self) -> StateId {
        self.graph.default_state().id
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.graph.contains(id)
    }

    pub fn state(&self, id: StateId) -> Option<&State<D, C>> {
        self.graph.state(id)
    }

    pub fn states(&self) -> impl Iterator<Item = &State<D, C>> {
        self.graph.states()
    }

    /// Force the active state, ignoring entry policies.
    ///
    /// Unknown ids fall back to the default state; returns whether `id` was
    /// registered.
    pub fn set_state(&mut self, id: StateId) -> bool {
        match self.graph.index.get(&id) {
            Some(&i) => {
                self.current = i;
                true
            }
            None => {
                self.current = self.graph.default;
                false
            }
        }
    }

    /// Return to the default state
    pub fn reset(&mut self) {
        self.current = self.graph.default;
    }

    /// The state a single transition from the active state would enter
    pub fn evaluate_transitions(&self, context: &C) -> Option<StateId> {
        self.graph
            .evaluate_from(self.current, context)
            .map(|i| self.graph.states[i].id)
    }

    /// The state the machine would settle in after chained transitions,
    /// without changing the active state
    pub fn passthrough(&self, context: &C) -> StateId {
        let settled = self.graph.resolve_chain(self.current, context);
        self.graph.states[settled].id
    }

    /// Evaluate transitions and move to the settled state.
    ///
    /// Returns the change when the active state differs afterwards.
    pub fn update_state(&mut self, context: &C) -> Option<StateChange> {
        let from = self.current;
        let settled = self.graph.resolve_chain(from, context);
        if settled == from {
            return None;
        }
        self.current = settled;
        Some(StateChange {
            from: self.graph.states[from].id,
            to: self.graph.states[settled].id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::{StateMachineBuilder, Transition};

    #[derive(Debug, Default)]
    struct Ctx {
        go: bool,
        bounce: bool,
    }

    fn machine() -> StateMachine<(), Ctx> {
        let mut builder = StateMachineBuilder::new();
        builder
            .add_state("a", EntryPolicy::Interrupt, ())
            .add_state("b", EntryPolicy::Interrupt, ())
            .add_state("c", EntryPolicy::Interrupt, ())
            .add_state("locked", EntryPolicy::Reject, ())
            .add_state("queued", EntryPolicy::Queue, ())
            .add_transition("a", Transition::to("b", |c: &Ctx| c.go))
            .add_transition("b", Transition::to("c", |c: &Ctx| c.go))
            .add_transition("c", Transition::to("a", |c: &Ctx| c.bounce))
            .default_state("a");
        builder.build().unwrap()
    }

    #[test]
    fn starts_in_default_state() {
        let m = machine();
        assert_eq!(m.current(), StateId::of("a"));
    }

    #[test]
    fn update_chains_zero_duration_transitions() {
        let mut m = machine();
        let change = m.update_state(&Ctx {
            go: true,
            bounce: false,
        });
        assert_eq!(
            change,
            Some(StateChange {
                from: StateId::of("a"),
                to: StateId::of("c"),
            })
        );
        assert_eq!(m.current(), StateId::of("c"));
    }

    #[test]
    fn no_change_when_no_transition_fires() {
        let mut m = machine();
        assert_eq!(m.update_state(&Ctx::default()), None);
        assert_eq!(m.current(), StateId::of("a"));
    }

    #[test]
    fn cycle_is_stopped_by_loop_guard() {
        let mut m = machine();
        let ctx = Ctx {
            go: true,
            bounce: true,
        };
        // a -> b -> c -> a ... eight hops from a lands on c.
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of("c"));
    }

    #[test]
    fn evaluate_and_passthrough_do_not_mutate() {
        let m = machine();
        let ctx = Ctx {
            go: true,
            bounce: false,
        };
        assert_eq!(m.evaluate_transitions(&ctx), Some(StateId::of("b")));
        assert_eq!(m.passthrough(&ctx), StateId::of("c"));
        assert_eq!(m.current(), StateId::of("a"));
    }

    #[test]
    fn set_state_unknown_falls_back_to_default() {
        let mut m = machine();
        assert!(m.set_state(StateId::of("b")));
        assert_eq!(m.current(), StateId::of("b"));
        assert!(!m.set_state(StateId::of("missing")));
        assert_eq!(m.current(), StateId::of("a"));
    }

    #[test]
    fn set_state_may_enter_rejecting_state() {
        let mut m = machine();
        assert!(m.set_state(StateId::of("locked")));
        assert_eq!(m.current(), StateId::of("locked"));
        m.reset();
        assert_eq!(m.current(), StateId::of("a"));
    }

    #[test]
    fn dangling_and_rejected_targets_are_no_transition() {
        let mut builder = StateMachineBuilder::new();
        builder
            .add_state("a", EntryPolicy::Interrupt, ())
            .add_state("locked", EntryPolicy::Reject, ())
            .add_state("b", EntryPolicy::Interrupt, ())
            .add_transition("a", Transition::to("nowhere", |_: &Ctx| true))
            .add_transition("a", Transition::to("locked", |_: &Ctx| true))
            .add_transition("a", Transition::to("a", |_: &Ctx| true))
            .add_transition("a", Transition::to("b", |c: &Ctx| c.go))
            .default_state("a");
        let mut m = builder.build().unwrap();

        assert_eq!(m.update_state(&Ctx::default()), None);
        assert_eq!(m.current(), StateId::of("a"));

        // Later edges are still considered after the malformed ones.
        let ctx = Ctx {
            go: true,
            bounce: false,
        };
        assert_eq!(m.update_state(&ctx).map(|c| c.to), Some(StateId::of("b")));
    }

    #[test]
    fn queue_state_ends_chain() {
        let mut builder = StateMachineBuilder::new();
        builder
            .add_state("a", EntryPolicy::Interrupt, ())
            .add_state("queued", EntryPolicy::Queue, ())
            .add_state("after", EntryPolicy::Interrupt, ())
            .add_transition("a", Transition::to("queued", |c: &Ctx| c.go))
            .add_transition("queued", Transition::to("after", |c: &Ctx| c.go))
            .default_state("a");
        let mut m = builder.build().unwrap();
        let ctx = Ctx {
            go: true,
            bounce: false,
        };

        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of("queued"));
        m.update_state(&ctx);
        assert_eq!(m.current(), StateId::of("after"));
    }

    #[test]
    fn clones_share_graph_but_not_active_state() {
        let mut a = machine();
        let b = a.clone();
        a.set_state(StateId::of("c"));
        assert_eq!(b.current(), StateId::of("a"));
        assert!(Arc::ptr_eq(a.graph(), b.graph()));
    }
}
