//! States, transitions and state identifiers

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::util::hashing::fnv1a_32;

/// Stable identifier for a registered state: the FNV-1a hash of its name.
///
/// This is the `state_hash` carried in summaries, so it must be identical on
/// every peer regardless of registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u32);

impl StateId {
    pub fn of(name: &str) -> Self {
        StateId(fnv1a_32(name))
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// How a state reacts to transitions that target it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPolicy {
    /// Entered immediately; chained transitions continue from it
    #[default]
    Interrupt,
    /// Entered, but ends the chain for this update
    Queue,
    /// Never entered through a transition; only `set_state`/`reset` reach it
    Reject,
}

type Predicate<C> = dyn Fn(&C) -> Option<StateId> + Send + Sync;

/// A guarded edge out of a state.
///
/// The predicate is pure: it only reads the context and answers with the
/// next state, or `None` for "no transition".
pub struct Transition<C> {
    predicate: Arc<Predicate<C>>,
    /// Declared target, if known up front (used for build-time diagnostics)
    target: Option<StateId>,
}

impl<C> Transition<C> {
    /// Transition whose predicate picks the target itself
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> Option<StateId> + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            target: None,
        }
    }

    /// Transition to the state named `target` whenever `guard` holds
    pub fn to<F>(target: &str, guard: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        let id = StateId::of(target);
        Self {
            predicate: Arc::new(move |ctx: &C| guard(ctx).then_some(id)),
            target: Some(id),
        }
    }

    pub fn evaluate(&self, context: &C) -> Option<StateId> {
        (self.predicate)(context)
    }

    pub fn declared_target(&self) -> Option<StateId> {
        self.target
    }
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            target: self.target,
        }
    }
}

impl<C> fmt::Debug for Transition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A registered node of the state graph
#[derive(Debug)]
pub struct State<D, C> {
    pub(crate) id: StateId,
    pub(crate) name: String,
    pub(crate) policy: EntryPolicy,
    pub(crate) data: D,
    pub(crate) transitions: Vec<Transition<C>>,
}

impl<D, C> State<D, C> {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> EntryPolicy {
        self.policy
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn transitions(&self) -> &[Transition<C>] {
        &self.transitions
    }
}
