//! Generic finite-state-machine evaluator
//!
//! States and guarded transitions are registered once through a
//! [`StateMachineBuilder`] into an immutable [`StateGraph`]. Each character
//! instance holds its own [`StateMachine`] cursor over the shared graph.

mod builder;
mod machine;
mod state;

pub use builder::{StateMachineBuilder, StateMachineError};
pub use machine::{StateChange, StateGraph, StateMachine, DEFAULT_MAX_CHAIN};
pub use state::{EntryPolicy, State, StateId, Transition};
