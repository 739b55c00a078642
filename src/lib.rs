//! Deterministic fighter simulation with client prediction and rollback
//! reconciliation.
//!
//! Characters are advanced one fixed tick at a time by a component pipeline
//! driven by a state machine. Every appended input is kept in a per-character
//! history so that an authoritative update for an older tick can be applied
//! and the ticks after it replayed.

pub mod app;
pub mod character;
pub mod config;
pub mod fsm;
pub mod game;
pub mod history;
pub mod input;
pub mod net;
pub mod util;
