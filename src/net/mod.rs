//! Network synchronization: message contract, batching and role controllers

pub mod batcher;
pub mod controller;
pub mod protocol;

pub use batcher::InputBatcher;
pub use controller::{CharacterController, NetworkRole, Reconciliation};
pub use protocol::{
    AuthoritativeUpdate, ClientInputBatch, ClientMsg, JoinAccepted, PlayerId,
    PlayerIdentityAssignment, PlayerInfo, ServerMsg, INPUT_BATCH_SIZE,
};
