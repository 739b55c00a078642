//! Session layer: authoritative server loop, clients and input sources

pub mod bot;
pub mod client;
pub mod publisher;
pub mod registry;
pub mod session;

pub use bot::{BotInput, InputSource};
pub use client::{ClientSession, ClientStats};
pub use publisher::{PublishStats, UpdatePublisher};
pub use registry::SessionRegistry;
pub use session::{
    Session, SessionCommand, SessionError, SessionHandle, SessionSettings, SharedController,
    DEFAULT_MAX_PLAYERS,
};
