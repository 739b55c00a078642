//! Character simulation: summary, components, state graph and pipeline

pub mod components;
pub mod context;
pub mod events;
pub mod pipeline;
pub mod profile;
pub mod roster;
pub mod stage;
pub mod states;
pub mod summary;

pub use components::{HitEvent, SimulationComponent};
pub use context::CharacterContext;
pub use events::{Pose, SimEvent, SimEvents};
pub use pipeline::Character;
pub use profile::{CharacterProfile, CharacterStateData, ProfileError};
pub use roster::{CharacterType, Roster};
pub use stage::{Ledge, LedgeId, Stage};
pub use summary::CharacterStateSummary;
