//! Application state shared across the process

use std::sync::Arc;

use tracing::info;

use crate::character::{ProfileError, Roster, Stage};
use crate::config::Config;
use crate::game::{SessionHandle, SessionRegistry, SessionSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub roster: Arc<Roster>,
    pub stage: Arc<Stage>,
    pub settings: SessionSettings,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ProfileError> {
        // Load the roster; fall back to the builtin characters
        let roster = match &config.character_profiles {
            Some(path) => Roster::load(path)?,
            None => Roster::builtin()?,
        };
        info!(characters = roster.len(), "Roster ready");

        let settings = SessionSettings::from_config(&config);

        Ok(Self {
            config: Arc::new(config),
            roster: Arc::new(roster),
            stage: Arc::new(Stage::battlefield()),
            settings,
            registry: Arc::new(SessionRegistry::new()),
        })
    }

    /// Join an open session or start a new one
    pub fn session_for_join(&self) -> SessionHandle {
        match self.registry.find_available() {
            Some(handle) => handle,
            None => self.registry.spawn(
                self.roster.clone(),
                self.stage.clone(),
                self.settings,
            ),
        }
    }
}
