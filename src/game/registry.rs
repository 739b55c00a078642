//! Registry of running sessions

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::character::{Roster, Stage};

use super::session::{Session, SessionHandle, SessionSettings};

/// Registry of all active sessions
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn insert(&self, handle: SessionHandle) {
        self.sessions.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, h)| h)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn total_players(&self) -> usize {
        self.sessions
            .iter()
            .map(|s| s.value().player_count())
            .sum()
    }

    /// Find a session with a free seat
    pub fn find_available(&self) -> Option<SessionHandle> {
        self.sessions
            .iter()
            .find(|entry| {
                let handle = entry.value();
                handle.player_count() < handle.settings().max_players
            })
            .map(|entry| entry.value().clone())
    }

    /// Start a session task; it unregisters itself when it ends
    pub fn spawn(
        self: &Arc<Self>,
        roster: Arc<Roster>,
        stage: Arc<Stage>,
        settings: SessionSettings,
    ) -> SessionHandle {
        let (session, handle) = Session::new(roster, stage, settings);
        let id = handle.id;
        self.insert(handle.clone());

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let ticks = session.run().await;
            registry.remove(&id);
            info!(session_id = %id, ticks, "Session unregistered");
        });

        handle
    }

    /// Ask every running session to stop
    pub async fn shutdown_all(&self) {
        let handles: Vec<SessionHandle> = self.sessions.iter().map(|s| s.value().clone()).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
