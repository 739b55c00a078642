//! Client side of a session: one predicted owner plus observer copies

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::character::{CharacterStateSummary, Roster, Stage};
use crate::net::{
    AuthoritativeUpdate, CharacterController, ClientMsg, NetworkRole, PlayerId, PlayerInfo,
    ServerMsg,
};
use crate::util::time::tick_duration;

use super::bot::InputSource;
use super::session::{SessionCommand, SessionError, SessionHandle, SessionSettings};

/// Counters describing how well prediction held up
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientStats {
    pub ticks: u64,
    pub batches_sent: u64,
    pub updates_received: u64,
    pub reconciliations: u64,
    pub snaps: u64,
    /// Largest position correction applied to the owned character
    pub max_correction: f32,
}

/// A joined player driving its own character and mirroring the others
pub struct ClientSession {
    player_id: PlayerId,
    owner: CharacterController,
    observers: BTreeMap<PlayerId, CharacterController>,
    roster: Arc<Roster>,
    stage: Arc<Stage>,
    settings: SessionSettings,
    commands: mpsc::Sender<SessionCommand>,
    updates: broadcast::Receiver<ServerMsg>,
    source: Box<dyn InputSource>,
    stats: ClientStats,
}

impl ClientSession {
    /// Join `handle` as `character`, seeding observers for players already present
    pub async fn connect(
        handle: &SessionHandle,
        roster: Arc<Roster>,
        character: &str,
        source: Box<dyn InputSource>,
    ) -> Result<Self, SessionError> {
        // Subscribe before joining so no update is missed
        let updates = handle.subscribe();
        let accepted = handle.join(character).await?;
        let player_id = accepted.assignment.player_id;
        let stage = handle.stage().clone();
        let settings = *handle.settings();

        let owned = roster
            .spawn(&accepted.character, stage.clone())
            .ok_or_else(|| SessionError::UnknownCharacter(accepted.character.clone()))?;

        let mut client = Self {
            player_id,
            owner: CharacterController::new(
                NetworkRole::Owner,
                player_id,
                owned,
                settings.history(),
            ),
            observers: BTreeMap::new(),
            roster,
            stage,
            settings,
            commands: handle.commands.clone(),
            updates,
            source,
            stats: ClientStats::default(),
        };
        for info in &accepted.players {
            client.add_observer(info);
        }

        info!(
            player_id,
            character = %accepted.character,
            observers = client.observers.len(),
            "Joined session"
        );
        Ok(client)
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn summary(&self) -> &CharacterStateSummary {
        self.owner.summary()
    }

    pub fn owner(&self) -> &CharacterController {
        &self.owner
    }

    pub fn observer(&self, player_id: PlayerId) -> Option<&CharacterController> {
        self.observers.get(&player_id)
    }

    pub fn observer_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.observers.keys().copied()
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// Apply every queued server message. Returns false once the session is gone.
    pub fn process_updates(&mut self) -> bool {
        loop {
            match self.updates.try_recv() {
                Ok(msg) => self.handle_server_msg(msg),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(player_id = self.player_id, skipped, "Client fell behind on updates");
                }
                Err(TryRecvError::Closed) => return false,
            }
        }
    }

    /// One client tick: reconcile, predict, send any full batch, extrapolate observers
    pub async fn tick(&mut self) -> Result<(), SessionError> {
        if !self.process_updates() {
            return Err(SessionError::Closed);
        }

        let timestamp = self.owner.timestamp() + 1;
        let input = self.source.next_input(timestamp, self.owner.summary());
        let (_, batch) = self.owner.predict(input);
        self.owner.drain_events();
        if let Some(batch) = batch {
            self.commands
                .send(SessionCommand::Client {
                    player_id: self.player_id,
                    msg: ClientMsg::Inputs { batch },
                })
                .await
                .map_err(|_| SessionError::Closed)?;
            self.stats.batches_sent += 1;
        }

        for observer in self.observers.values_mut() {
            observer.extrapolate();
            observer.drain_events();
        }
        self.stats.ticks += 1;
        Ok(())
    }

    /// Tick at the session rate for `ticks` ticks
    pub async fn run(&mut self, ticks: u64) -> Result<&ClientStats, SessionError> {
        let mut tick_interval = interval(tick_duration(self.settings.tps));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        for _ in 0..ticks {
            tick_interval.tick().await;
            self.tick().await?;
        }
        Ok(&self.stats)
    }

    /// Leave the session, returning the final counters
    pub async fn leave(self) -> ClientStats {
        let _ = self
            .commands
            .send(SessionCommand::Client {
                player_id: self.player_id,
                msg: ClientMsg::Leave,
            })
            .await;
        debug!(player_id = self.player_id, "Left session");
        self.stats
    }

    fn handle_server_msg(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::Update { player_id, update } if player_id == self.player_id => {
                self.reconcile_owner(&update);
            }
            ServerMsg::Update { player_id, update } => {
                if let Some(observer) = self.observers.get_mut(&player_id) {
                    observer.receive_update(&update);
                    observer.drain_events();
                }
            }
            ServerMsg::PlayerJoined { player } if player.player_id != self.player_id => {
                self.add_observer(&player);
            }
            ServerMsg::PlayerJoined { .. } => {}
            ServerMsg::PlayerLeft { player_id, reason } => {
                if self.observers.remove(&player_id).is_some() {
                    debug!(player_id, reason = %reason, "Observer removed");
                }
            }
            ServerMsg::Identity(_) => {}
            ServerMsg::Error { code, message } => {
                warn!(player_id = self.player_id, code = %code, message = %message, "Server error");
            }
        }
    }

    fn reconcile_owner(&mut self, update: &AuthoritativeUpdate) {
        self.stats.updates_received += 1;
        let outcome = self.owner.receive_update(update);
        self.owner.drain_events();
        self.stats.reconciliations += 1;
        if outcome.snapped {
            self.stats.snaps += 1;
        }
        self.stats.max_correction = self.stats.max_correction.max(outcome.correction);
    }

    fn add_observer(&mut self, info: &PlayerInfo) {
        let Some(character) = self.roster.spawn(&info.character, self.stage.clone()) else {
            warn!(
                player_id = info.player_id,
                character = %info.character,
                "Unknown character for observer"
            );
            return;
        };
        let mut observer = CharacterController::new(
            NetworkRole::Observer,
            info.player_id,
            character,
            self.settings.history(),
        );
        observer.receive_update(&info.update);
        observer.drain_events();
        self.observers.insert(info.player_id, observer);
    }
}
