//! Authoritative session state and tick loop

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::character::{Character, Roster, SimEvent, Stage};
use crate::config::Config;
use crate::history::{InputHistory, DEFAULT_HISTORY_CAPACITY};
use crate::net::{
    AuthoritativeUpdate, CharacterController, ClientMsg, JoinAccepted, NetworkRole, PlayerId,
    PlayerIdentityAssignment, PlayerInfo, ServerMsg,
};
use crate::util::time::{
    tick_delta, tick_duration, Timer, DEFAULT_SIMULATION_TPS, DEFAULT_SNAPSHOT_INTERVAL_TICKS,
};

use super::publisher::UpdatePublisher;

/// Authoritative controller shared between the session task and handles.
///
/// The mutex is the per-character critical section: append and
/// reconciliation never interleave on one character.
pub type SharedController = Arc<Mutex<CharacterController>>;

/// Most players a session accepts
pub const DEFAULT_MAX_PLAYERS: usize = 4;

/// Tick and history parameters shared by a session and its clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub tps: u32,
    pub snapshot_interval_ticks: u32,
    pub history_capacity: usize,
    pub max_players: usize,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tps: config.simulation_tps,
            snapshot_interval_ticks: config.snapshot_interval_ticks,
            history_capacity: config.history_capacity,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }

    /// Fixed simulation step
    pub fn dt(&self) -> f32 {
        tick_delta(self.tps)
    }

    /// Fresh history sized for these settings
    pub fn history(&self) -> InputHistory {
        InputHistory::new(self.history_capacity, self.dt())
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tps: DEFAULT_SIMULATION_TPS,
            snapshot_interval_ticks: DEFAULT_SNAPSHOT_INTERVAL_TICKS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

/// Session errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Unknown character `{0}`")]
    UnknownCharacter(String),

    #[error("Session is full ({0} players)")]
    Full(usize),

    #[error("Player {0} is not in this session")]
    UnknownPlayer(PlayerId),

    #[error("Session is closed")]
    Closed,
}

/// Work queued for the session task
#[derive(Debug)]
pub enum SessionCommand {
    /// Claim a character; the reply carries the identity assignment
    Join {
        character: String,
        reply: oneshot::Sender<Result<JoinAccepted, SessionError>>,
    },
    /// Message from a joined player
    Client { player_id: PlayerId, msg: ClientMsg },
    /// Stop the tick loop
    Shutdown,
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub commands: mpsc::Sender<SessionCommand>,
    pub updates: broadcast::Sender<ServerMsg>,
    players: Arc<DashMap<PlayerId, SharedController>>,
    stage: Arc<Stage>,
    settings: SessionSettings,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.updates.subscribe()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn stage(&self) -> &Arc<Stage> {
        &self.stage
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Current authoritative state of `player_id`
    pub fn latest_update(&self, player_id: PlayerId) -> Option<AuthoritativeUpdate> {
        self.players
            .get(&player_id)
            .map(|controller| controller.lock().update())
    }

    pub async fn join(&self, character: &str) -> Result<JoinAccepted, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Join {
                character: character.to_string(),
                reply,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn send(&self, player_id: PlayerId, msg: ClientMsg) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::Client { player_id, msg })
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }
}

/// The authoritative session: one authority controller per player
pub struct Session {
    id: Uuid,
    settings: SessionSettings,
    roster: Arc<Roster>,
    stage: Arc<Stage>,
    players: Arc<DashMap<PlayerId, SharedController>>,
    characters: BTreeMap<PlayerId, String>,
    commands: mpsc::Receiver<SessionCommand>,
    updates: broadcast::Sender<ServerMsg>,
    publisher: UpdatePublisher,
    tick: u64,
    ever_joined: bool,
    shutting_down: bool,
}

impl Session {
    pub fn new(
        roster: Arc<Roster>,
        stage: Arc<Stage>,
        settings: SessionSettings,
    ) -> (Self, SessionHandle) {
        let id = Uuid::new_v4();
        let (commands_tx, commands_rx) = mpsc::channel(256);
        let (updates_tx, _) = broadcast::channel(256);
        let players = Arc::new(DashMap::new());

        let handle = SessionHandle {
            id,
            commands: commands_tx,
            updates: updates_tx.clone(),
            players: players.clone(),
            stage: stage.clone(),
            settings,
        };

        let session = Self {
            id,
            settings,
            roster,
            stage,
            players,
            characters: BTreeMap::new(),
            commands: commands_rx,
            updates: updates_tx,
            publisher: UpdatePublisher::new(settings.snapshot_interval_ticks),
            tick: 0,
            ever_joined: false,
            shutting_down: false,
        };
        (session, handle)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run the authoritative tick loop until shutdown, every handle is
    /// dropped, or the last player leaves. Returns the ticks run.
    pub async fn run(mut self) -> u64 {
        info!(session_id = %self.id, tps = self.settings.tps, "Session started");

        let budget = tick_duration(self.settings.tps);
        let mut tick_interval = interval(budget);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut timer = Timer::new();

        loop {
            tick_interval.tick().await;
            timer.reset();

            // Drain command queue
            let connected = self.process_commands();

            self.run_tick();

            if self.publisher.should_send() && self.publisher.has_pending() {
                for msg in self.publisher.build() {
                    let _ = self.updates.send(msg);
                }
            }

            let elapsed = timer.elapsed_micros();
            if elapsed > budget.as_micros() as u64 {
                warn!(
                    session_id = %self.id,
                    tick = self.tick,
                    elapsed_micros = elapsed,
                    "Tick overran its budget"
                );
            }

            if self.shutting_down {
                info!(session_id = %self.id, "Session shutting down");
                break;
            }
            if !connected {
                info!(session_id = %self.id, "All handles dropped, ending session");
                break;
            }
            if self.ever_joined && self.players.is_empty() {
                info!(session_id = %self.id, "All players left, ending session");
                break;
            }
        }

        info!(session_id = %self.id, ticks = self.tick, "Session ended");
        self.tick
    }

    /// Apply every queued command; false once all senders are gone
    fn process_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(SessionCommand::Join { character, reply }) => {
                    self.handle_join(character, reply);
                }
                Ok(SessionCommand::Client { player_id, msg }) => {
                    self.handle_client(player_id, msg);
                }
                Ok(SessionCommand::Shutdown) => {
                    self.shutting_down = true;
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle_join(
        &mut self,
        character: String,
        reply: oneshot::Sender<Result<JoinAccepted, SessionError>>,
    ) {
        let Some(kind) = self.roster.get(&character) else {
            warn!(session_id = %self.id, character = %character, "Join with unknown character");
            let _ = reply.send(Err(SessionError::UnknownCharacter(character)));
            return;
        };

        let max_players = self.settings.max_players.min(PlayerId::MAX as usize + 1);
        let free_id = (0..=PlayerId::MAX)
            .take(max_players)
            .find(|id| !self.players.contains_key(id));
        let Some(player_id) = free_id else {
            let _ = reply.send(Err(SessionError::Full(max_players)));
            return;
        };

        let controller = CharacterController::new(
            NetworkRole::Authority,
            player_id,
            Character::new(kind, self.stage.clone()),
            self.settings.history(),
        );
        let info = PlayerInfo {
            player_id,
            character: character.clone(),
            update: controller.update(),
        };
        let players = self.player_infos();

        let accepted = JoinAccepted {
            assignment: PlayerIdentityAssignment { player_id },
            character: character.clone(),
            players,
        };
        if reply.send(Ok(accepted)).is_err() {
            debug!(session_id = %self.id, player_id, "Joiner went away before reply");
            return;
        }

        self.players
            .insert(player_id, Arc::new(Mutex::new(controller)));
        self.characters.insert(player_id, character.clone());
        self.ever_joined = true;

        // Notify everyone of the new player
        let _ = self.updates.send(ServerMsg::PlayerJoined { player: info });
        self.publisher.force_next();

        info!(
            session_id = %self.id,
            player_id,
            character = %character,
            player_count = self.players.len(),
            "Player joined session"
        );
    }

    fn handle_client(&mut self, player_id: PlayerId, msg: ClientMsg) {
        match msg {
            ClientMsg::Inputs { batch } => {
                let Some(controller) = self.players.get(&player_id).map(|c| c.value().clone())
                else {
                    warn!(session_id = %self.id, player_id, "Inputs from unknown player");
                    return;
                };
                let update = controller.lock().apply_batch(&batch);
                if let Some(update) = update {
                    trace!(player_id, timestamp = update.timestamp, "Applied input batch");
                    self.publisher.record(player_id, update);
                }
            }
            ClientMsg::Leave => self.handle_leave(player_id, "left"),
            ClientMsg::Join { .. } => {
                warn!(session_id = %self.id, player_id, "Player already in session");
                let _ = self.updates.send(ServerMsg::error(
                    "already_joined",
                    format!("Player {player_id} is already in this session"),
                ));
            }
        }
    }

    fn handle_leave(&mut self, player_id: PlayerId, reason: &str) {
        if self.players.remove(&player_id).is_none() {
            return;
        }
        self.characters.remove(&player_id);
        self.publisher.forget(player_id);
        let _ = self.updates.send(ServerMsg::PlayerLeft {
            player_id,
            reason: reason.to_string(),
        });
        info!(
            session_id = %self.id,
            player_id,
            player_count = self.players.len(),
            "Player left session"
        );
    }

    /// Advance bookkeeping and drain simulation events
    fn run_tick(&mut self) {
        self.tick += 1;
        for entry in self.players.iter() {
            let events = entry.value().lock().drain_events();
            for event in events {
                match event {
                    SimEvent::KnockedOut => {
                        info!(
                            session_id = %self.id,
                            player_id = *entry.key(),
                            "Player knocked out"
                        );
                    }
                    SimEvent::Pose(_) => {}
                    other => trace!(player_id = *entry.key(), event = ?other, "Simulation event"),
                }
            }
        }
    }

    fn player_infos(&self) -> Vec<PlayerInfo> {
        self.characters
            .iter()
            .filter_map(|(player_id, character)| {
                let controller = self.players.get(player_id)?;
                let update = controller.lock().update();
                Some(PlayerInfo {
                    player_id: *player_id,
                    character: character.clone(),
                    update,
                })
            })
            .collect()
    }
}
