//! Role-aware driver for one character's history
//!
//! The same character runs under one of three roles:
//! - the owning client predicts every tick and batches its inputs
//! - the authority consumes batches in order and republishes results
//! - observers dead-reckon from the last known input between updates

use tracing::{debug, trace, warn};

use crate::character::{Character, CharacterStateSummary, SimEvent, SimEvents};
use crate::history::InputHistory;
use crate::input::InputSlice;

use super::batcher::InputBatcher;
use super::protocol::{AuthoritativeUpdate, ClientInputBatch, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkRole {
    /// Local player's character on a client
    Owner,
    /// Server copy; its results are the truth
    Authority,
    /// Remote player's character on a client
    Observer,
}

/// What applying an authoritative update did to the local copy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub summary: CharacterStateSummary,
    /// Distance between the local summary before and after correction
    pub correction: f32,
    /// The update predated all retained history
    pub snapped: bool,
}

pub struct CharacterController {
    role: NetworkRole,
    player_id: PlayerId,
    character: Character,
    history: InputHistory,
    summary: CharacterStateSummary,
    batcher: InputBatcher,
    events: SimEvents,
}

impl CharacterController {
    /// Controller for a character standing at the stage's spawn point
    pub fn new(
        role: NetworkRole,
        player_id: PlayerId,
        character: Character,
        history: InputHistory,
    ) -> Self {
        let summary = character.spawn_summary(character.stage().spawn_point);
        Self {
            role,
            player_id,
            character,
            history,
            summary,
            batcher: InputBatcher::new(),
            events: SimEvents::new(),
        }
    }

    pub fn role(&self) -> NetworkRole {
        self.role
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn summary(&self) -> &CharacterStateSummary {
        &self.summary
    }

    pub fn timestamp(&self) -> u64 {
        self.history.latest_timestamp()
    }

    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain().collect()
    }

    /// Owner path: simulate `input` now, returning a batch when one fills
    pub fn predict(
        &mut self,
        input: InputSlice,
    ) -> (CharacterStateSummary, Option<ClientInputBatch>) {
        self.step(input);
        let batch = self
            .batcher
            .push(self.history.latest_timestamp(), self.history.latest_input());
        (self.summary, batch)
    }

    /// Authority path: consume a batch in timestamp order.
    ///
    /// Inputs at or before the latest simulated timestamp are duplicates and
    /// skipped. Missing timestamps before the batch are filled by repeating
    /// the last input, up to the history capacity; a wider gap rebases the
    /// history just before the batch without simulating the skipped ticks.
    /// Batches whose timestamps overflow are dropped. Returns the update to
    /// publish if anything advanced.
    pub fn apply_batch(&mut self, batch: &ClientInputBatch) -> Option<AuthoritativeUpdate> {
        if batch.end_timestamp().is_none() {
            warn!(
                player_id = self.player_id,
                start_timestamp = batch.start_timestamp,
                "Dropping batch with overflowing timestamps"
            );
            return None;
        }

        let mut advanced = false;
        for (timestamp, input) in batch.iter() {
            let latest = self.history.latest_timestamp();
            if timestamp <= latest {
                trace!(player_id = self.player_id, timestamp, latest, "Skipping duplicate input");
                continue;
            }
            let missing = timestamp - latest - 1;
            let max_fill = self.history.capacity() as u64;
            if missing > max_fill {
                warn!(
                    player_id = self.player_id,
                    missing,
                    max_fill,
                    "Input gap too wide, rebasing history"
                );
                self.history.rebase(timestamp - 1, self.history.latest_input());
            } else if missing > 0 {
                debug!(
                    player_id = self.player_id,
                    missing, "Input gap, repeating last input"
                );
                for _ in 0..missing {
                    self.step(self.history.latest_input());
                }
            }
            self.step(input);
            advanced = true;
        }
        advanced.then(|| self.update())
    }

    /// Observer path: advance one tick on the last known input
    pub fn extrapolate(&mut self) -> CharacterStateSummary {
        self.step(self.history.latest_input());
        self.summary
    }

    /// Current state as an authoritative update
    pub fn update(&self) -> AuthoritativeUpdate {
        AuthoritativeUpdate {
            timestamp: self.history.latest_timestamp(),
            summary: self.summary,
            last_input: self.history.latest_input(),
        }
    }

    /// Correct the local copy with an authoritative update.
    ///
    /// The authority ignores updates, as does everyone for an update carrying
    /// non-finite values. Observers first retarget the input they synthesized
    /// after the update's timestamp to its `last_input`.
    pub fn receive_update(&mut self, update: &AuthoritativeUpdate) -> Reconciliation {
        let unchanged = Reconciliation {
            summary: self.summary,
            correction: 0.0,
            snapped: false,
        };
        if self.role == NetworkRole::Authority {
            return unchanged;
        }
        if !update.summary.is_finite() {
            warn!(
                player_id = self.player_id,
                timestamp = update.timestamp,
                "Ignoring update with non-finite state"
            );
            return unchanged;
        }
        if self.role == NetworkRole::Observer {
            self.history.rewrite_pending(update.timestamp, update.last_input);
        }

        let before = self.summary;
        let snapped = update.timestamp < self.history.oldest_timestamp();
        if snapped {
            self.batcher.clear();
        }
        self.summary = self.history.reconcile_state(
            &mut self.character,
            update.timestamp,
            &update.summary,
            Some(update.last_input),
            &mut self.events,
        );
        Reconciliation {
            summary: self.summary,
            correction: before.position.distance(self.summary.position),
            snapped,
        }
    }

    fn step(&mut self, input: InputSlice) {
        let events = &mut self.events;
        self.summary = self
            .history
            .advance(&mut self.character, input, &self.summary, events);
    }
}
