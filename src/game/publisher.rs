//! Authoritative update publishing

use std::collections::BTreeMap;

use crate::net::{AuthoritativeUpdate, PlayerId, ServerMsg};

/// Collects the latest update per player and releases them every N ticks
pub struct UpdatePublisher {
    /// Tick counter since last publish
    ticks_since_publish: u32,
    /// Publish interval in ticks
    interval: u32,
    pending: BTreeMap<PlayerId, AuthoritativeUpdate>,
    stats: PublishStats,
}

impl UpdatePublisher {
    pub fn new(interval: u32) -> Self {
        Self {
            ticks_since_publish: 0,
            interval: interval.max(1),
            pending: BTreeMap::new(),
            stats: PublishStats::default(),
        }
    }

    /// Check if it's time to publish
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_publish += 1;
        if self.ticks_since_publish >= self.interval {
            self.ticks_since_publish = 0;
            true
        } else {
            false
        }
    }

    /// Publish on the next check (used when a player joins)
    pub fn force_next(&mut self) {
        self.ticks_since_publish = self.interval;
    }

    /// Keep `update` as the newest state of `player_id`
    pub fn record(&mut self, player_id: PlayerId, update: AuthoritativeUpdate) {
        self.pending.insert(player_id, update);
    }

    /// Drop anything queued for a player who left
    pub fn forget(&mut self, player_id: PlayerId) {
        self.pending.remove(&player_id);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain queued updates into messages, ordered by player id
    pub fn build(&mut self) -> Vec<ServerMsg> {
        let messages: Vec<ServerMsg> = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(player_id, update)| ServerMsg::Update { player_id, update })
            .collect();
        self.stats.record(messages.len());
        messages
    }

    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }
}

/// Publish counters for debugging
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PublishStats {
    pub total_publishes: u64,
    pub total_updates: u64,
    pub avg_updates_per_publish: f32,
}

impl PublishStats {
    pub fn record(&mut self, updates: usize) {
        self.total_publishes += 1;
        self.total_updates += updates as u64;

        // Running average
        let n = self.total_publishes as f32;
        self.avg_updates_per_publish =
            self.avg_updates_per_publish * ((n - 1.0) / n) + (updates as f32 / n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterStateSummary;
    use crate::fsm::StateId;
    use crate::input::InputSlice;
    use crate::util::Vec2;

    fn update(timestamp: u64) -> AuthoritativeUpdate {
        AuthoritativeUpdate {
            timestamp,
            summary: CharacterStateSummary::spawn(Vec2::ZERO, StateId::of("idle"), 2, 50.0),
            last_input: InputSlice::NEUTRAL,
        }
    }

    #[test]
    fn sends_every_interval() {
        let mut publisher = UpdatePublisher::new(3);
        let sent: Vec<_> = (0..6).map(|_| publisher.should_send()).collect();
        assert_eq!(sent, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn force_next_sends_immediately() {
        let mut publisher = UpdatePublisher::new(10);
        publisher.should_send();
        publisher.force_next();
        assert!(publisher.should_send());
    }

    #[test]
    fn keeps_only_latest_update_per_player() {
        let mut publisher = UpdatePublisher::new(3);
        publisher.record(2, update(3));
        publisher.record(1, update(3));
        publisher.record(2, update(6));
        let messages = publisher.build();
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[1],
            ServerMsg::Update { player_id: 2, update } if update.timestamp == 6
        ));
        assert!(!publisher.has_pending());
        assert_eq!(publisher.stats().total_updates, 2);
    }
}
