//! Message contract between owning clients, the authority and observers
//! These are the wire types; transport framing is left to the caller

use serde::{Deserialize, Serialize};

use crate::character::CharacterStateSummary;
use crate::input::InputSlice;

/// Inputs carried by one [`ClientInputBatch`]
pub const INPUT_BATCH_SIZE: usize = 3;

/// Session-local player identifier
pub type PlayerId = u8;

/// Consecutive inputs flushed together by the owning client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientInputBatch {
    /// Timestamp of `inputs[0]`; the rest follow at +1 each
    pub start_timestamp: u64,
    pub inputs: [InputSlice; INPUT_BATCH_SIZE],
}

impl ClientInputBatch {
    /// Timestamp of the last input, `None` if it would not fit in a `u64`
    pub fn end_timestamp(&self) -> Option<u64> {
        self.start_timestamp.checked_add(INPUT_BATCH_SIZE as u64 - 1)
    }

    /// `(timestamp, input)` pairs in order, stopping before any timestamp
    /// that would overflow
    pub fn iter(&self) -> impl Iterator<Item = (u64, InputSlice)> + '_ {
        self.inputs.iter().enumerate().map_while(move |(i, input)| {
            self.start_timestamp
                .checked_add(i as u64)
                .map(|timestamp| (timestamp, *input))
        })
    }
}

/// Verified state of one character, republished to every client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeUpdate {
    pub timestamp: u64,
    pub summary: CharacterStateSummary,
    pub last_input: InputSlice,
}

/// Tells a connection which character it controls; sent once on join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentityAssignment {
    pub player_id: PlayerId,
}

/// A player present in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    /// Roster name of the character
    pub character: String,
    /// Latest authoritative state, used to seed an observer copy
    pub update: AuthoritativeUpdate,
}

/// Successful reply to a join request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinAccepted {
    pub assignment: PlayerIdentityAssignment,
    pub character: String,
    /// Everyone else already in the session
    pub players: Vec<PlayerInfo>,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request a character in the session
    Join {
        /// Roster name of the character to play
        character: String,
    },

    /// Batched inputs for the sender's character
    Inputs {
        batch: ClientInputBatch,
    },

    /// Leave the session
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Reply to `Join`
    Identity(JoinAccepted),

    /// A player joined; observers spawn a dead-reckoned copy
    PlayerJoined {
        player: PlayerInfo,
    },

    /// A player left the session
    PlayerLeft {
        player_id: PlayerId,
        reason: String,
    },

    /// Authoritative state of one character
    Update {
        player_id: PlayerId,
        update: AuthoritativeUpdate,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },
}

impl ServerMsg {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::StateId;
    use crate::util::Vec2;

    #[test]
    fn batch_timestamps_are_consecutive() {
        let batch = ClientInputBatch {
            start_timestamp: 10,
            inputs: [InputSlice::NEUTRAL; INPUT_BATCH_SIZE],
        };
        let stamps: Vec<_> = batch.iter().map(|(t, _)| t).collect();
        assert_eq!(stamps, vec![10, 11, 12]);
        assert_eq!(batch.end_timestamp(), Some(12));
    }

    #[test]
    fn batch_near_timestamp_limit_does_not_overflow() {
        let batch = ClientInputBatch {
            start_timestamp: u64::MAX - 1,
            inputs: [InputSlice::NEUTRAL; INPUT_BATCH_SIZE],
        };
        assert_eq!(batch.end_timestamp(), None);
        let stamps: Vec<_> = batch.iter().map(|(t, _)| t).collect();
        assert_eq!(stamps, vec![u64::MAX - 1, u64::MAX]);
    }

    #[test]
    fn client_messages_are_tagged() {
        let json = serde_json::to_value(ClientMsg::Leave).unwrap();
        assert_eq!(json["type"], "leave");

        let join = ClientMsg::Join {
            character: "zephyr".into(),
        };
        let text = serde_json::to_string(&join).unwrap();
        assert_eq!(serde_json::from_str::<ClientMsg>(&text).unwrap(), join);
    }

    #[test]
    fn update_message_carries_summary() {
        let summary =
            CharacterStateSummary::spawn(Vec2::new(1.0, 2.0), StateId::of("idle"), 2, 50.0);
        let msg = ServerMsg::Update {
            player_id: 3,
            update: AuthoritativeUpdate {
                timestamp: 42,
                summary,
                last_input: InputSlice::NEUTRAL,
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["update"]["timestamp"], 42);
        assert_eq!(json["update"]["summary"]["jump_count"], 2);

        let back: ServerMsg = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn identity_is_flattened_into_the_tag() {
        let msg = ServerMsg::Identity(JoinAccepted {
            assignment: PlayerIdentityAssignment { player_id: 0 },
            character: "vanguard".into(),
            players: Vec::new(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "identity");
        assert_eq!(json["assignment"]["player_id"], 0);
    }
}
