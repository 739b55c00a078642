//! Output events produced while simulating a character
//!
//! The simulation never calls into presentation code. Anything a renderer,
//! audio layer or effect system cares about is pushed onto a [`SimEvents`]
//! queue that the caller drains after the tick.

use serde::{Deserialize, Serialize};

use crate::fsm::StateId;
use crate::util::Vec2;

use super::stage::LedgeId;

/// Presentation-facing pose written by `apply_state`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    pub facing_right: bool,
    pub state: StateId,
    pub normalized_time: f32,
    pub damage: f32,
    pub shield_health: f32,
    pub in_hitstun: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    StateChanged { from: StateId, to: StateId },
    Jumped { remaining: u32 },
    Landed,
    LedgeGrabbed { ledge: LedgeId },
    LedgeReleased { ledge: LedgeId },
    ShieldBroken,
    HitstunEnded,
    KnockedOut,
    Pose(Pose),
}

/// Event queue threaded through a tick.
///
/// A muted queue drops everything pushed to it; reconciliation uses one for
/// the intermediate ticks it replays.
#[derive(Debug, Default)]
pub struct SimEvents {
    events: Vec<SimEvent>,
    muted: bool,
}

impl SimEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn muted() -> Self {
        Self {
            events: Vec::new(),
            muted: true,
        }
    }

    pub fn push(&mut self, event: SimEvent) {
        if !self.muted {
            self.events.push(event);
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, SimEvent> {
        self.events.drain(..)
    }

    /// Most recent pose, if `apply_state` ran
    pub fn last_pose(&self) -> Option<&Pose> {
        self.events.iter().rev().find_map(|e| match e {
            SimEvent::Pose(pose) => Some(pose),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muted_queue_discards() {
        let mut events = SimEvents::muted();
        events.push(SimEvent::Landed);
        assert!(events.is_empty());
    }

    #[test]
    fn drain_empties_queue() {
        let mut events = SimEvents::new();
        events.push(SimEvent::Landed);
        events.push(SimEvent::ShieldBroken);
        let drained: Vec<_> = events.drain().collect();
        assert_eq!(drained, vec![SimEvent::Landed, SimEvent::ShieldBroken]);
        assert!(events.is_empty());
    }
}
