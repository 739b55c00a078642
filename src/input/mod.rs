//! Per-tick player input and its edge-detected derivation
//!
//! An [`InputSlice`] is what the input-mapping layer hands the simulation for
//! one tick. An [`InputContext`] is rebuilt from two adjacent slices whenever
//! the simulation steps and is never stored.

use serde::{Deserialize, Serialize};

use crate::util::Vec2;

/// Axis magnitude below which a stick counts as neutral
pub const DEAD_ZONE: f32 = 0.3;

/// Raw input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSlice {
    /// Movement stick, each axis in `[-1, 1]`
    pub movement: Vec2,
    /// Smash/tilt stick, each axis in `[-1, 1]`
    pub smash: Vec2,
    pub attack: bool,
    pub special: bool,
    pub shield: bool,
    pub jump: bool,
}

impl InputSlice {
    /// Neutral input: sticks centered, no buttons held
    pub const NEUTRAL: InputSlice = InputSlice {
        movement: Vec2::ZERO,
        smash: Vec2::ZERO,
        attack: false,
        special: false,
        shield: false,
        jump: false,
    };

    /// Copy with both sticks clamped to the unit square and NaN removed.
    ///
    /// Inputs received from a peer go through this before entering history.
    pub fn sanitized(self) -> Self {
        Self {
            movement: self.movement.clamp_axes(),
            smash: self.smash.clamp_axes(),
            ..self
        }
    }
}

/// Coarse classification of a stick position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Neutral,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Classify a stick against [`DEAD_ZONE`]. The dominant axis wins;
    /// equal magnitudes resolve horizontally.
    pub fn classify(value: Vec2) -> Self {
        let (ax, ay) = (value.x.abs(), value.y.abs());
        if ax < DEAD_ZONE && ay < DEAD_ZONE {
            return Direction::Neutral;
        }
        if ax >= ay {
            if value.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if value.y > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// Previous and current state of one button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonContext {
    pub previous: bool,
    pub current: bool,
}

impl ButtonContext {
    pub fn new(previous: bool, current: bool) -> Self {
        Self { previous, current }
    }

    /// Went down this tick
    pub fn was_pressed(&self) -> bool {
        !self.previous && self.current
    }

    /// Went up this tick
    pub fn was_released(&self) -> bool {
        self.previous && !self.current
    }

    pub fn is_held(&self) -> bool {
        self.current
    }
}

/// A stick value with its classification on this and the previous tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalInput {
    pub value: Vec2,
    pub direction: Direction,
    pub previous_direction: Direction,
}

impl DirectionalInput {
    pub fn new(previous: Vec2, current: Vec2) -> Self {
        Self {
            value: current,
            direction: Direction::classify(current),
            previous_direction: Direction::classify(previous),
        }
    }

    /// The stick moved into `direction` this tick
    pub fn entered(&self, direction: Direction) -> bool {
        self.direction == direction && self.previous_direction != direction
    }
}

/// Edge-detected view over two adjacent input slices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputContext {
    pub movement: DirectionalInput,
    pub smash: DirectionalInput,
    pub attack: ButtonContext,
    pub special: ButtonContext,
    pub shield: ButtonContext,
    pub jump: ButtonContext,
}

impl InputContext {
    pub fn new(previous: &InputSlice, current: &InputSlice) -> Self {
        Self {
            movement: DirectionalInput::new(previous.movement, current.movement),
            smash: DirectionalInput::new(previous.smash, current.smash),
            attack: ButtonContext::new(previous.attack, current.attack),
            special: ButtonContext::new(previous.special, current.special),
            shield: ButtonContext::new(previous.shield, current.shield),
            jump: ButtonContext::new(previous.jump, current.jump),
        }
    }
}

impl Default for InputContext {
    fn default() -> Self {
        Self::new(&InputSlice::NEUTRAL, &InputSlice::NEUTRAL)
    }
}
