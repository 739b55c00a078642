//! Transition context shared by the character state graph

use crate::input::InputContext;

/// Facts the state graph's predicates read, refreshed every tick by the
/// components' `update_context`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterContext {
    pub input: InputContext,
    pub is_grounded: bool,
    /// Facing right
    pub direction: bool,
    /// Vertical velocity is positive
    pub rising: bool,
    pub is_grabbing_ledge: bool,
    pub is_hit: bool,
    pub shield_broken: bool,
    pub can_jump: bool,
    /// Time in state over the state's length; 0 for looping states
    pub normalized_time: f32,
}

impl CharacterContext {
    pub fn new(input: InputContext) -> Self {
        Self {
            input,
            is_grounded: true,
            direction: true,
            rising: false,
            is_grabbing_ledge: false,
            is_hit: false,
            shield_broken: false,
            can_jump: true,
            normalized_time: 0.0,
        }
    }

    pub fn is_airborne(&self) -> bool {
        !self.is_grounded && !self.is_grabbing_ledge
    }

    /// The state's timeline has played through
    pub fn is_finished(&self) -> bool {
        self.normalized_time >= 1.0
    }
}

impl Default for CharacterContext {
    fn default() -> Self {
        Self::new(InputContext::default())
    }
}
