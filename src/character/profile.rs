//! Static per-character data supplied by the profile loader

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fsm::StateMachineError;

/// Timeline data for one state, keyed by state name in the profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterStateData {
    /// Seconds until the state's timeline completes; 0 loops until a
    /// transition fires
    pub length: f32,
}

/// Movement and combat tuning for one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub name: String,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub air_speed: f32,
    /// Horizontal acceleration cap while airborne
    pub air_acceleration: f32,
    /// Horizontal deceleration while grounded and not moving
    pub ground_friction: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub fast_fall_speed: f32,
    /// Vertical launch speed per jump; index 0 is the grounded jump
    pub jump_power: Vec<f32>,
    pub max_damage: f32,
    pub max_shield: f32,
    /// Shield lost per second while shielding
    pub shield_depletion: f32,
    /// Shield regained per second otherwise
    pub shield_regen: f32,
    pub ledge_grab_radius: f32,
    /// Timeline overrides keyed by state name
    #[serde(default)]
    pub states: BTreeMap<String, CharacterStateData>,
}

impl CharacterProfile {
    pub fn max_jump_count(&self) -> u32 {
        self.jump_power.len() as u32
    }

    /// Launch speed for the next jump given the jumps still available
    pub fn jump_power_for(&self, remaining: u32) -> Option<f32> {
        let used = self.max_jump_count().checked_sub(remaining)?;
        self.jump_power.get(used as usize).copied()
    }

    pub fn state_length(&self, state: &str, fallback: f32) -> f32 {
        self.states.get(state).map(|d| d.length).unwrap_or(fallback)
    }

    /// Reject tuning the simulation cannot run with
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.jump_power.is_empty() {
            return Err(ProfileError::EmptyJumpTable(self.name.clone()));
        }
        let positive = [
            ("max_damage", self.max_damage),
            ("max_shield", self.max_shield),
            ("gravity", self.gravity),
            ("max_fall_speed", self.max_fall_speed),
            ("fast_fall_speed", self.fast_fall_speed),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ProfileError::InvalidValue {
                    character: self.name.clone(),
                    field,
                });
            }
        }
        let non_negative = [
            ("walk_speed", self.walk_speed),
            ("run_speed", self.run_speed),
            ("air_speed", self.air_speed),
            ("air_acceleration", self.air_acceleration),
            ("ground_friction", self.ground_friction),
            ("shield_depletion", self.shield_depletion),
            ("shield_regen", self.shield_regen),
            ("ledge_grab_radius", self.ledge_grab_radius),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ProfileError::InvalidValue {
                    character: self.name.clone(),
                    field,
                });
            }
        }
        if self
            .jump_power
            .iter()
            .any(|p| !(p.is_finite() && *p > 0.0))
        {
            return Err(ProfileError::InvalidValue {
                character: self.name.clone(),
                field: "jump_power",
            });
        }
        if self.states.values().any(|s| !(s.length.is_finite() && s.length >= 0.0)) {
            return Err(ProfileError::InvalidValue {
                character: self.name.clone(),
                field: "states",
            });
        }
        Ok(())
    }

    /// Balanced all-rounder with a double jump
    pub fn vanguard() -> Self {
        Self {
            name: "vanguard".to_string(),
            walk_speed: 10.0,
            run_speed: 18.0,
            air_speed: 12.0,
            air_acceleration: 60.0,
            ground_friction: 80.0,
            gravity: 60.0,
            max_fall_speed: 25.0,
            fast_fall_speed: 38.0,
            jump_power: vec![22.0, 18.0],
            max_damage: 999.0,
            max_shield: 50.0,
            shield_depletion: 15.0,
            shield_regen: 7.5,
            ledge_grab_radius: 3.0,
            states: BTreeMap::from([
                ("land".to_string(), CharacterStateData { length: 0.1 }),
                ("attack".to_string(), CharacterStateData { length: 0.3 }),
            ]),
        }
    }

    /// Light, floaty character with three jumps
    pub fn zephyr() -> Self {
        Self {
            name: "zephyr".to_string(),
            walk_speed: 9.0,
            run_speed: 16.0,
            air_speed: 14.0,
            air_acceleration: 75.0,
            ground_friction: 70.0,
            gravity: 42.0,
            max_fall_speed: 18.0,
            fast_fall_speed: 30.0,
            jump_power: vec![19.0, 16.0, 14.0],
            max_damage: 999.0,
            max_shield: 45.0,
            shield_depletion: 15.0,
            shield_regen: 7.5,
            ledge_grab_radius: 3.5,
            states: BTreeMap::from([("attack".to_string(), CharacterStateData { length: 0.25 })]),
        }
    }
}

/// Profile loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Failed to read character profiles from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed character profiles: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Character `{0}` has no jumps configured")]
    EmptyJumpTable(String),

    #[error("Character `{character}` has an invalid `{field}`")]
    InvalidValue {
        character: String,
        field: &'static str,
    },

    #[error("Character `{0}` is defined twice")]
    DuplicateCharacter(String),

    #[error("Roster contains no characters")]
    EmptyRoster,

    #[error("State graph for `{character}` is malformed: {source}")]
    Graph {
        character: String,
        #[source]
        source: StateMachineError,
    },
}
