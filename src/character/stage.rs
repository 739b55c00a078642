//! Stage geometry and the ledge registry
//!
//! Summaries refer to ledges only through [`LedgeId`]; the ledge itself is
//! looked up here when a component needs it.

use serde::{Deserialize, Serialize};

use crate::util::Vec2;

/// Opaque handle of a grabbable ledge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgeId(pub u16);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledge {
    pub id: LedgeId,
    /// Hang point
    pub position: Vec2,
    /// Direction a hanging character faces (towards the stage)
    pub facing_right: bool,
}

/// Flat main platform with ledges at its edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub ground_height: f32,
    pub ground_min_x: f32,
    pub ground_max_x: f32,
    /// Falling below this height knocks a character out
    pub blast_zone_bottom: f32,
    pub spawn_point: Vec2,
    pub ledges: Vec<Ledge>,
}

impl Stage {
    /// Single platform, 120 units wide, with a ledge on either side
    pub fn battlefield() -> Self {
        Self {
            ground_height: 0.0,
            ground_min_x: -60.0,
            ground_max_x: 60.0,
            blast_zone_bottom: -120.0,
            spawn_point: Vec2::new(0.0, 0.0),
            ledges: vec![
                Ledge {
                    id: LedgeId(0),
                    position: Vec2::new(-60.0, 0.0),
                    facing_right: true,
                },
                Ledge {
                    id: LedgeId(1),
                    position: Vec2::new(60.0, 0.0),
                    facing_right: false,
                },
            ],
        }
    }

    pub fn is_over_ground(&self, x: f32) -> bool {
        x >= self.ground_min_x && x <= self.ground_max_x
    }

    pub fn ledge(&self, id: LedgeId) -> Option<&Ledge> {
        self.ledges.iter().find(|l| l.id == id)
    }

    /// First ledge within `radius` of `position`, in registration order
    pub fn grabbable_ledge(&self, position: Vec2, radius: f32) -> Option<&Ledge> {
        self.ledges
            .iter()
            .find(|l| l.position.distance(position) <= radius)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::battlefield()
    }
}
