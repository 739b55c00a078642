//! Input sources for client sessions

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::character::CharacterStateSummary;
use crate::input::InputSlice;
use crate::util::Vec2;

/// Produces the local player's input for each tick
pub trait InputSource: Send {
    fn next_input(&mut self, timestamp: u64, summary: &CharacterStateSummary) -> InputSlice;
}

impl<F> InputSource for F
where
    F: FnMut(u64, &CharacterStateSummary) -> InputSlice + Send,
{
    fn next_input(&mut self, timestamp: u64, summary: &CharacterStateSummary) -> InputSlice {
        self(timestamp, summary)
    }
}

/// Distance from the stage centre past which bots head back
const RETURN_DISTANCE: f32 = 40.0;

/// Seeded random player: picks an intent and holds it for a while
pub struct BotInput {
    rng: ChaCha8Rng,
    held: InputSlice,
    hold_ticks: u32,
    fresh: bool,
}

impl BotInput {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            held: InputSlice::NEUTRAL,
            hold_ticks: 0,
            fresh: false,
        }
    }

    fn choose(&mut self, summary: &CharacterStateSummary) -> InputSlice {
        let x = if summary.position.x.abs() > RETURN_DISTANCE {
            -summary.position.x.signum()
        } else {
            self.rng.gen_range(-1.0..=1.0)
        };
        let roll: f32 = self.rng.gen();
        InputSlice {
            movement: Vec2::new(x, 0.0),
            jump: roll < 0.15 || (!summary.is_grounded && summary.position.y < 0.0),
            attack: (0.15..0.25).contains(&roll),
            shield: (0.25..0.32).contains(&roll),
            ..InputSlice::NEUTRAL
        }
    }
}

impl InputSource for BotInput {
    fn next_input(&mut self, _timestamp: u64, summary: &CharacterStateSummary) -> InputSlice {
        if self.hold_ticks == 0 {
            self.held = self.choose(summary);
            self.hold_ticks = self.rng.gen_range(5..30);
            self.fresh = true;
        }
        self.hold_ticks -= 1;

        let mut input = self.held;
        // Jump and attack are taps; shield stays held.
        if !self.fresh {
            input.jump = false;
            input.attack = false;
        }
        self.fresh = false;
        input
    }
}
