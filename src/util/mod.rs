//! Shared utilities

pub mod hashing;
pub mod math;
pub mod time;

pub use math::Vec2;
