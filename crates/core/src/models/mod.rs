//! Typed shapes of the collections whose editors need field-level checks.

pub mod items;
pub mod moves;

pub use items::{BallColor, StudioItem};
pub use moves::{MoveCategory, MoveTarget, StudioMove};
