//! Fixtures for exercising the editor core against a real worker.

pub mod faults;
pub mod fixtures;
pub mod project;

pub use faults::{FaultPlan, FaultyStorage};
pub use project::TestProject;
