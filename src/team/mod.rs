//! Team entities and the registry that owns them.

pub mod models;
pub mod registry;

pub use models::{StreakState, Team, TeamNumber, TeamRecord, TeamStanding};
pub use registry::TeamRegistry;
