//! Sentinels and policy constants shared across the crate.

/// Stands in for a missing partner in record lines and domain-equality
/// comparisons; a team may be a single player.
pub const NO_PARTNER: &str = "*";

/// Placeholder for the winner/loser/next-game fields of a table that has
/// not been finalized yet.
pub const UNDECIDED: &str = "*";

/// Invite code written into a finalized table's next-game slot when the
/// table is torn down instead of re-seated.
pub const DESTROYED_INVITE_CODE: &str = "-------------";

/// Next-team audit field of a torn-down table.
pub const DESTROYED_MARKER: &str = "Table Destroyed";

/// A losing team's prior streak must exceed this for the rotation outcome
/// to flag the streak as broken.
pub const STREAK_BROKEN_THRESHOLD: u32 = 3;
