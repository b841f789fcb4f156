//! Crate-wide error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rotation::TableNumber;
use crate::team::TeamNumber;

/// Errors reported by core rotation operations.
///
/// Every variant is recoverable: all state lives in memory, and no failed
/// operation leaves a partial mutation behind (result correction is the one
/// compensated path, see [`RotationEngine::correct_table`]).
///
/// [`RotationEngine::correct_table`]: crate::rotation::RotationEngine::correct_table
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum RotationError {
    #[error("no team with number {0}")]
    TeamNotFound(TeamNumber),
    #[error("no table with number {0}")]
    TableNotFound(TableNumber),
    #[error("team number {0} is already in use")]
    DuplicateNumber(TeamNumber),
    #[error("team {0} is already on the waitlist")]
    AlreadyQueued(TeamNumber),
    #[error("team {0} is not on the waitlist")]
    NotQueued(TeamNumber),
    #[error("not enough teams on the waitlist: need {needed}, have {available}")]
    InsufficientWaitlist { needed: usize, available: usize },
    #[error("team {0} cannot be seated against itself")]
    SelfMatch(TeamNumber),
    #[error("table {0} is already finalized")]
    TableAlreadyFinalized(TableNumber),
    #[error("team {team} is not seated at table {table}")]
    WinnerNotSeated { table: TableNumber, team: TeamNumber },
    #[error("no table slots left to remove")]
    CapacityExhausted,
    #[error("invalid win/loss adjustment amount {0}")]
    InvalidAmount(i32),
    #[error("malformed record line: {0}")]
    MalformedRecord(String),
}

/// Result type for core rotation operations.
pub type RotationResult<T> = Result<T, RotationError>;
