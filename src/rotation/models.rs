//! Table entities and rotation outcome payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DESTROYED_MARKER, UNDECIDED};
use crate::team::{TeamNumber, TeamRecord};

/// Sequential table identity, assigned at seating. Numbers are never
/// reused; clearing the pool rewinds the counter.
pub type TableNumber = u32;

/// Who takes the table after the recorded game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum NextSlot {
    /// The winner stays and this team challenges.
    Team(TeamNumber),
    /// The table was torn down; nobody takes it.
    Destroyed,
}

/// The terminal state of a table, written exactly once.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FinalResult {
    pub winner: TeamNumber,
    pub loser: TeamNumber,
    pub next_team: NextSlot,
    pub next_invite_code: String,
}

/// A table is active until its result is recorded; it never goes back.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TableStatus {
    Active,
    Finalized(FinalResult),
}

/// One physical seat-pairing instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Table {
    number: TableNumber,
    invite_code: String,
    seats: [TeamNumber; 2],
    status: TableStatus,
}

impl Table {
    pub(crate) fn seat(
        number: TableNumber,
        team_a: TeamNumber,
        team_b: TeamNumber,
        invite_code: &str,
    ) -> Self {
        Self {
            number,
            invite_code: normalize_invite_code(invite_code),
            seats: [team_a, team_b],
            status: TableStatus::Active,
        }
    }

    pub fn number(&self) -> TableNumber {
        self.number
    }

    /// Invite code, case-normalized to upper-case.
    pub fn invite_code(&self) -> &str {
        &self.invite_code
    }

    pub fn seats(&self) -> [TeamNumber; 2] {
        self.seats
    }

    pub fn seats_team(&self, number: TeamNumber) -> bool {
        self.seats.contains(&number)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, TableStatus::Active)
    }

    pub fn result(&self) -> Option<&FinalResult> {
        match &self.status {
            TableStatus::Active => None,
            TableStatus::Finalized(result) => Some(result),
        }
    }

    pub(crate) fn finalize(&mut self, result: FinalResult) {
        self.status = TableStatus::Finalized(result);
    }

    pub(crate) fn set_seats(&mut self, seats: [TeamNumber; 2]) {
        self.seats = seats;
    }

    pub(crate) fn set_invite_code(&mut self, invite_code: &str) {
        self.invite_code = normalize_invite_code(invite_code);
    }

    pub(crate) fn set_result_teams(&mut self, winner: TeamNumber, loser: TeamNumber) {
        if let TableStatus::Finalized(result) = &mut self.status {
            result.winner = winner;
            result.loser = loser;
        }
    }

    /// Renders the append-only audit line for this table. Result fields
    /// hold the `"*"` sentinel while the game is still in progress.
    pub fn audit_line(&self) -> String {
        let [team_a, team_b] = self.seats;
        match self.result() {
            None => format!(
                "{} | {} | {team_a}#:{team_b}# | {UNDECIDED}|{UNDECIDED} | {UNDECIDED} | {UNDECIDED}",
                self.number, self.invite_code,
            ),
            Some(result) => {
                let next_team = match result.next_team {
                    NextSlot::Team(number) => number.to_string(),
                    NextSlot::Destroyed => DESTROYED_MARKER.to_string(),
                };
                format!(
                    "{} | {} | {team_a}#:{team_b}# | {}|{} | {} | {next_team}",
                    self.number, self.invite_code, result.winner, result.loser,
                    result.next_invite_code,
                )
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [team_a, team_b] = self.seats;
        let state = if self.is_active() { "active" } else { "finalized" };
        write!(
            f,
            "table {} [{}] {team_a} vs {team_b} ({state})",
            self.number, self.invite_code
        )
    }
}

/// Whether teams leaving a finished table rejoin the waitlist.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum RequeuePolicy {
    /// The loser rejoins the tail; a winner displaced by teardown is
    /// enqueued just ahead of them.
    #[default]
    Requeue,
    /// Nobody rejoins; the teams walk away.
    Drop,
}

/// Everything the reporting layer needs after a result is recorded.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RotationOutcome {
    pub table: TableNumber,
    pub winner: TeamRecord,
    pub loser: TeamRecord,
    /// The loser's streak just before this loss was recorded.
    pub loser_prior_streak: u32,
    /// Set when the prior streak was long enough to be worth announcing.
    pub streak_broken: bool,
    /// The table was over capacity and got torn down instead of re-seated.
    pub table_destroyed: bool,
    /// Replacement table seating the winner against the next challenger.
    pub replacement: Option<TableNumber>,
    /// The new invite code matches the finished game's code.
    pub invite_code_reused: bool,
}

/// Result of an administrative table correction.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CorrectionOutcome {
    pub table: TableNumber,
    pub seats: [TeamNumber; 2],
    pub invite_code: String,
    /// A recorded result was reversed and re-applied to a different winner.
    pub result_corrected: bool,
}

/// Point-in-time view of the table pool against its capacity target.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PoolSummary {
    pub tables: usize,
    pub active: usize,
    pub capacity: u32,
    /// Active tables that will be torn down instead of re-seated at their
    /// next recorded result.
    pub pending_teardown: usize,
}

fn normalize_invite_code(invite_code: &str) -> String {
    invite_code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_codes_are_upper_cased() {
        let table = Table::seat(0, 1, 2, " b2 ");
        assert_eq!(table.invite_code(), "B2");
    }

    #[test]
    fn audit_line_uses_sentinels_until_finalized() {
        let mut table = Table::seat(3, 4, 7, "K9");
        assert_eq!(table.audit_line(), "3 | K9 | 4#:7# | *|* | * | *");

        table.finalize(FinalResult {
            winner: 7,
            loser: 4,
            next_team: NextSlot::Team(5),
            next_invite_code: "Q1".to_string(),
        });
        assert_eq!(table.audit_line(), "3 | K9 | 4#:7# | 7|4 | Q1 | 5");
        assert!(!table.is_active());
    }

    #[test]
    fn destroyed_table_renders_the_marker() {
        let mut table = Table::seat(0, 1, 2, "A1");
        table.finalize(FinalResult {
            winner: 1,
            loser: 2,
            next_team: NextSlot::Destroyed,
            next_invite_code: crate::constants::DESTROYED_INVITE_CODE.to_string(),
        });
        assert_eq!(
            table.audit_line(),
            "0 | A1 | 1#:2# | 1|2 | ------------- | Table Destroyed"
        );
    }
}
