//! The rotation engine: table pool, capacity target, and the result
//! recording step that keeps winners seated and challengers flowing.

use log::{debug, info, warn};

use super::models::{
    CorrectionOutcome, FinalResult, NextSlot, PoolSummary, RequeuePolicy, RotationOutcome, Table,
    TableNumber,
};
use crate::constants::{DESTROYED_INVITE_CODE, STREAK_BROKEN_THRESHOLD};
use crate::errors::{RotationError, RotationResult};
use crate::team::{TeamNumber, TeamRegistry};
use crate::waitlist::WaitList;

/// Owns every table in the session and the operator's capacity target.
///
/// Capacity changes never destroy tables directly. Shrinking below the
/// active count only flags future rotations: the next result recorded on an
/// over-capacity pool skips the replacement table (lazy teardown).
#[derive(Clone, Debug, Default)]
pub struct RotationEngine {
    tables: Vec<Table>,
    /// Target number of simultaneously active tables.
    capacity: u32,
    next_table_number: TableNumber,
}

impl RotationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn increase_capacity(&mut self) -> u32 {
        self.capacity += 1;
        info!("table capacity raised to {}", self.capacity);
        self.capacity
    }

    pub fn decrease_capacity(&mut self) -> RotationResult<u32> {
        if self.capacity == 0 {
            return Err(RotationError::CapacityExhausted);
        }
        self.capacity -= 1;
        info!("table capacity lowered to {}", self.capacity);
        Ok(self.capacity)
    }

    /// Administrative teardown of one slot. Existing tables are untouched;
    /// the next rotation on an over-capacity pool absorbs the shrink.
    pub fn teardown_one_slot(&mut self) -> RotationResult<u32> {
        self.decrease_capacity()
    }

    pub(crate) fn reset_capacity(&mut self) {
        self.capacity = 0;
    }

    pub fn active_table_count(&self) -> usize {
        self.tables.iter().filter(|t| t.is_active()).count()
    }

    pub fn pool_summary(&self) -> PoolSummary {
        let active = self.active_table_count();
        PoolSummary {
            tables: self.tables.len(),
            active,
            capacity: self.capacity,
            pending_teardown: active.saturating_sub(self.capacity as usize),
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn find_table(&self, number: TableNumber) -> Option<&Table> {
        self.tables.iter().find(|t| t.number() == number)
    }

    pub fn get_table(&self, number: TableNumber) -> RotationResult<&Table> {
        self.find_table(number)
            .ok_or(RotationError::TableNotFound(number))
    }

    /// Creation-order view of the pool, optionally narrowed to active
    /// tables and/or tables a given team is seated at.
    pub fn list_tables(&self, active_only: bool, for_team: Option<TeamNumber>) -> Vec<&Table> {
        self.tables
            .iter()
            .filter(|t| !active_only || t.is_active())
            .filter(|t| for_team.map_or(true, |n| t.seats_team(n)))
            .collect()
    }

    /// Seats two teams the caller has already pulled off the waitlist.
    /// Teams still sitting in the queue are refused; dequeue first.
    pub fn seat_new_table(
        &mut self,
        registry: &TeamRegistry,
        waitlist: &WaitList,
        team_a: TeamNumber,
        team_b: TeamNumber,
        invite_code: &str,
    ) -> RotationResult<TableNumber> {
        if waitlist.contains(team_a) {
            return Err(RotationError::AlreadyQueued(team_a));
        }
        if waitlist.contains(team_b) {
            return Err(RotationError::AlreadyQueued(team_b));
        }
        self.create_table(registry, team_a, team_b, invite_code)
    }

    /// Grows capacity by one slot and seats the next two waiting teams at
    /// it. The capacity increment sticks even when the waitlist comes up
    /// short; the operator asked for the slot either way.
    pub fn open_table(
        &mut self,
        registry: &TeamRegistry,
        waitlist: &mut WaitList,
        invite_code: &str,
    ) -> RotationResult<TableNumber> {
        self.increase_capacity();
        let teams = waitlist.dequeue(2)?;
        self.create_table(registry, teams[0], teams[1], invite_code)
    }

    /// The central rotation step.
    ///
    /// Records the winner's win and the loser's loss, pulls the next
    /// challenger off the waitlist to face the winner at a fresh table, and
    /// finalizes the old table. When the pool is over capacity the table is
    /// torn down instead: no challenger is pulled, no replacement is
    /// seated, and the displaced winner rejoins the queue ahead of the
    /// loser. Failures before the first mutation leave everything intact;
    /// in particular an empty waitlist fails the whole call with no
    /// win/loss recorded and the table still active.
    pub fn record_result(
        &mut self,
        registry: &mut TeamRegistry,
        waitlist: &mut WaitList,
        table_number: TableNumber,
        winner: TeamNumber,
        new_invite_code: &str,
        policy: RequeuePolicy,
    ) -> RotationResult<RotationOutcome> {
        let active_tables = self.active_table_count();
        let tearing_down = active_tables > self.capacity as usize;

        let idx = self
            .tables
            .iter()
            .position(|t| t.number() == table_number)
            .ok_or(RotationError::TableNotFound(table_number))?;
        if !self.tables[idx].is_active() {
            return Err(RotationError::TableAlreadyFinalized(table_number));
        }
        if !self.tables[idx].seats_team(winner) {
            return Err(RotationError::WinnerNotSeated {
                table: table_number,
                team: winner,
            });
        }
        let [team_a, team_b] = self.tables[idx].seats();
        let loser = if team_a == winner { team_b } else { team_a };

        let loser_prior_streak = registry.get(loser)?.streak().current();
        registry.get(winner)?;

        let normalized_code = new_invite_code.trim().to_uppercase();
        let invite_code_reused = self.tables[idx].invite_code() == normalized_code;
        if invite_code_reused {
            warn!("invite code {normalized_code} reused from the finished game at table {table_number}");
        }

        let (challenger, replacement) = if tearing_down {
            warn!(
                "table {table_number} is being torn down ({} active, capacity {})",
                active_tables, self.capacity
            );
            (None, None)
        } else {
            let challenger = waitlist.dequeue(1)?[0];
            let replacement =
                self.create_table(registry, winner, challenger, &normalized_code)?;
            (Some(challenger), Some(replacement))
        };

        let winner_record = registry.record_win(winner, 1)?;
        let loser_record = registry.record_loss(loser, 1)?;
        registry.record_opponents(winner, loser)?;

        self.tables[idx].finalize(FinalResult {
            winner,
            loser,
            next_team: match challenger {
                Some(number) => NextSlot::Team(number),
                None => NextSlot::Destroyed,
            },
            next_invite_code: if tearing_down {
                DESTROYED_INVITE_CODE.to_string()
            } else {
                normalized_code
            },
        });
        debug!("table {table_number} finalized: winner {winner}, loser {loser}");

        if policy == RequeuePolicy::Requeue {
            if tearing_down && !waitlist.enqueue(winner) {
                warn!("displaced winner {winner} was already on the waitlist");
            }
            if !waitlist.enqueue(loser) {
                warn!("loser {loser} was already on the waitlist");
            }
        }

        Ok(RotationOutcome {
            table: table_number,
            winner: winner_record,
            loser: loser_record,
            loser_prior_streak,
            streak_broken: loser_prior_streak > STREAK_BROKEN_THRESHOLD,
            table_destroyed: tearing_down,
            replacement,
            invite_code_reused,
        })
    }

    /// Administrative fix for a table: re-points the seats and invite code,
    /// and — on a finalized table with a different winner supplied —
    /// reverses the recorded win/loss and applies it to the corrected pair.
    /// A corrected winner seated at neither seat rolls the reversal back
    /// before the error returns, so no half-applied correction is ever
    /// observable. A corrected winner on a still-active table is ignored.
    pub fn correct_table(
        &mut self,
        registry: &mut TeamRegistry,
        table_number: TableNumber,
        team_a: TeamNumber,
        team_b: TeamNumber,
        invite_code: Option<&str>,
        corrected_winner: Option<TeamNumber>,
    ) -> RotationResult<CorrectionOutcome> {
        let a = registry.get(team_a)?;
        let b = registry.get(team_b)?;
        if a.matches(b) {
            return Err(RotationError::SelfMatch(team_a));
        }
        let idx = self
            .tables
            .iter()
            .position(|t| t.number() == table_number)
            .ok_or(RotationError::TableNotFound(table_number))?;

        self.tables[idx].set_seats([team_a, team_b]);
        if let Some(code) = invite_code {
            self.tables[idx].set_invite_code(code);
        }

        let mut result_corrected = false;
        if let Some(winner) = corrected_winner {
            if let Some(old) = self.tables[idx].result().cloned() {
                if winner != old.winner {
                    // Both previously recorded teams must still exist, or
                    // the reversal could stop halfway.
                    registry.get(old.winner)?;
                    registry.get(old.loser)?;
                    registry.record_win(old.winner, -1)?;
                    registry.record_loss(old.loser, -1)?;
                    let (new_winner, new_loser) = if winner == team_a {
                        (team_a, team_b)
                    } else if winner == team_b {
                        (team_b, team_a)
                    } else {
                        // Restore what was just reversed and bail.
                        registry.record_win(old.winner, 1)?;
                        registry.record_loss(old.loser, 1)?;
                        return Err(RotationError::WinnerNotSeated {
                            table: table_number,
                            team: winner,
                        });
                    };
                    registry.record_win(new_winner, 1)?;
                    registry.record_loss(new_loser, 1)?;
                    self.tables[idx].set_result_teams(new_winner, new_loser);
                    result_corrected = true;
                    warn!("table {table_number} result corrected: winner is now {new_winner}");
                }
            }
        }

        info!("table {table_number} updated");
        Ok(CorrectionOutcome {
            table: table_number,
            seats: self.tables[idx].seats(),
            invite_code: self.tables[idx].invite_code().to_string(),
            result_corrected,
        })
    }

    /// Wipes the pool and rewinds table numbering. Capacity is untouched.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.next_table_number = 0;
    }

    fn create_table(
        &mut self,
        registry: &TeamRegistry,
        team_a: TeamNumber,
        team_b: TeamNumber,
        invite_code: &str,
    ) -> RotationResult<TableNumber> {
        let a = registry.get(team_a)?;
        let b = registry.get(team_b)?;
        if a.matches(b) {
            return Err(RotationError::SelfMatch(team_a));
        }
        let number = self.next_table_number;
        self.next_table_number += 1;
        let table = Table::seat(number, team_a, team_b, invite_code);
        info!("table {number} seated: {team_a} vs {team_b} at {}", table.invite_code());
        self.tables.push(table);
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(teams: u32) -> (RotationEngine, TeamRegistry, WaitList) {
        let mut registry = TeamRegistry::new();
        for n in 0..teams {
            registry
                .create_team(&format!("player{n}"), None, None)
                .unwrap();
        }
        (RotationEngine::new(), registry, WaitList::new())
    }

    #[test]
    fn seating_a_team_against_itself_is_refused() {
        let (mut engine, registry, waitlist) = fixture(2);
        let err = engine
            .seat_new_table(&registry, &waitlist, 0, 0, "X")
            .unwrap_err();
        assert_eq!(err, RotationError::SelfMatch(0));
        assert!(engine.tables().is_empty());
    }

    #[test]
    fn queued_teams_must_be_dequeued_before_seating() {
        let (mut engine, registry, mut waitlist) = fixture(2);
        waitlist.enqueue(0);
        waitlist.enqueue(1);
        let err = engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap_err();
        assert_eq!(err, RotationError::AlreadyQueued(0));

        waitlist.dequeue(2).unwrap();
        let table = engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        assert_eq!(table, 0);
        assert!(engine.get_table(0).unwrap().is_active());
    }

    #[test]
    fn open_table_keeps_the_capacity_bump_on_a_short_waitlist() {
        let (mut engine, registry, mut waitlist) = fixture(2);
        waitlist.enqueue(0);
        let err = engine.open_table(&registry, &mut waitlist, "A1").unwrap_err();
        assert!(matches!(err, RotationError::InsufficientWaitlist { .. }));
        assert_eq!(engine.capacity(), 1);
        assert_eq!(waitlist.len(), 1);
    }

    #[test]
    fn empty_waitlist_fails_record_result_atomically() {
        let (mut engine, mut registry, mut waitlist) = fixture(2);
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        let err = engine
            .record_result(&mut registry, &mut waitlist, 0, 0, "B2", RequeuePolicy::Requeue)
            .unwrap_err();
        assert_eq!(
            err,
            RotationError::InsufficientWaitlist {
                needed: 1,
                available: 0
            }
        );
        assert!(engine.get_table(0).unwrap().is_active());
        assert_eq!(registry.get(0).unwrap().wins(), 0);
        assert_eq!(registry.get(1).unwrap().losses(), 0);
    }

    #[test]
    fn normal_rotation_seats_winner_against_next_challenger() {
        let (mut engine, mut registry, mut waitlist) = fixture(3);
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        waitlist.enqueue(2);

        let outcome = engine
            .record_result(&mut registry, &mut waitlist, 0, 0, "B2", RequeuePolicy::Requeue)
            .unwrap();
        assert!(!outcome.table_destroyed);
        assert_eq!(outcome.replacement, Some(1));
        assert_eq!(outcome.winner.wins, 1);
        assert_eq!(outcome.loser.losses, 1);

        let replacement = engine.get_table(1).unwrap();
        assert_eq!(replacement.seats(), [0, 2]);
        assert_eq!(replacement.invite_code(), "B2");
        // Loser rejoined the queue.
        assert_eq!(waitlist.snapshot(), vec![1]);

        let old = engine.get_table(0).unwrap();
        assert_eq!(old.result().unwrap().next_team, NextSlot::Team(2));
        let err = engine
            .record_result(&mut registry, &mut waitlist, 0, 0, "C3", RequeuePolicy::Requeue)
            .unwrap_err();
        assert_eq!(err, RotationError::TableAlreadyFinalized(0));
    }

    #[test]
    fn over_capacity_rotation_tears_the_table_down() {
        let (mut engine, mut registry, mut waitlist) = fixture(4);
        engine.increase_capacity();
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        engine
            .seat_new_table(&registry, &waitlist, 2, 3, "B2")
            .unwrap();
        engine.decrease_capacity().unwrap();

        let outcome = engine
            .record_result(&mut registry, &mut waitlist, 0, 1, "C3", RequeuePolicy::Requeue)
            .unwrap();
        assert!(outcome.table_destroyed);
        assert_eq!(outcome.replacement, None);
        // Displaced winner goes back in line ahead of the loser.
        assert_eq!(waitlist.snapshot(), vec![1, 0]);
        assert_eq!(
            engine.get_table(0).unwrap().result().unwrap().next_team,
            NextSlot::Destroyed
        );
        assert_eq!(engine.active_table_count(), 1);
    }

    #[test]
    fn wrong_winner_is_refused() {
        let (mut engine, mut registry, mut waitlist) = fixture(3);
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        let err = engine
            .record_result(&mut registry, &mut waitlist, 0, 2, "B2", RequeuePolicy::Requeue)
            .unwrap_err();
        assert_eq!(err, RotationError::WinnerNotSeated { table: 0, team: 2 });
    }

    #[test]
    fn drop_policy_skips_the_requeue() {
        let (mut engine, mut registry, mut waitlist) = fixture(3);
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        waitlist.enqueue(2);
        engine
            .record_result(&mut registry, &mut waitlist, 0, 0, "B2", RequeuePolicy::Drop)
            .unwrap();
        assert!(waitlist.is_empty());
    }

    #[test]
    fn correction_repoints_an_active_table_without_streak_side_effects() {
        let (mut engine, mut registry, waitlist) = fixture(4);
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        let outcome = engine
            .correct_table(&mut registry, 0, 2, 3, Some("z9"), Some(2))
            .unwrap();
        assert_eq!(outcome.seats, [2, 3]);
        assert_eq!(outcome.invite_code, "Z9");
        assert!(!outcome.result_corrected);
        assert_eq!(registry.get(2).unwrap().wins(), 0);
    }

    #[test]
    fn result_correction_moves_the_win_to_the_other_seat() {
        let (mut engine, mut registry, mut waitlist) = fixture(3);
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        waitlist.enqueue(2);
        engine
            .record_result(&mut registry, &mut waitlist, 0, 0, "B2", RequeuePolicy::Drop)
            .unwrap();

        let outcome = engine
            .correct_table(&mut registry, 0, 0, 1, None, Some(1))
            .unwrap();
        assert!(outcome.result_corrected);
        assert_eq!(registry.get(0).unwrap().wins(), 0);
        assert_eq!(registry.get(0).unwrap().losses(), 1);
        assert_eq!(registry.get(1).unwrap().wins(), 1);
        assert_eq!(registry.get(1).unwrap().losses(), 0);
        let result = engine.get_table(0).unwrap().result().unwrap().clone();
        assert_eq!(result.winner, 1);
        assert_eq!(result.loser, 0);
    }

    #[test]
    fn failed_result_correction_restores_the_reversed_records() {
        let (mut engine, mut registry, mut waitlist) = fixture(4);
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        waitlist.enqueue(2);
        engine
            .record_result(&mut registry, &mut waitlist, 0, 0, "B2", RequeuePolicy::Drop)
            .unwrap();

        // Winner 3 is seated at neither seat of table 0.
        let err = engine
            .correct_table(&mut registry, 0, 0, 1, None, Some(3))
            .unwrap_err();
        assert_eq!(err, RotationError::WinnerNotSeated { table: 0, team: 3 });
        assert_eq!(registry.get(0).unwrap().wins(), 1);
        assert_eq!(registry.get(1).unwrap().losses(), 1);
        let result = engine.get_table(0).unwrap().result().unwrap().clone();
        assert_eq!(result.winner, 0);
        assert_eq!(result.loser, 1);
    }

    #[test]
    fn capacity_cannot_drop_below_zero() {
        let (mut engine, _, _) = fixture(0);
        assert_eq!(engine.decrease_capacity().unwrap_err(), RotationError::CapacityExhausted);
        engine.increase_capacity();
        assert_eq!(engine.teardown_one_slot().unwrap(), 0);
    }

    #[test]
    fn pool_summary_counts_pending_teardowns() {
        let (mut engine, registry, waitlist) = fixture(4);
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        engine
            .seat_new_table(&registry, &waitlist, 2, 3, "B2")
            .unwrap();
        let summary = engine.pool_summary();
        assert_eq!(summary.tables, 2);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.capacity, 1);
        assert_eq!(summary.pending_teardown, 1);
    }

    #[test]
    fn list_tables_filters_by_activity_and_team() {
        let (mut engine, mut registry, mut waitlist) = fixture(4);
        engine.increase_capacity();
        engine.increase_capacity();
        engine
            .seat_new_table(&registry, &waitlist, 0, 1, "A1")
            .unwrap();
        engine
            .seat_new_table(&registry, &waitlist, 2, 3, "B2")
            .unwrap();
        waitlist.enqueue(3);
        // Finalizes table 0 and seats table 2 with teams 0 and 3.
        engine
            .record_result(&mut registry, &mut waitlist, 0, 0, "C3", RequeuePolicy::Drop)
            .unwrap();

        assert_eq!(engine.list_tables(false, None).len(), 3);
        assert_eq!(engine.list_tables(true, None).len(), 2);
        let for_zero = engine.list_tables(false, Some(0));
        assert_eq!(for_zero.len(), 2);
        assert_eq!(engine.list_tables(true, Some(0)).len(), 1);
    }
}
