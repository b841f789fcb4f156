//! The session controller.

use std::{
    collections::{BTreeSet, VecDeque},
    fmt,
};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{RotationError, RotationResult};
use crate::events::SessionEvent;
use crate::records::TeamLine;
use crate::rotation::{
    CorrectionOutcome, PoolSummary, RequeuePolicy, RotationEngine, RotationOutcome, Table,
    TableNumber,
};
use crate::team::{TeamNumber, TeamRecord, TeamRegistry, TeamStanding};
use crate::waitlist::WaitList;

/// Game-play format of the event. Only rise-and-fly rotation is
/// implemented; the others are announced formats the operator can select
/// ahead of time.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PlayMode {
    #[default]
    Rise,
    Shark,
    Team,
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Rise => "rise",
            Self::Shark => "shark",
            Self::Team => "team",
        };
        write!(f, "{repr}")
    }
}

/// Outcome of an end-of-session attempt.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum SessionClose {
    /// Tables are still in play; nothing was torn down, but capacity was
    /// forced to zero so no new tables get seated.
    Refused { active_tables: Vec<TableNumber> },
    /// Tables cleared, team records reset. The timestamp and standings are
    /// the collaborator's trigger to roll over to a fresh results file.
    Completed {
        ended_at: DateTime<Utc>,
        standings: Vec<TeamStanding>,
    },
}

/// The single owner of all mutable session state: team registry, wait
/// queue, table pool, group list, and the event queue the collaborating
/// shell drains.
///
/// Every operation completes synchronously and in-memory. Callers serving
/// concurrent commands must serialize them against this object as a whole;
/// several operations touch the queue and the registry together and must
/// not interleave.
#[derive(Debug)]
pub struct Session {
    registry: TeamRegistry,
    waitlist: WaitList,
    engine: RotationEngine,
    groups: BTreeSet<String>,
    play_mode: PlayMode,
    started_at: DateTime<Utc>,
    events: VecDeque<SessionEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            registry: TeamRegistry::new(),
            waitlist: WaitList::new(),
            engine: RotationEngine::new(),
            groups: BTreeSet::new(),
            play_mode: PlayMode::default(),
            started_at: Utc::now(),
            events: VecDeque::new(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn registry(&self) -> &TeamRegistry {
        &self.registry
    }

    pub fn waitlist(&self) -> &WaitList {
        &self.waitlist
    }

    pub fn engine(&self) -> &RotationEngine {
        &self.engine
    }

    /// Hands the queued events to the collaborator and empties the queue.
    pub fn drain_events(&mut self) -> VecDeque<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- teams ----------------------------------------------------------

    pub fn create_team(
        &mut self,
        player: &str,
        partner: Option<&str>,
        number: Option<TeamNumber>,
    ) -> RotationResult<TeamNumber> {
        let team = self.registry.create_team(player, partner, number)?.clone();
        let number = team.number();
        self.events.push_back(SessionEvent::TeamCreated(team));
        Ok(number)
    }

    pub fn edit_team(
        &mut self,
        number: TeamNumber,
        player: &str,
        partner: Option<&str>,
    ) -> RotationResult<()> {
        let team = self.registry.edit_team(number, player, partner)?.clone();
        self.events.push_back(SessionEvent::TeamUpdated(team));
        Ok(())
    }

    /// Removes a team from the registry. Any waitlist or table references
    /// to the number are left behind on purpose; cleaning those up is the
    /// operator's call.
    pub fn delete_team(&mut self, number: TeamNumber) -> RotationResult<()> {
        self.registry.delete_team(number)?;
        self.events.push_back(SessionEvent::TeamDeleted(number));
        Ok(())
    }

    pub fn record_win(&mut self, number: TeamNumber, amount: i32) -> RotationResult<TeamRecord> {
        let record = self.registry.record_win(number, amount)?;
        self.push_team_updated(number);
        Ok(record)
    }

    pub fn record_loss(&mut self, number: TeamNumber, amount: i32) -> RotationResult<TeamRecord> {
        let record = self.registry.record_loss(number, amount)?;
        self.push_team_updated(number);
        Ok(record)
    }

    pub fn final_standings(&self) -> Vec<TeamStanding> {
        self.registry.list().iter().map(|t| t.standing()).collect()
    }

    // ---- waitlist -------------------------------------------------------

    pub fn enqueue_team(&mut self, number: TeamNumber) -> RotationResult<()> {
        self.registry.get(number)?;
        if !self.waitlist.enqueue(number) {
            return Err(RotationError::AlreadyQueued(number));
        }
        self.push_waitlist_changed();
        Ok(())
    }

    pub fn dequeue_teams(&mut self, count: usize) -> RotationResult<Vec<TeamNumber>> {
        let teams = self.waitlist.dequeue(count)?;
        self.push_waitlist_changed();
        Ok(teams)
    }

    pub fn remove_from_waitlist(&mut self, number: TeamNumber) -> RotationResult<()> {
        self.waitlist.remove(number)?;
        self.push_waitlist_changed();
        Ok(())
    }

    // ---- tables ---------------------------------------------------------

    pub fn seat_new_table(
        &mut self,
        team_a: TeamNumber,
        team_b: TeamNumber,
        invite_code: &str,
    ) -> RotationResult<TableNumber> {
        let number =
            self.engine
                .seat_new_table(&self.registry, &self.waitlist, team_a, team_b, invite_code)?;
        self.push_table_created(number);
        Ok(number)
    }

    /// Adds a table slot and seats the next two waiting teams at it. The
    /// capacity bump survives a failed seating (short waitlist), so the
    /// capacity event fires either way.
    pub fn open_table(&mut self, invite_code: &str) -> RotationResult<TableNumber> {
        let result = self
            .engine
            .open_table(&self.registry, &mut self.waitlist, invite_code);
        self.push_capacity_changed();
        let number = result?;
        self.push_waitlist_changed();
        self.push_table_created(number);
        Ok(number)
    }

    pub fn record_result(
        &mut self,
        table: TableNumber,
        winner: TeamNumber,
        new_invite_code: &str,
        policy: RequeuePolicy,
    ) -> RotationResult<RotationOutcome> {
        let outcome = self.engine.record_result(
            &mut self.registry,
            &mut self.waitlist,
            table,
            winner,
            new_invite_code,
            policy,
        )?;
        if let Some(replacement) = outcome.replacement {
            self.push_table_created(replacement);
        }
        self.events
            .push_back(SessionEvent::TableFinalized(outcome.clone()));
        self.push_waitlist_changed();
        Ok(outcome)
    }

    pub fn correct_table(
        &mut self,
        table: TableNumber,
        team_a: TeamNumber,
        team_b: TeamNumber,
        invite_code: Option<&str>,
        corrected_winner: Option<TeamNumber>,
    ) -> RotationResult<CorrectionOutcome> {
        let outcome = self.engine.correct_table(
            &mut self.registry,
            table,
            team_a,
            team_b,
            invite_code,
            corrected_winner,
        )?;
        self.events
            .push_back(SessionEvent::TableCorrected(outcome.clone()));
        Ok(outcome)
    }

    pub fn increase_capacity(&mut self) -> u32 {
        let capacity = self.engine.increase_capacity();
        self.push_capacity_changed();
        capacity
    }

    pub fn decrease_capacity(&mut self) -> RotationResult<u32> {
        let capacity = self.engine.decrease_capacity()?;
        self.push_capacity_changed();
        Ok(capacity)
    }

    pub fn pool_summary(&self) -> PoolSummary {
        self.engine.pool_summary()
    }

    pub fn list_tables(&self, active_only: bool, for_team: Option<TeamNumber>) -> Vec<&Table> {
        self.engine.list_tables(active_only, for_team)
    }

    /// Audit line for one table, for the collaborator's append-only log.
    pub fn audit_line(&self, table: TableNumber) -> RotationResult<String> {
        Ok(self.engine.get_table(table)?.audit_line())
    }

    // ---- groups and play mode -------------------------------------------

    pub fn add_team_to_group(&mut self, number: TeamNumber, group: &str) -> RotationResult<()> {
        self.registry.add_to_group(number, group)?;
        self.groups.insert(group.to_string());
        self.events.push_back(SessionEvent::GroupsChanged {
            team: number,
            group: group.to_string(),
            joined: true,
        });
        Ok(())
    }

    /// Returns whether the team was actually in the group; leaving a group
    /// the team never joined is reported, not an error.
    pub fn remove_team_from_group(
        &mut self,
        number: TeamNumber,
        group: &str,
    ) -> RotationResult<bool> {
        let removed = self.registry.remove_from_group(number, group)?;
        if removed {
            self.events.push_back(SessionEvent::GroupsChanged {
                team: number,
                group: group.to_string(),
                joined: false,
            });
        } else {
            warn!("team {number} was never part of group {group}");
        }
        Ok(removed)
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
        self.events.push_back(SessionEvent::PlayModeChanged(mode));
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    // ---- records --------------------------------------------------------

    /// Merges persisted team lines back into the registry. Returns how
    /// many lines were applied; blank lines are skipped, a malformed line
    /// fails the load.
    pub fn load_team_records(&mut self, text: &str) -> RotationResult<usize> {
        let mut merged = 0;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: TeamLine = line.parse()?;
            let existed = self.registry.contains(record.number);
            let team = self.registry.merge_record(&record).clone();
            self.events.push_back(if existed {
                SessionEvent::TeamUpdated(team)
            } else {
                SessionEvent::TeamCreated(team)
            });
            merged += 1;
        }
        info!("loaded {merged} team record line(s)");
        Ok(merged)
    }

    // ---- session lifecycle ----------------------------------------------

    /// Ends the session. While tables are still active (or slots are still
    /// open) the close is refused, but capacity is forced to zero as a side
    /// effect of the attempt so no new tables get seated. A clean close
    /// snapshots the final standings, wipes the tables, and resets every
    /// team's record.
    pub fn end_session(&mut self) -> SessionClose {
        let active_tables: Vec<TableNumber> = self
            .engine
            .list_tables(true, None)
            .iter()
            .map(|t| t.number())
            .collect();
        if self.engine.capacity() > 0 || !active_tables.is_empty() {
            warn!(
                "session close refused: {} active table(s), capacity {}",
                active_tables.len(),
                self.engine.capacity()
            );
            self.engine.reset_capacity();
            self.push_capacity_changed();
            self.events.push_back(SessionEvent::SessionEndRefused {
                active_tables: active_tables.clone(),
            });
            return SessionClose::Refused { active_tables };
        }

        let standings = self.final_standings();
        self.engine.clear();
        self.registry.reset_all();
        let ended_at = Utc::now();
        info!("session ended; {} team record(s) reset", standings.len());
        self.events.push_back(SessionEvent::SessionEnded {
            ended_at,
            standings: standings.clone(),
        });
        SessionClose::Completed {
            ended_at,
            standings,
        }
    }

    /// Wipes teams, tables, and the master group list in one go. The
    /// waitlist has its own clear.
    pub fn clear_all(&mut self) {
        self.clear_teams();
        self.clear_tables();
        self.clear_groups();
    }

    pub fn clear_teams(&mut self) {
        self.registry.clear();
        info!("teams cleared");
    }

    pub fn clear_tables(&mut self) {
        self.engine.clear();
        info!("tables cleared");
    }

    pub fn clear_waitlist(&mut self) {
        self.waitlist.clear();
        self.push_waitlist_changed();
        info!("waitlist cleared");
    }

    /// Clears the master group list; per-team memberships are untouched.
    pub fn clear_groups(&mut self) {
        self.groups.clear();
        info!("groups cleared");
    }

    // ---- internals ------------------------------------------------------

    fn push_team_updated(&mut self, number: TeamNumber) {
        if let Some(team) = self.registry.find(number) {
            self.events
                .push_back(SessionEvent::TeamUpdated(team.clone()));
        }
    }

    fn push_waitlist_changed(&mut self) {
        self.events.push_back(SessionEvent::WaitlistChanged {
            queued: self.waitlist.snapshot(),
        });
    }

    fn push_capacity_changed(&mut self) {
        self.events.push_back(SessionEvent::CapacityChanged {
            capacity: self.engine.capacity(),
            active: self.engine.active_table_count(),
        });
    }

    fn push_table_created(&mut self, number: TableNumber) {
        if let Some(table) = self.engine.find_table(number) {
            self.events.push_back(SessionEvent::TableCreated {
                table: number,
                invite_code: table.invite_code().to_string(),
                seats: table.seats(),
            });
        }
    }
}
