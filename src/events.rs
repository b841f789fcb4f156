//! Collaborator-facing session events.
//!
//! The core never formats user-visible text; it queues these data events
//! for the messaging layer to render. The `Display` impls exist for log
//! lines only.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rotation::{CorrectionOutcome, RotationOutcome, TableNumber};
use crate::session::PlayMode;
use crate::team::{Team, TeamNumber, TeamStanding};

/// Events that occur as a session's teams rotate through its tables.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum SessionEvent {
    TeamCreated(Team),
    TeamUpdated(Team),
    TeamDeleted(TeamNumber),
    WaitlistChanged { queued: Vec<TeamNumber> },
    TableCreated {
        table: TableNumber,
        invite_code: String,
        seats: [TeamNumber; 2],
    },
    TableFinalized(RotationOutcome),
    TableCorrected(CorrectionOutcome),
    CapacityChanged { capacity: u32, active: usize },
    GroupsChanged {
        team: TeamNumber,
        group: String,
        joined: bool,
    },
    PlayModeChanged(PlayMode),
    SessionEndRefused { active_tables: Vec<TableNumber> },
    SessionEnded {
        ended_at: DateTime<Utc>,
        standings: Vec<TeamStanding>,
    },
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TeamCreated(team) => write!(f, "team {} created ({team})", team.number()),
            Self::TeamUpdated(team) => write!(f, "team {} updated ({team})", team.number()),
            Self::TeamDeleted(number) => write!(f, "team {number} deleted"),
            Self::WaitlistChanged { queued } => {
                write!(f, "waitlist now holds {} team(s)", queued.len())
            }
            Self::TableCreated {
                table,
                invite_code,
                seats,
            } => write!(
                f,
                "table {table} [{invite_code}] seats {} vs {}",
                seats[0], seats[1]
            ),
            Self::TableFinalized(outcome) => {
                if outcome.table_destroyed {
                    write!(f, "table {} finalized and torn down", outcome.table)
                } else {
                    write!(f, "table {} finalized", outcome.table)
                }
            }
            Self::TableCorrected(outcome) => write!(f, "table {} corrected", outcome.table),
            Self::CapacityChanged { capacity, active } => {
                write!(f, "capacity now {capacity} ({active} active)")
            }
            Self::GroupsChanged {
                team,
                group,
                joined,
            } => {
                if *joined {
                    write!(f, "team {team} joined group {group}")
                } else {
                    write!(f, "team {team} left group {group}")
                }
            }
            Self::PlayModeChanged(mode) => write!(f, "play mode set to {mode}"),
            Self::SessionEndRefused { active_tables } => write!(
                f,
                "session close refused: {} table(s) still active",
                active_tables.len()
            ),
            Self::SessionEnded { standings, .. } => {
                write!(f, "session ended with {} team(s) on record", standings.len())
            }
        }
    }
}
