//! Team entity and streak bookkeeping.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::constants::NO_PARTNER;

/// Caller-visible team identity. Small integers, assigned at registration
/// and stable for the life of the team.
pub type TeamNumber = u32;

/// Consecutive-win bookkeeping with a single level of undo.
///
/// Two single-slot snapshots (`previous`, `previous_best`) stand in for a
/// history log: only the immediately preceding win/loss transition can be
/// rolled back. Reversing a multi-win recording cannot reconstruct the
/// streak that preceded it, so the current streak degrades to zero there.
/// Reversing a loss rolls the best streak back to the saved previous *win*
/// streak, not the previous best; operators rely on that exact behavior, so
/// the asymmetry with the win-reversal path is kept.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StreakState {
    current: u32,
    best: u32,
    previous: u32,
    previous_best: u32,
}

impl StreakState {
    /// Streak from the wins currently being strung together.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Historical peak streak.
    pub fn best(&self) -> u32 {
        self.best
    }

    fn record_win(&mut self, amount: u32) {
        self.previous = self.current;
        self.current += amount;
        if self.current >= self.best {
            self.previous_best = self.best;
            self.best = self.current;
        }
    }

    fn reverse_win(&mut self, magnitude: u32) {
        if self.current >= self.best {
            self.best = self.previous_best;
        }
        if magnitude == 1 {
            self.current = self.previous;
        } else {
            // Multi-win reversal has no snapshot to land on.
            self.current = 0;
        }
    }

    fn record_loss(&mut self) {
        self.previous = self.current;
        if self.current >= self.best {
            self.previous_best = self.best;
            self.best = self.current;
        }
        self.current = 0;
    }

    fn reverse_loss(&mut self) {
        self.best = self.previous;
    }
}

/// Compact win/loss/streak snapshot of a team, embedded in rotation
/// outcomes and update events.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TeamRecord {
    pub number: TeamNumber,
    pub wins: u32,
    pub losses: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}

/// One row of the standings table: everything the reporting layer needs to
/// render a stats line, as plain data.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TeamStanding {
    pub number: TeamNumber,
    pub player: String,
    pub partner: Option<String>,
    pub best_streak: u32,
    pub win_percentage: f64,
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
}

/// A registered competitor: one or two players with a persistent number
/// and a running performance record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Team {
    number: TeamNumber,
    player: String,
    partner: Option<String>,
    wins: u32,
    losses: u32,
    streak: StreakState,
    /// Group labels this team belongs to (reporting only).
    pub groups: BTreeSet<String>,
    /// Numbers of the teams this team has faced (reporting only).
    pub opponents: BTreeSet<TeamNumber>,
}

impl Team {
    pub fn new(number: TeamNumber, player: &str, partner: Option<&str>) -> Self {
        Self {
            number,
            player: player.trim().to_string(),
            partner: normalize_partner(partner),
            wins: 0,
            losses: 0,
            streak: StreakState::default(),
            groups: BTreeSet::new(),
            opponents: BTreeSet::new(),
        }
    }

    pub fn number(&self) -> TeamNumber {
        self.number
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn partner(&self) -> Option<&str> {
        self.partner.as_deref()
    }

    /// Partner name with the `"*"` sentinel standing in for solo teams.
    pub fn partner_label(&self) -> &str {
        self.partner.as_deref().unwrap_or(NO_PARTNER)
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    /// Percentage of games won, 0 when the team has no wins or no games.
    pub fn win_percentage(&self) -> f64 {
        if self.games_played() == 0 || self.wins == 0 {
            return 0.0;
        }
        let pct = f64::from(self.wins) / f64::from(self.games_played()) * 100.0;
        log::debug!("team {} win percentage {pct}", self.number);
        pct
    }

    /// Domain equality: same number and the same players, compared
    /// case-insensitively with the `"*"` sentinel for a missing partner.
    pub fn matches(&self, other: &Team) -> bool {
        self.number == other.number
            && self.player.eq_ignore_ascii_case(&other.player)
            && self.partner_label().eq_ignore_ascii_case(other.partner_label())
    }

    pub(crate) fn set_names(&mut self, player: &str, partner: Option<&str>) {
        self.player = player.trim().to_string();
        self.partner = normalize_partner(partner);
    }

    /// Applies a win adjustment. Positive amounts extend the streak; a
    /// negative amount reverses the previous recording (single-level undo).
    /// Wins clamp at zero.
    pub(crate) fn record_win(&mut self, amount: i32) {
        self.wins = self.wins.saturating_add_signed(amount);
        if amount < 0 {
            self.streak.reverse_win(amount.unsigned_abs());
        } else {
            self.streak.record_win(amount as u32);
        }
    }

    /// Applies a loss adjustment; the streak transition happens once no
    /// matter the magnitude. Losses clamp at zero.
    pub(crate) fn record_loss(&mut self, amount: i32) {
        self.losses = self.losses.saturating_add_signed(amount);
        if amount < 0 {
            self.streak.reverse_loss();
        } else {
            self.streak.record_loss();
        }
    }

    /// End-of-session reset: scores and group memberships go, identity and
    /// opponent history stay.
    pub(crate) fn reset(&mut self) {
        self.wins = 0;
        self.losses = 0;
        self.streak = StreakState::default();
        self.groups.clear();
    }

    pub fn record(&self) -> TeamRecord {
        TeamRecord {
            number: self.number,
            wins: self.wins,
            losses: self.losses,
            current_streak: self.streak.current,
            best_streak: self.streak.best,
        }
    }

    pub fn standing(&self) -> TeamStanding {
        TeamStanding {
            number: self.number,
            player: self.player.clone(),
            partner: self.partner.clone(),
            best_streak: self.streak.best,
            win_percentage: self.win_percentage(),
            wins: self.wins,
            losses: self.losses,
            games_played: self.games_played(),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {}", self.player, self.partner_label())
    }
}

fn normalize_partner(partner: Option<&str>) -> Option<String> {
    match partner {
        Some(p) if !p.trim().is_empty() && p.trim() != NO_PARTNER => Some(p.trim().to_string()),
        _ => None,
    }
}
