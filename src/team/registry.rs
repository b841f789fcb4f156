//! The team registry: owner of every [`Team`] in a session.

use log::{debug, info};

use super::models::{Team, TeamNumber, TeamRecord};
use crate::errors::{RotationError, RotationResult};
use crate::records::TeamLine;

/// Owns all registered teams, keeps them sorted by ascending team number,
/// and hands out unused numbers for auto-assigned registrations.
#[derive(Clone, Debug, Default)]
pub struct TeamRegistry {
    teams: Vec<Team>,
    /// Auto-assignment counter. Advances only when a number was picked by
    /// the registry, never when the caller supplied one.
    next_number: TeamNumber,
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a team. A caller-supplied number that is already in use is
    /// refused; without one, the registry assigns the smallest unused
    /// number at or above its internal counter.
    pub fn create_team(
        &mut self,
        player: &str,
        partner: Option<&str>,
        number: Option<TeamNumber>,
    ) -> RotationResult<&Team> {
        let mut candidate = number.unwrap_or(self.next_number);
        if number.is_some() && self.contains(candidate) {
            return Err(RotationError::DuplicateNumber(candidate));
        }
        while self.contains(candidate) {
            self.next_number += 1;
            candidate = self.next_number;
        }
        let team = Team::new(candidate, player, partner);
        if number.is_none() {
            self.next_number += 1;
        }
        info!("team {candidate} registered: {team}");
        Ok(self.insert_sorted(team))
    }

    /// Overwrites a team's names in place; number and record are untouched.
    pub fn edit_team(
        &mut self,
        number: TeamNumber,
        player: &str,
        partner: Option<&str>,
    ) -> RotationResult<&Team> {
        let idx = self
            .position(number)
            .ok_or(RotationError::TeamNotFound(number))?;
        self.teams[idx].set_names(player, partner);
        debug!("team {number} renamed: {}", self.teams[idx]);
        Ok(&self.teams[idx])
    }

    /// Removes a team. Waitlist and table references are the caller's job
    /// to clean up; the registry does not cascade.
    pub fn delete_team(&mut self, number: TeamNumber) -> RotationResult<()> {
        let idx = self
            .position(number)
            .ok_or(RotationError::TeamNotFound(number))?;
        self.teams.remove(idx);
        info!("team {number} removed");
        Ok(())
    }

    /// Adjusts a team's wins by `amount` (non-zero; negative reverses the
    /// previous recording) and applies the streak policy.
    pub fn record_win(&mut self, number: TeamNumber, amount: i32) -> RotationResult<TeamRecord> {
        if amount == 0 {
            return Err(RotationError::InvalidAmount(amount));
        }
        let team = self.get_mut(number)?;
        team.record_win(amount);
        let record = team.record();
        debug!("team {number} wins adjusted by {amount}: now {}", record.wins);
        Ok(record)
    }

    /// The loss-side counterpart of [`record_win`](Self::record_win).
    pub fn record_loss(&mut self, number: TeamNumber, amount: i32) -> RotationResult<TeamRecord> {
        if amount == 0 {
            return Err(RotationError::InvalidAmount(amount));
        }
        let team = self.get_mut(number)?;
        team.record_loss(amount);
        let record = team.record();
        debug!(
            "team {number} losses adjusted by {amount}: now {}",
            record.losses
        );
        Ok(record)
    }

    pub fn find(&self, number: TeamNumber) -> Option<&Team> {
        self.position(number).map(|idx| &self.teams[idx])
    }

    pub fn get(&self, number: TeamNumber) -> RotationResult<&Team> {
        self.find(number)
            .ok_or(RotationError::TeamNotFound(number))
    }

    pub fn contains(&self, number: TeamNumber) -> bool {
        self.position(number).is_some()
    }

    /// All teams, ascending by team number.
    pub fn list(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn add_to_group(&mut self, number: TeamNumber, group: &str) -> RotationResult<()> {
        let team = self.get_mut(number)?;
        team.groups.insert(group.to_string());
        Ok(())
    }

    /// Returns whether the team was actually a member of the group.
    pub fn remove_from_group(&mut self, number: TeamNumber, group: &str) -> RotationResult<bool> {
        let team = self.get_mut(number)?;
        Ok(team.groups.remove(group))
    }

    /// Records that two teams have faced each other.
    pub fn record_opponents(&mut self, a: TeamNumber, b: TeamNumber) -> RotationResult<()> {
        self.get(a)?;
        self.get(b)?;
        if let Some(team) = self.find_mut(a) {
            team.opponents.insert(b);
        }
        if let Some(team) = self.find_mut(b) {
            team.opponents.insert(a);
        }
        Ok(())
    }

    /// Loader contract for persisted team lines: an existing number gets
    /// its names updated in place, an unknown one is created. Neither path
    /// advances the auto-assignment counter.
    pub fn merge_record(&mut self, line: &TeamLine) -> &Team {
        if let Some(idx) = self.position(line.number) {
            self.teams[idx].set_names(&line.player, line.partner.as_deref());
            debug!("team {} merged from record line", line.number);
            &self.teams[idx]
        } else {
            let team = Team::new(line.number, &line.player, line.partner.as_deref());
            debug!("team {} loaded from record line", line.number);
            self.insert_sorted(team)
        }
    }

    /// End-of-session reset of every team: scores and groups zeroed,
    /// identity preserved.
    pub fn reset_all(&mut self) {
        for team in &mut self.teams {
            team.reset();
        }
        info!("all {} team records reset", self.teams.len());
    }

    /// Drops every team and rewinds the auto-assignment counter.
    pub fn clear(&mut self) {
        self.teams.clear();
        self.next_number = 0;
    }

    pub(crate) fn find_mut(&mut self, number: TeamNumber) -> Option<&mut Team> {
        self.position(number).map(|idx| &mut self.teams[idx])
    }

    fn get_mut(&mut self, number: TeamNumber) -> RotationResult<&mut Team> {
        self.find_mut(number)
            .ok_or(RotationError::TeamNotFound(number))
    }

    fn position(&self, number: TeamNumber) -> Option<usize> {
        self.teams
            .binary_search_by_key(&number, Team::number)
            .ok()
    }

    fn insert_sorted(&mut self, team: Team) -> &Team {
        let idx = self
            .teams
            .partition_point(|t| t.number() < team.number());
        self.teams.insert(idx, team);
        &self.teams[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_numbers_start_at_zero_and_advance() {
        let mut registry = TeamRegistry::new();
        let a = registry.create_team("Alice", Some("Bob"), None).unwrap();
        assert_eq!(a.number(), 0);
        let b = registry.create_team("Cara", None, None).unwrap();
        assert_eq!(b.number(), 1);
    }

    #[test]
    fn explicit_numbers_never_advance_the_counter() {
        let mut registry = TeamRegistry::new();
        registry.create_team("Eve", None, Some(5)).unwrap();
        let auto = registry.create_team("Fay", None, None).unwrap();
        assert_eq!(auto.number(), 0);
    }

    #[test]
    fn auto_assignment_skips_taken_numbers() {
        let mut registry = TeamRegistry::new();
        registry.create_team("Alice", None, None).unwrap(); // 0
        registry.create_team("Eve", None, Some(1)).unwrap();
        let auto = registry.create_team("Fay", None, None).unwrap();
        assert_eq!(auto.number(), 2);
    }

    #[test]
    fn duplicate_explicit_number_is_refused() {
        let mut registry = TeamRegistry::new();
        registry.create_team("Alice", None, Some(3)).unwrap();
        let err = registry.create_team("Eve", None, Some(3)).unwrap_err();
        assert_eq!(err, RotationError::DuplicateNumber(3));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_stays_sorted_by_number() {
        let mut registry = TeamRegistry::new();
        registry.create_team("C", None, Some(9)).unwrap();
        registry.create_team("A", None, Some(2)).unwrap();
        registry.create_team("B", None, Some(5)).unwrap();
        let numbers: Vec<_> = registry.list().iter().map(Team::number).collect();
        assert_eq!(numbers, vec![2, 5, 9]);
    }

    #[test]
    fn zero_amount_adjustment_is_invalid() {
        let mut registry = TeamRegistry::new();
        registry.create_team("Alice", None, None).unwrap();
        assert_eq!(
            registry.record_win(0, 0).unwrap_err(),
            RotationError::InvalidAmount(0)
        );
    }

    #[test]
    fn edit_and_delete_report_unknown_numbers() {
        let mut registry = TeamRegistry::new();
        assert_eq!(
            registry.edit_team(8, "X", None).unwrap_err(),
            RotationError::TeamNotFound(8)
        );
        assert_eq!(
            registry.delete_team(8).unwrap_err(),
            RotationError::TeamNotFound(8)
        );
    }

    #[test]
    fn merge_record_updates_instead_of_duplicating() {
        let mut registry = TeamRegistry::new();
        registry.create_team("Alice", Some("Bob"), None).unwrap();
        let line = TeamLine {
            number: 0,
            player: "Alicia".to_string(),
            partner: Some("Bob".to_string()),
        };
        registry.merge_record(&line);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).unwrap().player(), "Alicia");

        let fresh = TeamLine {
            number: 12,
            player: "Gil".to_string(),
            partner: None,
        };
        registry.merge_record(&fresh);
        assert_eq!(registry.len(), 2);
        // Loading records never advances the auto counter.
        let auto = registry.create_team("Hana", None, None).unwrap();
        assert_eq!(auto.number(), 1);
    }

    #[test]
    fn opponent_history_is_mutual() {
        let mut registry = TeamRegistry::new();
        registry.create_team("Alice", None, None).unwrap();
        registry.create_team("Cara", None, None).unwrap();
        registry.record_opponents(0, 1).unwrap();
        assert!(registry.get(0).unwrap().opponents.contains(&1));
        assert!(registry.get(1).unwrap().opponents.contains(&0));
    }
}
