//! Persisted record-line layouts.
//!
//! File I/O belongs to the collaborator, but the line layouts are a core
//! contract: team lines are re-parsed into the registry at load time, and
//! table audit lines (rendered by [`Table::audit_line`]) are appended on
//! every create/finalize/correction event.
//!
//! [`Table::audit_line`]: crate::rotation::Table::audit_line

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::constants::NO_PARTNER;
use crate::errors::RotationError;
use crate::team::{Team, TeamNumber};

/// One persisted team line: `<number> | <player> & <partner_or_*>`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TeamLine {
    pub number: TeamNumber,
    pub player: String,
    pub partner: Option<String>,
}

impl From<&Team> for TeamLine {
    fn from(team: &Team) -> Self {
        Self {
            number: team.number(),
            player: team.player().to_string(),
            partner: team.partner().map(str::to_string),
        }
    }
}

impl fmt::Display for TeamLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:2} | {} & {}",
            self.number,
            self.player,
            self.partner.as_deref().unwrap_or(NO_PARTNER)
        )
    }
}

impl FromStr for TeamLine {
    type Err = RotationError;

    /// Whitespace-tolerant parse. A `"*"` or empty partner field means a
    /// solo team.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || RotationError::MalformedRecord(line.to_string());
        let (number, names) = line.split_once('|').ok_or_else(malformed)?;
        let number: TeamNumber = number.trim().parse().map_err(|_| malformed())?;
        let (player, partner) = names.split_once('&').ok_or_else(malformed)?;
        let player = player.trim();
        if player.is_empty() {
            return Err(malformed());
        }
        let partner = match partner.trim() {
            "" | NO_PARTNER => None,
            name => Some(name.to_string()),
        };
        Ok(Self {
            number,
            player: player.to_string(),
            partner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_line_round_trips() {
        let line = TeamLine {
            number: 4,
            player: "Alice".to_string(),
            partner: Some("Bob".to_string()),
        };
        let rendered = line.to_string();
        assert_eq!(rendered, " 4 | Alice & Bob");
        assert_eq!(rendered.parse::<TeamLine>().unwrap(), line);
    }

    #[test]
    fn solo_partner_renders_and_parses_as_sentinel() {
        let line = TeamLine {
            number: 0,
            player: "Cara".to_string(),
            partner: None,
        };
        assert_eq!(line.to_string(), " 0 | Cara & *");
        let parsed: TeamLine = "0 | Cara & *".parse().unwrap();
        assert_eq!(parsed.partner, None);
    }

    #[test]
    fn parse_tolerates_loose_whitespace() {
        let parsed: TeamLine = "  12 |  Toni  &   ".parse().unwrap();
        assert_eq!(parsed.number, 12);
        assert_eq!(parsed.player, "Toni");
        assert_eq!(parsed.partner, None);
    }

    #[test]
    fn malformed_lines_are_reported() {
        for line in ["", "x | A & B", "3 - A & B", "3 | & B", "3 | A"] {
            assert!(matches!(
                line.parse::<TeamLine>(),
                Err(RotationError::MalformedRecord(_))
            ));
        }
    }
}
