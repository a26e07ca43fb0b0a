//! Rule tunables and the player roster.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_GO_SALARY, DEFAULT_JAIL_FINE, DEFAULT_STARTING_BALANCE, MAX_PLAYERS, MIN_PLAYERS,
};
use crate::ledger::PlayerId;

const DEFAULT_RULES_DATA: &str = include_str!("../data/rules.json");
const DEFAULT_ROSTER_DATA: &str = include_str!("../data/roster.json");

/// Errors raised when rules or roster data violate their invariants.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("a game needs between {min} and {max} players (got {found})")]
    PlayerCount {
        min: usize,
        max: usize,
        found: usize,
    },
    #[error("token {token} is claimed by more than one player")]
    DuplicateToken { token: u32 },
    #[error("roster entry {index} has an empty name")]
    EmptyName { index: usize },
}

/// Money rules a host may tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_starting_balance")]
    pub starting_balance: i64,
    #[serde(default = "RulesConfig::default_jail_fine")]
    pub jail_fine: u32,
    /// Paid each time a token passes or lands on Go; 0 turns it off.
    #[serde(default = "RulesConfig::default_go_salary")]
    pub go_salary: u32,
}

impl RulesConfig {
    #[must_use]
    pub const fn default_starting_balance() -> i64 {
        DEFAULT_STARTING_BALANCE
    }

    #[must_use]
    pub const fn default_jail_fine() -> u32 {
        DEFAULT_JAIL_FINE
    }

    #[must_use]
    pub const fn default_go_salary() -> u32 {
        DEFAULT_GO_SALARY
    }

    /// Parse and validate rules from JSON; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Rules bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled data has been corrupted.
    pub fn load_from_static() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_RULES_DATA)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MinViolation`] when the starting balance is negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_balance < 0 {
            return Err(ConfigError::MinViolation {
                field: "starting_balance",
                min: 0,
                value: self.starting_balance,
            });
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            starting_balance: Self::default_starting_balance(),
            jail_fine: Self::default_jail_fine(),
            go_salary: Self::default_go_salary(),
        }
    }
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    /// Token id; doubles as the player id.
    pub token: u32,
    #[serde(default)]
    pub color: String,
}

impl RosterEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, token: u32, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token,
            color: color.into(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> PlayerId {
        PlayerId(self.token)
    }
}

/// Ordered list of players; the first entry acts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub players: Vec<RosterEntry>,
}

impl Roster {
    /// Build and validate a roster.
    ///
    /// # Errors
    ///
    /// See [`Roster::validate`].
    pub fn new(players: Vec<RosterEntry>) -> Result<Self, ConfigError> {
        let roster = Self { players };
        roster.validate()?;
        Ok(roster)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or an invalid roster.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let roster: Self = serde_json::from_str(json)?;
        roster.validate()?;
        Ok(roster)
    }

    /// The four-player table bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled data has been corrupted.
    pub fn load_from_static() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_ROSTER_DATA)
    }

    /// Check player count, names and token uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let found = self.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&found) {
            return Err(ConfigError::PlayerCount {
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
                found,
            });
        }
        for (index, entry) in self.players.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::EmptyName { index });
            }
            if self.players[..index]
                .iter()
                .any(|earlier| earlier.token == entry.token)
            {
                return Err(ConfigError::DuplicateToken { token: entry.token });
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.players.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
