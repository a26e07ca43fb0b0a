//! Monopoly Game Engine
//!
//! Platform-agnostic rule engine for a turn-based Monopoly game: board and
//! dice, property ownership and rent, player balances, and a stack-based turn
//! state machine. Rendering is left to the host, which feeds UI events in and
//! drains render requests out.

pub mod board;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod context;
pub mod dice;
pub mod engine;
pub mod ledger;
pub mod phases;
pub mod registry;
pub mod rent;
pub mod session;

use std::sync::Arc;

use anyhow::Context as _;
use thiserror::Error;

// Re-export commonly used types
pub use board::{Advance, Board, BoardError, SpaceType, space_type_at};
pub use catalog::{
    CatalogError, ColorGroup, Property, PropertyCatalog, PropertyClass, PropertyKind, Street,
};
pub use config::{ConfigError, Roster, RosterEntry, RulesConfig};
pub use context::GameContext;
pub use dice::{Dice, DiceError, DiceRoll};
pub use engine::{
    Awaiting, EngineError, EngineStatus, Feature, GameEvent, Notification, Outbox, PhaseKind,
    StackOp, Step, TransitionRecord, TurnEngine,
};
pub use ledger::{
    EntryReason, LedgerEntry, LedgerError, Player, PlayerId, PlayerLedger, TransferReceipt,
    TurnOrder,
};
pub use phases::{Phase, RentShortfall};
pub use registry::{PropertyAssignment, PropertyRegistry, RegistryError};
pub use rent::{RentBasis, RentError, RentQuote, rent_due, railroad_rent, street_rent, utility_rent};
pub use session::{GameSession, GameSetup};

/// Config names understood by [`DataLoader::load_config`].
pub const RULES_CONFIG: &str = "rules";
pub const ROSTER_CONFIG: &str = "roster";

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the property catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the property data cannot be loaded.
    fn load_catalog(&self) -> Result<PropertyCatalog, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

#[derive(Debug, Error)]
pub enum StaticDataError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("malformed bundled config '{name}': {source}")]
    Parse {
        name: String,
        source: serde_json::Error,
    },
    #[error("no bundled config named '{0}'")]
    UnknownConfig(String),
}

/// Serves the data files compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = StaticDataError;

    fn load_catalog(&self) -> Result<PropertyCatalog, Self::Error> {
        Ok(PropertyCatalog::load_from_static()?)
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let raw = match config_name {
            RULES_CONFIG => include_str!("../data/rules.json"),
            ROSTER_CONFIG => include_str!("../data/roster.json"),
            other => return Err(StaticDataError::UnknownConfig(other.to_string())),
        };
        serde_json::from_str(raw).map_err(|source| StaticDataError::Parse {
            name: config_name.to_string(),
            source,
        })
    }
}

/// Main game engine for creating game sessions
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Assemble a game from the loader's catalog, roster and rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any data set cannot be loaded or fails validation.
    pub fn setup(&self, seed: u64) -> anyhow::Result<GameSetup> {
        let catalog = self
            .data_loader
            .load_catalog()
            .context("loading property catalog")?;
        let rules: RulesConfig = self
            .data_loader
            .load_config(RULES_CONFIG)
            .context("loading rules config")?;
        rules.validate().context("validating rules config")?;
        let roster: Roster = self
            .data_loader
            .load_config(ROSTER_CONFIG)
            .context("loading player roster")?;
        roster.validate().context("validating player roster")?;
        Ok(GameSetup::new()
            .with_catalog(Arc::new(catalog))
            .with_roster(roster)
            .with_rules(rules)
            .with_seed(seed))
    }

    /// Create and start a game with the specified seed
    ///
    /// # Errors
    ///
    /// Returns an error if data cannot be loaded or the game cannot start.
    pub fn create_session(&self, seed: u64) -> anyhow::Result<GameSession> {
        self.setup(seed)?
            .start()
            .with_context(|| format!("starting game with seed {seed}"))
    }

    /// Create a game whose first rolls are forced.
    ///
    /// # Errors
    ///
    /// Returns an error if data cannot be loaded or the game cannot start.
    pub fn create_scripted_session(
        &self,
        seed: u64,
        rolls: impl IntoIterator<Item = DiceRoll>,
    ) -> anyhow::Result<GameSession> {
        self.setup(seed)?
            .with_scripted_rolls(rolls)
            .start()
            .with_context(|| format!("starting scripted game with seed {seed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FixtureLoader {
        configs: RefCell<HashMap<String, String>>,
    }

    impl FixtureLoader {
        fn with_config(self, name: &str, json: &str) -> Self {
            self.configs
                .borrow_mut()
                .insert(name.to_string(), json.to_string());
            self
        }
    }

    impl DataLoader for FixtureLoader {
        type Error = StaticDataError;

        fn load_catalog(&self) -> Result<PropertyCatalog, Self::Error> {
            StaticDataLoader.load_catalog()
        }

        fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            let configs = self.configs.borrow();
            let raw = configs
                .get(config_name)
                .ok_or_else(|| StaticDataError::UnknownConfig(config_name.to_string()))?;
            serde_json::from_str(raw).map_err(|source| StaticDataError::Parse {
                name: config_name.to_string(),
                source,
            })
        }
    }

    const TWO_PLAYERS: &str = r#"{"players": [
        {"name": "Alice", "token": 2, "color": "blue"},
        {"name": "Bob", "token": 3, "color": "green"}
    ]}"#;

    #[test]
    fn static_loader_serves_bundled_data() {
        let engine = GameEngine::new(StaticDataLoader);
        let session = engine.create_session(5).unwrap();
        assert_eq!(session.context().unwrap().ledger().len(), 4);
        assert!(matches!(
            StaticDataLoader.load_config::<RulesConfig>("weather"),
            Err(StaticDataError::UnknownConfig(name)) if name == "weather"
        ));
    }

    #[test]
    fn fixture_loader_drives_session() {
        let loader = FixtureLoader::default()
            .with_config(RULES_CONFIG, r#"{"starting_balance": 900}"#)
            .with_config(ROSTER_CONFIG, TWO_PLAYERS);
        let engine = GameEngine::new(loader);
        let mut session = engine
            .create_scripted_session(1, [DiceRoll::new(6, 6).unwrap()])
            .unwrap();
        assert_eq!(session.active_player().unwrap(), PlayerId(2));
        assert_eq!(session.balance(PlayerId(3)).unwrap(), 900);
        assert_eq!(session.roll_and_move().unwrap(), 12);
        assert_eq!(
            session.awaiting(),
            Awaiting::PropertyDecision {
                position: 12,
                can_buy: true
            }
        );
    }

    #[test]
    fn missing_config_reports_context() {
        let loader = FixtureLoader::default().with_config(RULES_CONFIG, "{}");
        let err = GameEngine::new(loader).create_session(1).unwrap_err();
        assert!(format!("{err:#}").contains("loading player roster"));
    }

    #[test]
    fn invalid_roster_is_rejected() {
        let loader = FixtureLoader::default()
            .with_config(RULES_CONFIG, "{}")
            .with_config(
                ROSTER_CONFIG,
                r#"{"players": [{"name": "Solo", "token": 1}]}"#,
            );
        let err = GameEngine::new(loader).create_session(1).unwrap_err();
        assert!(format!("{err:#}").contains("validating player roster"));
    }
}
