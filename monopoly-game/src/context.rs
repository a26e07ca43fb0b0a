//! Snapshot of everything a phase reads and writes.
//!
//! A context becomes immutable once a phase owns it. Phases that change the
//! game clone their context, apply rules to the clone, and hand the clone to
//! the next phase; a failed check therefore never leaves a half-applied move
//! behind.

use std::sync::Arc;

use crate::board::Board;
use crate::catalog::PropertyCatalog;
use crate::config::{ConfigError, Roster, RulesConfig};
use crate::dice::{Dice, DiceRoll};
use crate::engine::EngineError;
use crate::ledger::{Player, PlayerId, PlayerLedger, TurnOrder};
use crate::registry::PropertyRegistry;

#[derive(Debug, Clone)]
pub struct GameContext {
    board: Board,
    registry: PropertyRegistry,
    ledger: PlayerLedger,
    turn_order: TurnOrder,
    rules: RulesConfig,
}

impl GameContext {
    /// Seat the roster, open a fresh registry and prepare the dice.
    ///
    /// Tokens are placed on the board by the new-game phase, not here.
    ///
    /// # Errors
    ///
    /// Returns an error when the roster or the rules fail validation.
    pub fn new(
        catalog: Arc<PropertyCatalog>,
        roster: &Roster,
        rules: RulesConfig,
        dice: Dice,
    ) -> Result<Self, EngineError> {
        roster.validate()?;
        rules.validate()?;
        let ledger = PlayerLedger::from_roster(&roster.players, rules.starting_balance)?;
        let turn_order = TurnOrder::new(ledger.ids()).ok_or(ConfigError::PlayerCount {
            min: crate::constants::MIN_PLAYERS,
            max: crate::constants::MAX_PLAYERS,
            found: 0,
        })?;
        Ok(Self {
            board: Board::new(dice),
            registry: PropertyRegistry::new(catalog),
            ledger,
            turn_order,
            rules,
        })
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn ledger(&self) -> &PlayerLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn turn_order(&self) -> &TurnOrder {
        &self.turn_order
    }

    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    #[must_use]
    pub const fn active_player(&self) -> PlayerId {
        self.turn_order.active()
    }

    /// Record of the player whose turn it is.
    ///
    /// # Errors
    ///
    /// Fails only if the turn order names a player missing from the ledger.
    pub fn active(&self) -> Result<&Player, EngineError> {
        Ok(self.ledger.player(self.active_player())?)
    }

    #[must_use]
    pub const fn last_roll(&self) -> DiceRoll {
        self.board.last_roll()
    }

    /// Mutable board, for staging a context before the engine owns it.
    pub const fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Mutable registry, for staging a context before the engine owns it.
    pub const fn registry_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.registry
    }

    /// Mutable ledger, for staging a context before the engine owns it.
    pub const fn ledger_mut(&mut self) -> &mut PlayerLedger {
        &mut self.ledger
    }

    pub(crate) const fn turn_order_mut(&mut self) -> &mut TurnOrder {
        &mut self.turn_order
    }
}
