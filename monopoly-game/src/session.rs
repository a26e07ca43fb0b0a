//! Game assembly and the session wrapper hosts drive.

use std::sync::Arc;

use crate::catalog::PropertyCatalog;
use crate::config::{Roster, RulesConfig};
use crate::context::GameContext;
use crate::dice::{Dice, DiceRoll};
use crate::engine::{
    Awaiting, EngineError, GameEvent, Notification, TransitionRecord, TurnEngine,
};
use crate::ledger::PlayerId;
use crate::phases::RentShortfall;

/// Builder for a [`GameSession`]; unset parts fall back to the bundled data.
#[derive(Debug, Clone, Default)]
pub struct GameSetup {
    catalog: Option<Arc<PropertyCatalog>>,
    roster: Option<Roster>,
    rules: RulesConfig,
    seed: u64,
    script: Vec<DiceRoll>,
}

impl GameSetup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<PropertyCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = Some(roster);
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Force the first rolls of the game, in order.
    #[must_use]
    pub fn with_scripted_rolls(mut self, rolls: impl IntoIterator<Item = DiceRoll>) -> Self {
        self.script.extend(rolls);
        self
    }

    /// Assemble the initial context without starting a game.
    ///
    /// # Errors
    ///
    /// Fails if bundled data is needed and cannot be loaded, or if the roster
    /// or rules are invalid.
    pub fn build_context(&self) -> Result<GameContext, EngineError> {
        let catalog = match &self.catalog {
            Some(catalog) => Arc::clone(catalog),
            None => Arc::new(PropertyCatalog::load_from_static()?),
        };
        let roster = match &self.roster {
            Some(roster) => roster.clone(),
            None => Roster::load_from_static()?,
        };
        let dice = Dice::with_script(self.seed, self.script.iter().copied());
        GameContext::new(catalog, &roster, self.rules, dice)
    }

    /// Build the context and run the new-game phase.
    ///
    /// # Errors
    ///
    /// See [`GameSetup::build_context`].
    pub fn start(&self) -> Result<GameSession, EngineError> {
        GameSession::start(self.build_context()?)
    }
}

/// A running game: the turn engine plus the seed it was dealt.
#[derive(Debug)]
pub struct GameSession {
    engine: TurnEngine,
    seed: u64,
}

impl GameSession {
    /// Start a game from a prepared context.
    ///
    /// # Errors
    ///
    /// Propagates failures from the new-game phase.
    pub fn start(context: GameContext) -> Result<Self, EngineError> {
        let seed = context.board().dice().seed();
        let engine = TurnEngine::start(context)?;
        Ok(Self { engine, seed })
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn engine(&self) -> &TurnEngine {
        &self.engine
    }

    /// # Errors
    ///
    /// See [`TurnEngine::dispatch`].
    pub fn dispatch(&mut self, event: GameEvent) -> Result<(), EngineError> {
        self.engine.dispatch(event)
    }

    /// Roll, acknowledge the move, and report where the roller landed.
    ///
    /// # Errors
    ///
    /// Fails if the engine is not waiting for a roll or the landing phase
    /// cannot be entered.
    pub fn roll_and_move(&mut self) -> Result<u8, EngineError> {
        let player = self.active_player()?;
        self.dispatch(GameEvent::RollRequested)?;
        self.dispatch(GameEvent::TransitionComplete)?;
        Ok(self.context()?.board().token_position(player)?)
    }

    /// Committed context of the current phase.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyStack`] once the engine has stopped.
    pub fn context(&self) -> Result<&GameContext, EngineError> {
        self.engine.context().ok_or(EngineError::EmptyStack)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::EmptyStack`] once the engine has stopped.
    pub fn active_player(&self) -> Result<PlayerId, EngineError> {
        Ok(self.context()?.active_player())
    }

    /// # Errors
    ///
    /// Fails for unknown players or a stopped engine.
    pub fn balance(&self, player: PlayerId) -> Result<i64, EngineError> {
        Ok(self.context()?.ledger().balance(player)?)
    }

    #[must_use]
    pub fn awaiting(&self) -> Awaiting {
        self.engine.awaiting()
    }

    #[must_use]
    pub fn rent_shortfall(&self) -> Option<&RentShortfall> {
        self.engine.rent_shortfall()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.engine.drain_notifications()
    }

    #[must_use]
    pub fn history(&self) -> &[TransitionRecord] {
        self.engine.history()
    }

    #[must_use]
    pub fn into_engine(self) -> TurnEngine {
        self.engine
    }
}
