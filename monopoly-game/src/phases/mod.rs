//! Turn phases driven by [`crate::engine::TurnEngine`].
//!
//! Every phase owns the committed [`GameContext`] it was entered with. Phases
//! never mutate that context; they build the next one from a clone and hand it
//! to the phase they transition to.

mod end_turn;
mod in_jail;
mod new_game;
mod pay_rent;
mod roll_dice;
mod unowned_property;

pub use end_turn::EndTurn;
pub use in_jail::InJail;
pub use new_game::NewGame;
pub use pay_rent::{PayRent, RentShortfall};
pub use roll_dice::RollDice;
pub use unowned_property::UnownedProperty;

use crate::context::GameContext;
use crate::engine::{Awaiting, EngineError, GameEvent, Outbox, PhaseKind, Step};

/// Hooks the engine calls on the phase at the top of its stack.
trait PhaseBehavior {
    fn kind(&self) -> PhaseKind;

    fn context(&self) -> &GameContext;

    fn awaiting(&self) -> Awaiting {
        Awaiting::Nothing
    }

    fn on_enter(&mut self, _outbox: &mut Outbox) -> Result<(), EngineError> {
        log::trace!("enter {}", self.kind());
        Ok(())
    }

    fn execute(&mut self, outbox: &mut Outbox) -> Result<Step, EngineError>;

    fn handle(&mut self, event: GameEvent, _outbox: &mut Outbox) -> Result<Step, EngineError> {
        Err(EngineError::UnexpectedEvent {
            phase: self.kind(),
            event,
        })
    }

    fn on_exit(&mut self) {
        log::trace!("exit {}", self.kind());
    }
}

#[derive(Debug, Clone)]
pub enum Phase {
    NewGame(NewGame),
    RollDice(RollDice),
    UnownedProperty(UnownedProperty),
    PayRent(PayRent),
    InJail(InJail),
    EndTurn(EndTurn),
}

impl Phase {
    #[must_use]
    pub const fn new_game(context: GameContext) -> Self {
        Self::NewGame(NewGame::new(context))
    }

    #[must_use]
    pub const fn roll_dice(context: GameContext) -> Self {
        Self::RollDice(RollDice::new(context))
    }

    #[must_use]
    pub const fn unowned_property(context: GameContext, position: u8) -> Self {
        Self::UnownedProperty(UnownedProperty::new(context, position))
    }

    #[must_use]
    pub const fn pay_rent(context: GameContext, position: u8) -> Self {
        Self::PayRent(PayRent::new(context, position))
    }

    #[must_use]
    pub const fn in_jail(context: GameContext) -> Self {
        Self::InJail(InJail::new(context))
    }

    #[must_use]
    pub const fn end_turn(context: GameContext) -> Self {
        Self::EndTurn(EndTurn::new(context))
    }

    fn behavior(&self) -> &dyn PhaseBehavior {
        match self {
            Self::NewGame(phase) => phase,
            Self::RollDice(phase) => phase,
            Self::UnownedProperty(phase) => phase,
            Self::PayRent(phase) => phase,
            Self::InJail(phase) => phase,
            Self::EndTurn(phase) => phase,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn PhaseBehavior {
        match self {
            Self::NewGame(phase) => phase,
            Self::RollDice(phase) => phase,
            Self::UnownedProperty(phase) => phase,
            Self::PayRent(phase) => phase,
            Self::InJail(phase) => phase,
            Self::EndTurn(phase) => phase,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PhaseKind {
        self.behavior().kind()
    }

    #[must_use]
    pub fn context(&self) -> &GameContext {
        self.behavior().context()
    }

    #[must_use]
    pub fn awaiting(&self) -> Awaiting {
        self.behavior().awaiting()
    }

    #[must_use]
    pub const fn rent_shortfall(&self) -> Option<&RentShortfall> {
        match self {
            Self::PayRent(phase) => phase.shortfall(),
            _ => None,
        }
    }

    pub(crate) fn on_enter(&mut self, outbox: &mut Outbox) -> Result<(), EngineError> {
        self.behavior_mut().on_enter(outbox)
    }

    pub(crate) fn execute(&mut self, outbox: &mut Outbox) -> Result<Step, EngineError> {
        self.behavior_mut().execute(outbox)
    }

    pub(crate) fn handle(
        &mut self,
        event: GameEvent,
        outbox: &mut Outbox,
    ) -> Result<Step, EngineError> {
        self.behavior_mut().handle(event, outbox)
    }

    pub(crate) fn on_exit(&mut self) {
        self.behavior_mut().on_exit();
    }
}
