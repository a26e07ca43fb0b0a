use serde::{Deserialize, Serialize};

use super::{Phase, PhaseBehavior};
use crate::context::GameContext;
use crate::engine::{
    Awaiting, EngineError, Feature, GameEvent, Notification, Outbox, PhaseKind, Step,
};
use crate::ledger::{LedgerError, PlayerId};
use crate::rent::rent_due;

/// Rent the payer could not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentShortfall {
    pub payer: PlayerId,
    pub owner: PlayerId,
    pub position: u8,
    pub amount: u32,
    pub balance: i64,
}

/// Charges the active player rent for landing on someone else's property.
#[derive(Debug, Clone)]
pub struct PayRent {
    context: GameContext,
    position: u8,
    shortfall: Option<RentShortfall>,
}

impl PayRent {
    #[must_use]
    pub const fn new(context: GameContext, position: u8) -> Self {
        Self {
            context,
            position,
            shortfall: None,
        }
    }

    #[must_use]
    pub const fn position(&self) -> u8 {
        self.position
    }

    #[must_use]
    pub const fn shortfall(&self) -> Option<&RentShortfall> {
        self.shortfall.as_ref()
    }
}

impl PhaseBehavior for PayRent {
    fn kind(&self) -> PhaseKind {
        PhaseKind::PayRent
    }

    fn context(&self) -> &GameContext {
        &self.context
    }

    fn awaiting(&self) -> Awaiting {
        if self.shortfall.is_some() {
            Awaiting::DebtResolution
        } else {
            Awaiting::Nothing
        }
    }

    fn execute(&mut self, outbox: &mut Outbox) -> Result<Step, EngineError> {
        if self.shortfall.is_some() {
            return Ok(Step::Await);
        }
        let payer = self.context.active_player();
        let quote = rent_due(
            self.context.registry(),
            self.position,
            self.context.last_roll(),
        )?;
        let mut next = self.context.clone();
        match next.ledger_mut().transfer(payer, quote.owner, quote.amount) {
            Ok(receipt) => {
                log::info!(
                    "player {payer} paid {} rent to player {} for position {} ({:?})",
                    quote.amount,
                    quote.owner,
                    self.position,
                    quote.basis
                );
                outbox.push(Notification::UpdateBalance {
                    player: payer,
                    balance: receipt.from_balance,
                });
                outbox.push(Notification::UpdateBalance {
                    player: quote.owner,
                    balance: receipt.to_balance,
                });
                Ok(Step::Change(Phase::end_turn(next)))
            }
            Err(LedgerError::InsufficientFunds { balance, .. }) => {
                let shortfall = RentShortfall {
                    payer,
                    owner: quote.owner,
                    position: self.position,
                    amount: quote.amount,
                    balance,
                };
                log::warn!(
                    "player {payer} owes {} rent to player {} but holds {balance}",
                    quote.amount,
                    quote.owner
                );
                self.shortfall = Some(shortfall);
                outbox.push(Notification::RentShortfall(shortfall));
                Ok(Step::Await)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn handle(&mut self, event: GameEvent, _outbox: &mut Outbox) -> Result<Step, EngineError> {
        if self.shortfall.is_some() {
            return Err(EngineError::NotImplemented(Feature::BankruptcyResolution));
        }
        Err(EngineError::UnexpectedEvent {
            phase: self.kind(),
            event,
        })
    }
}
