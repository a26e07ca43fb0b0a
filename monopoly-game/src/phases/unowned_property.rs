use super::{Phase, PhaseBehavior};
use crate::context::GameContext;
use crate::engine::{
    Awaiting, EngineError, Feature, GameEvent, Notification, Outbox, PhaseKind, Step,
};
use crate::ledger::EntryReason;

/// Offers the property under the active token for sale.
#[derive(Debug, Clone)]
pub struct UnownedProperty {
    context: GameContext,
    position: u8,
    can_buy: bool,
}

impl UnownedProperty {
    #[must_use]
    pub const fn new(context: GameContext, position: u8) -> Self {
        Self {
            context,
            position,
            can_buy: false,
        }
    }

    #[must_use]
    pub const fn position(&self) -> u8 {
        self.position
    }

    /// Strictly more cash than the asking price.
    fn affordable(&self) -> Result<bool, EngineError> {
        let price = self.context.registry().property(self.position)?.price;
        Ok(self.context.active()?.balance() > i64::from(price))
    }

    fn buy(&self, position: u8, outbox: &mut Outbox) -> Result<Step, EngineError> {
        if position != self.position {
            return Err(EngineError::PositionMismatch {
                requested: position,
                actual: self.position,
            });
        }
        let player = self.context.active_player();
        if !self.affordable()? {
            return Err(EngineError::ActionUnavailable {
                action: "buy this property",
                player,
            });
        }

        let mut next = self.context.clone();
        let property = next.registry().property(position)?;
        let (name, price) = (property.name.clone(), property.price);
        let balance = next
            .ledger_mut()
            .debit(player, price, EntryReason::Purchase { position })?;
        next.registry_mut().assign_owner(position, player)?;
        let level = next.registry().development_level(position)?;
        log::info!("player {player} bought '{name}' for {price}");

        outbox.push(Notification::RecolorProperty {
            position,
            owner: player,
            level,
        });
        outbox.push(Notification::UpdateBalance { player, balance });
        Ok(Step::Change(Phase::end_turn(next)))
    }
}

impl PhaseBehavior for UnownedProperty {
    fn kind(&self) -> PhaseKind {
        PhaseKind::UnownedProperty
    }

    fn context(&self) -> &GameContext {
        &self.context
    }

    fn awaiting(&self) -> Awaiting {
        Awaiting::PropertyDecision {
            position: self.position,
            can_buy: self.can_buy,
        }
    }

    fn on_enter(&mut self, outbox: &mut Outbox) -> Result<(), EngineError> {
        self.can_buy = self.affordable()?;
        outbox.push(Notification::ShowPropertyActions {
            position: self.position,
            can_buy: self.can_buy,
        });
        Ok(())
    }

    fn execute(&mut self, _outbox: &mut Outbox) -> Result<Step, EngineError> {
        Ok(Step::Await)
    }

    fn handle(&mut self, event: GameEvent, outbox: &mut Outbox) -> Result<Step, EngineError> {
        match event {
            GameEvent::BuyClicked { position } => self.buy(position, outbox),
            GameEvent::AuctionClicked { .. } => Err(EngineError::NotImplemented(Feature::Auction)),
            GameEvent::ManageClicked => {
                Err(EngineError::NotImplemented(Feature::PropertyManagement))
            }
            _ => Err(EngineError::UnexpectedEvent {
                phase: self.kind(),
                event,
            }),
        }
    }
}
