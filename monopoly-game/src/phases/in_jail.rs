use super::{Phase, PhaseBehavior};
use crate::context::GameContext;
use crate::engine::{
    Awaiting, EngineError, Feature, GameEvent, Notification, Outbox, PhaseKind, Step,
};
use crate::ledger::EntryReason;

/// Start of a jailed player's turn: pay, use a card, or (eventually) roll.
#[derive(Debug, Clone)]
pub struct InJail {
    context: GameContext,
    can_pay_fine: bool,
    can_use_card: bool,
}

impl InJail {
    #[must_use]
    pub const fn new(context: GameContext) -> Self {
        Self {
            context,
            can_pay_fine: false,
            can_use_card: false,
        }
    }

    fn pay_fine(&self, outbox: &mut Outbox) -> Result<Step, EngineError> {
        let player = self.context.active_player();
        if !self.can_pay_fine {
            return Err(EngineError::ActionUnavailable {
                action: "pay the jail fine",
                player,
            });
        }
        let fine = self.context.rules().jail_fine;
        let mut next = self.context.clone();
        let balance = next
            .ledger_mut()
            .debit(player, fine, EntryReason::JailFine)?;
        next.ledger_mut().release_from_jail(player)?;
        log::info!("player {player} paid {fine} to leave jail");
        outbox.push(Notification::UpdateBalance { player, balance });
        Ok(Step::Change(Phase::roll_dice(next)))
    }

    fn use_card(&self) -> Result<Step, EngineError> {
        let player = self.context.active_player();
        if !self.can_use_card {
            return Err(EngineError::ActionUnavailable {
                action: "use a get-out-of-jail-free card",
                player,
            });
        }
        let mut next = self.context.clone();
        let left = next.ledger_mut().use_jail_card(player)?;
        next.ledger_mut().release_from_jail(player)?;
        log::info!("player {player} used a card to leave jail ({left} left)");
        Ok(Step::Change(Phase::roll_dice(next)))
    }
}

impl PhaseBehavior for InJail {
    fn kind(&self) -> PhaseKind {
        PhaseKind::InJail
    }

    fn context(&self) -> &GameContext {
        &self.context
    }

    fn awaiting(&self) -> Awaiting {
        Awaiting::JailDecision {
            can_pay_fine: self.can_pay_fine,
            can_use_card: self.can_use_card,
        }
    }

    fn on_enter(&mut self, outbox: &mut Outbox) -> Result<(), EngineError> {
        let player = self.context.active()?;
        self.can_pay_fine = player.can_cover(self.context.rules().jail_fine);
        self.can_use_card = player.jail_cards() > 0;
        outbox.push(Notification::HighlightActivePlayer { player: player.id });
        outbox.push(Notification::ShowJailActions {
            can_pay_fine: self.can_pay_fine,
            can_use_card: self.can_use_card,
        });
        Ok(())
    }

    fn execute(&mut self, _outbox: &mut Outbox) -> Result<Step, EngineError> {
        Ok(Step::Await)
    }

    fn handle(&mut self, event: GameEvent, outbox: &mut Outbox) -> Result<Step, EngineError> {
        match event {
            GameEvent::PayFineClicked => self.pay_fine(outbox),
            GameEvent::UseCardClicked => self.use_card(),
            GameEvent::RollForDoublesClicked => {
                Err(EngineError::NotImplemented(Feature::RollForDoubles))
            }
            _ => Err(EngineError::UnexpectedEvent {
                phase: self.kind(),
                event,
            }),
        }
    }
}
