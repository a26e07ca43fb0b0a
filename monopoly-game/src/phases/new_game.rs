use super::{Phase, PhaseBehavior};
use crate::context::GameContext;
use crate::engine::{EngineError, Notification, Outbox, PhaseKind, Step};

/// Places every player's token on Go and hands the first turn out.
#[derive(Debug, Clone)]
pub struct NewGame {
    context: GameContext,
}

impl NewGame {
    #[must_use]
    pub const fn new(context: GameContext) -> Self {
        Self { context }
    }
}

impl PhaseBehavior for NewGame {
    fn kind(&self) -> PhaseKind {
        PhaseKind::NewGame
    }

    fn context(&self) -> &GameContext {
        &self.context
    }

    fn execute(&mut self, outbox: &mut Outbox) -> Result<Step, EngineError> {
        let mut next = self.context.clone();
        let tokens: Vec<_> = next.ledger().ids().collect();
        for token in tokens {
            next.board_mut().add_token(token)?;
            outbox.push(Notification::PlaceTokenAtGo { token });
        }
        log::info!(
            "new game with {} players; player {} starts",
            next.ledger().len(),
            next.active_player()
        );
        Ok(Step::Change(Phase::roll_dice(next)))
    }
}
