use super::{Phase, PhaseBehavior};
use crate::context::GameContext;
use crate::engine::{EngineError, Outbox, PhaseKind, Step};

/// Passes the turn to the next player in the queue.
#[derive(Debug, Clone)]
pub struct EndTurn {
    context: GameContext,
}

impl EndTurn {
    #[must_use]
    pub const fn new(context: GameContext) -> Self {
        Self { context }
    }
}

impl PhaseBehavior for EndTurn {
    fn kind(&self) -> PhaseKind {
        PhaseKind::EndTurn
    }

    fn context(&self) -> &GameContext {
        &self.context
    }

    fn execute(&mut self, _outbox: &mut Outbox) -> Result<Step, EngineError> {
        let mut next = self.context.clone();
        let finished = next.active_player();
        let player = next.turn_order_mut().rotate();
        log::info!("turn passes from player {finished} to player {player}");
        let phase = if next.active()?.in_jail() {
            Phase::in_jail(next)
        } else {
            Phase::roll_dice(next)
        };
        Ok(Step::Change(phase))
    }
}
