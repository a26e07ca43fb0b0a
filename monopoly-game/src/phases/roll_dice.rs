use super::{Phase, PhaseBehavior};
use crate::board::SpaceType;
use crate::constants::POSITION_JAIL;
use crate::context::GameContext;
use crate::engine::{Awaiting, EngineError, GameEvent, Notification, Outbox, PhaseKind, Step};
use crate::ledger::EntryReason;

#[derive(Debug, Clone)]
enum Stage {
    AwaitingRoll,
    /// Dice thrown and token moved in the staged context; waiting for the
    /// movement to finish on screen.
    Moving(Box<GameContext>),
    Landed,
}

/// Throws the dice for the active player and routes them by landing space.
#[derive(Debug, Clone)]
pub struct RollDice {
    context: GameContext,
    stage: Stage,
}

impl RollDice {
    #[must_use]
    pub const fn new(context: GameContext) -> Self {
        Self {
            context,
            stage: Stage::AwaitingRoll,
        }
    }

    fn roll(&mut self, outbox: &mut Outbox) -> Result<Step, EngineError> {
        let mut next = self.context.clone();
        let player = next.active_player();
        let roll = next.board_mut().roll_dice();
        let advance = next
            .board_mut()
            .advance_token(player, i32::from(roll.total()))?;
        outbox.push(Notification::DiceRolled { player, roll });

        let salary = next.rules().go_salary;
        if advance.passed_go() && salary > 0 {
            let amount = salary.saturating_mul(advance.laps);
            let balance = next.ledger_mut().credit(
                player,
                amount,
                EntryReason::GoSalary { laps: advance.laps },
            )?;
            outbox.push(Notification::UpdateBalance { player, balance });
        }

        log::info!(
            "player {player} rolled {roll}: {} -> {}",
            advance.from,
            advance.to
        );
        outbox.push(Notification::MoveToken {
            token: player,
            from: advance.from,
            to: advance.to,
        });
        self.stage = Stage::Moving(Box::new(next));
        Ok(Step::Await)
    }
}

fn land(mut next: GameContext, outbox: &mut Outbox) -> Result<Step, EngineError> {
    let player = next.active_player();
    let position = next.board().token_position(player)?;
    let space = next.board().space_type(position)?;
    let phase = match space {
        SpaceType::Property => match next.registry().owner_of(position)? {
            None => Phase::unowned_property(next, position),
            Some(owner) if owner == player => {
                log::debug!("player {player} landed on their own property at {position}");
                Phase::end_turn(next)
            }
            Some(_) => Phase::pay_rent(next, position),
        },
        SpaceType::GoToJail => {
            next.board_mut().set_token_position(player, POSITION_JAIL)?;
            next.ledger_mut().send_to_jail(player)?;
            outbox.push(Notification::MoveToken {
                token: player,
                from: position,
                to: POSITION_JAIL,
            });
            log::info!("player {player} is sent to jail");
            Phase::end_turn(next)
        }
        SpaceType::Chance
        | SpaceType::CommunityChest
        | SpaceType::IncomeTax
        | SpaceType::LuxuryTax => {
            log::info!("no {space} effect is applied at {position}; ending turn");
            Phase::end_turn(next)
        }
        SpaceType::Go | SpaceType::Jail | SpaceType::FreeParking => Phase::end_turn(next),
    };
    Ok(Step::Change(phase))
}

impl PhaseBehavior for RollDice {
    fn kind(&self) -> PhaseKind {
        PhaseKind::RollDice
    }

    fn context(&self) -> &GameContext {
        &self.context
    }

    fn awaiting(&self) -> Awaiting {
        match self.stage {
            Stage::AwaitingRoll => Awaiting::Roll,
            Stage::Moving(_) => Awaiting::Arrival,
            Stage::Landed => Awaiting::Nothing,
        }
    }

    fn on_enter(&mut self, outbox: &mut Outbox) -> Result<(), EngineError> {
        outbox.push(Notification::HighlightActivePlayer {
            player: self.context.active_player(),
        });
        Ok(())
    }

    fn execute(&mut self, _outbox: &mut Outbox) -> Result<Step, EngineError> {
        Ok(Step::Await)
    }

    fn handle(&mut self, event: GameEvent, outbox: &mut Outbox) -> Result<Step, EngineError> {
        match event {
            GameEvent::RollRequested if matches!(self.stage, Stage::AwaitingRoll) => {
                self.roll(outbox)
            }
            GameEvent::TransitionComplete => {
                if let Stage::Moving(next) = &self.stage {
                    let step = land(GameContext::clone(next), outbox)?;
                    self.stage = Stage::Landed;
                    return Ok(step);
                }
                Err(EngineError::UnexpectedEvent {
                    phase: self.kind(),
                    event,
                })
            }
            _ => Err(EngineError::UnexpectedEvent {
                phase: self.kind(),
                event,
            }),
        }
    }
}
