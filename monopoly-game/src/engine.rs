//! Stack-based turn state machine.
//!
//! The engine owns a stack of [`Phase`]s. Entering a phase runs its entry hook
//! and then `execute`, which either waits for an external [`GameEvent`] or
//! asks for a stack operation. Requested operations are applied in a loop so a
//! chain of phases that never wait settles without recursion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::BoardError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::context::GameContext;
use crate::dice::DiceRoll;
use crate::ledger::{LedgerError, PlayerId};
use crate::phases::{Phase, RentShortfall};
use crate::registry::RegistryError;
use crate::rent::RentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    NewGame,
    RollDice,
    UnownedProperty,
    PayRent,
    InJail,
    EndTurn,
}

impl PhaseKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewGame => "new-game",
            Self::RollDice => "roll-dice",
            Self::UnownedProperty => "unowned-property",
            Self::PayRent => "pay-rent",
            Self::InJail => "in-jail",
            Self::EndTurn => "end-turn",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Input delivered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    RollRequested,
    /// The token movement animation finished.
    TransitionComplete,
    BuyClicked { position: u8 },
    AuctionClicked { position: u8 },
    ManageClicked,
    PayFineClicked,
    UseCardClicked,
    RollForDoublesClicked,
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RollRequested => f.write_str("roll requested"),
            Self::TransitionComplete => f.write_str("transition complete"),
            Self::BuyClicked { position } => write!(f, "buy clicked ({position})"),
            Self::AuctionClicked { position } => write!(f, "auction clicked ({position})"),
            Self::ManageClicked => f.write_str("manage clicked"),
            Self::PayFineClicked => f.write_str("pay fine clicked"),
            Self::UseCardClicked => f.write_str("use card clicked"),
            Self::RollForDoublesClicked => f.write_str("roll for doubles clicked"),
        }
    }
}

/// Rule areas that are recognised but deliberately not played out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Auction,
    PropertyManagement,
    RollForDoubles,
    BankruptcyResolution,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Auction => "auction",
            Self::PropertyManagement => "property management",
            Self::RollForDoubles => "rolling for doubles",
            Self::BankruptcyResolution => "bankruptcy resolution",
        })
    }
}

/// One-way render request for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum Notification {
    PlaceTokenAtGo {
        token: PlayerId,
    },
    MoveToken {
        token: PlayerId,
        from: u8,
        to: u8,
    },
    RecolorProperty {
        position: u8,
        owner: PlayerId,
        level: u8,
    },
    ShowPropertyActions {
        position: u8,
        can_buy: bool,
    },
    ShowJailActions {
        can_pay_fine: bool,
        can_use_card: bool,
    },
    UpdateBalance {
        player: PlayerId,
        balance: i64,
    },
    HighlightActivePlayer {
        player: PlayerId,
    },
    DiceRolled {
        player: PlayerId,
        roll: DiceRoll,
    },
    RentShortfall(RentShortfall),
}

/// Pending render requests, drained by the presentation layer.
#[derive(Debug, Default, Clone)]
pub struct Outbox {
    pending: Vec<Notification>,
}

impl Outbox {
    pub(crate) fn push(&mut self, notification: Notification) {
        log::trace!("render request: {notification:?}");
        self.pending.push(notification);
    }

    #[must_use]
    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }

    /// Take every queued request, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }
}

/// What the top phase is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "awaiting", rename_all = "snake_case")]
pub enum Awaiting {
    /// The stack is empty or the top phase does not accept input.
    Nothing,
    Roll,
    /// Token movement was requested; waiting for it to finish.
    Arrival,
    PropertyDecision { position: u8, can_buy: bool },
    JailDecision { can_pay_fine: bool, can_use_card: bool },
    DebtResolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackOp {
    Push,
    Pop,
    Change,
}

impl std::fmt::Display for StackOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Push => "push",
            Self::Pop => "pop",
            Self::Change => "change",
        })
    }
}

/// One committed stack transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub sequence: u64,
    pub op: StackOp,
    pub from: Option<PhaseKind>,
    pub to: Option<PhaseKind>,
    pub active: PlayerId,
    pub roll: DiceRoll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Running,
    Stopped,
}

/// What a phase asks the engine to do next.
#[derive(Debug)]
pub enum Step {
    Await,
    Change(Phase),
    Push(Phase),
    Pop,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Rent(#[from] RentError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{phase} phase does not accept '{event}'")]
    UnexpectedEvent { phase: PhaseKind, event: GameEvent },
    #[error("the phase stack is empty")]
    EmptyStack,
    #[error("{0} is not implemented")]
    NotImplemented(Feature),
    #[error("player {player} cannot {action} right now")]
    ActionUnavailable {
        action: &'static str,
        player: PlayerId,
    },
    #[error("requested position {requested} but the active token is on {actual}")]
    PositionMismatch { requested: u8, actual: u8 },
}

impl EngineError {
    /// Events that reached a phase which never accepts them.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::UnexpectedEvent { .. } | Self::EmptyStack)
    }
}

/// Engine state captured before a stack operation so a failure can be undone.
struct Checkpoint {
    stack: Vec<Phase>,
    status: EngineStatus,
    history_len: usize,
    outbox_len: usize,
}

impl Checkpoint {
    fn take(engine: &TurnEngine) -> Self {
        Self {
            stack: engine.stack.clone(),
            status: engine.status,
            history_len: engine.history.len(),
            outbox_len: engine.outbox.pending.len(),
        }
    }

    fn restore(self, engine: &mut TurnEngine) {
        engine.stack = self.stack;
        engine.status = self.status;
        engine.history.truncate(self.history_len);
        engine.outbox.pending.truncate(self.outbox_len);
    }
}

/// Owner of the phase stack.
#[derive(Debug)]
pub struct TurnEngine {
    stack: Vec<Phase>,
    status: EngineStatus,
    outbox: Outbox,
    history: Vec<TransitionRecord>,
}

impl Default for TurnEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnEngine {
    /// An idle engine with an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stack: Vec::new(),
            status: EngineStatus::Stopped,
            outbox: Outbox {
                pending: Vec::new(),
            },
            history: Vec::new(),
        }
    }

    /// Push the new-game phase for `context` and run until input is needed.
    ///
    /// # Errors
    ///
    /// Propagates any failure raised while seating players.
    pub fn start(context: GameContext) -> Result<Self, EngineError> {
        let mut engine = Self::new();
        engine.push(Phase::new_game(context))?;
        Ok(engine)
    }

    /// Suspend the current phase and enter `phase` on top of it.
    ///
    /// # Errors
    ///
    /// Propagates failures from the new phase's entry hook or `execute`; the
    /// engine is then left exactly as it was.
    pub fn push(&mut self, phase: Phase) -> Result<(), EngineError> {
        self.transact(Step::Push(phase))
    }

    /// Leave the current phase and resume the one below it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyStack`] when there is nothing to pop.
    pub fn pop(&mut self) -> Result<(), EngineError> {
        self.transact(Step::Pop)
    }

    /// Replace the current phase without resuming anything below it.
    ///
    /// # Errors
    ///
    /// Propagates failures from the new phase's entry hook or `execute`; the
    /// replaced phase then stays on top.
    pub fn change(&mut self, phase: Phase) -> Result<(), EngineError> {
        self.transact(Step::Change(phase))
    }

    /// Exit every phase top-down and stop, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let cleared = self.stack.len();
        while let Some(mut phase) = self.stack.pop() {
            phase.on_exit();
        }
        self.status = EngineStatus::Stopped;
        log::info!("cleared {cleared} phases from the stack; engine stopped");
        cleared
    }

    /// Deliver an external event to the top phase.
    ///
    /// A rejected event leaves the engine exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns a protocol error for events the phase never accepts,
    /// [`EngineError::NotImplemented`] for recognised but unplayed choices, and
    /// validation errors for choices that are not currently allowed.
    pub fn dispatch(&mut self, event: GameEvent) -> Result<(), EngineError> {
        let Some(phase) = self.current_kind() else {
            log::warn!("dropping '{event}': no active phase");
            return Err(EngineError::EmptyStack);
        };
        let checkpoint = Checkpoint::take(self);
        let result = self.deliver(event);
        if let Err(err) = &result {
            checkpoint.restore(self);
            if err.is_protocol() {
                log::warn!("{phase} rejected '{event}': {err}");
            } else {
                log::debug!("{phase} could not apply '{event}': {err}");
            }
        }
        result
    }

    fn deliver(&mut self, event: GameEvent) -> Result<(), EngineError> {
        let top = self.stack.last_mut().ok_or(EngineError::EmptyStack)?;
        let step = top.handle(event, &mut self.outbox)?;
        self.apply(step)
    }

    /// Apply `step` and everything it chains into, or nothing at all.
    fn transact(&mut self, step: Step) -> Result<(), EngineError> {
        let checkpoint = Checkpoint::take(self);
        let result = self.apply(step);
        if result.is_err() {
            checkpoint.restore(self);
        }
        result
    }

    fn apply(&mut self, first: Step) -> Result<(), EngineError> {
        let mut next = Some(first);
        while let Some(step) = next.take() {
            next = match step {
                Step::Await => None,
                Step::Push(phase) => {
                    let from = self.stack.last_mut().map(|top| {
                        top.on_exit();
                        top.kind()
                    });
                    Some(self.enter(phase, StackOp::Push, from)?)
                }
                Step::Change(phase) => {
                    let from = self.stack.pop().map(|mut top| {
                        top.on_exit();
                        top.kind()
                    });
                    Some(self.enter(phase, StackOp::Change, from)?)
                }
                Step::Pop => self.resume_below()?,
            };
        }
        Ok(())
    }

    fn enter(
        &mut self,
        mut phase: Phase,
        op: StackOp,
        from: Option<PhaseKind>,
    ) -> Result<Step, EngineError> {
        let to = phase.kind();
        let (active, roll) = (phase.context().active_player(), phase.context().last_roll());
        phase.on_enter(&mut self.outbox)?;
        let step = phase.execute(&mut self.outbox)?;
        self.stack.push(phase);
        self.status = EngineStatus::Running;
        self.record(op, from, Some(to), active, roll);
        Ok(step)
    }

    fn resume_below(&mut self) -> Result<Option<Step>, EngineError> {
        let Some(mut top) = self.stack.pop() else {
            log::warn!("pop requested on an empty phase stack");
            return Err(EngineError::EmptyStack);
        };
        top.on_exit();
        let from = Some(top.kind());
        let Some(below) = self.stack.last() else {
            self.status = EngineStatus::Stopped;
            let context = top.context();
            self.record(
                StackOp::Pop,
                from,
                None,
                context.active_player(),
                context.last_roll(),
            );
            log::info!("phase stack emptied; engine stopped");
            return Ok(None);
        };
        let (to, active, roll) = (
            below.kind(),
            below.context().active_player(),
            below.context().last_roll(),
        );
        self.record(StackOp::Pop, from, Some(to), active, roll);
        let below = self.stack.last_mut().ok_or(EngineError::EmptyStack)?;
        below.on_enter(&mut self.outbox)?;
        Ok(Some(below.execute(&mut self.outbox)?))
    }

    fn record(
        &mut self,
        op: StackOp,
        from: Option<PhaseKind>,
        to: Option<PhaseKind>,
        active: PlayerId,
        roll: DiceRoll,
    ) {
        let sequence = self.history.len() as u64;
        log::info!(
            "#{sequence} {op}: {} -> {} (player {active})",
            from.map_or("-", PhaseKind::label),
            to.map_or("-", PhaseKind::label)
        );
        self.history.push(TransitionRecord {
            sequence,
            op,
            from,
            to,
            active,
            roll,
        });
    }

    #[must_use]
    pub const fn status(&self) -> EngineStatus {
        self.status
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == EngineStatus::Running
    }

    #[must_use]
    pub fn current(&self) -> Option<&Phase> {
        self.stack.last()
    }

    #[must_use]
    pub fn current_kind(&self) -> Option<PhaseKind> {
        self.stack.last().map(Phase::kind)
    }

    /// Context committed by the top phase.
    #[must_use]
    pub fn context(&self) -> Option<&GameContext> {
        self.stack.last().map(Phase::context)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn awaiting(&self) -> Awaiting {
        self.stack.last().map_or(Awaiting::Nothing, Phase::awaiting)
    }

    /// Unresolved rent the active player could not cover, if any.
    #[must_use]
    pub fn rent_shortfall(&self) -> Option<&RentShortfall> {
        self.stack.last().and_then(Phase::rent_shortfall)
    }

    #[must_use]
    pub const fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Take every queued render request.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.outbox.drain()
    }

    #[must_use]
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::PropertyCatalog;
    use crate::config::{Roster, RosterEntry, RulesConfig};
    use crate::dice::Dice;

    fn context(rolls: &[(u8, u8)]) -> GameContext {
        let roster = Roster::new(vec![
            RosterEntry::new("Alice", 1, "blue"),
            RosterEntry::new("Bob", 2, "green"),
        ])
        .unwrap();
        let script = rolls.iter().map(|(a, b)| DiceRoll::new(*a, *b).unwrap());
        GameContext::new(
            Arc::new(PropertyCatalog::load_from_static().unwrap()),
            &roster,
            RulesConfig::default(),
            Dice::with_script(9, script),
        )
        .unwrap()
    }

    #[test]
    fn start_settles_on_first_roll() {
        let mut engine = TurnEngine::start(context(&[])).unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.current_kind(), Some(PhaseKind::RollDice));
        assert_eq!(engine.awaiting(), Awaiting::Roll);
        assert_eq!(engine.depth(), 1);

        let ops: Vec<_> = engine.history().iter().map(|r| (r.op, r.to)).collect();
        assert_eq!(
            ops,
            [
                (StackOp::Push, Some(PhaseKind::NewGame)),
                (StackOp::Change, Some(PhaseKind::RollDice)),
            ]
        );

        let notes = engine.drain_notifications();
        assert_eq!(
            notes,
            [
                Notification::PlaceTokenAtGo { token: PlayerId(1) },
                Notification::PlaceTokenAtGo { token: PlayerId(2) },
                Notification::HighlightActivePlayer { player: PlayerId(1) },
            ]
        );
        assert!(engine.outbox().pending().is_empty());
    }

    #[test]
    fn mismatched_event_is_a_protocol_error() {
        let mut engine = TurnEngine::start(context(&[])).unwrap();
        let history = engine.history().len();
        let err = engine.dispatch(GameEvent::PayFineClicked).unwrap_err();
        assert!(err.is_protocol());
        assert!(matches!(
            err,
            EngineError::UnexpectedEvent {
                phase: PhaseKind::RollDice,
                event: GameEvent::PayFineClicked
            }
        ));
        assert_eq!(engine.history().len(), history);
        assert_eq!(engine.awaiting(), Awaiting::Roll);

        let err = engine.dispatch(GameEvent::TransitionComplete).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn push_and_pop_resume_the_phase_below() {
        let ctx = context(&[]);
        let mut engine = TurnEngine::new();
        assert_eq!(engine.status(), EngineStatus::Stopped);
        assert!(matches!(engine.pop(), Err(EngineError::EmptyStack)));
        assert!(engine.history().is_empty());

        engine.push(Phase::roll_dice(ctx.clone())).unwrap();
        engine.push(Phase::roll_dice(ctx)).unwrap();
        assert_eq!(engine.depth(), 2);
        engine.pop().unwrap();
        assert_eq!(engine.depth(), 1);
        assert_eq!(engine.awaiting(), Awaiting::Roll);
        engine.pop().unwrap();
        assert_eq!(engine.depth(), 0);
        assert_eq!(engine.status(), EngineStatus::Stopped);
        assert_eq!(engine.awaiting(), Awaiting::Nothing);

        let last = engine.history().last().unwrap();
        assert_eq!((last.op, last.to), (StackOp::Pop, None));
        assert!(matches!(
            engine.dispatch(GameEvent::RollRequested),
            Err(EngineError::EmptyStack)
        ));
    }

    #[test]
    fn failed_change_keeps_the_current_phase() {
        let ctx = context(&[]);
        let mut engine = TurnEngine::start(ctx.clone()).unwrap();
        let history = engine.history().to_vec();
        let pending = engine.outbox().pending().to_vec();

        let err = engine.change(Phase::unowned_property(ctx, 7)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Registry(RegistryError::NotAProperty { position: 7 })
        ));
        assert_eq!(engine.depth(), 1);
        assert_eq!(engine.current_kind(), Some(PhaseKind::RollDice));
        assert_eq!(engine.awaiting(), Awaiting::Roll);
        assert!(engine.is_running());
        assert!(engine.context().is_some());
        assert_eq!(engine.history(), history.as_slice());
        assert_eq!(engine.outbox().pending(), pending.as_slice());
    }

    #[test]
    fn failed_push_onto_an_idle_engine_stays_stopped() {
        let mut engine = TurnEngine::new();
        assert!(engine.push(Phase::pay_rent(context(&[]), 4)).is_err());
        assert_eq!(engine.depth(), 0);
        assert_eq!(engine.status(), EngineStatus::Stopped);
        assert!(engine.history().is_empty());
        assert!(engine.outbox().pending().is_empty());
    }

    #[test]
    fn clear_exits_every_phase_and_stops() {
        let ctx = context(&[]);
        let mut engine = TurnEngine::new();
        engine.push(Phase::roll_dice(ctx.clone())).unwrap();
        engine.push(Phase::roll_dice(ctx)).unwrap();
        let history = engine.history().len();

        assert_eq!(engine.clear(), 2);
        assert_eq!(engine.depth(), 0);
        assert_eq!(engine.status(), EngineStatus::Stopped);
        assert_eq!(engine.awaiting(), Awaiting::Nothing);
        assert_eq!(engine.history().len(), history);
        assert_eq!(engine.clear(), 0);
    }

    #[test]
    fn change_does_not_resume_ancestors() {
        let ctx = context(&[]);
        let mut engine = TurnEngine::new();
        engine.push(Phase::roll_dice(ctx.clone())).unwrap();
        engine.push(Phase::roll_dice(ctx.clone())).unwrap();
        let before = engine.history().len();
        engine.change(Phase::roll_dice(ctx)).unwrap();
        assert_eq!(engine.depth(), 2);
        assert_eq!(engine.history().len(), before + 1);
        let last = engine.history().last().unwrap();
        assert_eq!(last.op, StackOp::Change);
        assert_eq!(last.from, Some(PhaseKind::RollDice));
    }

    #[test]
    fn end_turn_settles_on_next_player() {
        let mut engine = TurnEngine::new();
        engine.push(Phase::end_turn(context(&[]))).unwrap();
        assert_eq!(engine.depth(), 1);
        assert_eq!(engine.current_kind(), Some(PhaseKind::RollDice));
        assert_eq!(engine.context().unwrap().active_player(), PlayerId(2));
    }

    #[test]
    fn history_sequences_are_contiguous() {
        let mut engine = TurnEngine::start(context(&[(3, 4), (1, 2)])).unwrap();
        for _ in 0..2 {
            engine.dispatch(GameEvent::RollRequested).unwrap();
            engine.dispatch(GameEvent::TransitionComplete).unwrap();
        }
        for (index, record) in engine.history().iter().enumerate() {
            assert_eq!(record.sequence, index as u64);
        }
    }
}
