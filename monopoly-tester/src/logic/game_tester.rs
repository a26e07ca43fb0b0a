use anyhow::Result;
use std::sync::Arc;

use monopoly_game::{
    EntryReason, GameContext, GameSession, GameSetup, PhaseKind, TransitionRecord,
};
use serde::Serialize;

use crate::logic::policy::AutopilotStrategy;
use crate::logic::simulation::{
    DecisionRecord, HaltReason, SimulationConfig, SimulationSession, TurnOutcome,
};

pub const DEFAULT_MAX_TURNS: u32 = 200;

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: AutopilotStrategy,
    pub max_turns: Option<u32>,
    pub setup: Option<fn(&mut GameContext)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: AutopilotStrategy) -> Self {
        Self {
            strategy,
            max_turns: None,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameContext)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Counters gathered over a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayMetrics {
    pub rolls: u32,
    pub purchases: u32,
    pub rent_payments: u32,
    pub go_salaries: u32,
    pub jail_visits: u32,
    pub decision_log: Vec<DecisionRecord>,
}

impl PlayMetrics {
    fn record_turn(&mut self, outcome: &TurnOutcome) {
        self.rolls += u32::from(
            outcome
                .decisions
                .iter()
                .any(|d| d.event == monopoly_game::GameEvent::RollRequested),
        );
        self.decision_log.extend(outcome.decisions.iter().cloned());
    }

    fn finalize(&mut self, context: &GameContext, history: &[TransitionRecord]) {
        for entry in context.ledger().journal() {
            match entry.reason {
                EntryReason::Purchase { .. } => self.purchases += 1,
                EntryReason::TransferOut { .. } => self.rent_payments += 1,
                EntryReason::GoSalary { .. } => self.go_salaries += 1,
                EntryReason::JailFine
                | EntryReason::TransferIn { .. }
                | EntryReason::Adjustment => {}
            }
        }
        self.jail_visits = history
            .iter()
            .filter(|record| record.to == Some(PhaseKind::InJail))
            .count()
            .try_into()
            .unwrap_or(u32::MAX);
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: AutopilotStrategy,
    pub max_turns: u32,
    pub turns: Vec<TurnOutcome>,
    pub metrics: PlayMetrics,
    /// Committed context when the run stopped; `None` if the game never started.
    pub final_context: Option<GameContext>,
    pub history: Vec<TransitionRecord>,
    pub halt: HaltReason,
}

impl SimulationSummary {
    #[must_use]
    pub fn ending_message(&self) -> String {
        self.halt.label()
    }
}

/// Headless deterministic runner for the rule engine.
#[derive(Debug, Clone, Copy)]
pub struct GameTester {
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    fn start_session(plan: &SimulationPlan, seed: u64) -> Result<GameSession, HaltReason> {
        let fault = |err: monopoly_game::EngineError| HaltReason::EngineFault {
            message: err.to_string(),
        };
        let mut context = GameSetup::new()
            .with_seed(seed)
            .build_context()
            .map_err(fault)?;
        if let Some(setup) = plan.setup {
            setup(&mut context);
        }
        GameSession::start(context).map_err(fault)
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let max_turns = plan.max_turns.unwrap_or(DEFAULT_MAX_TURNS);
        let mut summary = SimulationSummary {
            seed,
            strategy: plan.strategy,
            max_turns,
            turns: Vec::new(),
            metrics: PlayMetrics::default(),
            final_context: None,
            history: Vec::new(),
            halt: HaltReason::EngineStopped,
        };

        let session = match Self::start_session(plan, seed) {
            Ok(session) => session,
            Err(halt) => {
                log::warn!("simulation seed {seed} failed to start: {}", halt.label());
                summary.halt = halt;
                return summary;
            }
        };

        if self.verbose {
            log_initial_state(seed, plan, &session);
        }

        let config = SimulationConfig::new(plan.strategy, seed).with_max_turns(max_turns);
        let mut simulation = SimulationSession::from_session(config, session);
        let mut policy = plan.strategy.create_policy(seed);

        if max_turns == 0 {
            summary.halt = HaltReason::TurnLimit;
        } else {
            loop {
                let outcome = simulation.advance(policy.as_mut());
                summary.metrics.record_turn(&outcome);
                if self.verbose {
                    log_turn(&outcome);
                }
                let halted = outcome.halted.clone();
                summary.turns.push(outcome);
                if let Some(halt) = halted {
                    summary.halt = halt;
                    break;
                }
            }
        }

        let session = simulation.into_session();
        summary.history = session.history().to_vec();
        if let Ok(context) = session.context() {
            summary.metrics.finalize(context, &summary.history);
            summary.final_context = Some(context.clone());
        }
        summary
    }
}

fn log_initial_state(seed: u64, plan: &SimulationPlan, session: &GameSession) {
    println!(
        "🎲 Starting simulation | seed:{seed} policy:{} max turns:{}",
        plan.strategy.label(),
        plan.max_turns.unwrap_or(DEFAULT_MAX_TURNS)
    );
    if let Ok(context) = session.context() {
        for player in context.ledger().players() {
            println!(
                "👤 {} ({}) starts with ${}",
                player.name,
                player.id,
                player.balance()
            );
        }
    }
}

fn log_turn(outcome: &TurnOutcome) {
    let landed = outcome
        .landed_on
        .map_or_else(|| "-".to_string(), |kind| kind.to_string());
    println!(
        "🎯 Turn {}: player {} {} -> {} ({landed})",
        outcome.turn, outcome.player, outcome.from, outcome.to
    );
    if let Some(halt) = &outcome.halted {
        println!("🏁 Simulation ended: {}", halt.label());
    }
}
