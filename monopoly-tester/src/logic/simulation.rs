use monopoly_game::{Awaiting, GameContext, GameEvent, GameSession, PhaseKind, PlayerId};
use serde::Serialize;

use crate::logic::policy::{AutopilotStrategy, PlayerPolicy, PolicyDecision};

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: AutopilotStrategy,
    pub max_turns: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(strategy: AutopilotStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_turns: 200,
        }
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Why a simulation stopped advancing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    /// Still playable; the turn budget ran out.
    TurnLimit,
    /// The policy wanted a branch the engine leaves unimplemented.
    PolicyDeclined { phase: Option<PhaseKind>, rationale: String },
    /// The engine rejected an event the policy derived from its own state.
    EngineFault { message: String },
    EngineStopped,
}

impl HaltReason {
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::EngineFault { .. })
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::TurnLimit => "turn limit".to_string(),
            Self::PolicyDeclined { rationale, .. } => format!("declined: {rationale}"),
            Self::EngineFault { message } => format!("fault: {message}"),
            Self::EngineStopped => "engine stopped".to_string(),
        }
    }
}

/// Snapshot of a decision the policy made.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub turn: u32,
    pub player: PlayerId,
    pub event: GameEvent,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Result of advancing the simulation by one roll.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub turn: u32,
    pub player: PlayerId,
    pub from: u8,
    pub to: u8,
    pub landed_on: Option<PhaseKind>,
    pub decisions: Vec<DecisionRecord>,
    pub halted: Option<HaltReason>,
}

/// Deterministic autopilot game used by the tester.
pub struct SimulationSession {
    config: SimulationConfig,
    session: GameSession,
    turn: u32,
    halted: Option<HaltReason>,
}

impl SimulationSession {
    #[must_use]
    pub fn from_session(config: SimulationConfig, session: GameSession) -> Self {
        log::debug!(
            "autopilot {} on seed {} for up to {} turns",
            config.strategy,
            config.seed,
            config.max_turns
        );
        Self {
            config,
            session,
            turn: 0,
            halted: None,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub const fn halted(&self) -> Option<&HaltReason> {
        self.halted.as_ref()
    }

    #[must_use]
    pub fn into_session(self) -> GameSession {
        self.session
    }

    /// Play one roll and everything it triggers, up to the next roll.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> TurnOutcome {
        self.turn += 1;
        let player = self.session.active_player().unwrap_or(PlayerId(0));
        let from = self.position_of(player);
        let mut decisions = Vec::new();
        let mut landed_on = None;

        let halted = loop {
            if let Some(reason) = &self.halted {
                break Some(reason.clone());
            }
            let awaiting = self.session.awaiting();
            let Ok(context) = self.session.context() else {
                break Some(HaltReason::EngineStopped);
            };
            // One roll per advance; the next prompt for a roll ends it.
            if !decisions.is_empty()
                && (awaiting == Awaiting::Roll || context.active_player() != player)
            {
                break None;
            }
            let event = match policy.decide(context, awaiting) {
                PolicyDecision::Act { event, rationale } => {
                    decisions.push(DecisionRecord {
                        turn: self.turn,
                        player: context.active_player(),
                        event,
                        policy_name: policy.name().to_string(),
                        rationale,
                    });
                    event
                }
                PolicyDecision::Decline { rationale } => {
                    break Some(HaltReason::PolicyDeclined {
                        phase: self.session.engine().current_kind(),
                        rationale,
                    });
                }
            };
            if let Err(err) = self.session.dispatch(event) {
                break Some(HaltReason::EngineFault {
                    message: err.to_string(),
                });
            }
            if event == GameEvent::TransitionComplete {
                landed_on = self.session.engine().current_kind();
            }
        };

        if halted.is_none() && self.turn >= self.config.max_turns {
            self.halted = Some(HaltReason::TurnLimit);
        } else if halted.is_some() {
            self.halted.clone_from(&halted);
        }

        TurnOutcome {
            turn: self.turn,
            player,
            from,
            to: self.position_of(player),
            landed_on,
            decisions,
            halted: self.halted.clone(),
        }
    }

    fn position_of(&self, player: PlayerId) -> u8 {
        self.session
            .context()
            .ok()
            .and_then(|context| context.board().token_position(player).ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn context(&self) -> Option<&GameContext> {
        self.session.context().ok()
    }
}
