use std::fmt;

use monopoly_game::{Awaiting, GameContext, GameEvent};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Cash a frugal player keeps in hand after any purchase.
pub const FRUGAL_RESERVE: i64 = 500;

/// What a [`PlayerPolicy`] wants to do with an open decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Act {
        event: GameEvent,
        rationale: Option<String>,
    },
    /// The policy would take a path the engine does not offer yet.
    Decline { rationale: String },
}

impl PolicyDecision {
    #[must_use]
    pub fn act(event: GameEvent) -> Self {
        Self::Act {
            event,
            rationale: None,
        }
    }

    #[must_use]
    pub fn act_because(event: GameEvent, rationale: impl Into<String>) -> Self {
        Self::Act {
            event,
            rationale: Some(rationale.into()),
        }
    }

    #[must_use]
    pub fn decline(rationale: impl Into<String>) -> Self {
        Self::Decline {
            rationale: rationale.into(),
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Answer a property offer on `position`.
    fn on_property(&mut self, context: &GameContext, position: u8, can_buy: bool)
    -> PolicyDecision;

    /// Choose how to leave jail.
    fn on_jail(&mut self, _context: &GameContext, can_pay_fine: bool, can_use_card: bool)
    -> PolicyDecision {
        if can_use_card {
            PolicyDecision::act(GameEvent::UseCardClicked)
        } else if can_pay_fine {
            PolicyDecision::act(GameEvent::PayFineClicked)
        } else {
            PolicyDecision::decline("cannot pay the fine and holds no card")
        }
    }

    /// Map whatever the engine waits for onto an event.
    fn decide(&mut self, context: &GameContext, awaiting: Awaiting) -> PolicyDecision {
        match awaiting {
            Awaiting::Roll => PolicyDecision::act(GameEvent::RollRequested),
            Awaiting::Arrival => PolicyDecision::act(GameEvent::TransitionComplete),
            Awaiting::PropertyDecision { position, can_buy } => {
                self.on_property(context, position, can_buy)
            }
            Awaiting::JailDecision {
                can_pay_fine,
                can_use_card,
            } => self.on_jail(context, can_pay_fine, can_use_card),
            Awaiting::DebtResolution => PolicyDecision::decline("rent shortfall is pending"),
            Awaiting::Nothing => PolicyDecision::decline("engine accepts no input"),
        }
    }
}

/// Built-in autopilot strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AutopilotStrategy {
    /// Buys everything it can afford.
    Collector,
    /// Buys only while a cash reserve survives the purchase.
    Frugal,
    /// Flips a seeded coin for every offer.
    Gambler,
}

impl AutopilotStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Collector => "Collector",
            Self::Frugal => "Frugal",
            Self::Gambler => "Gambler",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Collector => Box::new(CollectorPolicy),
            Self::Frugal => Box::new(FrugalPolicy {
                reserve: FRUGAL_RESERVE,
            }),
            Self::Gambler => Box::new(GamblerPolicy::new(seed)),
        }
    }
}

impl fmt::Display for AutopilotStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn buy(position: u8) -> GameEvent {
    GameEvent::BuyClicked { position }
}

#[derive(Debug, Default)]
struct CollectorPolicy;

impl PlayerPolicy for CollectorPolicy {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn on_property(
        &mut self,
        _context: &GameContext,
        position: u8,
        can_buy: bool,
    ) -> PolicyDecision {
        if can_buy {
            PolicyDecision::act(buy(position))
        } else {
            PolicyDecision::decline(format!("cannot afford {position}, auction needed"))
        }
    }
}

#[derive(Debug)]
struct FrugalPolicy {
    reserve: i64,
}

impl PlayerPolicy for FrugalPolicy {
    fn name(&self) -> &'static str {
        "frugal"
    }

    fn on_property(
        &mut self,
        context: &GameContext,
        position: u8,
        can_buy: bool,
    ) -> PolicyDecision {
        let price = context
            .registry()
            .property(position)
            .map_or(i64::MAX, |property| i64::from(property.price));
        let balance = context.active().map_or(0, monopoly_game::Player::balance);
        if can_buy && balance - price >= self.reserve {
            PolicyDecision::act_because(buy(position), format!("{} left", balance - price))
        } else {
            PolicyDecision::decline(format!(
                "keeping {} in reserve, auction needed for {position}",
                self.reserve
            ))
        }
    }

    fn on_jail(
        &mut self,
        _context: &GameContext,
        can_pay_fine: bool,
        can_use_card: bool,
    ) -> PolicyDecision {
        if can_use_card {
            PolicyDecision::act(GameEvent::UseCardClicked)
        } else if can_pay_fine {
            PolicyDecision::act_because(GameEvent::PayFineClicked, "no card in hand")
        } else {
            PolicyDecision::decline("would roll for doubles")
        }
    }
}

#[derive(Debug)]
struct GamblerPolicy {
    rng: ChaCha20Rng,
}

impl GamblerPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for GamblerPolicy {
    fn name(&self) -> &'static str {
        "gambler"
    }

    fn on_property(
        &mut self,
        _context: &GameContext,
        position: u8,
        can_buy: bool,
    ) -> PolicyDecision {
        let roll: f64 = self.rng.r#gen();
        if can_buy && roll < 0.75 {
            PolicyDecision::act_because(buy(position), format!("coin {roll:.2}"))
        } else {
            PolicyDecision::decline(format!("passed on {position} (coin {roll:.2})"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monopoly_game::{GameSetup, PlayerId};

    fn context() -> GameContext {
        GameSetup::new().build_context().unwrap()
    }

    #[test]
    fn rolls_and_acknowledges_moves() {
        let ctx = context();
        let mut policy = AutopilotStrategy::Collector.create_policy(1);
        assert_eq!(
            policy.decide(&ctx, Awaiting::Roll),
            PolicyDecision::act(GameEvent::RollRequested)
        );
        assert_eq!(
            policy.decide(&ctx, Awaiting::Arrival),
            PolicyDecision::act(GameEvent::TransitionComplete)
        );
        assert!(matches!(
            policy.decide(&ctx, Awaiting::DebtResolution),
            PolicyDecision::Decline { .. }
        ));
    }

    #[test]
    fn collector_buys_when_affordable() {
        let ctx = context();
        let mut policy = AutopilotStrategy::Collector.create_policy(1);
        let offer = Awaiting::PropertyDecision {
            position: 39,
            can_buy: true,
        };
        assert_eq!(policy.decide(&ctx, offer), PolicyDecision::act(buy(39)));
        let refused = Awaiting::PropertyDecision {
            position: 39,
            can_buy: false,
        };
        assert!(matches!(
            policy.decide(&ctx, refused),
            PolicyDecision::Decline { .. }
        ));
    }

    #[test]
    fn frugal_keeps_its_reserve() {
        let mut ctx = context();
        let mut policy = AutopilotStrategy::Frugal.create_policy(1);
        let offer = Awaiting::PropertyDecision {
            position: 39,
            can_buy: true,
        };
        assert!(matches!(
            policy.decide(&ctx, offer),
            PolicyDecision::Act { .. }
        ));
        ctx.ledger_mut()
            .debit(PlayerId(1), 700, monopoly_game::EntryReason::Adjustment)
            .unwrap();
        assert!(matches!(
            policy.decide(&ctx, offer),
            PolicyDecision::Decline { .. }
        ));
    }

    #[test]
    fn jail_prefers_card_then_fine() {
        let ctx = context();
        let mut policy = AutopilotStrategy::Collector.create_policy(1);
        let both = Awaiting::JailDecision {
            can_pay_fine: true,
            can_use_card: true,
        };
        assert_eq!(
            policy.decide(&ctx, both),
            PolicyDecision::act(GameEvent::UseCardClicked)
        );
        let neither = Awaiting::JailDecision {
            can_pay_fine: false,
            can_use_card: false,
        };
        assert!(matches!(
            policy.decide(&ctx, neither),
            PolicyDecision::Decline { .. }
        ));
    }

    #[test]
    fn gambler_is_reproducible_per_seed() {
        let ctx = context();
        let offer = Awaiting::PropertyDecision {
            position: 1,
            can_buy: true,
        };
        let run = |seed| {
            let mut policy = AutopilotStrategy::Gambler.create_policy(seed);
            (0..16)
                .map(|_| policy.decide(&ctx, offer))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }
}
