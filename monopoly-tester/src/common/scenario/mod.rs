pub mod catalog;
pub mod smoke;

use anyhow::{Result, ensure};

use crate::logic::game_tester::SimulationSummary;
use crate::logic::{AutopilotStrategy, SimulationPlan};

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Every run must end without the engine rejecting autopilot input.
pub(crate) fn no_fault_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        !summary.halt.is_fault(),
        "Engine rejected autopilot input: {}",
        summary.ending_message()
    );
    Ok(())
}

fn full_game_expectation(summary: &SimulationSummary) -> Result<()> {
    no_fault_expectation(summary)?;
    ensure!(
        summary.metrics.rolls > 0,
        "Game should have rolled at least once"
    );
    let Some(context) = &summary.final_context else {
        anyhow::bail!("Game stopped without a committed context");
    };
    for player in context.ledger().players() {
        ensure!(
            player.balance() >= 0,
            "{} went negative ({}) without a shortfall",
            player.name,
            player.balance()
        );
    }
    Ok(())
}

fn full_game_scenario(name: &str, strategy: AutopilotStrategy) -> TestScenario {
    TestScenario::simulation(
        name,
        SimulationPlan::new(strategy).with_expectation(full_game_expectation),
    )
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::smoke_scenario()),
        "full-game-collector" | "collector" => Some(full_game_scenario(
            "Full Game - Collector",
            AutopilotStrategy::Collector,
        )),
        "full-game-frugal" | "frugal" => Some(full_game_scenario(
            "Full Game - Frugal",
            AutopilotStrategy::Frugal,
        )),
        "full-game-gambler" | "gambler" => Some(full_game_scenario(
            "Full Game - Gambler",
            AutopilotStrategy::Gambler,
        )),
        "ledger-audit" | "ledger" => catalog::find_catalog_scenario("Ledger Audit"),
        "registry-consistency" | "registry" => {
            catalog::find_catalog_scenario("Registry Consistency")
        }
        "board-integrity" | "board" => catalog::find_catalog_scenario("Board Integrity"),
        "deterministic-replay" | "deterministic" => {
            catalog::find_catalog_scenario("Deterministic Replay")
        }
        "jail-cards" | "jail" => catalog::find_catalog_scenario("Jail Cards"),
        _ => None,
    }
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("full-game-collector", "Full Game - Collector"),
        ("full-game-frugal", "Full Game - Frugal"),
        ("full-game-gambler", "Full Game - Gambler"),
        ("ledger-audit", "Ledger Audit"),
        ("registry-consistency", "Registry Consistency"),
        ("board-integrity", "Board Integrity"),
        ("deterministic-replay", "Deterministic Replay"),
        ("jail-cards", "Jail Cards"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, description) in list_scenarios() {
            let scenario = get_scenario(key).unwrap_or_else(|| panic!("missing {key}"));
            assert_eq!(scenario.name, description);
            assert!(!scenario.plan.expectations.is_empty());
        }
    }

    #[test]
    fn aliases_are_case_insensitive() {
        assert_eq!(get_scenario("LEDGER").unwrap().name, "Ledger Audit");
        assert!(get_scenario("auction-house").is_none());
    }
}
