use anyhow::{Result, ensure};

use super::TestScenario;
use crate::logic::game_tester::SimulationSummary;
use crate::logic::{AutopilotStrategy, SimulationPlan};
use monopoly_game::{PhaseKind, PlayerId};

fn plan() -> SimulationPlan {
    SimulationPlan::new(AutopilotStrategy::Collector)
        .with_max_turns(0)
        .with_expectation(smoke_expectation)
}

pub fn smoke_scenario() -> TestScenario {
    TestScenario::simulation("Smoke Test", plan())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    let Some(context) = &summary.final_context else {
        anyhow::bail!("Game did not start: {}", summary.ending_message());
    };

    let ledger = context.ledger();
    ensure!(
        (2..=8).contains(&ledger.len()),
        "Roster should seat 2-8 players, got {}",
        ledger.len()
    );
    for player in ledger.players() {
        ensure!(
            player.balance() == context.rules().starting_balance,
            "{} should start with {}, got {}",
            player.name,
            context.rules().starting_balance,
            player.balance()
        );
        ensure!(!player.in_jail(), "{} should not start in jail", player.name);
    }

    let tokens: Vec<(PlayerId, u8)> = context.board().tokens().collect();
    ensure!(
        tokens.len() == ledger.len(),
        "Every player needs a token, found {} for {} players",
        tokens.len(),
        ledger.len()
    );
    ensure!(
        tokens.iter().all(|&(_, position)| position == 0),
        "All tokens should start on Go"
    );

    ensure!(
        context.registry().assignments().all(|a| a.owner.is_none()),
        "No property should be owned at the start"
    );

    let first = ledger.ids().next();
    ensure!(
        first == Some(context.active_player()),
        "First roster entry should act first"
    );

    let kinds: Vec<_> = summary.history.iter().map(|r| r.to).collect();
    ensure!(
        kinds == [Some(PhaseKind::NewGame), Some(PhaseKind::RollDice)],
        "Opening transitions should be NewGame then RollDice, got {kinds:?}"
    );
    Ok(())
}
