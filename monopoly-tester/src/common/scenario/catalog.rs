use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow, ensure};
use monopoly_game::constants::{BOARD_SIZE, MAX_PLAYERS, POSITION_JAIL};
use monopoly_game::{EntryReason, GameContext, PropertyClass};

use super::{TestScenario, no_fault_expectation};
use crate::common::fingerprint;
use crate::logic::game_tester::SimulationSummary;
use crate::logic::{AutopilotStrategy, GameTester, SimulationPlan};

const AUDIT_TURNS: u32 = 120;

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::simulation(
            "Ledger Audit",
            audit_plan(AutopilotStrategy::Gambler).with_expectation(ledger_audit_expectation),
        ),
        TestScenario::simulation(
            "Registry Consistency",
            audit_plan(AutopilotStrategy::Collector)
                .with_expectation(registry_consistency_expectation),
        ),
        TestScenario::simulation(
            "Board Integrity",
            audit_plan(AutopilotStrategy::Frugal).with_expectation(board_integrity_expectation),
        ),
        TestScenario::simulation(
            "Deterministic Replay",
            audit_plan(AutopilotStrategy::Gambler)
                .with_max_turns(60)
                .with_expectation(deterministic_replay_expectation),
        ),
        TestScenario::simulation(
            "Jail Cards",
            audit_plan(AutopilotStrategy::Collector)
                .with_setup(deal_jail_cards)
                .with_expectation(jail_cards_expectation),
        ),
    ]
}

pub fn find_catalog_scenario(name: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name == name)
}

fn audit_plan(strategy: AutopilotStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy)
        .with_max_turns(AUDIT_TURNS)
        .with_expectation(no_fault_expectation)
}

fn final_context(summary: &SimulationSummary) -> Result<&GameContext> {
    summary
        .final_context
        .as_ref()
        .ok_or_else(|| anyhow!("No committed context ({})", summary.ending_message()))
}

fn ledger_audit_expectation(summary: &SimulationSummary) -> Result<()> {
    let context = final_context(summary)?;
    let ledger = context.ledger();
    let catalog = context.registry().catalog();

    for player in ledger.players() {
        let replayed = ledger.replay_balance(player.id)?;
        ensure!(
            replayed == player.balance(),
            "Journal replays {} to {replayed}, ledger holds {}",
            player.name,
            player.balance()
        );
    }

    let mut paid_out = 0_i64;
    let mut paid_in = 0_i64;
    let mut outside_money = 0_i64;
    for entry in ledger.journal() {
        let delta = entry.after - entry.before;
        match entry.reason {
            EntryReason::TransferOut { .. } => paid_out -= delta,
            EntryReason::TransferIn { .. } => paid_in += delta,
            EntryReason::Purchase { position } => {
                let price = catalog
                    .get(position)
                    .map(|property| i64::from(property.price))
                    .with_context(|| format!("Purchase of non-property {position}"))?;
                ensure!(
                    -delta == price,
                    "Purchase of {position} cost {} instead of {price}",
                    -delta
                );
                outside_money += delta;
            }
            EntryReason::JailFine | EntryReason::GoSalary { .. } | EntryReason::Adjustment => {
                outside_money += delta;
            }
        }
    }
    ensure!(
        paid_out == paid_in,
        "Transfers are unbalanced: {paid_out} left payers, {paid_in} reached owners"
    );

    let seats = i64::try_from(ledger.len())?;
    let total: i64 = ledger.players().map(monopoly_game::Player::balance).sum();
    ensure!(
        total == seats * ledger.starting_balance() + outside_money,
        "Cash in play {total} does not match opening cash plus bank flows {outside_money}"
    );
    Ok(())
}

fn registry_consistency_expectation(summary: &SimulationSummary) -> Result<()> {
    let context = final_context(summary)?;
    let registry = context.registry();
    let ledger = context.ledger();

    let mut owned = BTreeSet::new();
    for assignment in registry.assignments() {
        ensure!(
            assignment.development == 0,
            "{} carries development level {} without any building",
            assignment.position,
            assignment.development
        );
        if let Some(owner) = assignment.owner {
            ledger
                .player(owner)
                .with_context(|| format!("Owner of {} is not seated", assignment.position))?;
            owned.insert(assignment.position);
        }
    }

    let purchases = ledger
        .journal()
        .iter()
        .filter(|entry| matches!(entry.reason, EntryReason::Purchase { .. }))
        .count();
    ensure!(
        purchases == owned.len(),
        "{purchases} purchases recorded but {} properties owned",
        owned.len()
    );

    let mut held = BTreeSet::new();
    for player in ledger.players() {
        let holdings = registry.holdings(player.id);
        let by_class: usize = [
            PropertyClass::Street,
            PropertyClass::Railroad,
            PropertyClass::Utility,
        ]
        .into_iter()
        .map(|class| usize::from(registry.count_owned(player.id, class)))
        .sum();
        ensure!(
            by_class == holdings.len(),
            "{} holds {} deeds but class counts add to {by_class}",
            player.name,
            holdings.len()
        );
        for position in holdings {
            ensure!(
                held.insert(position),
                "{position} appears in two players' holdings"
            );
        }
    }
    ensure!(held == owned, "Holdings do not cover the owned set");
    Ok(())
}

fn board_integrity_expectation(summary: &SimulationSummary) -> Result<()> {
    let context = final_context(summary)?;

    for (token, position) in context.board().tokens() {
        ensure!(
            position < BOARD_SIZE,
            "Token {token} is off the board at {position}"
        );
        let player = context.ledger().player(token)?;
        if player.in_jail() {
            ensure!(
                position == POSITION_JAIL,
                "{} is jailed but stands on {position}",
                player.name
            );
        }
    }

    for (index, record) in summary.history.iter().enumerate() {
        ensure!(
            record.sequence == u64::try_from(index)?,
            "History gap at {index}: sequence {}",
            record.sequence
        );
    }

    for turn in &summary.turns {
        ensure!(
            turn.to < BOARD_SIZE,
            "Turn {} ended off the board at {}",
            turn.turn,
            turn.to
        );
    }
    Ok(())
}

fn deterministic_replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let plan = SimulationPlan::new(summary.strategy).with_max_turns(summary.max_turns);
    let replay = GameTester::new(false).run_plan(&plan, summary.seed);

    ensure!(
        replay.halt == summary.halt,
        "Replay ended with '{}' instead of '{}'",
        replay.ending_message(),
        summary.ending_message()
    );
    ensure!(
        fingerprint(&replay.history)? == fingerprint(&summary.history)?,
        "Replay diverged from seed {} in its transition history",
        summary.seed
    );

    let journal = |s: &SimulationSummary| {
        s.final_context
            .as_ref()
            .map(|context| context.ledger().journal().to_vec())
            .unwrap_or_default()
    };
    ensure!(
        fingerprint(&journal(&replay))? == fingerprint(&journal(summary))?,
        "Replay diverged from seed {} in its ledger journal",
        summary.seed
    );
    Ok(())
}

fn deal_jail_cards(context: &mut GameContext) {
    let ids: Vec<_> = context.ledger().ids().collect();
    for id in ids {
        if let Err(err) = context.ledger_mut().grant_jail_card(id) {
            log::warn!("could not deal a jail card to {id}: {err}");
        }
    }
}

fn jail_cards_expectation(summary: &SimulationSummary) -> Result<()> {
    let context = final_context(summary)?;
    ensure!(
        context.ledger().len() <= MAX_PLAYERS,
        "Roster grew past {MAX_PLAYERS} players"
    );
    for player in context.ledger().players() {
        ensure!(
            player.jail_cards() <= 1,
            "{} holds {} cards but was dealt one",
            player.name,
            player.jail_cards()
        );
        let paid_fine = context
            .ledger()
            .journal()
            .iter()
            .any(|entry| entry.player == player.id && entry.reason == EntryReason::JailFine);
        ensure!(
            !paid_fine || player.jail_cards() == 0,
            "{} paid a fine while still holding a card",
            player.name
        );
    }
    Ok(())
}
