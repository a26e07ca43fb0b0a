//! Player identities, balances, jail status and turn order.
//!
//! Every balance change goes through [`PlayerLedger::credit`],
//! [`PlayerLedger::debit`] or [`PlayerLedger::transfer`]; each one is logged
//! with its before/after values and appended to the ledger journal so a final
//! balance can always be re-derived from the starting balance.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RosterEntry;

/// Identity of a player; doubles as the id of the player's board token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    balance: i64,
    in_jail: bool,
    jail_cards: u8,
}

impl Player {
    #[must_use]
    pub const fn balance(&self) -> i64 {
        self.balance
    }

    #[must_use]
    pub const fn in_jail(&self) -> bool {
        self.in_jail
    }

    /// Get-out-of-jail-free cards held.
    #[must_use]
    pub const fn jail_cards(&self) -> u8 {
        self.jail_cards
    }

    /// Whether the player could hand over `amount` right now.
    #[must_use]
    pub fn can_cover(&self, amount: u32) -> bool {
        self.balance >= i64::from(amount)
    }
}

/// Why a balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryReason {
    Purchase { position: u8 },
    JailFine,
    GoSalary { laps: u32 },
    TransferOut { to: PlayerId },
    TransferIn { from: PlayerId },
    Adjustment,
}

/// One journaled balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub player: PlayerId,
    pub before: i64,
    pub after: i64,
    pub reason: EntryReason,
}

/// Balances after a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from_balance: i64,
    pub to_balance: i64,
}

/// Errors raised by ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("player {player} is registered twice")]
    DuplicatePlayer { player: PlayerId },
    #[error("no player with token {player}")]
    UnknownPlayer { player: PlayerId },
    #[error("player {player} has {balance} but owes {required}")]
    InsufficientFunds {
        player: PlayerId,
        balance: i64,
        required: u32,
    },
    #[error("player {player} cannot transfer money to themselves")]
    SelfTransfer { player: PlayerId },
    #[error("player {player} holds no get-out-of-jail-free card")]
    NoJailCard { player: PlayerId },
}

/// Player records plus the balance journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLedger {
    starting_balance: i64,
    players: Vec<Player>,
    journal: Vec<LedgerEntry>,
}

impl PlayerLedger {
    /// Seed a ledger from the roster, in roster order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicatePlayer`] if two entries share a token.
    pub fn from_roster(roster: &[RosterEntry], starting_balance: i64) -> Result<Self, LedgerError> {
        let mut players: Vec<Player> = Vec::with_capacity(roster.len());
        for entry in roster {
            let id = PlayerId(entry.token);
            if players.iter().any(|player| player.id == id) {
                return Err(LedgerError::DuplicatePlayer { player: id });
            }
            players.push(Player {
                id,
                name: entry.name.clone(),
                color: entry.color.clone(),
                balance: starting_balance,
                in_jail: false,
                jail_cards: 0,
            });
        }
        Ok(Self {
            starting_balance,
            players,
            journal: Vec::new(),
        })
    }

    #[must_use]
    pub const fn starting_balance(&self) -> i64 {
        self.starting_balance
    }

    /// Players in roster order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Player ids in roster order.
    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|player| player.id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a player.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn player(&self, id: PlayerId) -> Result<&Player, LedgerError> {
        self.players
            .iter()
            .find(|player| player.id == id)
            .ok_or(LedgerError::UnknownPlayer { player: id })
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, LedgerError> {
        self.players
            .iter_mut()
            .find(|player| player.id == id)
            .ok_or(LedgerError::UnknownPlayer { player: id })
    }

    /// Current balance of a player.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn balance(&self, id: PlayerId) -> Result<i64, LedgerError> {
        self.player(id).map(Player::balance)
    }

    fn adjust(&mut self, id: PlayerId, delta: i64, reason: EntryReason) -> Result<i64, LedgerError> {
        let player = self.player_mut(id)?;
        let before = player.balance;
        player.balance = before.saturating_add(delta);
        let after = player.balance;
        log::debug!(
            "balance of '{}' ({id}): {before} -> {after} ({reason:?})",
            player.name
        );
        self.journal.push(LedgerEntry {
            player: id,
            before,
            after,
            reason,
        });
        Ok(after)
    }

    /// Add money to a player's balance, returning the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn credit(
        &mut self,
        id: PlayerId,
        amount: u32,
        reason: EntryReason,
    ) -> Result<i64, LedgerError> {
        self.adjust(id, i64::from(amount), reason)
    }

    /// Remove money from a player's balance, returning the new balance.
    ///
    /// The balance may go negative; callers that need a guard use
    /// [`PlayerLedger::transfer`] or check [`Player::can_cover`] first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn debit(
        &mut self,
        id: PlayerId,
        amount: u32,
        reason: EntryReason,
    ) -> Result<i64, LedgerError> {
        self.adjust(id, -i64::from(amount), reason)
    }

    /// Move money between two players; both balances change or neither does.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown ids, a self transfer, or when `from`
    /// cannot cover `amount`. No balance is touched in any error case.
    pub fn transfer(
        &mut self,
        from: PlayerId,
        to: PlayerId,
        amount: u32,
    ) -> Result<TransferReceipt, LedgerError> {
        if from == to {
            return Err(LedgerError::SelfTransfer { player: from });
        }
        let payer = self.player(from)?;
        self.player(to)?;
        if !payer.can_cover(amount) {
            return Err(LedgerError::InsufficientFunds {
                player: from,
                balance: payer.balance,
                required: amount,
            });
        }
        let from_balance = self.debit(from, amount, EntryReason::TransferOut { to })?;
        let to_balance = self.credit(to, amount, EntryReason::TransferIn { from })?;
        Ok(TransferReceipt {
            from_balance,
            to_balance,
        })
    }

    /// Flag a player as jailed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn send_to_jail(&mut self, id: PlayerId) -> Result<(), LedgerError> {
        self.player_mut(id)?.in_jail = true;
        Ok(())
    }

    /// Clear a player's jail flag.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn release_from_jail(&mut self, id: PlayerId) -> Result<(), LedgerError> {
        self.player_mut(id)?.in_jail = false;
        Ok(())
    }

    /// Hand a player a get-out-of-jail-free card.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn grant_jail_card(&mut self, id: PlayerId) -> Result<u8, LedgerError> {
        let player = self.player_mut(id)?;
        player.jail_cards = player.jail_cards.saturating_add(1);
        Ok(player.jail_cards)
    }

    /// Spend one get-out-of-jail-free card.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NoJailCard`] when the player holds none.
    pub fn use_jail_card(&mut self, id: PlayerId) -> Result<u8, LedgerError> {
        let player = self.player_mut(id)?;
        if player.jail_cards == 0 {
            return Err(LedgerError::NoJailCard { player: id });
        }
        player.jail_cards -= 1;
        Ok(player.jail_cards)
    }

    #[must_use]
    pub fn journal(&self) -> &[LedgerEntry] {
        &self.journal
    }

    /// Re-derive a balance from the starting balance and the journal.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownPlayer`] for ids outside the roster.
    pub fn replay_balance(&self, id: PlayerId) -> Result<i64, LedgerError> {
        self.player(id)?;
        Ok(self
            .journal
            .iter()
            .filter(|entry| entry.player == id)
            .fold(self.starting_balance, |balance, entry| {
                balance + (entry.after - entry.before)
            }))
    }
}

/// FIFO turn order: the active player plus everyone waiting behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrder {
    active: PlayerId,
    waiting: VecDeque<PlayerId>,
}

impl TurnOrder {
    /// First id becomes active, the rest queue up in order. `None` if empty.
    pub fn new(order: impl IntoIterator<Item = PlayerId>) -> Option<Self> {
        let mut waiting: VecDeque<PlayerId> = order.into_iter().collect();
        let active = waiting.pop_front()?;
        Some(Self { active, waiting })
    }

    #[must_use]
    pub const fn active(&self) -> PlayerId {
        self.active
    }

    /// Players still to act this round, front first.
    #[must_use]
    pub const fn waiting(&self) -> &VecDeque<PlayerId> {
        &self.waiting
    }

    /// Move the active player to the back and promote the front of the queue.
    pub fn rotate(&mut self) -> PlayerId {
        self.waiting.push_back(self.active);
        if let Some(next) = self.waiting.pop_front() {
            self.active = next;
        }
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<RosterEntry> {
        vec![
            RosterEntry::new("Alice", 1, "blue"),
            RosterEntry::new("Bob", 2, "green"),
        ]
    }

    fn ledger() -> PlayerLedger {
        PlayerLedger::from_roster(&roster(), 1_500).unwrap()
    }

    #[test]
    fn roster_seeds_players_in_order() {
        let ledger = ledger();
        let names: Vec<_> = ledger.players().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);
        assert_eq!(ledger.balance(PlayerId(1)).unwrap(), 1_500);
        assert!(!ledger.player(PlayerId(2)).unwrap().in_jail());

        let mut duplicated = roster();
        duplicated.push(RosterEntry::new("Mallory", 1, "black"));
        assert_eq!(
            PlayerLedger::from_roster(&duplicated, 1_500),
            Err(LedgerError::DuplicatePlayer {
                player: PlayerId(1)
            })
        );
    }

    #[test]
    fn transfer_without_funds_changes_nothing() {
        let mut ledger = ledger();
        ledger
            .debit(PlayerId(1), 1_450, EntryReason::Adjustment)
            .unwrap();
        let before = ledger.clone();
        assert_eq!(
            ledger.transfer(PlayerId(1), PlayerId(2), 100),
            Err(LedgerError::InsufficientFunds {
                player: PlayerId(1),
                balance: 50,
                required: 100
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn transfer_with_funds_moves_both_balances() {
        let mut ledger = ledger();
        ledger
            .debit(PlayerId(1), 1_350, EntryReason::Adjustment)
            .unwrap();
        let receipt = ledger.transfer(PlayerId(1), PlayerId(2), 100).unwrap();
        assert_eq!(receipt.from_balance, 50);
        assert_eq!(receipt.to_balance, 1_600);
        assert_eq!(ledger.balance(PlayerId(1)).unwrap(), 50);
        assert_eq!(ledger.balance(PlayerId(2)).unwrap(), 1_600);
    }

    #[test]
    fn transfer_validates_parties() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.transfer(PlayerId(1), PlayerId(1), 5),
            Err(LedgerError::SelfTransfer {
                player: PlayerId(1)
            })
        );
        assert_eq!(
            ledger.transfer(PlayerId(1), PlayerId(9), 5),
            Err(LedgerError::UnknownPlayer {
                player: PlayerId(9)
            })
        );
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn journal_replays_to_current_balance() {
        let mut ledger = ledger();
        ledger
            .debit(PlayerId(1), 240, EntryReason::Purchase { position: 24 })
            .unwrap();
        ledger
            .credit(PlayerId(1), 200, EntryReason::GoSalary { laps: 1 })
            .unwrap();
        ledger.transfer(PlayerId(2), PlayerId(1), 20).unwrap();
        assert_eq!(ledger.journal().len(), 4);
        for id in [PlayerId(1), PlayerId(2)] {
            assert_eq!(
                ledger.replay_balance(id).unwrap(),
                ledger.balance(id).unwrap()
            );
        }
        let last = ledger.journal().last().unwrap();
        assert_eq!(last.before, 1_460);
        assert_eq!(last.after, 1_480);
    }

    #[test]
    fn debit_may_overdraw() {
        let mut ledger = ledger();
        let balance = ledger
            .debit(PlayerId(2), 2_000, EntryReason::Adjustment)
            .unwrap();
        assert_eq!(balance, -500);
    }

    #[test]
    fn jail_cards_are_counted() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.use_jail_card(PlayerId(1)),
            Err(LedgerError::NoJailCard {
                player: PlayerId(1)
            })
        );
        assert_eq!(ledger.grant_jail_card(PlayerId(1)).unwrap(), 1);
        assert_eq!(ledger.use_jail_card(PlayerId(1)).unwrap(), 0);
        ledger.send_to_jail(PlayerId(2)).unwrap();
        assert!(ledger.player(PlayerId(2)).unwrap().in_jail());
        ledger.release_from_jail(PlayerId(2)).unwrap();
        assert!(!ledger.player(PlayerId(2)).unwrap().in_jail());
    }

    #[test]
    fn turn_order_rotates_fifo() {
        let mut order = TurnOrder::new([PlayerId(1), PlayerId(2), PlayerId(3)]).unwrap();
        assert_eq!(order.active(), PlayerId(1));
        assert_eq!(order.rotate(), PlayerId(2));
        assert_eq!(
            order.waiting().iter().copied().collect::<Vec<_>>(),
            [PlayerId(3), PlayerId(1)]
        );
        assert_eq!(order.rotate(), PlayerId(3));
        assert_eq!(order.rotate(), PlayerId(1));
        assert!(TurnOrder::new(std::iter::empty()).is_none());

        let mut solo = TurnOrder::new([PlayerId(5)]).unwrap();
        assert_eq!(solo.rotate(), PlayerId(5));
    }
}
