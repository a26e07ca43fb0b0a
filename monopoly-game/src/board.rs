//! The physical board: space layout, dice and token positions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BOARD_SIZE, CHANCE_POSITIONS, COMMUNITY_CHEST_POSITIONS, POSITION_FREE_PARKING, POSITION_GO,
    POSITION_GO_TO_JAIL, POSITION_INCOME_TAX, POSITION_JAIL, POSITION_LUXURY_TAX,
};
use crate::dice::{Dice, DiceRoll};
use crate::ledger::PlayerId;

/// Classification of a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceType {
    Property,
    Chance,
    CommunityChest,
    IncomeTax,
    LuxuryTax,
    Go,
    Jail,
    FreeParking,
    GoToJail,
}

impl SpaceType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Chance => "chance",
            Self::CommunityChest => "community chest",
            Self::IncomeTax => "income tax",
            Self::LuxuryTax => "luxury tax",
            Self::Go => "go",
            Self::Jail => "jail",
            Self::FreeParking => "free parking",
            Self::GoToJail => "go to jail",
        }
    }
}

impl std::fmt::Display for SpaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

const fn contains(set: &[u8], position: u8) -> bool {
    let mut i = 0;
    while i < set.len() {
        if set[i] == position {
            return true;
        }
        i += 1;
    }
    false
}

const fn classify(position: u8) -> SpaceType {
    if position == POSITION_GO {
        SpaceType::Go
    } else if position == POSITION_JAIL {
        SpaceType::Jail
    } else if position == POSITION_FREE_PARKING {
        SpaceType::FreeParking
    } else if position == POSITION_GO_TO_JAIL {
        SpaceType::GoToJail
    } else if position == POSITION_INCOME_TAX {
        SpaceType::IncomeTax
    } else if position == POSITION_LUXURY_TAX {
        SpaceType::LuxuryTax
    } else if contains(&CHANCE_POSITIONS, position) {
        SpaceType::Chance
    } else if contains(&COMMUNITY_CHEST_POSITIONS, position) {
        SpaceType::CommunityChest
    } else {
        SpaceType::Property
    }
}

const fn build_layout() -> [SpaceType; BOARD_SIZE as usize] {
    let mut layout = [SpaceType::Property; BOARD_SIZE as usize];
    let mut position = 0;
    while position < BOARD_SIZE {
        layout[position as usize] = classify(position);
        position += 1;
    }
    layout
}

const LAYOUT: [SpaceType; BOARD_SIZE as usize] = build_layout();

/// Errors raised by board operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid board position {position} (must be below 40)")]
    PositionOutOfRange { position: u8 },
    #[error("token {token} is already on the board")]
    DuplicateToken { token: PlayerId },
    #[error("token {token} is not on the board")]
    UnknownToken { token: PlayerId },
    #[error("token {token} cannot move {spaces} spaces; movement must be non-negative")]
    NegativeAdvance { token: PlayerId, spaces: i32 },
}

/// Space type of `position` on the classic layout.
///
/// # Errors
///
/// Returns [`BoardError::PositionOutOfRange`] for positions past the last space.
pub fn space_type_at(position: u8) -> Result<SpaceType, BoardError> {
    LAYOUT
        .get(usize::from(position))
        .copied()
        .ok_or(BoardError::PositionOutOfRange { position })
}

/// Result of moving a token forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    pub from: u8,
    pub to: u8,
    /// How many times the move reached or crossed Go.
    pub laps: u32,
}

impl Advance {
    #[must_use]
    pub const fn passed_go(&self) -> bool {
        self.laps > 0
    }
}

/// Token positions plus the dice used to move them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    tokens: BTreeMap<PlayerId, u8>,
    last_roll: DiceRoll,
    #[serde(skip)]
    dice: Dice,
}

impl Board {
    #[must_use]
    pub fn new(dice: Dice) -> Self {
        Self {
            tokens: BTreeMap::new(),
            last_roll: DiceRoll::default(),
            dice,
        }
    }

    /// Throw both dice and remember the result as the board's last roll.
    pub fn roll_dice(&mut self) -> DiceRoll {
        self.last_roll = self.dice.roll();
        self.last_roll
    }

    #[must_use]
    pub const fn last_roll(&self) -> DiceRoll {
        self.last_roll
    }

    #[must_use]
    pub const fn dice(&self) -> &Dice {
        &self.dice
    }

    /// Classify a board position.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::PositionOutOfRange`] for positions past the last space.
    pub fn space_type(&self, position: u8) -> Result<SpaceType, BoardError> {
        space_type_at(position)
    }

    /// Place a new token on Go.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::DuplicateToken`] if the token is already placed.
    pub fn add_token(&mut self, token: PlayerId) -> Result<(), BoardError> {
        if self.tokens.contains_key(&token) {
            return Err(BoardError::DuplicateToken { token });
        }
        self.tokens.insert(token, POSITION_GO);
        Ok(())
    }

    /// Move a token `spaces` forward, wrapping past Go.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NegativeAdvance`] for negative movement and
    /// [`BoardError::UnknownToken`] if the token was never placed. Neither
    /// case moves anything.
    pub fn advance_token(&mut self, token: PlayerId, spaces: i32) -> Result<Advance, BoardError> {
        let Ok(steps) = u32::try_from(spaces) else {
            return Err(BoardError::NegativeAdvance { token, spaces });
        };
        let slot = self
            .tokens
            .get_mut(&token)
            .ok_or(BoardError::UnknownToken { token })?;
        let from = *slot;
        let travelled = u64::from(from) + u64::from(steps);
        let size = u64::from(BOARD_SIZE);
        let to = u8::try_from(travelled % size).unwrap_or(POSITION_GO);
        let laps = u32::try_from(travelled / size).unwrap_or(u32::MAX);
        *slot = to;
        Ok(Advance { from, to, laps })
    }

    /// Relocate a token directly; never counts as passing Go.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range position or an unknown token.
    pub fn set_token_position(&mut self, token: PlayerId, position: u8) -> Result<(), BoardError> {
        space_type_at(position)?;
        let slot = self
            .tokens
            .get_mut(&token)
            .ok_or(BoardError::UnknownToken { token })?;
        *slot = position;
        Ok(())
    }

    /// Current position of a token.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownToken`] if the token was never placed.
    pub fn token_position(&self, token: PlayerId) -> Result<u8, BoardError> {
        self.tokens
            .get(&token)
            .copied()
            .ok_or(BoardError::UnknownToken { token })
    }

    #[must_use]
    pub fn has_token(&self, token: PlayerId) -> bool {
        self.tokens.contains_key(&token)
    }

    /// All placed tokens with their positions, ordered by token id.
    pub fn tokens(&self) -> impl Iterator<Item = (PlayerId, u8)> + '_ {
        self.tokens.iter().map(|(token, position)| (*token, *position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(Dice::from_seed(5))
    }

    #[test]
    fn layout_is_total_and_stable() {
        for position in 0..BOARD_SIZE {
            let first = space_type_at(position).unwrap();
            assert_eq!(space_type_at(position).unwrap(), first);
        }
        assert_eq!(
            space_type_at(BOARD_SIZE),
            Err(BoardError::PositionOutOfRange { position: 40 })
        );
    }

    #[test]
    fn layout_matches_classic_board() {
        assert_eq!(space_type_at(0).unwrap(), SpaceType::Go);
        assert_eq!(space_type_at(4).unwrap(), SpaceType::IncomeTax);
        assert_eq!(space_type_at(7).unwrap(), SpaceType::Chance);
        assert_eq!(space_type_at(10).unwrap(), SpaceType::Jail);
        assert_eq!(space_type_at(17).unwrap(), SpaceType::CommunityChest);
        assert_eq!(space_type_at(20).unwrap(), SpaceType::FreeParking);
        assert_eq!(space_type_at(30).unwrap(), SpaceType::GoToJail);
        assert_eq!(space_type_at(38).unwrap(), SpaceType::LuxuryTax);
        let properties = (0..BOARD_SIZE)
            .filter(|p| space_type_at(*p).unwrap() == SpaceType::Property)
            .count();
        assert_eq!(properties, crate::constants::PROPERTY_COUNT);
    }

    #[test]
    fn duplicate_tokens_are_rejected() {
        let mut board = board();
        board.add_token(PlayerId(1)).unwrap();
        assert_eq!(board.token_position(PlayerId(1)).unwrap(), 0);
        assert_eq!(
            board.add_token(PlayerId(1)),
            Err(BoardError::DuplicateToken { token: PlayerId(1) })
        );
    }

    #[test]
    fn advance_wraps_and_counts_laps() {
        let mut board = board();
        board.add_token(PlayerId(1)).unwrap();
        board.set_token_position(PlayerId(1), 35).unwrap();
        let advance = board.advance_token(PlayerId(1), 8).unwrap();
        assert_eq!(advance, Advance { from: 35, to: 3, laps: 1 });
        assert!(advance.passed_go());

        let still = board.advance_token(PlayerId(1), 0).unwrap();
        assert_eq!(still.to, 3);
        assert!(!still.passed_go());

        let far = board.advance_token(PlayerId(1), 117).unwrap();
        assert_eq!(far.to, 0);
        assert_eq!(far.laps, 3);
    }

    #[test]
    fn advance_property_holds_for_every_start() {
        for start in 0..BOARD_SIZE {
            for spaces in 0..=24 {
                let mut board = board();
                board.add_token(PlayerId(9)).unwrap();
                board.set_token_position(PlayerId(9), start).unwrap();
                let advance = board.advance_token(PlayerId(9), spaces).unwrap();
                let expected = (i32::from(start) + spaces) % 40;
                assert_eq!(i32::from(advance.to), expected);
            }
        }
    }

    #[test]
    fn invalid_moves_leave_positions_untouched() {
        let mut board = board();
        board.add_token(PlayerId(2)).unwrap();
        assert_eq!(
            board.advance_token(PlayerId(2), -1),
            Err(BoardError::NegativeAdvance {
                token: PlayerId(2),
                spaces: -1
            })
        );
        assert_eq!(
            board.advance_token(PlayerId(3), 4),
            Err(BoardError::UnknownToken { token: PlayerId(3) })
        );
        assert_eq!(
            board.set_token_position(PlayerId(2), 44),
            Err(BoardError::PositionOutOfRange { position: 44 })
        );
        assert_eq!(board.token_position(PlayerId(2)).unwrap(), 0);
    }

    #[test]
    fn rolling_updates_last_roll() {
        let forced = DiceRoll::new(6, 5).unwrap();
        let mut board = Board::new(Dice::with_script(0, [forced]));
        assert_eq!(board.last_roll(), DiceRoll::default());
        assert_eq!(board.roll_dice(), forced);
        assert_eq!(board.last_roll(), forced);
    }
}
