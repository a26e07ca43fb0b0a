//! Fixed board geometry and default rule values.
//!
//! Everything the bundled rules depend on lives here so a change to the
//! classic board numbers goes through one reviewed file. Tunables that a host
//! may override (starting cash, fines, Go salary) are only defaults; see
//! [`crate::config::RulesConfig`].

// Board geometry -----------------------------------------------------------
pub const BOARD_SIZE: u8 = 40;
pub const POSITION_GO: u8 = 0;
pub const POSITION_JAIL: u8 = 10;
pub const POSITION_FREE_PARKING: u8 = 20;
pub const POSITION_GO_TO_JAIL: u8 = 30;
pub const POSITION_INCOME_TAX: u8 = 4;
pub const POSITION_LUXURY_TAX: u8 = 38;
pub const COMMUNITY_CHEST_POSITIONS: [u8; 3] = [2, 17, 33];
pub const CHANCE_POSITIONS: [u8; 3] = [7, 22, 36];

/// Number of purchasable spaces on the board.
pub const PROPERTY_COUNT: usize = 28;

// Dice ---------------------------------------------------------------------
pub const DIE_FACES: u8 = 6;
pub const MIN_DICE_SUM: u8 = 2;
pub const MAX_DICE_SUM: u8 = 12;

// Development --------------------------------------------------------------
pub const MAX_DEVELOPMENT_LEVEL: u8 = 5;
pub const RENT_TIERS: usize = 6;

// Rent ---------------------------------------------------------------------
pub const RAILROAD_BASE_RENT: u32 = 25;
pub const RAILROAD_COUNT: u8 = 4;
pub const UTILITY_COUNT: u8 = 2;
pub const UTILITY_SINGLE_MULTIPLIER: u32 = 4;
pub const UTILITY_PAIR_MULTIPLIER: u32 = 10;
pub const MONOPOLY_BASE_MULTIPLIER: u32 = 2;

// Default rules ------------------------------------------------------------
pub const DEFAULT_STARTING_BALANCE: i64 = 1_500;
pub const DEFAULT_JAIL_FINE: u32 = 50;
pub const DEFAULT_GO_SALARY: u32 = 200;

// Roster -------------------------------------------------------------------
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 8;

// RNG domain tags ----------------------------------------------------------
pub(crate) const DICE_STREAM_TAG: &[u8] = b"dice";
