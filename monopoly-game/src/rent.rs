//! Pure rent computation.
//!
//! Precedence for a street: a developed street charges its tier, a bare street
//! charges double base rent when its owner holds the whole color group, and
//! base rent otherwise. Nothing here mutates game state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{PropertyClass, PropertyKind, Street};
use crate::constants::{
    MAX_DICE_SUM, MIN_DICE_SUM, MONOPOLY_BASE_MULTIPLIER, RAILROAD_BASE_RENT, RAILROAD_COUNT,
    UTILITY_COUNT, UTILITY_PAIR_MULTIPLIER, UTILITY_SINGLE_MULTIPLIER,
};
use crate::dice::DiceRoll;
use crate::ledger::PlayerId;
use crate::registry::{PropertyRegistry, RegistryError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RentError {
    #[error("railroad count {count} is outside 1..=4")]
    RailroadCount { count: u8 },
    #[error("utility count {count} is outside 1..=2")]
    UtilityCount { count: u8 },
    #[error("dice total {sum} is outside 2..=12")]
    DiceSum { sum: u8 },
    #[error("street has no rent tier for development level {level}")]
    DevelopmentLevel { level: u8 },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// What a rent amount was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RentBasis {
    Street { level: u8, monopoly: bool },
    Railroad { owned: u8 },
    Utility { owned: u8, dice_sum: u8 },
}

/// Rent owed for landing on an owned property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentQuote {
    pub position: u8,
    pub owner: PlayerId,
    pub amount: u32,
    pub basis: RentBasis,
}

/// Rent for a street at a development level.
///
/// `monopoly` only matters for a bare street.
///
/// # Errors
///
/// Returns [`RentError::DevelopmentLevel`] when `level` has no rent tier.
pub fn street_rent(street: &Street, level: u8, monopoly: bool) -> Result<u32, RentError> {
    let tier = street
        .rent_at(level)
        .ok_or(RentError::DevelopmentLevel { level })?;
    if level == 0 && monopoly {
        return Ok(tier * MONOPOLY_BASE_MULTIPLIER);
    }
    Ok(tier)
}

/// 25, 50, 100, 200 for one through four railroads.
///
/// # Errors
///
/// Returns [`RentError::RailroadCount`] for counts outside `1..=4`.
pub fn railroad_rent(owned: u8) -> Result<u32, RentError> {
    if !(1..=RAILROAD_COUNT).contains(&owned) {
        return Err(RentError::RailroadCount { count: owned });
    }
    Ok(RAILROAD_BASE_RENT << (owned - 1))
}

/// Dice total times 4 for one utility, times 10 for both.
///
/// # Errors
///
/// Returns an error for counts outside `1..=2` or totals outside `2..=12`.
pub fn utility_rent(owned: u8, dice_sum: u8) -> Result<u32, RentError> {
    if !(MIN_DICE_SUM..=MAX_DICE_SUM).contains(&dice_sum) {
        return Err(RentError::DiceSum { sum: dice_sum });
    }
    let multiplier = match owned {
        1 => UTILITY_SINGLE_MULTIPLIER,
        n if n == UTILITY_COUNT => UTILITY_PAIR_MULTIPLIER,
        _ => return Err(RentError::UtilityCount { count: owned }),
    };
    Ok(u32::from(dice_sum) * multiplier)
}

/// Quote the rent owed for landing on `position` with `roll`.
///
/// # Errors
///
/// Fails for non-property positions, unowned properties, and any rent input
/// outside its valid range.
pub fn rent_due(
    registry: &PropertyRegistry,
    position: u8,
    roll: DiceRoll,
) -> Result<RentQuote, RentError> {
    let owner = registry.require_owner(position)?;
    let property = registry.property(position)?;
    let (amount, basis) = match &property.kind {
        PropertyKind::Street(street) => {
            let level = registry.development_level(position)?;
            let monopoly = registry.is_monopoly(position)?;
            (
                street_rent(street, level, monopoly)?,
                RentBasis::Street { level, monopoly },
            )
        }
        PropertyKind::Railroad => {
            let owned = registry.count_owned(owner, PropertyClass::Railroad);
            (railroad_rent(owned)?, RentBasis::Railroad { owned })
        }
        PropertyKind::Utility => {
            let owned = registry.count_owned(owner, PropertyClass::Utility);
            let dice_sum = roll.total();
            (
                utility_rent(owned, dice_sum)?,
                RentBasis::Utility { owned, dice_sum },
            )
        }
    };
    Ok(RentQuote {
        position,
        owner,
        amount,
        basis,
    })
}
