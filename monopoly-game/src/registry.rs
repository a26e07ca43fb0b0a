//! Ownership and development state for every purchasable property.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::catalog::{ColorGroup, Property, PropertyCatalog, PropertyClass};
use crate::constants::{BOARD_SIZE, MAX_DEVELOPMENT_LEVEL};
use crate::ledger::PlayerId;

/// Mutable per-property state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyAssignment {
    pub position: u8,
    pub owner: Option<PlayerId>,
    /// Houses on a street, 5 meaning a hotel. Always 0 for non-streets.
    pub development: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid board position {position} (must be below 40)")]
    PositionOutOfRange { position: u8 },
    #[error("position {position} is not a purchasable property")]
    NotAProperty { position: u8 },
    #[error("property at position {position} has no owner")]
    Unowned { position: u8 },
    #[error("property at position {position} is not a street")]
    NotAStreet { position: u8 },
    #[error("development level {level} is invalid for position {position} (expected 0..=5)")]
    InvalidDevelopmentLevel { position: u8, level: u8 },
    #[error("player {player} does not own the property at position {position}")]
    NotOwner { position: u8, player: PlayerId },
    #[error("the color group of position {position} is not a monopoly")]
    NoMonopoly { position: u8 },
}

/// Who owns what, and how far each street is developed.
///
/// Property definitions are shared with the catalog through an [`Arc`], so
/// cloning a registry only copies the assignment table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRegistry {
    catalog: Arc<PropertyCatalog>,
    assignments: BTreeMap<u8, PropertyAssignment>,
}

impl PropertyRegistry {
    /// One unowned, undeveloped assignment per catalog entry.
    #[must_use]
    pub fn new(catalog: Arc<PropertyCatalog>) -> Self {
        let assignments = catalog
            .iter()
            .map(|property| {
                (
                    property.position,
                    PropertyAssignment {
                        position: property.position,
                        owner: None,
                        development: 0,
                    },
                )
            })
            .collect();
        Self {
            catalog,
            assignments,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }

    /// Shared handle to the catalog backing this registry.
    #[must_use]
    pub fn catalog_handle(&self) -> Arc<PropertyCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Definition of the property at `position`.
    ///
    /// # Errors
    ///
    /// Fails for out-of-range or non-property positions.
    pub fn property(&self, position: u8) -> Result<&Property, RegistryError> {
        if position >= BOARD_SIZE {
            return Err(RegistryError::PositionOutOfRange { position });
        }
        self.catalog
            .get(position)
            .ok_or(RegistryError::NotAProperty { position })
    }

    /// Ownership record for `position`.
    ///
    /// # Errors
    ///
    /// Fails for out-of-range or non-property positions.
    pub fn assignment(&self, position: u8) -> Result<&PropertyAssignment, RegistryError> {
        self.property(position)?;
        self.assignments
            .get(&position)
            .ok_or(RegistryError::NotAProperty { position })
    }

    fn assignment_mut(&mut self, position: u8) -> Result<&mut PropertyAssignment, RegistryError> {
        self.property(position)?;
        self.assignments
            .get_mut(&position)
            .ok_or(RegistryError::NotAProperty { position })
    }

    /// All assignments in board order.
    pub fn assignments(&self) -> impl Iterator<Item = &PropertyAssignment> {
        self.assignments.values()
    }

    /// Current owner, `None` when the bank still holds the deed.
    ///
    /// # Errors
    ///
    /// Fails for out-of-range or non-property positions.
    pub fn owner_of(&self, position: u8) -> Result<Option<PlayerId>, RegistryError> {
        Ok(self.assignment(position)?.owner)
    }

    /// Current owner, failing when nobody owns the property yet.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unowned`] for bank-held properties.
    pub fn require_owner(&self, position: u8) -> Result<PlayerId, RegistryError> {
        self.owner_of(position)?
            .ok_or(RegistryError::Unowned { position })
    }

    /// `false` for unowned properties and for positions that are not properties.
    #[must_use]
    pub fn is_owned(&self, position: u8) -> bool {
        matches!(self.owner_of(position), Ok(Some(_)))
    }

    /// Record `player` as the owner, replacing any previous owner.
    ///
    /// # Errors
    ///
    /// Fails for out-of-range or non-property positions.
    pub fn assign_owner(&mut self, position: u8, player: PlayerId) -> Result<(), RegistryError> {
        let assignment = self.assignment_mut(position)?;
        if let Some(previous) = assignment.owner.filter(|owner| *owner != player) {
            log::warn!("overwriting owner {previous} of position {position} with {player}");
        }
        assignment.owner = Some(player);
        Ok(())
    }

    /// Hand a deed from its current owner to another player.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotOwner`] unless `from` currently owns it.
    pub fn transfer_ownership(
        &mut self,
        position: u8,
        from: PlayerId,
        to: PlayerId,
    ) -> Result<(), RegistryError> {
        let assignment = self.assignment_mut(position)?;
        if assignment.owner != Some(from) {
            return Err(RegistryError::NotOwner {
                position,
                player: from,
            });
        }
        assignment.owner = Some(to);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails for out-of-range or non-property positions.
    pub fn development_level(&self, position: u8) -> Result<u8, RegistryError> {
        Ok(self.assignment(position)?.development)
    }

    /// Overwrite the development level of a street.
    ///
    /// # Errors
    ///
    /// Fails when the property is not a street or `level` exceeds a hotel.
    pub fn set_development_level(&mut self, position: u8, level: u8) -> Result<(), RegistryError> {
        if self.property(position)?.street().is_none() {
            return Err(RegistryError::NotAStreet { position });
        }
        if level > MAX_DEVELOPMENT_LEVEL {
            return Err(RegistryError::InvalidDevelopmentLevel { position, level });
        }
        self.assignment_mut(position)?.development = level;
        Ok(())
    }

    fn require_street_owner(&self, position: u8, owner: PlayerId) -> Result<u8, RegistryError> {
        if self.property(position)?.street().is_none() {
            return Err(RegistryError::NotAStreet { position });
        }
        let assignment = self.assignment(position)?;
        if assignment.owner != Some(owner) {
            return Err(RegistryError::NotOwner {
                position,
                player: owner,
            });
        }
        Ok(assignment.development)
    }

    /// Add one house (or the hotel) to a street, returning the new level.
    ///
    /// # Errors
    ///
    /// Requires `owner` to hold the street and its whole color group, and the
    /// street to be below hotel level.
    pub fn build_house(&mut self, position: u8, owner: PlayerId) -> Result<u8, RegistryError> {
        let level = self.require_street_owner(position, owner)?;
        if !self.is_monopoly(position)? {
            return Err(RegistryError::NoMonopoly { position });
        }
        let next = level.saturating_add(1);
        if next > MAX_DEVELOPMENT_LEVEL {
            return Err(RegistryError::InvalidDevelopmentLevel {
                position,
                level: next,
            });
        }
        self.assignment_mut(position)?.development = next;
        Ok(next)
    }

    /// Remove one house from a street, returning the new level.
    ///
    /// # Errors
    ///
    /// Requires `owner` to hold the street and the street to be developed.
    pub fn sell_house(&mut self, position: u8, owner: PlayerId) -> Result<u8, RegistryError> {
        let level = self.require_street_owner(position, owner)?;
        let Some(next) = level.checked_sub(1) else {
            return Err(RegistryError::InvalidDevelopmentLevel { position, level: 0 });
        };
        self.assignment_mut(position)?.development = next;
        Ok(next)
    }

    /// Streets in a color group, in board order.
    #[must_use]
    pub fn properties_in_color_group(&self, group: ColorGroup) -> SmallVec<[u8; 3]> {
        self.catalog.color_group_positions(group)
    }

    /// How many properties of `class` one player holds.
    #[must_use]
    pub fn count_owned(&self, owner: PlayerId, class: PropertyClass) -> u8 {
        let count = self
            .catalog
            .positions_of(class)
            .iter()
            .filter(|position| {
                self.assignments
                    .get(position)
                    .is_some_and(|assignment| assignment.owner == Some(owner))
            })
            .count();
        u8::try_from(count).unwrap_or(u8::MAX)
    }

    /// Positions owned by one player, in board order.
    #[must_use]
    pub fn holdings(&self, owner: PlayerId) -> Vec<u8> {
        self.assignments
            .values()
            .filter(|assignment| assignment.owner == Some(owner))
            .map(|assignment| assignment.position)
            .collect()
    }

    /// Whether the owner of this street also owns the rest of its color group.
    ///
    /// Railroads, utilities and unowned streets are never monopolies.
    ///
    /// # Errors
    ///
    /// Fails for out-of-range or non-property positions.
    pub fn is_monopoly(&self, position: u8) -> Result<bool, RegistryError> {
        let Some(street) = self.property(position)?.street() else {
            return Ok(false);
        };
        let Some(owner) = self.owner_of(position)? else {
            return Ok(false);
        };
        for member in self.properties_in_color_group(street.color) {
            if self.owner_of(member)? != Some(owner) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    fn registry() -> PropertyRegistry {
        PropertyRegistry::new(Arc::new(PropertyCatalog::load_from_static().unwrap()))
    }

    fn own_red_group(registry: &mut PropertyRegistry, owner: PlayerId) {
        for position in registry.properties_in_color_group(ColorGroup::Red) {
            registry.assign_owner(position, owner).unwrap();
        }
    }

    #[test]
    fn starts_unowned_and_undeveloped() {
        let registry = registry();
        assert_eq!(registry.assignments().count(), 28);
        assert!(registry.assignments().all(|a| a.owner.is_none() && a.development == 0));
        assert_eq!(registry.owner_of(24), Ok(None));
        assert_eq!(
            registry.require_owner(24),
            Err(RegistryError::Unowned { position: 24 })
        );
    }

    #[test]
    fn non_property_positions_are_rejected() {
        let registry = registry();
        assert_eq!(
            registry.owner_of(7),
            Err(RegistryError::NotAProperty { position: 7 })
        );
        assert_eq!(
            registry.owner_of(40),
            Err(RegistryError::PositionOutOfRange { position: 40 })
        );
        assert!(!registry.is_owned(7));
        assert!(!registry.is_owned(200));
    }

    #[test]
    fn ownership_can_be_assigned_and_transferred() {
        let mut registry = registry();
        registry.assign_owner(24, ALICE).unwrap();
        assert!(registry.is_owned(24));
        assert_eq!(registry.require_owner(24), Ok(ALICE));
        assert_eq!(
            registry.transfer_ownership(24, BOB, ALICE),
            Err(RegistryError::NotOwner {
                position: 24,
                player: BOB
            })
        );
        registry.transfer_ownership(24, ALICE, BOB).unwrap();
        assert_eq!(registry.owner_of(24), Ok(Some(BOB)));
        assert_eq!(registry.holdings(BOB), vec![24]);
        assert!(registry.holdings(ALICE).is_empty());
    }

    #[test]
    fn monopoly_requires_whole_group() {
        let mut registry = registry();
        own_red_group(&mut registry, ALICE);
        for position in [21, 23, 24] {
            assert_eq!(registry.is_monopoly(position), Ok(true));
        }
        registry.assign_owner(23, BOB).unwrap();
        for position in [21, 23, 24] {
            assert_eq!(registry.is_monopoly(position), Ok(false));
        }
    }

    #[test]
    fn unowned_member_breaks_monopoly() {
        let mut registry = registry();
        registry.assign_owner(37, ALICE).unwrap();
        assert_eq!(registry.is_monopoly(37), Ok(false));
        registry.assign_owner(39, ALICE).unwrap();
        assert_eq!(registry.is_monopoly(37), Ok(true));
        registry.assign_owner(5, ALICE).unwrap();
        assert_eq!(registry.is_monopoly(5), Ok(false));
    }

    #[test]
    fn development_is_street_only_and_bounded() {
        let mut registry = registry();
        registry.set_development_level(24, 5).unwrap();
        assert_eq!(registry.development_level(24), Ok(5));
        assert_eq!(
            registry.set_development_level(24, 6),
            Err(RegistryError::InvalidDevelopmentLevel {
                position: 24,
                level: 6
            })
        );
        assert_eq!(
            registry.set_development_level(5, 1),
            Err(RegistryError::NotAStreet { position: 5 })
        );
        assert_eq!(registry.development_level(5), Ok(0));
    }

    #[test]
    fn building_needs_monopoly_and_ownership() {
        let mut registry = registry();
        registry.assign_owner(24, ALICE).unwrap();
        assert_eq!(
            registry.build_house(24, ALICE),
            Err(RegistryError::NoMonopoly { position: 24 })
        );
        own_red_group(&mut registry, ALICE);
        assert_eq!(
            registry.build_house(24, BOB),
            Err(RegistryError::NotOwner {
                position: 24,
                player: BOB
            })
        );
        for expected in 1..=5 {
            assert_eq!(registry.build_house(24, ALICE), Ok(expected));
        }
        assert!(registry.build_house(24, ALICE).is_err());
        assert_eq!(registry.sell_house(24, ALICE), Ok(4));

        let mut bare = registry.clone();
        bare.set_development_level(21, 0).unwrap();
        assert_eq!(
            bare.sell_house(21, ALICE),
            Err(RegistryError::InvalidDevelopmentLevel {
                position: 21,
                level: 0
            })
        );
    }

    #[test]
    fn counts_holdings_by_class() {
        let mut registry = registry();
        for position in [5, 15, 25] {
            registry.assign_owner(position, ALICE).unwrap();
        }
        registry.assign_owner(35, BOB).unwrap();
        registry.assign_owner(12, ALICE).unwrap();
        assert_eq!(registry.count_owned(ALICE, PropertyClass::Railroad), 3);
        assert_eq!(registry.count_owned(BOB, PropertyClass::Railroad), 1);
        assert_eq!(registry.count_owned(ALICE, PropertyClass::Utility), 1);
        assert_eq!(registry.count_owned(BOB, PropertyClass::Street), 0);
    }
}
