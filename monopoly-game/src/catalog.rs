//! Immutable definitions of every purchasable property.
//!
//! The catalog is parsed once from JSON records shaped like
//! `{"name", "cost", "position", "type", "rent", "house", "color"}` where the
//! street-only fields (`rent`, `house`, `color`) are required for `STREET`
//! records and ignored otherwise.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::board::{BoardError, SpaceType, space_type_at};
use crate::constants::{PROPERTY_COUNT, RAILROAD_COUNT, RENT_TIERS, UTILITY_COUNT};

const STANDARD_PROPERTY_DATA: &str = include_str!("../data/properties.json");

/// Street color groups; owning a whole group is a monopoly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorGroup {
    Purple,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
}

impl ColorGroup {
    pub const ALL: [Self; 8] = [
        Self::Purple,
        Self::LightBlue,
        Self::Pink,
        Self::Orange,
        Self::Red,
        Self::Yellow,
        Self::Green,
        Self::DarkBlue,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Purple => "purple",
            Self::LightBlue => "light blue",
            Self::Pink => "pink",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::DarkBlue => "dark blue",
        }
    }

    /// Streets in the group on the standard board.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Purple | Self::DarkBlue => 2,
            _ => 3,
        }
    }
}

/// Street-only data: rent tiers, house cost and color group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Street {
    /// Rent for development levels 0 (bare) through 5 (hotel).
    pub rent: [u32; RENT_TIERS],
    pub house_cost: u32,
    pub color: ColorGroup,
}

impl Street {
    /// Rent printed on the deed for a development level, if the level exists.
    #[must_use]
    pub fn rent_at(&self, level: u8) -> Option<u32> {
        self.rent.get(usize::from(level)).copied()
    }

    #[must_use]
    pub const fn base_rent(&self) -> u32 {
        self.rent[0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyKind {
    Street(Street),
    Railroad,
    Utility,
}

/// Payload-free view of [`PropertyKind`] used for counting holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyClass {
    Street,
    Railroad,
    Utility,
}

impl PropertyKind {
    #[must_use]
    pub const fn class(&self) -> PropertyClass {
        match self {
            Self::Street(_) => PropertyClass::Street,
            Self::Railroad => PropertyClass::Railroad,
            Self::Utility => PropertyClass::Utility,
        }
    }
}

/// A purchasable board space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub position: u8,
    /// Price to buy the deed from the bank.
    pub price: u32,
    pub kind: PropertyKind,
}

impl Property {
    #[must_use]
    pub const fn street(&self) -> Option<&Street> {
        match &self.kind {
            PropertyKind::Street(street) => Some(street),
            PropertyKind::Railroad | PropertyKind::Utility => None,
        }
    }

    #[must_use]
    pub const fn class(&self) -> PropertyClass {
        self.kind.class()
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            PropertyKind::Street(street) => write!(
                f,
                "'{}' => street[{}] / pos {}, price {}, max rent {}",
                self.name,
                street.color.label(),
                self.position,
                self.price,
                street.rent[RENT_TIERS - 1]
            ),
            PropertyKind::Railroad => write!(
                f,
                "'{}' => railroad / pos {}, price {}",
                self.name, self.position, self.price
            ),
            PropertyKind::Utility => write!(
                f,
                "'{}' => utility / pos {}, price {}",
                self.name, self.position, self.price
            ),
        }
    }
}

/// Errors raised while loading property definitions.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed property data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("street '{name}' has {found} rent tiers (expected 6)")]
    RentTable { name: String, found: usize },
    #[error("catalog must define {expected} properties (found {found})")]
    WrongCount { expected: usize, found: usize },
    #[error("two properties claim board position {position}")]
    DuplicatePosition { position: u8 },
    #[error("'{name}' sits on position {position}, which is a {space} space")]
    NotAPropertySpace {
        name: String,
        position: u8,
        space: SpaceType,
    },
    #[error("catalog defines {found} {class:?} properties (expected {expected})")]
    ClassCount {
        class: PropertyClass,
        expected: usize,
        found: usize,
    },
    #[error("the {} group has {found} streets (expected {expected})", .group.label())]
    GroupSize {
        group: ColorGroup,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum PropertyRecord {
    Street {
        name: String,
        cost: u32,
        position: u8,
        rent: Vec<u32>,
        house: u32,
        color: ColorGroup,
    },
    Railroad {
        name: String,
        cost: u32,
        position: u8,
    },
    Utility {
        name: String,
        cost: u32,
        position: u8,
    },
}

impl PropertyRecord {
    fn into_property(self) -> Result<Property, CatalogError> {
        match self {
            Self::Street {
                name,
                cost,
                position,
                rent,
                house,
                color,
            } => {
                let rent: [u32; RENT_TIERS] = match rent.try_into() {
                    Ok(rent) => rent,
                    Err(rent) => {
                        return Err(CatalogError::RentTable {
                            name,
                            found: rent.len(),
                        });
                    }
                };
                Ok(Property {
                    name,
                    position,
                    price: cost,
                    kind: PropertyKind::Street(Street {
                        rent,
                        house_cost: house,
                        color,
                    }),
                })
            }
            Self::Railroad {
                name,
                cost,
                position,
            } => Ok(Property {
                name,
                position,
                price: cost,
                kind: PropertyKind::Railroad,
            }),
            Self::Utility {
                name,
                cost,
                position,
            } => Ok(Property {
                name,
                position,
                price: cost,
                kind: PropertyKind::Utility,
            }),
        }
    }
}

/// All purchasable properties ordered by board position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyCatalog {
    properties: Vec<Property>,
}

impl PropertyCatalog {
    /// Parse and validate a catalog from a JSON array of property records.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown type tags, malformed rent arrays, a count
    /// other than 28, duplicate positions, records placed on a non-property
    /// space, or a layout other than 4 railroads, 2 utilities and eight color
    /// groups of standard size.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<PropertyRecord> = serde_json::from_str(json)?;
        let properties = records
            .into_iter()
            .map(PropertyRecord::into_property)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_properties(properties)
    }

    /// Validate an already-built property list.
    ///
    /// # Errors
    ///
    /// See [`PropertyCatalog::from_json`].
    pub fn from_properties(mut properties: Vec<Property>) -> Result<Self, CatalogError> {
        if properties.len() != PROPERTY_COUNT {
            return Err(CatalogError::WrongCount {
                expected: PROPERTY_COUNT,
                found: properties.len(),
            });
        }
        properties.sort_by_key(|property| property.position);
        for pair in properties.windows(2) {
            if pair[0].position == pair[1].position {
                return Err(CatalogError::DuplicatePosition {
                    position: pair[0].position,
                });
            }
        }
        for property in &properties {
            let space = space_type_at(property.position)?;
            if space != SpaceType::Property {
                return Err(CatalogError::NotAPropertySpace {
                    name: property.name.clone(),
                    position: property.position,
                    space,
                });
            }
        }
        let catalog = Self { properties };
        for (class, expected) in [
            (PropertyClass::Railroad, usize::from(RAILROAD_COUNT)),
            (PropertyClass::Utility, usize::from(UTILITY_COUNT)),
        ] {
            let found = catalog.positions_of(class).len();
            if found != expected {
                return Err(CatalogError::ClassCount {
                    class,
                    expected,
                    found,
                });
            }
        }
        for group in ColorGroup::ALL {
            let found = catalog.color_group_positions(group).len();
            if found != group.size() {
                return Err(CatalogError::GroupSize {
                    group,
                    expected: group.size(),
                    found,
                });
            }
        }
        Ok(catalog)
    }

    /// The classic board bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled data has been corrupted.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(STANDARD_PROPERTY_DATA)
    }

    #[must_use]
    pub fn get(&self, position: u8) -> Option<&Property> {
        self.properties
            .binary_search_by_key(&position, |property| property.position)
            .ok()
            .map(|index| &self.properties[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Positions of the streets in a color group, in board order.
    #[must_use]
    pub fn color_group_positions(&self, group: ColorGroup) -> SmallVec<[u8; 3]> {
        self.properties
            .iter()
            .filter(|property| property.street().is_some_and(|street| street.color == group))
            .map(|property| property.position)
            .collect()
    }

    /// Positions of every property of one class, in board order.
    #[must_use]
    pub fn positions_of(&self, class: PropertyClass) -> SmallVec<[u8; 4]> {
        self.properties
            .iter()
            .filter(|property| property.class() == class)
            .map(|property| property.position)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> PropertyCatalog {
        PropertyCatalog::load_from_static().unwrap()
    }

    fn records_with(replace: impl FnOnce(&mut Vec<serde_json::Value>)) -> String {
        let mut records: Vec<serde_json::Value> =
            serde_json::from_str(STANDARD_PROPERTY_DATA).unwrap();
        replace(&mut records);
        serde_json::to_string(&records).unwrap()
    }

    #[test]
    fn bundled_catalog_has_every_property() {
        let catalog = standard();
        assert_eq!(catalog.len(), PROPERTY_COUNT);
        let railroads = catalog.positions_of(PropertyClass::Railroad);
        assert_eq!(railroads.as_slice(), &[5, 15, 25, 35]);
        let utilities = catalog.positions_of(PropertyClass::Utility);
        assert_eq!(utilities.as_slice(), &[12, 28]);
        for group in ColorGroup::ALL {
            let members = catalog.color_group_positions(group);
            assert!((2..=3).contains(&members.len()), "{group:?}");
        }
    }

    #[test]
    fn lookups_follow_board_positions() {
        let catalog = standard();
        let boardwalk = catalog.get(39).unwrap();
        assert_eq!(boardwalk.name, "Boardwalk");
        assert_eq!(boardwalk.price, 400);
        let street = boardwalk.street().unwrap();
        assert_eq!(street.color, ColorGroup::DarkBlue);
        assert_eq!(street.rent_at(5), Some(2_000));
        assert_eq!(street.rent_at(6), None);
        assert!(catalog.get(7).is_none());
        assert!(boardwalk.to_string().contains("dark blue"));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let json = records_with(|records| {
            records[0]["type"] = serde_json::Value::from("HOTEL");
        });
        assert!(matches!(
            PropertyCatalog::from_json(&json),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn short_rent_table_is_rejected() {
        let json = records_with(|records| {
            records[1]["rent"] = serde_json::json!([4, 20, 60]);
        });
        match PropertyCatalog::from_json(&json) {
            Err(CatalogError::RentTable { name, found }) => {
                assert_eq!(name, "Baltic Avenue");
                assert_eq!(found, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn catalog_shape_is_validated() {
        let short = records_with(|records| {
            records.pop();
        });
        assert!(matches!(
            PropertyCatalog::from_json(&short),
            Err(CatalogError::WrongCount {
                expected: 28,
                found: 27
            })
        ));

        let duplicate = records_with(|records| {
            records[1]["position"] = serde_json::Value::from(1);
        });
        assert!(matches!(
            PropertyCatalog::from_json(&duplicate),
            Err(CatalogError::DuplicatePosition { position: 1 })
        ));

        let misplaced = records_with(|records| {
            records[0]["position"] = serde_json::Value::from(7);
        });
        assert!(matches!(
            PropertyCatalog::from_json(&misplaced),
            Err(CatalogError::NotAPropertySpace {
                position: 7,
                space: SpaceType::Chance,
                ..
            })
        ));
    }

    #[test]
    fn fifth_railroad_is_rejected() {
        // Oriental Avenue relabelled as a railroad.
        let json = records_with(|records| {
            records[3]["type"] = serde_json::Value::from("RAILROAD");
        });
        assert!(matches!(
            PropertyCatalog::from_json(&json),
            Err(CatalogError::ClassCount {
                class: PropertyClass::Railroad,
                expected: 4,
                found: 5
            })
        ));
    }

    #[test]
    fn third_utility_is_rejected() {
        let json = records_with(|records| {
            records[3]["type"] = serde_json::Value::from("UTILITY");
        });
        assert!(matches!(
            PropertyCatalog::from_json(&json),
            Err(CatalogError::ClassCount {
                class: PropertyClass::Utility,
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn misshapen_color_group_is_rejected() {
        let json = records_with(|records| {
            records[3]["color"] = serde_json::Value::from("PINK");
        });
        let err = PropertyCatalog::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::GroupSize {
                group: ColorGroup::LightBlue,
                expected: 3,
                found: 2
            }
        ));
        assert!(err.to_string().contains("light blue"));
    }
}
