//! The apartment stock: numbers of apartments per region, by construction era, apartment size and
//! number of dwellings in the building.
use crate::id::RegionID;
use anyhow::{Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

macro_rules! define_class_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            derive_more::Display,
        )]
        pub struct $name(pub u32);
    };
}

define_class_type!(AgeClass, "Ordinal code of a construction-era bracket (0 = before 1919)");
define_class_type!(
    SizeClass,
    "Code of an apartment floor-area bracket, being the bracket's midpoint in m²"
);
define_class_type!(
    UnitCountClass,
    "Code of a bracket of the number of dwellings sharing a building"
);

/// The highest unit-count code for which a building counts as a single-family house
pub const MAX_SINGLE_FAMILY_UNIT_COUNT: UnitCountClass = UnitCountClass(2);

/// The type of residential building
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    /// One- and two-family houses
    #[strum(to_string = "single_family", serialize = "EFH")]
    SingleFamily,
    /// Buildings with three or more dwellings
    #[strum(to_string = "multi_family", serialize = "MFH")]
    MultiFamily,
}

impl BuildingType {
    /// Classify a building by its unit-count code
    pub fn from_unit_count(unit_count: UnitCountClass) -> Self {
        if unit_count > MAX_SINGLE_FAMILY_UNIT_COUNT {
            Self::MultiFamily
        } else {
            Self::SingleFamily
        }
    }
}

/// Identifies a cell of the apartment stock table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StockKey {
    /// Construction era
    pub age: AgeClass,
    /// Apartment size
    pub size: SizeClass,
    /// Dwellings per building
    pub unit_count: UnitCountClass,
}

impl StockKey {
    /// Create a new key from the canonical codes
    pub fn new(age: u32, size: u32, unit_count: u32) -> Self {
        Self {
            age: AgeClass(age),
            size: SizeClass(size),
            unit_count: UnitCountClass(unit_count),
        }
    }

    /// The type of building this cell describes
    pub fn building_type(&self) -> BuildingType {
        BuildingType::from_unit_count(self.unit_count)
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(age: {}, size: {}, units: {})",
            self.age, self.size, self.unit_count
        )
    }
}

/// Apartment counts for each region in one cell of the stock table
pub type RegionCounts = IndexMap<RegionID, u64>;

/// Number of apartments for every combination of [`StockKey`] and region.
///
/// Every cell holds a count for each of the table's regions.
#[derive(Debug, Clone, PartialEq)]
pub struct ApartmentStock {
    regions: IndexSet<RegionID>,
    cells: IndexMap<StockKey, RegionCounts>,
}

impl ApartmentStock {
    /// Create a new stock table, checking that each cell covers exactly the given regions
    pub fn new(regions: IndexSet<RegionID>, cells: IndexMap<StockKey, RegionCounts>) -> Result<Self> {
        for (key, counts) in &cells {
            ensure!(
                counts.len() == regions.len() && counts.keys().all(|id| regions.contains(id)),
                "Stock cell {key} does not cover the regions of the table"
            );
        }

        Ok(Self { regions, cells })
    }

    /// The regions of the table, in column order
    pub fn regions(&self) -> &IndexSet<RegionID> {
        &self.regions
    }

    /// Iterate over the cell keys
    pub fn keys(&self) -> impl Iterator<Item = &StockKey> {
        self.cells.keys()
    }

    /// Iterate over every (key, region, count) triple
    pub fn iter(&self) -> impl Iterator<Item = (&StockKey, &RegionID, u64)> {
        self.cells.iter().flat_map(|(key, counts)| {
            counts
                .iter()
                .map(move |(region_id, count)| (key, region_id, *count))
        })
    }

    /// The number of apartments in the given cell and region
    pub fn count(&self, key: &StockKey, region_id: &RegionID) -> Option<u64> {
        self.cells.get(key)?.get(region_id).copied()
    }

    /// The number of cells in the table
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the table has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::stock;
    use indexmap::indexmap;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(1, BuildingType::SingleFamily)]
    #[case(2, BuildingType::SingleFamily)]
    #[case(4, BuildingType::MultiFamily)]
    #[case(7, BuildingType::MultiFamily)]
    #[case(13, BuildingType::MultiFamily)]
    fn test_building_type_from_unit_count(#[case] code: u32, #[case] expected: BuildingType) {
        assert_eq!(BuildingType::from_unit_count(UnitCountClass(code)), expected);
        assert_eq!(StockKey::new(0, 50, code).building_type(), expected);
    }

    #[rstest]
    #[case("EFH", BuildingType::SingleFamily)]
    #[case("single_family", BuildingType::SingleFamily)]
    #[case("MFH", BuildingType::MultiFamily)]
    #[case("multi_family", BuildingType::MultiFamily)]
    fn test_building_type_from_str(#[case] label: &str, #[case] expected: BuildingType) {
        assert_eq!(BuildingType::from_str(label).unwrap(), expected);
    }

    #[test]
    fn test_building_type_display() {
        assert_eq!(BuildingType::SingleFamily.to_string(), "single_family");
        assert_eq!(BuildingType::MultiFamily.to_string(), "multi_family");
    }

    #[rstest]
    fn test_stock_iter(stock: ApartmentStock) {
        assert_eq!(stock.len(), 3);
        assert_eq!(stock.iter().count(), 6);
        assert_eq!(
            stock.count(&StockKey::new(0, 50, 1), &"KI".into()),
            Some(20)
        );
        assert_eq!(stock.count(&StockKey::new(9, 50, 1), &"KI".into()), None);
    }

    #[test]
    fn test_stock_new_missing_region() {
        let regions: IndexSet<RegionID> = ["FL".into(), "KI".into()].into_iter().collect();
        let cells = indexmap! {
            StockKey::new(0, 50, 1) => indexmap! {"FL".into() => 1},
        };
        assert!(ApartmentStock::new(regions, cells).is_err());
    }
}
