//! Classification of regions by the age structure of their housing stock.
//!
//! The share of apartments built up to 1978 selects the building class of the standard load
//! profile: the smaller the share of old buildings, the higher the class.
use crate::id::RegionID;
use crate::stock::{AgeClass, ApartmentStock};
use indexmap::IndexMap;
use log::warn;
use serde::Serialize;

/// The newest age class still counted as an old building ("1949 - 1978")
pub const OLD_BUILDING_MAX_AGE: AgeClass = AgeClass(2);

/// Bin edges for the share of old buildings
pub const VINTAGE_BREAKPOINTS: [f64; 9] = [
    0.405, 0.455, 0.555, 0.605, 0.655, 0.705, 0.755, 0.805, 0.855,
];

/// Building class for each bin, in the order of [`VINTAGE_BREAKPOINTS`]
const BUILDING_CLASS_LABELS: [u8; 8] = [8, 7, 6, 5, 4, 3, 2, 1];

/// The building class of a region, between 1 and 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, derive_more::Display)]
pub struct BuildingClass(pub u8);

/// The age structure of one region's housing stock
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VintageShare {
    /// Apartments in buildings of age class [`OLD_BUILDING_MAX_AGE`] or older
    pub old_apartments: u64,
    /// All apartments
    pub total_apartments: u64,
    /// `old_apartments / total_apartments`
    pub share: f64,
    /// The resulting building class, if the share is within range
    pub building_class: Option<BuildingClass>,
}

/// Vintage shares keyed by region
pub type VintageShareMap = IndexMap<RegionID, VintageShare>;

/// Map a share of old buildings onto a building class.
///
/// Bins are closed on the right: a share equal to a breakpoint belongs to the bin below it. Shares
/// at or below the lowest breakpoint get the highest class (8). Shares above the highest breakpoint
/// cannot be classified and give `None`.
pub fn categorise_share(share: f64) -> Option<BuildingClass> {
    if share <= VINTAGE_BREAKPOINTS[0] {
        return Some(BuildingClass(BUILDING_CLASS_LABELS[0]));
    }

    VINTAGE_BREAKPOINTS
        .windows(2)
        .zip(BUILDING_CLASS_LABELS)
        .find(|(bin, _)| share > bin[0] && share <= bin[1])
        .map(|(_, label)| BuildingClass(label))
}

/// Sum the apartment counts of each region by age class, over all sizes and unit counts
pub fn counts_by_age(stock: &ApartmentStock) -> IndexMap<RegionID, IndexMap<AgeClass, u64>> {
    let mut map: IndexMap<RegionID, IndexMap<AgeClass, u64>> = stock
        .regions()
        .iter()
        .map(|region_id| (region_id.clone(), IndexMap::new()))
        .collect();

    for (key, region_id, count) in stock.iter() {
        // NB: All regions were added above
        if let Some(by_age) = map.get_mut(region_id) {
            *by_age.entry(key.age).or_default() += count;
        }
    }

    for by_age in map.values_mut() {
        by_age.sort_keys();
    }

    map
}

/// Calculate the vintage share and building class of every region.
///
/// Regions without any apartments have no defined share and are left out.
pub fn vintage_shares(stock: &ApartmentStock) -> VintageShareMap {
    let mut map = VintageShareMap::new();
    for (region_id, by_age) in counts_by_age(stock) {
        let total_apartments: u64 = by_age.values().sum();
        if total_apartments == 0 {
            warn!("Region {region_id} has no apartments; no vintage share calculated");
            continue;
        }

        let old_apartments: u64 = by_age
            .iter()
            .filter(|(age, _)| **age <= OLD_BUILDING_MAX_AGE)
            .map(|(_, count)| count)
            .sum();
        let share = old_apartments as f64 / total_apartments as f64;
        let building_class = categorise_share(share);
        if building_class.is_none() {
            warn!(
                "Share of old buildings in region {region_id} ({share:.3}) is above {}; \
                region is left without a building class",
                VINTAGE_BREAKPOINTS[VINTAGE_BREAKPOINTS.len() - 1]
            );
        }

        map.insert(
            region_id,
            VintageShare {
                old_apartments,
                total_apartments,
                share,
                building_class,
            },
        );
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::stock;
    use crate::stock::StockKey;
    use float_cmp::assert_approx_eq;
    use indexmap::{IndexSet, indexmap};
    use rstest::rstest;

    #[rstest]
    #[case(0.0, Some(8))]
    #[case(0.40, Some(8))]
    #[case(0.405, Some(8))]
    #[case(0.41, Some(8))]
    #[case(0.455, Some(8))]
    #[case(0.50, Some(7))]
    #[case(0.60, Some(6))]
    #[case(0.62, Some(5))]
    #[case(0.70, Some(4))]
    #[case(0.72, Some(3))]
    #[case(0.80, Some(2))]
    #[case(0.855, Some(1))]
    #[case(0.86, None)]
    #[case(1.0, None)]
    fn test_categorise_share(#[case] share: f64, #[case] expected: Option<u8>) {
        assert_eq!(categorise_share(share), expected.map(BuildingClass));
    }

    #[rstest]
    fn test_counts_by_age(stock: ApartmentStock) {
        let counts = counts_by_age(&stock);
        assert_eq!(
            counts[&RegionID::from("FL")],
            indexmap! {AgeClass(0) => 10, AgeClass(2) => 5, AgeClass(9) => 2}
        );
        assert_eq!(
            counts[&RegionID::from("KI")],
            indexmap! {AgeClass(0) => 20, AgeClass(2) => 0, AgeClass(9) => 4}
        );
    }

    #[rstest]
    fn test_vintage_shares(stock: ApartmentStock) {
        let shares = vintage_shares(&stock);

        let fl = shares[&RegionID::from("FL")];
        assert_eq!(fl.old_apartments, 15);
        assert_eq!(fl.total_apartments, 17);
        assert_approx_eq!(f64, fl.share, 15.0 / 17.0);
        assert_eq!(fl.building_class, None);

        let ki = shares[&RegionID::from("KI")];
        assert_eq!(ki.old_apartments, 20);
        assert_eq!(ki.total_apartments, 24);
        assert_eq!(ki.building_class, Some(BuildingClass(1)));
    }

    #[test]
    fn test_vintage_shares_mixed_stock() {
        let regions: IndexSet<RegionID> = ["A".into(), "B".into(), "C".into()].into_iter().collect();
        let stock = ApartmentStock::new(
            regions,
            indexmap! {
                StockKey::new(1, 50, 1) => indexmap! {"A".into() => 50, "B".into() => 40, "C".into() => 0},
                StockKey::new(5, 50, 1) => indexmap! {"A".into() => 50, "B".into() => 60, "C".into() => 0},
            },
        )
        .unwrap();

        let shares = vintage_shares(&stock);

        // Region C has no apartments
        assert_eq!(shares.len(), 2);
        assert_eq!(
            shares[&RegionID::from("A")].building_class,
            Some(BuildingClass(7))
        );
        assert_eq!(
            shares[&RegionID::from("B")].building_class,
            Some(BuildingClass(8))
        );
    }
}
