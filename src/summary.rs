//! Descriptive statistics of the expanded apartment stock.
use crate::expansion::ExpandedStock;
use crate::id::RegionID;
use crate::stock::{ApartmentStock, BuildingType};
use crate::units::{Area, Energy};
use indexmap::IndexMap;
use serde::Serialize;

/// Totals for one region, or for all regions together
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RegionSummary {
    /// Annual heat demand in GWh
    pub energy_gwh: f64,
    /// Number of apartments
    pub apartments: u64,
    /// Floor area of all apartments
    pub area: Area,
    /// Mean floor area per apartment. `None` if there are no apartments.
    pub average_size: Option<f64>,
    /// Fraction of apartments in single-family houses. `None` if there are no apartments.
    pub single_family_share: Option<f64>,
}

/// Summary statistics of a household pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Statistics for each region, in stock column order
    pub regions: IndexMap<RegionID, RegionSummary>,
    /// Statistics over all regions
    pub total: RegionSummary,
}

#[derive(Default)]
struct Totals {
    energy: Energy,
    apartments: u64,
    single_family_apartments: u64,
    area: Area,
}

impl Totals {
    fn add(&mut self, other: &Self) {
        self.energy += other.energy;
        self.apartments += other.apartments;
        self.single_family_apartments += other.single_family_apartments;
        self.area += other.area;
    }

    fn to_summary(&self) -> RegionSummary {
        let apartments = (self.apartments > 0).then_some(self.apartments as f64);
        RegionSummary {
            energy_gwh: self.energy.gwh(),
            apartments: self.apartments,
            area: self.area,
            average_size: apartments.map(|n| self.area.value() / n),
            single_family_share: apartments.map(|n| self.single_family_apartments as f64 / n),
        }
    }
}

/// Summarise the expanded stock by region
pub fn summarise(stock: &ApartmentStock, expanded: &ExpandedStock) -> Summary {
    let mut by_region: IndexMap<&RegionID, Totals> = stock
        .regions()
        .iter()
        .map(|region_id| (region_id, Totals::default()))
        .collect();

    for ((_, region_id), cell) in expanded {
        let totals = by_region.entry(region_id).or_default();
        totals.energy += cell.energy;
        totals.area += cell.area;
        totals.apartments += cell.apartments;
        if cell.building_type == BuildingType::SingleFamily {
            totals.single_family_apartments += cell.apartments;
        }
    }

    let mut total = Totals::default();
    let regions = by_region
        .into_iter()
        .map(|(region_id, totals)| {
            total.add(&totals);
            (region_id.clone(), totals.to_summary())
        })
        .collect();

    Summary {
        regions,
        total: total.to_summary(),
    }
}
