//! Expansion of apartment counts into floor area and annual heat demand.
use crate::coefficient::WeightedAverageEnergyMap;
use crate::errors::PipelineError;
use crate::id::RegionID;
use crate::stock::{ApartmentStock, BuildingType, StockKey};
use crate::units::{Area, Energy};
use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;
use strum::IntoEnumIterator;

/// One cell of the apartment stock, classified and expanded into area and energy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpandedCell {
    /// The type of building, derived from the unit-count class
    pub building_type: BuildingType,
    /// Number of apartments
    pub apartments: u64,
    /// Total floor area of the apartments
    pub area: Area,
    /// Annual heat demand of the apartments
    pub energy: Energy,
}

/// Expanded cells, keyed by stock cell and region
pub type ExpandedStock = IndexMap<(StockKey, RegionID), ExpandedCell>;

/// Annual heat demand per region and building type
pub type RegionEnergyMap = IndexMap<(RegionID, BuildingType), Energy>;

/// Expand each cell of the stock into floor area and annual heat demand.
///
/// The floor area is the size class midpoint times the number of apartments and the energy is the
/// area times the weighted average specific consumption for the cell's age class and building
/// type.
///
/// # Returns
///
/// The expanded cells or [`PipelineError::MissingCoefficient`] if a cell has no specific
/// consumption value.
pub fn expand_stock(
    stock: &ApartmentStock,
    average_energy: &WeightedAverageEnergyMap,
) -> Result<ExpandedStock> {
    let mut expanded = ExpandedStock::with_capacity(stock.len() * stock.regions().len());
    for key in stock.keys() {
        let building_type = key.building_type();
        let specific_demand = *average_energy.get(&(key.age, building_type)).ok_or(
            PipelineError::MissingCoefficient {
                age_class: key.age,
                building_type,
            },
        )?;

        for region_id in stock.regions() {
            // NB: Every cell covers every region
            let apartments = stock.count(key, region_id).unwrap_or_default();
            let area = Area(key.size.0 as f64 * apartments as f64);
            expanded.insert(
                (*key, region_id.clone()),
                ExpandedCell {
                    building_type,
                    apartments,
                    area,
                    energy: area * specific_demand,
                },
            );
        }
    }

    Ok(expanded)
}

/// Sum the annual heat demand of the expanded stock by region and building type.
///
/// Regions appear in the stock's column order. Only building types occurring in the stock are
/// included.
pub fn energy_per_region(stock: &ApartmentStock, expanded: &ExpandedStock) -> RegionEnergyMap {
    let mut totals: IndexMap<(&RegionID, BuildingType), Energy> = IndexMap::new();
    for ((_, region_id), cell) in expanded {
        *totals.entry((region_id, cell.building_type)).or_default() += cell.energy;
    }

    let mut map = RegionEnergyMap::new();
    for region_id in stock.regions() {
        for building_type in BuildingType::iter() {
            if let Some(energy) = totals.get(&(region_id, building_type)) {
                map.insert((region_id.clone(), building_type), *energy);
            }
        }
    }

    map
}
