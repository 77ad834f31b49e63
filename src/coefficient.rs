//! Specific heat consumption coefficients and their aggregation over modernisation status.
use crate::stock::{AgeClass, BuildingType};
use crate::units::SpecificHeatDemand;
use float_cmp::approx_eq;
use indexmap::IndexMap;
use log::warn;

/// Specific heat consumption for one combination of age class, modernisation status and building
/// type
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificConsumptionCoefficient {
    /// Construction era
    pub age_class: AgeClass,
    /// Free-text modernisation status (e.g. "unmodernised")
    pub modernisation_status: String,
    /// The type of building
    pub building_type: BuildingType,
    /// Fraction of buildings of this age class and type with this modernisation status
    pub share: f64,
    /// Annual heat demand per unit of floor area
    pub parameter: SpecificHeatDemand,
}

/// Average specific heat consumption by age class and building type
pub type WeightedAverageEnergyMap = IndexMap<(AgeClass, BuildingType), SpecificHeatDemand>;

/// Collapse the modernisation-status dimension of the coefficient table.
///
/// For each (age class, building type) pair present, the result is the sum of `share * parameter`
/// over all modernisation statuses. Shares are used as given, even if they do not add up to one.
pub fn weighted_average_energy(
    coefficients: &[SpecificConsumptionCoefficient],
) -> WeightedAverageEnergyMap {
    let mut sums: IndexMap<(AgeClass, BuildingType), (SpecificHeatDemand, f64)> = IndexMap::new();
    for coefficient in coefficients {
        let (weighted, share) = sums
            .entry((coefficient.age_class, coefficient.building_type))
            .or_default();
        *weighted += SpecificHeatDemand(coefficient.share * coefficient.parameter.value());
        *share += coefficient.share;
    }

    sums.sort_keys();
    sums.into_iter()
        .map(|((age_class, building_type), (weighted, share))| {
            if !approx_eq!(f64, share, 1.0, epsilon = 1e-6) {
                warn!(
                    "Shares for age class {age_class} and building type {building_type} sum to \
                    {share}, not 1"
                );
            }

            ((age_class, building_type), weighted)
        })
        .collect()
}
