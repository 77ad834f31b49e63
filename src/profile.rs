//! Hourly heat demand series from annual demand figures.
//!
//! The conversion of an annual demand into an hourly series is done by a standard load profile
//! model, which is not part of this crate. Such a model is plugged in through the
//! [`LoadProfileSynthesiser`] trait.
use crate::errors::PipelineError;
use crate::expansion::RegionEnergyMap;
use crate::id::RegionID;
use crate::stock::BuildingType;
use crate::units::Energy;
use crate::vintage::{BuildingClass, VintageShareMap};
use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use indexmap::IndexMap;
use log::debug;

/// Hourly heat demand per region
pub type RegionSeriesMap = IndexMap<RegionID, Vec<f64>>;

/// A model turning an annual heat demand into an hourly demand series
pub trait LoadProfileSynthesiser {
    /// Create the hourly series for one building type in one region.
    ///
    /// # Arguments
    ///
    /// * `building_class` - The region's building class
    /// * `building_type` - The type of building
    /// * `annual_heat_demand` - Heat demand over the year
    /// * `temperature` - Hourly ambient temperature for the year
    /// * `year` - The calendar year
    ///
    /// # Returns
    ///
    /// One value per hour of the year.
    fn synthesise(
        &self,
        building_class: BuildingClass,
        building_type: BuildingType,
        annual_heat_demand: Energy,
        temperature: &[f64],
        year: i32,
    ) -> Result<Vec<f64>>;
}

/// The number of hours in a calendar year
pub fn hours_in_year(year: i32) -> Result<usize> {
    let leap = NaiveDate::from_ymd_opt(year, 2, 29).is_some();
    ensure!(
        NaiveDate::from_ymd_opt(year, 1, 1).is_some(),
        "Year {year} is out of range"
    );

    Ok(if leap { 8784 } else { 8760 })
}

/// Create an hourly heat demand series for every region.
///
/// The synthesiser is called once per region and building type, and the series for the building
/// types of a region are added up hour by hour.
///
/// # Returns
///
/// The series by region, or [`PipelineError::MissingBuildingClass`] if a region with demand has no
/// building class. Building types without demand in a region without a building class (e.g. a
/// region with no apartments) contribute an all-zero series.
pub fn synthesise_region_series<S: LoadProfileSynthesiser + ?Sized>(
    synthesiser: &S,
    energy_per_region: &RegionEnergyMap,
    vintage_shares: &VintageShareMap,
    temperature: &[f64],
    year: i32,
) -> Result<RegionSeriesMap> {
    let hours = hours_in_year(year)?;
    ensure!(
        temperature.len() == hours,
        "Temperature series has {} values, but year {year} has {hours} hours",
        temperature.len()
    );

    let mut map = RegionSeriesMap::new();
    for ((region_id, building_type), energy) in energy_per_region {
        let total = map
            .entry(region_id.clone())
            .or_insert_with(|| vec![0.0; hours]);

        let building_class = vintage_shares
            .get(region_id)
            .and_then(|vintage| vintage.building_class);
        let Some(building_class) = building_class else {
            if *energy > Energy(0.0) {
                return Err(PipelineError::MissingBuildingClass(region_id.to_string()).into());
            }
            debug!("No {building_type} demand in region {region_id} without building class");
            continue;
        };

        debug!(
            "Synthesising {building_type} series for region {region_id} \
            (building class {building_class})"
        );
        let series = synthesiser
            .synthesise(building_class, *building_type, *energy, temperature, year)
            .with_context(|| {
                format!("Failed to synthesise {building_type} series for region {region_id}")
            })?;
        ensure!(
            series.len() == hours,
            "Series for region {region_id} has {} values, expected {hours}",
            series.len()
        );

        for (acc, value) in total.iter_mut().zip(series) {
            *acc += value;
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vintage::VintageShare;
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::{fixture, rstest};
    use std::cell::RefCell;

    /// Spreads the annual demand evenly over the year and records its calls
    #[derive(Default)]
    struct FlatProfile {
        calls: RefCell<Vec<(BuildingClass, BuildingType)>>,
    }

    impl LoadProfileSynthesiser for FlatProfile {
        fn synthesise(
            &self,
            building_class: BuildingClass,
            building_type: BuildingType,
            annual_heat_demand: Energy,
            temperature: &[f64],
            _year: i32,
        ) -> Result<Vec<f64>> {
            self.calls.borrow_mut().push((building_class, building_type));
            let hours = temperature.len() as f64;
            Ok(vec![annual_heat_demand.value() / hours; temperature.len()])
        }
    }

    #[fixture]
    fn energy_per_region() -> RegionEnergyMap {
        indexmap! {
            ("FL".into(), BuildingType::SingleFamily) => Energy(8760.0),
            ("FL".into(), BuildingType::MultiFamily) => Energy(17520.0),
            ("KI".into(), BuildingType::SingleFamily) => Energy(876.0),
        }
    }

    fn vintage(building_class: Option<u8>) -> VintageShare {
        VintageShare {
            old_apartments: 1,
            total_apartments: 2,
            share: 0.5,
            building_class: building_class.map(BuildingClass),
        }
    }

    #[rstest]
    #[case(2011, 8760)]
    #[case(2012, 8784)]
    #[case(1900, 8760)]
    #[case(2000, 8784)]
    fn test_hours_in_year(#[case] year: i32, #[case] expected: usize) {
        assert_eq!(hours_in_year(year).unwrap(), expected);
    }

    #[rstest]
    fn test_synthesise_region_series(energy_per_region: RegionEnergyMap) {
        let shares = indexmap! {
            "FL".into() => vintage(Some(7)),
            "KI".into() => vintage(Some(3)),
        };
        let synthesiser = FlatProfile::default();
        let temperature = vec![5.0; 8760];

        let series =
            synthesise_region_series(&synthesiser, &energy_per_region, &shares, &temperature, 2011)
                .unwrap();

        assert_eq!(series.len(), 2);
        let fl = &series[&RegionID::from("FL")];
        assert_eq!(fl.len(), 8760);
        assert_approx_eq!(f64, fl[0], 3.0);
        assert_approx_eq!(f64, fl.iter().sum::<f64>(), 26280.0, epsilon = 1e-6);
        assert_approx_eq!(f64, series[&RegionID::from("KI")][100], 0.1);

        assert_eq!(
            *synthesiser.calls.borrow(),
            [
                (BuildingClass(7), BuildingType::SingleFamily),
                (BuildingClass(7), BuildingType::MultiFamily),
                (BuildingClass(3), BuildingType::SingleFamily),
            ]
        );
    }

    #[rstest]
    fn test_synthesise_region_series_missing_class(energy_per_region: RegionEnergyMap) {
        let shares = indexmap! {
            "FL".into() => vintage(Some(7)),
            "KI".into() => vintage(None),
        };
        let result = synthesise_region_series(
            &FlatProfile::default(),
            &energy_per_region,
            &shares,
            &[0.0; 8760],
            2011,
        );
        assert_eq!(
            result.unwrap_err().downcast_ref::<PipelineError>(),
            Some(&PipelineError::MissingBuildingClass("KI".into()))
        );
    }

    #[rstest]
    fn test_synthesise_region_series_region_without_demand(
        mut energy_per_region: RegionEnergyMap,
    ) {
        // No apartments, so no vintage share and zero demand
        energy_per_region.insert(("HEI".into(), BuildingType::SingleFamily), Energy(0.0));
        energy_per_region.insert(("HEI".into(), BuildingType::MultiFamily), Energy(0.0));
        let shares = indexmap! {
            "FL".into() => vintage(Some(7)),
            "KI".into() => vintage(Some(3)),
        };
        let synthesiser = FlatProfile::default();

        let series =
            synthesise_region_series(&synthesiser, &energy_per_region, &shares, &[0.0; 8760], 2011)
                .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[&RegionID::from("HEI")], vec![0.0; 8760]);
        assert_eq!(synthesiser.calls.borrow().len(), 3);

        // Demand without a building class is still an error
        energy_per_region.insert(("HEI".into(), BuildingType::MultiFamily), Energy(1.0));
        let result = synthesise_region_series(
            &synthesiser,
            &energy_per_region,
            &shares,
            &[0.0; 8760],
            2011,
        );
        assert_eq!(
            result.unwrap_err().downcast_ref::<PipelineError>(),
            Some(&PipelineError::MissingBuildingClass("HEI".into()))
        );
    }

    #[rstest]
    fn test_synthesise_region_series_bad_temperature(energy_per_region: RegionEnergyMap) {
        let shares = indexmap! {"FL".into() => vintage(Some(7))};
        assert!(
            synthesise_region_series(
                &FlatProfile::default(),
                &energy_per_region,
                &shares,
                &[0.0; 8760],
                2012,
            )
            .is_err()
        );
    }
}
