//! Fixtures for tests

use crate::carrier::RegionRecord;
use crate::coefficient::{
    SpecificConsumptionCoefficient, WeightedAverageEnergyMap, weighted_average_energy,
};
use crate::id::RegionID;
use crate::stock::{AgeClass, ApartmentStock, BuildingType, StockKey};
use crate::units::SpecificHeatDemand;
use indexmap::{IndexSet, indexmap};
use itertools::iproduct;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn region_ids() -> IndexSet<RegionID> {
    ["FL".into(), "KI".into()].into_iter().collect()
}

#[fixture]
pub fn stock(region_ids: IndexSet<RegionID>) -> ApartmentStock {
    let cells = indexmap! {
        StockKey::new(0, 50, 1) => indexmap! {"FL".into() => 10, "KI".into() => 20},
        StockKey::new(2, 80, 4) => indexmap! {"FL".into() => 5, "KI".into() => 0},
        StockKey::new(9, 20, 13) => indexmap! {"FL".into() => 2, "KI".into() => 4},
    };

    ApartmentStock::new(region_ids, cells).unwrap()
}

fn coefficient(
    age: u32,
    status: &str,
    building_type: BuildingType,
    share: f64,
    parameter: f64,
) -> SpecificConsumptionCoefficient {
    SpecificConsumptionCoefficient {
        age_class: AgeClass(age),
        modernisation_status: status.into(),
        building_type,
        share,
        parameter: SpecificHeatDemand(parameter),
    }
}

#[fixture]
pub fn coefficients() -> Vec<SpecificConsumptionCoefficient> {
    use BuildingType::{MultiFamily, SingleFamily};

    vec![
        coefficient(0, "unmodernised", SingleFamily, 0.25, 200.0),
        coefficient(0, "modernised", SingleFamily, 0.75, 100.0),
        coefficient(0, "unmodernised", MultiFamily, 0.5, 120.0),
        coefficient(0, "modernised", MultiFamily, 0.5, 80.0),
        coefficient(2, "unmodernised", MultiFamily, 1.0, 160.0),
        coefficient(9, "unmodernised", MultiFamily, 1.0, 60.0),
    ]
}

#[fixture]
pub fn average_energy(
    coefficients: Vec<SpecificConsumptionCoefficient>,
) -> WeightedAverageEnergyMap {
    weighted_average_energy(&coefficients)
}

#[fixture]
pub fn region_records() -> Vec<RegionRecord> {
    let districts = [("1001", "Flensburg"), ("1002", "Kiel"), ("1003", "Lübeck")];
    iproduct!([2010, 2011], districts)
        .map(|(year, (id, name))| {
            let mut record = RegionRecord {
                year,
                district_id: id.into(),
                district: name.into(),
                coal: 100.0,
                oil: 2000.0,
                gas: 5000.0,
                renewables: 300.0,
                electricity: 4000.0,
                heat: 800.0,
                other: 50.0,
            };
            if year == 2011 && id == "1002" {
                record.coal = 0.0;
                record.oil = 3600.0;
                record.gas = 7200.0;
                record.renewables = 0.0;
                record.heat = 0.0;
                record.other = 0.0;
            }
            record
        })
        .collect()
}
