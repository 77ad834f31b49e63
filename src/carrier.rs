//! Useful heat from energy consumption by carrier.
//!
//! The energy survey reports final energy consumption per district and energy carrier in 1000 MJ.
//! Dividing by a conversion efficiency per carrier gives the useful heat the consumption
//! corresponds to. Electricity is not converted and does not count towards useful heat.
use crate::id::{DistrictID, IDCollection};
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Gigajoules (1000 MJ) per megawatt hour
pub const GJ_PER_MWH: f64 = 3.6;

/// Megawatt hours per terawatt hour
pub const MWH_PER_TWH: f64 = 1e6;

/// An energy carrier of the energy survey
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
#[strum(serialize_all = "snake_case")]
pub enum Carrier {
    /// Coal
    Coal,
    /// Heating oil
    Oil,
    /// Natural gas
    Gas,
    /// Renewable energy sources
    Renewables,
    /// Electricity
    Electricity,
    /// District heat
    Heat,
    /// Other energy sources
    Other,
}

/// Energy consumption of one district in one year, in 1000 MJ per carrier
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    /// Survey year
    pub year: u32,
    /// Official district identifier
    pub district_id: DistrictID,
    /// District name, stripped of administrative qualifiers
    pub district: String,
    /// Coal consumption
    pub coal: f64,
    /// Heating oil consumption
    pub oil: f64,
    /// Natural gas consumption
    pub gas: f64,
    /// Consumption of renewables
    pub renewables: f64,
    /// Electricity consumption
    pub electricity: f64,
    /// District heat consumption
    pub heat: f64,
    /// Consumption of other carriers
    pub other: f64,
}

impl RegionRecord {
    /// The consumption of the given carrier
    pub fn consumption(&self, carrier: Carrier) -> f64 {
        match carrier {
            Carrier::Coal => self.coal,
            Carrier::Oil => self.oil,
            Carrier::Gas => self.gas,
            Carrier::Renewables => self.renewables,
            Carrier::Electricity => self.electricity,
            Carrier::Heat => self.heat,
            Carrier::Other => self.other,
        }
    }
}

/// Fraction of final energy which is turned into useful heat, per carrier.
///
/// Carriers without an efficiency (electricity) do not contribute to useful heat.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionEfficiencies(IndexMap<Carrier, f64>);

impl Default for ConversionEfficiencies {
    fn default() -> Self {
        Self(IndexMap::from([
            (Carrier::Coal, 0.85),
            (Carrier::Gas, 0.85),
            (Carrier::Oil, 0.80),
            (Carrier::Renewables, 0.60),
            (Carrier::Other, 0.80),
            (Carrier::Heat, 1.0),
        ]))
    }
}

impl ConversionEfficiencies {
    /// The default efficiencies with some values replaced
    pub fn with_overrides(overrides: &IndexMap<Carrier, f64>) -> Result<Self> {
        let mut efficiencies = Self::default();
        for (carrier, efficiency) in overrides {
            ensure!(
                *carrier != Carrier::Electricity,
                "Electricity is not converted to heat, so cannot have an efficiency"
            );
            ensure!(
                efficiency.is_finite() && *efficiency > 0.0 && *efficiency <= 1.0,
                "Efficiency for {carrier} must be greater than zero and at most one"
            );
            efficiencies.0.insert(*carrier, *efficiency);
        }

        Ok(efficiencies)
    }

    /// The efficiency for a carrier, if it is converted to heat
    pub fn get(&self, carrier: Carrier) -> Option<f64> {
        self.0.get(&carrier).copied()
    }

    /// Iterate over the carriers which are converted to heat, with their efficiencies
    pub fn iter(&self) -> impl Iterator<Item = (Carrier, f64)> + '_ {
        self.0.iter().map(|(carrier, efficiency)| (*carrier, *efficiency))
    }
}

/// Which districts to select from the survey
#[derive(Debug, Clone, PartialEq)]
pub enum DistrictSelection {
    /// Every district in the survey
    All,
    /// Only the listed districts
    Some(IndexSet<DistrictID>),
}

/// A subset of the energy survey
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSelection {
    /// The survey year
    pub year: u32,
    /// The districts
    pub districts: DistrictSelection,
}

impl RecordSelection {
    /// Whether the record is part of the selection
    pub fn contains(&self, record: &RegionRecord) -> bool {
        record.year == self.year
            && match &self.districts {
                DistrictSelection::All => true,
                DistrictSelection::Some(ids) => ids.contains(&record.district_id),
            }
    }
}

/// Useful heat of one district
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsefulHeat {
    /// Survey year
    pub year: u32,
    /// Official district identifier
    pub district_id: DistrictID,
    /// District name
    pub district: String,
    /// Useful heat in TWh
    pub useful_heat: f64,
}

/// Select the records for the given year and districts.
///
/// Every explicitly selected district must be present in the survey for that year.
pub fn select_records<'a>(
    records: &'a [RegionRecord],
    selection: &RecordSelection,
) -> Result<Vec<&'a RegionRecord>> {
    ensure!(
        records.iter().any(|r| r.year == selection.year),
        "No survey data found for year {}",
        selection.year
    );

    let selected: Vec<_> = records.iter().filter(|r| selection.contains(r)).collect();
    if let DistrictSelection::Some(ids) = &selection.districts {
        let found: IndexSet<DistrictID> = selected.iter().map(|r| r.district_id.clone()).collect();
        for id in ids {
            found.get_id(&id.0).with_context(|| {
                format!("No survey data for district {id} in year {}", selection.year)
            })?;
        }
    }

    Ok(selected)
}

/// Useful heat of a record in 1000 MJ: consumption divided by conversion efficiency, summed over all
/// carriers except electricity
pub fn useful_heat(record: &RegionRecord, efficiencies: &ConversionEfficiencies) -> f64 {
    efficiencies
        .iter()
        .map(|(carrier, efficiency)| record.consumption(carrier) / efficiency)
        .sum()
}

/// Convert an energy quantity from 1000 MJ to TWh
pub fn gj_to_twh(value: f64) -> f64 {
    value / GJ_PER_MWH / MWH_PER_TWH
}

/// Useful heat in TWh for the selected records
pub fn useful_heat_by_district(
    records: &[RegionRecord],
    selection: &RecordSelection,
    efficiencies: &ConversionEfficiencies,
) -> Result<Vec<UsefulHeat>> {
    let selected = select_records(records, selection)?;
    Ok(selected
        .into_iter()
        .map(|record| UsefulHeat {
            year: record.year,
            district_id: record.district_id.clone(),
            district: record.district.clone(),
            useful_heat: gj_to_twh(useful_heat(record, efficiencies)),
        })
        .collect())
}
