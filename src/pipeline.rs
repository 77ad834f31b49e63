//! The household and industry pipelines, as chains of named stages.
use crate::carrier::{UsefulHeat, useful_heat_by_district};
use crate::coefficient::{
    SpecificConsumptionCoefficient, WeightedAverageEnergyMap, weighted_average_energy,
};
use crate::expansion::{ExpandedStock, RegionEnergyMap, energy_per_region, expand_stock};
use crate::input::{Dataset, IndustryInput};
use crate::profile::{LoadProfileSynthesiser, RegionSeriesMap, synthesise_region_series};
use crate::stock::ApartmentStock;
use crate::summary::{Summary, summarise};
use crate::vintage::{VintageShareMap, vintage_shares};
use anyhow::{Context, Result};
use log::info;

/// The intermediate and final tables of the household pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdResults {
    /// Specific heat consumption by age class and building type
    pub average_energy: WeightedAverageEnergyMap,
    /// Area and energy of every stock cell and region
    pub expanded_stock: ExpandedStock,
    /// Annual heat demand by region and building type
    pub energy_per_region: RegionEnergyMap,
    /// Share of old buildings and building class by region
    pub vintage_shares: VintageShareMap,
    /// Summary statistics
    pub summary: Summary,
}

impl HouseholdResults {
    /// Create an hourly heat demand series for each region.
    ///
    /// # Arguments
    ///
    /// * `synthesiser` - The load profile model
    /// * `temperature` - Hourly ambient temperature for the year
    /// * `year` - The calendar year
    pub fn region_series<S: LoadProfileSynthesiser + ?Sized>(
        &self,
        synthesiser: &S,
        temperature: &[f64],
        year: i32,
    ) -> Result<RegionSeriesMap> {
        synthesise_region_series(
            synthesiser,
            &self.energy_per_region,
            &self.vintage_shares,
            temperature,
            year,
        )
    }
}

/// Run the household pipeline.
///
/// The coefficients are aggregated first, then the stock is expanded into area and energy, which
/// is summed by region and building type. The vintage shares and summary are derived from the
/// same stock.
pub fn run_household_pipeline(
    stock: &ApartmentStock,
    coefficients: &[SpecificConsumptionCoefficient],
) -> Result<HouseholdResults> {
    let average_energy = weighted_average_energy(coefficients);
    let expanded_stock =
        expand_stock(stock, &average_energy).context("Failed to expand apartment stock")?;
    let energy_per_region = energy_per_region(stock, &expanded_stock);
    let vintage_shares = vintage_shares(stock);
    let summary = summarise(stock, &expanded_stock);

    info!(
        "Annual heat demand of private households: {:.3} GWh",
        summary.total.energy_gwh
    );

    Ok(HouseholdResults {
        average_energy,
        expanded_stock,
        energy_per_region,
        vintage_shares,
        summary,
    })
}

/// Run the industry pipeline over the selected part of the survey
pub fn run_industry_pipeline(input: &IndustryInput) -> Result<Vec<UsefulHeat>> {
    let useful_heat = useful_heat_by_district(&input.records, &input.selection, &input.efficiencies)
        .context("Failed to calculate useful heat")?;

    info!(
        "Useful heat in {} for {} district(s): {:.6} TWh",
        input.selection.year,
        useful_heat.len(),
        useful_heat.iter().map(|heat| heat.useful_heat).sum::<f64>()
    );

    Ok(useful_heat)
}

/// The results of both pipelines
#[derive(Debug, Clone, PartialEq)]
pub struct Results {
    /// Results of the household pipeline
    pub households: HouseholdResults,
    /// Useful heat by district, if the industry pipeline was configured
    pub useful_heat: Option<Vec<UsefulHeat>>,
}

/// Run all pipelines configured for the dataset
pub fn run(dataset: &Dataset) -> Result<Results> {
    let households = run_household_pipeline(&dataset.stock, &dataset.coefficients)?;
    let useful_heat = dataset
        .industry
        .as_ref()
        .map(run_industry_pipeline)
        .transpose()?;

    Ok(Results {
        households,
        useful_heat,
    })
}
