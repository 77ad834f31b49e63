//! The module responsible for writing output data to disk.
use crate::carrier::UsefulHeat;
use crate::coefficient::WeightedAverageEnergyMap;
use crate::expansion::{ExpandedStock, RegionEnergyMap};
use crate::id::RegionID;
use crate::pipeline::{HouseholdResults, Results};
use crate::stock::{AgeClass, BuildingType, SizeClass, UnitCountClass};
use crate::summary::{RegionSummary, Summary};
use crate::units::{Area, Energy, SpecificHeatDemand};
use crate::vintage::{BuildingClass, VintageShareMap};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which dataset-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "heatdemand_results";

/// The output file name for annual energy by region and building type
const ENERGY_PER_REGION_FILE_NAME: &str = "energy_per_region.csv";

/// The output file name for weighted average specific heat consumption
const WEIGHTED_AVERAGE_ENERGY_FILE_NAME: &str = "weighted_average_energy.csv";

/// The output file name for vintage shares
const VINTAGE_SHARES_FILE_NAME: &str = "vintage_shares.csv";

/// The output file name for summary statistics
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for useful heat by district
const USEFUL_HEAT_FILE_NAME: &str = "useful_heat.csv";

/// The output file name for the expanded stock
const EXPANDED_STOCK_FILE_NAME: &str = "debug_expanded_stock.csv";

/// The label of the row holding totals over all regions in the summary file
const SUMMARY_TOTAL_LABEL: &str = "total";

/// Get the output directory for the dataset at the specified path
pub fn get_output_dir(data_dir: &Path) -> Result<PathBuf> {
    // Get the dataset name from the dir path
    let data_dir = data_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to dataset")?;

    let dataset_name = data_dir
        .file_name()
        .context("Dataset cannot be in root folder")?
        .to_str()
        .context("Invalid chars in dataset dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, dataset_name].iter().collect())
}

/// Create a new output directory, if it doesn't already exist.
///
/// If the directory exists and is not empty, its contents are removed if `allow_overwrite` is
/// true, otherwise an error is returned.
///
/// # Returns
///
/// Whether existing output was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Directory exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
            --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the energy per region CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct EnergyPerRegionRow {
    region_id: RegionID,
    building_type: BuildingType,
    energy: Energy,
}

/// Represents a row in the weighted average energy CSV file
#[derive(Serialize, Debug, PartialEq)]
struct WeightedAverageEnergyRow {
    age_class: AgeClass,
    building_type: BuildingType,
    specific_heat_demand: SpecificHeatDemand,
}

/// Represents a row in the vintage shares CSV file
#[derive(Serialize, Debug, PartialEq)]
struct VintageShareRow {
    region_id: RegionID,
    old_apartments: u64,
    total_apartments: u64,
    share: f64,
    building_class: Option<BuildingClass>,
}

/// Represents a row in the summary CSV file
#[derive(Serialize, Debug, PartialEq)]
struct SummaryRow<'a> {
    region: &'a str,
    energy_gwh: f64,
    apartments: u64,
    area: Area,
    average_size: Option<f64>,
    single_family_share: Option<f64>,
}

impl<'a> SummaryRow<'a> {
    fn new(region: &'a str, summary: &RegionSummary) -> Self {
        Self {
            region,
            energy_gwh: summary.energy_gwh,
            apartments: summary.apartments,
            area: summary.area,
            average_size: summary.average_size,
            single_family_share: summary.single_family_share,
        }
    }
}

/// Represents a row in the expanded stock CSV file
#[derive(Serialize, Debug, PartialEq)]
struct ExpandedStockRow {
    age_class: AgeClass,
    size_class: SizeClass,
    unit_count_class: UnitCountClass,
    region_id: RegionID,
    building_type: BuildingType,
    apartments: u64,
    area: Area,
    energy: Energy,
}

/// An object for writing result tables to file
pub struct DataWriter {
    energy_per_region: csv::Writer<File>,
    weighted_average_energy: csv::Writer<File>,
    vintage_shares: csv::Writer<File>,
    summary: csv::Writer<File>,
    useful_heat: Option<csv::Writer<File>>,
    expanded_stock: Option<csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `write_useful_heat` - Whether the industry pipeline has results to write
    /// * `save_debug_info` - Whether to include the expanded stock table
    pub fn create(
        output_path: &Path,
        write_useful_heat: bool,
        save_debug_info: bool,
    ) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(&file_path)
                .with_context(|| format!("Could not create {}", file_path.display()))
        };

        Ok(Self {
            energy_per_region: new_writer(ENERGY_PER_REGION_FILE_NAME)?,
            weighted_average_energy: new_writer(WEIGHTED_AVERAGE_ENERGY_FILE_NAME)?,
            vintage_shares: new_writer(VINTAGE_SHARES_FILE_NAME)?,
            summary: new_writer(SUMMARY_FILE_NAME)?,
            useful_heat: write_useful_heat
                .then(|| new_writer(USEFUL_HEAT_FILE_NAME))
                .transpose()?,
            expanded_stock: save_debug_info
                .then(|| new_writer(EXPANDED_STOCK_FILE_NAME))
                .transpose()?,
        })
    }

    /// Write annual energy by region and building type to file
    pub fn write_energy_per_region(&mut self, energy_per_region: &RegionEnergyMap) -> Result<()> {
        for ((region_id, building_type), energy) in energy_per_region {
            self.energy_per_region.serialize(EnergyPerRegionRow {
                region_id: region_id.clone(),
                building_type: *building_type,
                energy: *energy,
            })?;
        }

        Ok(())
    }

    /// Write weighted average specific heat consumption to file
    pub fn write_weighted_average_energy(
        &mut self,
        average_energy: &WeightedAverageEnergyMap,
    ) -> Result<()> {
        for ((age_class, building_type), specific_heat_demand) in average_energy {
            self.weighted_average_energy
                .serialize(WeightedAverageEnergyRow {
                    age_class: *age_class,
                    building_type: *building_type,
                    specific_heat_demand: *specific_heat_demand,
                })?;
        }

        Ok(())
    }

    /// Write vintage shares to file
    pub fn write_vintage_shares(&mut self, vintage_shares: &VintageShareMap) -> Result<()> {
        for (region_id, vintage) in vintage_shares {
            self.vintage_shares.serialize(VintageShareRow {
                region_id: region_id.clone(),
                old_apartments: vintage.old_apartments,
                total_apartments: vintage.total_apartments,
                share: vintage.share,
                building_class: vintage.building_class,
            })?;
        }

        Ok(())
    }

    /// Write summary statistics to file, with the totals last
    pub fn write_summary(&mut self, summary: &Summary) -> Result<()> {
        for (region_id, region_summary) in &summary.regions {
            self.summary
                .serialize(SummaryRow::new(region_id.0.as_ref(), region_summary))?;
        }
        self.summary
            .serialize(SummaryRow::new(SUMMARY_TOTAL_LABEL, &summary.total))?;

        Ok(())
    }

    /// Write the expanded stock to file, if debug info is enabled
    pub fn write_expanded_stock(&mut self, expanded_stock: &ExpandedStock) -> Result<()> {
        let Some(writer) = &mut self.expanded_stock else {
            return Ok(());
        };

        for ((key, region_id), cell) in expanded_stock {
            writer.serialize(ExpandedStockRow {
                age_class: key.age,
                size_class: key.size,
                unit_count_class: key.unit_count,
                region_id: region_id.clone(),
                building_type: cell.building_type,
                apartments: cell.apartments,
                area: cell.area,
                energy: cell.energy,
            })?;
        }

        Ok(())
    }

    /// Write useful heat by district to file
    pub fn write_useful_heat(&mut self, useful_heat: &[UsefulHeat]) -> Result<()> {
        let writer = self
            .useful_heat
            .as_mut()
            .context("Useful heat output was not enabled")?;
        for row in useful_heat {
            writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write all tables of the household pipeline
    pub fn write_household_results(&mut self, results: &HouseholdResults) -> Result<()> {
        self.write_weighted_average_energy(&results.average_energy)?;
        self.write_energy_per_region(&results.energy_per_region)?;
        self.write_vintage_shares(&results.vintage_shares)?;
        self.write_summary(&results.summary)?;
        self.write_expanded_stock(&results.expanded_stock)?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.energy_per_region.flush()?;
        self.weighted_average_energy.flush()?;
        self.vintage_shares.flush()?;
        self.summary.flush()?;
        for writer in [&mut self.useful_heat, &mut self.expanded_stock]
            .into_iter()
            .flatten()
        {
            writer.flush()?;
        }

        Ok(())
    }
}

/// Write the results of all pipelines to the output folder
pub fn write_results(output_path: &Path, results: &Results, save_debug_info: bool) -> Result<()> {
    let mut writer =
        DataWriter::create(output_path, results.useful_heat.is_some(), save_debug_info)?;
    writer.write_household_results(&results.households)?;
    if let Some(useful_heat) = &results.useful_heat {
        writer.write_useful_heat(useful_heat)?;
    }

    writer.flush()
}
