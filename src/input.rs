//! Common routines for handling input data.
use crate::carrier::{ConversionEfficiencies, RecordSelection, RegionRecord};
use crate::coefficient::SpecificConsumptionCoefficient;
use crate::schema::{RawTable, TableFormat};
use crate::stock::ApartmentStock;
use anyhow::{Context, Result, ensure};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod apartments;
use apartments::read_apartment_stock;
pub mod coefficient;
use coefficient::read_coefficients;
pub mod parameters;
use parameters::DatasetParameters;
pub mod region;
use region::{RegionMap, read_regions};
pub mod survey;
use survey::read_survey;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_internal(file_path)?;
    ensure!(
        !vec.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(vec)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a survey table laid out as described by `format`
pub fn read_table(file_path: &Path, format: &TableFormat) -> Result<RawTable> {
    RawTable::from_path(file_path, format).with_context(|| input_err_msg(file_path))
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Inputs of the industry pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryInput {
    /// All records of the energy survey
    pub records: Vec<RegionRecord>,
    /// The year and districts to evaluate
    pub selection: RecordSelection,
    /// Conversion efficiencies per carrier
    pub efficiencies: ConversionEfficiencies,
}

/// All input data of a heat demand dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// The contents of `heat_demand.toml`
    pub parameters: DatasetParameters,
    /// Regions of the apartment table
    pub regions: RegionMap,
    /// Apartment counts by stock cell and region
    pub stock: ApartmentStock,
    /// Specific heat consumption coefficients
    pub coefficients: Vec<SpecificConsumptionCoefficient>,
    /// Inputs for the industry pipeline, if configured
    pub industry: Option<IndustryInput>,
}

/// Read a dataset from the specified directory.
///
/// # Arguments
///
/// * `data_dir` - Folder containing `heat_demand.toml` and the input tables
///
/// # Returns
///
/// The dataset or an error if any input is missing or invalid.
pub fn load_dataset<P: AsRef<Path>>(data_dir: P) -> Result<Dataset> {
    let data_dir = data_dir.as_ref();
    let parameters = DatasetParameters::from_path(data_dir)?;
    let regions = read_regions(data_dir)?;

    let households = &parameters.households;
    let stock = read_apartment_stock(
        &data_dir.join(&households.apartments_file),
        &households.format,
        &regions,
        &households.excluded_columns,
    )?;
    let coefficients = read_coefficients(
        &data_dir.join(&households.coefficients_file),
        &households.coefficients_format,
    )?;

    let industry = parameters
        .industry
        .as_ref()
        .map(|industry| -> Result<_> {
            Ok(IndustryInput {
                records: read_survey(&data_dir.join(&industry.survey_file), &industry.format)?,
                selection: industry.record_selection(),
                efficiencies: industry.conversion_efficiencies()?,
            })
        })
        .transpose()?;

    Ok(Dataset {
        parameters,
        regions,
        stock,
        coefficients,
        industry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value\nhello,1\n world , 2").unwrap();
        }

        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".into(),
                    value: 1,
                },
                Record {
                    id: "world".into(),
                    value: 2,
                }
            ]
        );

        // File with no data rows
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value").unwrap();
        }
        assert!(read_csv::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".into(),
                value: 1,
            }
        );

        // Missing field
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"").unwrap();
        }
        assert!(read_toml::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_input_err_msg() {
        assert_eq!(
            input_err_msg(Path::new("data/regions.csv")),
            "Error reading data/regions.csv"
        );
    }
}
