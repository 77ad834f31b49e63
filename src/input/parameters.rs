//! Defines the `DatasetParameters` struct, which represents the contents of `heat_demand.toml`.
use crate::carrier::{Carrier, ConversionEfficiencies, DistrictSelection, RecordSelection};
use crate::id::DistrictID;
use crate::input::{input_err_msg, read_toml};
use crate::schema::TableFormat;
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DATASET_PARAMETERS_FILE_NAME: &str = "heat_demand.toml";

macro_rules! define_path_default {
    ($name:ident, $value: expr) => {
        fn $name() -> PathBuf {
            PathBuf::from($value)
        }
    };
}

define_path_default!(default_apartments_file, "apartments.csv");
define_path_default!(default_coefficients_file, "specific_heat_consumption.csv");
define_path_default!(default_survey_file, "energy_survey.csv");

/// Represents the contents of the entire dataset file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatasetParameters {
    /// Inputs of the household pipeline
    pub households: HouseholdParameters,
    /// Inputs of the industry pipeline. If absent, the pipeline is not run.
    pub industry: Option<IndustryParameters>,
}

/// Parameters of the household pipeline
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HouseholdParameters {
    /// Apartment counts by age, size, unit count and region
    #[serde(default = "default_apartments_file")]
    pub apartments_file: PathBuf,
    /// Layout of the apartments file
    #[serde(default)]
    pub format: TableFormat,
    /// Columns of the apartments file which are not regions of interest (e.g. state totals)
    #[serde(default)]
    pub excluded_columns: Vec<String>,
    /// Specific heat consumption by age, modernisation status and building type
    #[serde(default = "default_coefficients_file")]
    pub coefficients_file: PathBuf,
    /// Layout of the coefficients file
    #[serde(default = "TableFormat::plain_csv")]
    pub coefficients_format: TableFormat,
}

/// The districts to evaluate: either the keyword `"all"` or a list of district numbers
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DistrictList {
    /// A keyword; only `"all"` is valid
    Keyword(String),
    /// Explicit district numbers
    Ids(Vec<u32>),
}

/// Parameters of the industry pipeline
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IndustryParameters {
    /// Energy consumption by year, district and carrier
    #[serde(default = "default_survey_file")]
    pub survey_file: PathBuf,
    /// Layout of the survey file
    #[serde(default)]
    pub format: TableFormat,
    /// The survey year to evaluate
    pub year: u32,
    /// The districts to evaluate
    pub district_ids: DistrictList,
    /// Conversion efficiencies replacing the defaults, keyed by carrier name
    #[serde(default)]
    pub efficiencies: IndexMap<String, f64>,
}

impl IndustryParameters {
    /// The subset of the survey to evaluate
    pub fn record_selection(&self) -> RecordSelection {
        let districts = match &self.district_ids {
            DistrictList::Keyword(_) => DistrictSelection::All,
            DistrictList::Ids(ids) => DistrictSelection::Some(
                ids.iter()
                    .map(|id| DistrictID::from(id.to_string()))
                    .collect::<IndexSet<_>>(),
            ),
        };

        RecordSelection {
            year: self.year,
            districts,
        }
    }

    /// The conversion efficiencies, with any overrides applied
    pub fn conversion_efficiencies(&self) -> Result<ConversionEfficiencies> {
        let overrides = self
            .efficiencies
            .iter()
            .map(|(name, value)| {
                let carrier = Carrier::from_str(name)
                    .with_context(|| format!("Unknown energy carrier: {name}"))?;
                Ok((carrier, *value))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        ConversionEfficiencies::with_overrides(&overrides)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        match &self.district_ids {
            DistrictList::Keyword(keyword) => ensure!(
                keyword.eq_ignore_ascii_case("all"),
                "district_ids must be \"all\" or a list of district numbers, got \"{keyword}\""
            ),
            DistrictList::Ids(ids) => {
                ensure!(!ids.is_empty(), "district_ids is empty");
                let unique: IndexSet<_> = ids.iter().collect();
                ensure!(unique.len() == ids.len(), "district_ids contains duplicates");
            }
        }

        self.conversion_efficiencies()
            .context("Invalid value for efficiencies")?;

        Ok(())
    }
}

impl DatasetParameters {
    /// Read a dataset file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Folder containing the dataset
    ///
    /// # Returns
    ///
    /// The file contents as a [`DatasetParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(data_dir: P) -> Result<DatasetParameters> {
        let file_path = data_dir.as_ref().join(DATASET_PARAMETERS_FILE_NAME);
        let parameters: DatasetParameters = read_toml(&file_path)?;

        parameters
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(parameters)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // The delimiter must be usable by the CSV reader
        self.households.format.delimiter_byte()?;
        self.households.coefficients_format.delimiter_byte()?;

        if let Some(industry) = &self.industry {
            industry.format.delimiter_byte()?;
            industry.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::schema::Encoding;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_parameters_file(dir: &Path, contents: &str) {
        let mut file = File::create(dir.join(DATASET_PARAMETERS_FILE_NAME)).unwrap();
        write!(file, "{contents}").unwrap();
    }

    fn industry(district_ids: DistrictList) -> IndustryParameters {
        IndustryParameters {
            survey_file: default_survey_file(),
            format: TableFormat::default(),
            year: 2011,
            district_ids,
            efficiencies: IndexMap::new(),
        }
    }

    #[test]
    fn test_dataset_parameters_defaults() {
        let dir = tempdir().unwrap();
        write_parameters_file(dir.path(), "[households]\n");

        let parameters = DatasetParameters::from_path(dir.path()).unwrap();
        assert_eq!(
            parameters.households,
            HouseholdParameters {
                apartments_file: "apartments.csv".into(),
                format: TableFormat {
                    delimiter: ';',
                    skip_rows: 0,
                    encoding: Encoding::Latin1,
                },
                excluded_columns: Vec::new(),
                coefficients_file: "specific_heat_consumption.csv".into(),
                coefficients_format: TableFormat::plain_csv(),
            }
        );
        assert_eq!(parameters.industry, None);
    }

    #[test]
    fn test_dataset_parameters_industry() {
        let dir = tempdir().unwrap();
        write_parameters_file(
            dir.path(),
            r#"[households]
format = { skip_rows = 5 }

[industry]
year = 2011
district_ids = [1001, 1002]
format = { skip_rows = 7, encoding = "utf8" }
efficiencies = { gas = 0.9 }
"#,
        );

        let parameters = DatasetParameters::from_path(dir.path()).unwrap();
        assert_eq!(parameters.households.format.skip_rows, 5);

        let industry = parameters.industry.unwrap();
        assert_eq!(industry.format.encoding, Encoding::Utf8);
        assert_eq!(
            industry.record_selection(),
            RecordSelection {
                year: 2011,
                districts: DistrictSelection::Some(
                    ["1001".into(), "1002".into()].into_iter().collect()
                ),
            }
        );
        assert_eq!(
            industry.conversion_efficiencies().unwrap().get(Carrier::Gas),
            Some(0.9)
        );
    }

    #[test]
    fn test_dataset_parameters_missing_file() {
        let dir = tempdir().unwrap();
        assert!(DatasetParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(DistrictList::Keyword("all".into()), true)]
    #[case(DistrictList::Keyword("ALL".into()), true)]
    #[case(DistrictList::Keyword("some".into()), false)]
    #[case(DistrictList::Ids(vec![1001]), true)]
    #[case(DistrictList::Ids(vec![]), false)]
    #[case(DistrictList::Ids(vec![1001, 1001]), false)]
    fn test_industry_validate_district_ids(#[case] ids: DistrictList, #[case] valid: bool) {
        assert_eq!(industry(ids).validate().is_ok(), valid);
    }

    #[test]
    fn test_industry_all_districts() {
        assert_eq!(
            industry(DistrictList::Keyword("all".into()))
                .record_selection()
                .districts,
            DistrictSelection::All
        );
    }

    #[test]
    fn test_industry_unknown_carrier() {
        let mut parameters = industry(DistrictList::Ids(vec![1001]));
        parameters.efficiencies.insert("peat".into(), 0.5);
        assert_error!(
            parameters.conversion_efficiencies(),
            "Unknown energy carrier: peat"
        );
        assert!(parameters.validate().is_err());
    }
}
