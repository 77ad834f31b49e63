//! Code for writing metadata to file.
//!
//! Besides program and platform details, the metadata records which input files and which
//! parameters a run used, so that results can be traced back to their source tables.
use crate::carrier::DistrictSelection;
use crate::input::{Dataset, IndustryInput};
use anyhow::{Context, Result};
use chrono::prelude::*;
use indexmap::IndexMap;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Get information about program version from git
fn get_git_hash() -> String {
    let Some(hash) = built_info::GIT_COMMIT_HASH_SHORT else {
        return "unknown".into();
    };

    if built_info::GIT_DIRTY == Some(true) {
        format!("{hash}-dirty")
    } else {
        hash.into()
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    dataset: DatasetMetadata<'a>,
    program: ProgramMetadata<'a>,
    platform: PlatformMetadata,
}

/// Information about the pipeline run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the dataset which was processed
    data_path: &'a Path,
    /// The date and time on which the run started
    datetime: String,
}

impl<'a> RunMetadata<'a> {
    fn new(data_path: &'a Path) -> Self {
        let dt = Local::now();
        Self {
            data_path,
            datetime: dt.to_rfc2822(),
        }
    }
}

/// The inputs of the run
#[derive(Serialize)]
struct DatasetMetadata<'a> {
    /// Census table of apartment counts, relative to the dataset directory
    apartments_file: &'a Path,
    /// Specific heat consumption coefficients, relative to the dataset directory
    coefficients_file: &'a Path,
    /// Number of regions
    regions: usize,
    /// Number of (age, size, unit count) cells in the apartment stock
    stock_cells: usize,
    /// Number of coefficient rows
    coefficients: usize,
    /// Industry inputs, if the industry pipeline was run
    industry: Option<IndustryMetadata<'a>>,
}

/// Inputs of the industry pipeline
#[derive(Serialize)]
struct IndustryMetadata<'a> {
    /// Energy survey, relative to the dataset directory
    survey_file: &'a Path,
    /// The survey year evaluated
    year: u32,
    /// The districts evaluated, or `["all"]`
    districts: Vec<String>,
    /// Conversion efficiency per carrier, after overrides
    efficiencies: IndexMap<String, f64>,
}

impl<'a> DatasetMetadata<'a> {
    fn new(dataset: &'a Dataset) -> Self {
        let households = &dataset.parameters.households;
        let industry = dataset
            .parameters
            .industry
            .as_ref()
            .zip(dataset.industry.as_ref())
            .map(|(parameters, input)| IndustryMetadata::new(&parameters.survey_file, input));

        Self {
            apartments_file: &households.apartments_file,
            coefficients_file: &households.coefficients_file,
            regions: dataset.regions.len(),
            stock_cells: dataset.stock.len(),
            coefficients: dataset.coefficients.len(),
            industry,
        }
    }
}

impl<'a> IndustryMetadata<'a> {
    fn new(survey_file: &'a Path, input: &IndustryInput) -> Self {
        let districts = match &input.selection.districts {
            DistrictSelection::All => vec!["all".to_string()],
            DistrictSelection::Some(ids) => ids.iter().map(ToString::to_string).collect(),
        };

        Self {
            survey_file,
            year: input.selection.year,
            districts,
            efficiencies: input
                .efficiencies
                .iter()
                .map(|(carrier, efficiency)| (carrier.to_string(), efficiency))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// The target architecture for the build (e.g. x86_64-unknown-linux-gnu)
    target: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
    /// The version of rustc used to compile the program
    rustc_version: &'a str,
    /// When the program was built
    build_time_utc: &'a str,
    /// The git commit hash for the version of the program (if known)
    git_commit_hash: String,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            is_debug: built_info::DEBUG,
            rustc_version: built_info::RUSTC_VERSION,
            build_time_utc: built_info::BUILT_TIME_UTC,
            git_commit_hash: get_git_hash(),
        }
    }
}

/// Information about the platform on which the program is running.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info = PlatformInfo::new()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .context("Unable to determine platform info")?;
        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata for a run on `dataset`, loaded from `data_path`, to the output path in TOML
/// format
pub fn write_metadata(output_path: &Path, data_path: &Path, dataset: &Dataset) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata::new(data_path),
        dataset: DatasetMetadata::new(dataset),
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::new()?,
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::load_dataset;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn demo_path() -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "demos", "schleswig_holstein"]
            .iter()
            .collect()
    }

    #[test]
    fn test_write_metadata() {
        let dir = tempdir().unwrap();
        let dataset = load_dataset(demo_path()).unwrap();
        write_metadata(dir.path(), &demo_path(), &dataset).unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        let metadata: toml::Table = toml::from_str(&contents).unwrap();
        assert_eq!(metadata["run"]["data_path"].as_str(), demo_path().to_str());
        assert_eq!(metadata["program"]["name"].as_str(), Some("heatdemand"));
        assert!(metadata.contains_key("platform"));

        let data = &metadata["dataset"];
        assert_eq!(data["regions"].as_integer(), Some(15));
        assert_eq!(data["stock_cells"].as_integer(), Some(600));
        assert_eq!(
            data["apartments_file"].as_str(),
            dataset.parameters.households.apartments_file.to_str()
        );

        let industry = &data["industry"];
        assert_eq!(industry["year"].as_integer(), Some(2011));
        assert_eq!(industry["efficiencies"]["gas"].as_float(), Some(0.9));
        assert_eq!(industry["efficiencies"]["coal"].as_float(), Some(0.85));
        assert!(industry["efficiencies"].get("electricity").is_none());
    }

    #[test]
    fn test_industry_metadata_districts() {
        let input = IndustryInput {
            records: Vec::new(),
            selection: crate::carrier::RecordSelection {
                year: 2010,
                districts: DistrictSelection::Some(["1001".into(), "1003".into()].into_iter().collect()),
            },
            efficiencies: crate::carrier::ConversionEfficiencies::default(),
        };
        let metadata = IndustryMetadata::new(Path::new("survey.csv"), &input);
        assert_eq!(metadata.year, 2010);
        assert_eq!(metadata.districts, ["1001", "1003"]);
        assert_eq!(metadata.efficiencies.len(), 6);

        let input = IndustryInput {
            selection: crate::carrier::RecordSelection {
                year: 2010,
                districts: DistrictSelection::All,
            },
            ..input
        };
        assert_eq!(
            IndustryMetadata::new(Path::new("survey.csv"), &input).districts,
            ["all"]
        );
    }
}
