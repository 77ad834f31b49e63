//! Code for reading the energy survey of the industry pipeline.
//!
//! The survey gives energy consumption in 1000 MJ by year, district and energy carrier. Its key
//! columns are unlabelled and the carrier columns carry German headers.
use super::{input_err_msg, read_table};
use crate::carrier::RegionRecord;
use crate::errors::PipelineError;
use crate::schema::{ColumnMap, Record, TableFormat, clean_region_name, normalise};
use anyhow::{Context, Result, ensure};
use std::collections::HashSet;
use std::path::Path;

const SURVEY_TABLE: &str = "energy survey";

/// Raw survey header and canonical name of each carrier column
const CARRIER_COLUMNS: [(&str, &str); 7] = [
    ("Kohle", "coal"),
    ("Heizöl", "oil"),
    ("Erdgas", "gas"),
    ("Erneuerbare Energien", "renewables"),
    ("Strom", "electricity"),
    ("Wärme", "heat"),
    ("Sonstige Energieträger", "other"),
];

/// The sum over all carriers, which is not needed
const TOTAL_COLUMN: &str = "insgesamt";

fn survey_columns() -> ColumnMap {
    ColumnMap::new(SURVEY_TABLE)
        .rename("Unnamed: 0", "year")
        .rename("Unnamed: 1", "district_id")
        .rename("Unnamed: 2", "district")
        .rename_all(CARRIER_COLUMNS)
        .exclude(TOTAL_COLUMN)
}

/// Read the energy survey.
///
/// District IDs are normalised by parsing them as integers, so that `01001` becomes `1001`.
///
/// # Arguments
///
/// * `file_path` - Path to the survey file
/// * `format` - Layout of the file
pub fn read_survey(file_path: &Path, format: &TableFormat) -> Result<Vec<RegionRecord>> {
    let raw = read_table(file_path, format)?;
    let records = normalise(&raw, &survey_columns()).with_context(|| input_err_msg(file_path))?;
    read_survey_from_records(&records).with_context(|| input_err_msg(file_path))
}

fn read_survey_from_records(records: &[Record]) -> Result<Vec<RegionRecord>> {
    ensure!(!records.is_empty(), "Survey contains no data");

    let mut keys = HashSet::new();
    let mut survey = Vec::with_capacity(records.len());
    for record in records {
        let region_record = read_region_record(record)?;
        if !keys.insert((region_record.year, region_record.district_id.clone())) {
            Err(PipelineError::DuplicateKeyError {
                table: SURVEY_TABLE.into(),
                key: format!("({}, {})", region_record.year, region_record.district_id),
            })?;
        }
        survey.push(region_record);
    }

    Ok(survey)
}

fn read_region_record(record: &Record) -> Result<RegionRecord> {
    let district_id: u32 = record.parse("district_id")?;
    let value = |column: &str| -> Result<f64> { Ok(record.parse_count(column)? as f64) };

    Ok(RegionRecord {
        year: record.parse("year")?,
        district_id: district_id.to_string().into(),
        district: clean_region_name(record.get("district")?),
        coal: value("coal")?,
        oil: value("oil")?,
        gas: value("gas")?,
        renewables: value("renewables")?,
        electricity: value("electricity")?,
        heat: value("heat")?,
        other: value("other")?,
    })
}
