//! Code for reading the specific heat consumption table.
use super::{input_err_msg, read_table};
use crate::category::{CategoryAxis, KeyLabel};
use crate::coefficient::SpecificConsumptionCoefficient;
use crate::errors::PipelineError;
use crate::schema::{ColumnMap, Record, TableFormat, normalise};
use crate::stock::{AgeClass, BuildingType};
use crate::units::SpecificHeatDemand;
use anyhow::{Context, Result, ensure};
use std::collections::HashSet;
use std::path::Path;

const COEFFICIENTS_TABLE: &str = "specific heat consumption";

fn coefficient_columns() -> ColumnMap {
    ColumnMap::new(COEFFICIENTS_TABLE).rename_all([
        ("age", "age_class"),
        ("modernized", "modernisation_status"),
        ("Typ", "building_type"),
        ("share", "share"),
        ("parameter", "parameter"),
    ])
}

/// Read the specific heat consumption coefficients.
///
/// Age classes may be given either as codes or as the survey's bracket labels. Building types are
/// `EFH` (single-family) or `MFH` (multi-family).
///
/// # Arguments
///
/// * `file_path` - Path to the coefficient table
/// * `format` - Layout of the file
pub fn read_coefficients(
    file_path: &Path,
    format: &TableFormat,
) -> Result<Vec<SpecificConsumptionCoefficient>> {
    let raw = read_table(file_path, format)?;
    let records = normalise(&raw, &coefficient_columns()).with_context(|| input_err_msg(file_path))?;
    read_coefficients_from_records(&records).with_context(|| input_err_msg(file_path))
}

fn read_coefficients_from_records(records: &[Record]) -> Result<Vec<SpecificConsumptionCoefficient>> {
    ensure!(!records.is_empty(), "Coefficient table is empty");

    let mut keys = HashSet::new();
    records
        .iter()
        .map(|record| {
            let coefficient = read_coefficient(record)?;
            let key = (
                coefficient.age_class,
                coefficient.modernisation_status.clone(),
                coefficient.building_type,
            );
            if !keys.insert(key) {
                Err(PipelineError::DuplicateKeyError {
                    table: COEFFICIENTS_TABLE.into(),
                    key: format!(
                        "({}, {}, {})",
                        coefficient.age_class,
                        coefficient.modernisation_status,
                        coefficient.building_type
                    ),
                })?;
            }

            Ok(coefficient)
        })
        .collect()
}

fn read_coefficient(record: &Record) -> Result<SpecificConsumptionCoefficient> {
    let age = record.get("age_class")?;
    let KeyLabel::Code(age_class) = KeyLabel::Text(age.to_string()).encode(CategoryAxis::Age) else {
        return Err(record.format_error("age_class", age).into());
    };

    let share: f64 = record.parse("share")?;
    ensure!(
        (0.0..=1.0).contains(&share),
        "Share must be between 0 and 1 (line {})",
        record.line
    );
    let parameter: f64 = record.parse("parameter")?;
    ensure!(
        parameter.is_finite() && parameter >= 0.0,
        "Specific heat consumption must be a non-negative number (line {})",
        record.line
    );

    Ok(SpecificConsumptionCoefficient {
        age_class: AgeClass(age_class),
        modernisation_status: record.get("modernisation_status")?.to_string(),
        building_type: record.parse::<BuildingType>("building_type")?,
        share,
        parameter: SpecificHeatDemand(parameter),
    })
}
