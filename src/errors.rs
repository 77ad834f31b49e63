//! Errors raised by the heat demand pipelines.
//!
//! Every stage returns [`anyhow::Result`]; the variants below are the failures a caller may want to
//! distinguish. They can be recovered from an [`anyhow::Error`] with `downcast_ref`.
use crate::stock::{AgeClass, BuildingType};
use thiserror::Error;

/// A fatal failure while reconciling the input tables
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    /// The header row of a table does not match the expected columns
    #[error(
        "Schema mismatch in {table} table: unexpected columns {unexpected:?}, missing columns {missing:?}"
    )]
    SchemaMismatch {
        /// The table being normalised
        table: String,
        /// Columns which are neither mapped nor excluded
        unexpected: Vec<String>,
        /// Canonical columns which did not appear in the header row
        missing: Vec<String>,
    },
    /// A cell could not be parsed
    #[error("Invalid value \"{value}\" in column '{column}' (line {line})")]
    FormatError {
        /// The line of the input file on which the value occurs
        line: u64,
        /// The canonical name of the column
        column: String,
        /// The offending cell contents
        value: String,
    },
    /// Two rows share the same key after normalisation
    #[error("Duplicate key {key} in {table} table")]
    DuplicateKeyError {
        /// The table being normalised
        table: String,
        /// The repeated key
        key: String,
    },
    /// There is no specific heat consumption value for a cell of the apartment stock
    #[error(
        "No specific heat consumption for age class {age_class} and building type {building_type}"
    )]
    MissingCoefficient {
        /// Age class of the cell
        age_class: AgeClass,
        /// Building type of the cell
        building_type: BuildingType,
    },
    /// A region has annual demand but no vintage category for the load profile
    #[error("No building class available for region {0}")]
    MissingBuildingClass(String),
}
