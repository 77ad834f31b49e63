//! Code for reading the apartment stock table.
//!
//! The first three columns of the table are unlabelled and hold the age, apartment-size and
//! unit-count bracket of each row as German labels. The remaining columns give the number of
//! apartments in each region.
use super::read_table;
use super::region::RegionMap;
use crate::category::{CategoryAxis, CompositeKey, KeyLabel, map_level};
use crate::errors::PipelineError;
use crate::id::RegionID;
use crate::schema::{ColumnMap, Record, TableFormat, normalise};
use crate::stock::{ApartmentStock, RegionCounts, StockKey};
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use std::path::Path;

const APARTMENTS_TABLE: &str = "apartments";

/// Canonical names of the key columns, in level order
const KEY_COLUMNS: [(&str, &str, CategoryAxis); 3] = [
    ("Unnamed: 0", "age", CategoryAxis::Age),
    ("Unnamed: 1", "size_of_apartment", CategoryAxis::Size),
    ("Unnamed: 2", "n_apartments", CategoryAxis::UnitCount),
];

/// The column map for the apartment table with the given regions
fn apartment_columns(regions: &RegionMap, excluded_columns: &[String]) -> ColumnMap {
    let columns = ColumnMap::new(APARTMENTS_TABLE)
        .rename_all(KEY_COLUMNS.iter().map(|(raw, name, _)| (*raw, *name)))
        .rename_all(
            regions
                .values()
                .map(|region| (region.label.clone(), region.id.to_string())),
        );

    excluded_columns
        .iter()
        .fold(columns, |columns, label| columns.exclude(label))
}

/// Read the apartment stock table.
///
/// # Arguments
///
/// * `file_path` - Path to the apartment table
/// * `format` - Layout of the file
/// * `regions` - The regions, whose labels must match the region columns of the table
/// * `excluded_columns` - Columns of the table to ignore
pub fn read_apartment_stock(
    file_path: &Path,
    format: &TableFormat,
    regions: &RegionMap,
    excluded_columns: &[String],
) -> Result<ApartmentStock> {
    let raw = read_table(file_path, format)?;
    let records = normalise(&raw, &apartment_columns(regions, excluded_columns))
        .with_context(|| super::input_err_msg(file_path))?;

    read_apartment_stock_from_records(records, regions)
        .with_context(|| super::input_err_msg(file_path))
}

fn read_apartment_stock_from_records(
    records: Vec<Record>,
    regions: &RegionMap,
) -> Result<ApartmentStock> {
    let rows = records
        .into_iter()
        .map(|record| {
            let key: CompositeKey = KEY_COLUMNS
                .iter()
                .map(|(_, name, _)| Ok(KeyLabel::Text(record.get(name)?.to_string())))
                .collect::<Result<_>>()?;
            Ok((key, record))
        })
        .collect::<Result<Vec<_>>>()?;

    let rows = KEY_COLUMNS
        .iter()
        .enumerate()
        .fold(rows, |rows, (level, (_, _, axis))| map_level(rows, level, *axis));

    let region_ids: IndexSet<RegionID> = regions.keys().cloned().collect();
    let mut cells = IndexMap::new();
    for (key, record) in rows {
        let key = stock_key(&key, &record)?;
        let counts = region_ids
            .iter()
            .map(|region_id| Ok((region_id.clone(), record.parse_count(&region_id.0)?)))
            .collect::<Result<RegionCounts>>()?;

        if cells.insert(key, counts).is_some() {
            Err(PipelineError::DuplicateKeyError {
                table: APARTMENTS_TABLE.into(),
                key: key.to_string(),
            })?;
        }
    }

    // NB: Source tables are not reliably ordered
    cells.sort_keys();
    ApartmentStock::new(region_ids, cells)
}

/// Convert an encoded composite key into a [`StockKey`], requiring every level to be a code
fn stock_key(key: &CompositeKey, record: &Record) -> Result<StockKey> {
    let mut codes = [0; 3];
    for (code, (label, (_, name, _))) in codes.iter_mut().zip(key.iter().zip(KEY_COLUMNS)) {
        *code = match label {
            KeyLabel::Code(value) => *value,
            KeyLabel::Text(text) => return Err(record.format_error(name, text).into()),
        };
    }

    let [age, size, unit_count] = codes;
    Ok(StockKey::new(age, size, unit_count))
}
