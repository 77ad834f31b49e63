//! Code for reading the regions file.
//!
//! Each region is identified in the apartment table by a long label, e.g.
//! `010020000000 Kiel, Landeshauptstadt (Kreisfreie Stadt)`, and is given a short ID here.
use super::{input_err_msg, read_csv};
use crate::errors::PipelineError;
use crate::id::RegionID;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const REGIONS_FILE_NAME: &str = "regions.csv";

/// A map of [`Region`]s, keyed by region ID
pub type RegionMap = IndexMap<RegionID, Region>;

/// A region of the apartment table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Region {
    /// The column label of the region in the apartment table
    pub label: String,
    /// A unique short identifier (e.g. "KI")
    pub id: RegionID,
    /// A text description of the region (e.g. "Kiel")
    pub description: String,
}

/// Reads regions from a CSV file.
///
/// # Arguments
///
/// * `data_dir` - Folder containing the dataset
///
/// # Returns
///
/// The regions, in file order, or an error if an ID or label is repeated
pub fn read_regions(data_dir: &Path) -> Result<RegionMap> {
    let file_path = data_dir.join(REGIONS_FILE_NAME);
    let regions = read_csv::<Region>(&file_path)?;
    read_regions_from_iter(regions).with_context(|| input_err_msg(&file_path))
}

fn read_regions_from_iter<I>(iter: I) -> Result<RegionMap>
where
    I: IntoIterator<Item = Region>,
{
    let mut labels = HashSet::new();
    let mut map = RegionMap::new();
    for region in iter {
        if !labels.insert(region.label.clone()) {
            Err(PipelineError::DuplicateKeyError {
                table: "regions".into(),
                key: region.label.clone(),
            })?;
        }

        let id = region.id.clone();
        if map.insert(id.clone(), region).is_some() {
            Err(PipelineError::DuplicateKeyError {
                table: "regions".into(),
                key: id.to_string(),
            })?;
        }
    }

    Ok(map)
}
