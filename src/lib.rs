//! Estimation of regional heat demand from building-stock statistics.
//!
//! Survey tables of apartment counts are normalised, joined with specific heat consumption
//! coefficients and expanded into floor area and annual heat demand per region and building type.
//! A second, independent pipeline turns energy-carrier survey figures into useful heat.
#![warn(missing_docs)]
use dirs::config_dir;
use std::path::PathBuf;

pub mod carrier;
pub mod category;
pub mod cli;
pub mod coefficient;
pub mod errors;
pub mod expansion;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod schema;
pub mod settings;
pub mod stock;
pub mod summary;
pub mod units;
pub mod vintage;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// This is a subfolder of the platform-specific configuration directory. If the platform has no
/// such directory, the current working directory is used.
pub fn get_heatdemand_config_dir() -> PathBuf {
    let Some(mut config_dir) = config_dir() else {
        return PathBuf::default();
    };

    config_dir.push("heatdemand");
    config_dir
}
