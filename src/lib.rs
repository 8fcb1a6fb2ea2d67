//! Sizing and dispatch optimisation for microgrids.
//!
//! A [`scenario::Scenario`] is turned into a mixed-integer linear program, solved with HiGHS and
//! analysed to give costs, emissions and levelised costs of every energy source.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod analytics;
pub mod cli;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod optimisation;
pub mod output;
pub mod scenario;
pub mod settings;
pub mod sweep;
pub mod time_step;
pub mod units;
pub mod variant;

#[cfg(test)]
mod fixture;

/// Get the config dir for the program
pub fn get_mgopt_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir on this platform; use the current directory instead
        return PathBuf::new();
    };
    config_dir.push("mgopt");

    config_dir
}
