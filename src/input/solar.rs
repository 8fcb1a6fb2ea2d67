//! Code for reading the solar installations CSV file.
use super::{input_err_msg, read_csv_optional};
use crate::scenario::SolarInstallation;
use crate::units::Money;
use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use std::path::Path;

const SOLAR_FILE_NAME: &str = "solar.csv";

/// Represents a row of the solar CSV file
#[derive(Deserialize, Debug, PartialEq)]
struct SolarRaw {
    id: String,
    investment: Money,
    lifetime: u32,
    maintenance: Money,
}

/// Read the fixed costs of the PV and solar thermal installations.
///
/// The file is optional; missing installations have no cost.
///
/// # Returns
///
/// The PV and solar thermal installations, in that order.
pub(super) fn read_solar_installations(
    scenario_dir: &Path,
) -> Result<(SolarInstallation, SolarInstallation)> {
    let file_path = scenario_dir.join(SOLAR_FILE_NAME);
    let rows: Vec<SolarRaw> = read_csv_optional(&file_path)?;

    read_solar_from_iter(rows).with_context(|| input_err_msg(&file_path))
}

fn read_solar_from_iter<I>(iter: I) -> Result<(SolarInstallation, SolarInstallation)>
where
    I: IntoIterator<Item = SolarRaw>,
{
    let mut pv = None;
    let mut st = None;
    for row in iter {
        ensure!(
            row.investment.is_finite() && row.investment >= Money(0.0),
            "Investment for {} must be a finite, non-negative number",
            row.id
        );
        ensure!(
            row.maintenance.is_finite() && row.maintenance >= Money(0.0),
            "Maintenance for {} must be a finite, non-negative number",
            row.id
        );

        let slot = match row.id.to_uppercase().as_str() {
            "PV" => &mut pv,
            "ST" => &mut st,
            _ => bail!("Unknown solar installation {}. Must be PV or ST", row.id),
        };
        ensure!(slot.is_none(), "Duplicate ID found: {}", row.id);
        *slot = Some(SolarInstallation {
            investment: row.investment,
            lifetime: row.lifetime,
            maintenance: row.maintenance,
        });
    }

    Ok((pv.unwrap_or_default(), st.unwrap_or_default()))
}
