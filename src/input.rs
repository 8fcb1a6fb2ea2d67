//! Common routines for handling input data.
use crate::scenario::grid::{DistrictHeatingConnection, GridConnection};
use crate::scenario::parameters::ScenarioParameters;
use crate::scenario::unit::UnitKind;
use crate::scenario::{Fixings, Renewables, Scenario};
use crate::time_step::{Horizon, TimeSeries};
use crate::units::Energy;
use anyhow::{Context, Result, bail};
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

mod solar;
use solar::read_solar_installations;
mod storage;
use storage::read_storage;
mod time_series;
use time_series::read_time_series;
mod unit;
use unit::read_units;

const SCENARIO_FILE_NAME: &str = "scenario.toml";
const GENERATORS_FILE_NAME: &str = "generators.csv";
const HEATERS_FILE_NAME: &str = "heaters.csv";

/// Read a series of type `T`s from a CSV file.
///
/// Returns an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec)
}

/// Read a series of type `T`s from a CSV file which may be absent or empty
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    if !file_path.exists() {
        return Ok(Vec::new());
    }

    read_csv_internal(file_path)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;

    Ok(toml_data)
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<f64>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(serde::de::Error::custom("Value must be between 0 and 1"));
    }

    Ok(T::from(value))
}

/// Read a scenario from the specified directory.
///
/// # Arguments
///
/// * `scenario_dir` - Folder containing scenario input files
///
/// # Returns
///
/// The scenario, with its maintenance schedule applied, or an error if the input data are invalid.
pub fn load_scenario<P: AsRef<Path>>(scenario_dir: P) -> Result<Scenario> {
    let scenario_dir = scenario_dir.as_ref();
    let parameters = ScenarioParameters::from_path(scenario_dir)?;
    let horizon = Horizon::new(parameters.days, parameters.start_day)
        .with_context(|| input_err_msg(scenario_dir.join(SCENARIO_FILE_NAME)))?;

    let generators = read_units(
        &scenario_dir.join(GENERATORS_FILE_NAME),
        UnitKind::Generator,
        true,
    )?;
    let heaters = read_units(
        &scenario_dir.join(HEATERS_FILE_NAME),
        UnitKind::Heater,
        false,
    )?;
    let storage = read_storage(scenario_dir)?;
    let series = read_time_series(scenario_dir, &horizon)?;
    let (pv_installation, st_installation) = read_solar_installations(scenario_dir)?;

    let num_steps = horizon.num_steps();
    let grid_capacity = series.grid_capacity.unwrap_or_else(|| {
        let capacity = parameters.grid.capacity.unwrap_or(Energy(f64::INFINITY));
        TimeSeries::constant(capacity, num_steps)
    });
    let grid = GridConnection {
        spot_price: series.spot_price,
        emissions: series.grid_emissions,
        capacity: grid_capacity,
        energy_tariff: parameters.grid.energy_tariff,
        fixed_tariff: parameters.grid.fixed_tariff,
        power_tariff: parameters.grid.power_tariff,
        assumed_peak: parameters.grid.assumed_peak,
        allow_export: parameters.grid.allow_export,
    };
    let district_heating = DistrictHeatingConnection {
        energy_tariff: series.dh_energy_tariff,
        power_tariff: series.dh_power_tariff,
        fixed_tariff: parameters.district_heating.fixed_tariff,
        emissions: parameters.district_heating.emissions,
        capacity: parameters.district_heating.capacity,
    };
    let renewables = Renewables {
        pv: series.pv,
        st: series.st,
        pv_installation,
        st_installation,
    };

    let name = parameters.name.clone().unwrap_or_else(|| {
        scenario_dir
            .file_name()
            .map_or_else(|| "scenario".into(), |name| name.to_string_lossy().into())
    });
    let maintenance = parameters.maintenance.clone();
    let mut scenario = Scenario {
        name,
        parameters,
        horizon,
        generators,
        heaters,
        storage,
        demand: series.demand,
        renewables,
        grid,
        district_heating,
        fixings: Fixings::default(),
    };

    scenario
        .apply_maintenance(&maintenance)
        .with_context(|| input_err_msg(scenario_dir.join(SCENARIO_FILE_NAME)))?;
    scenario
        .validate()
        .with_context(|| format!("Invalid scenario in {}", scenario_dir.display()))?;

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Dimensionless;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value\nhello, 1\nworld,2").unwrap();
        }

        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(
            records,
            [
                Record {
                    id: "hello".into(),
                    value: 1
                },
                Record {
                    id: "world".into(),
                    value: 2
                }
            ]
        );
    }

    #[test]
    fn test_read_csv_empty() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id,value").unwrap();
        }

        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).unwrap().is_empty());
    }

    #[test]
    fn test_read_csv_optional_missing() {
        let dir = tempdir().unwrap();
        let records: Vec<Record> = read_csv_optional(&dir.path().join("missing.csv")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_toml() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Data {
            value: u32,
        }

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "value = 1").unwrap();
        }
        assert_eq!(read_toml::<Data>(&file_path).unwrap(), Data { value: 1 });

        // Missing file
        assert!(read_toml::<Data>(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_deserialise_proportion() {
        #[derive(Debug, Deserialize)]
        struct Data {
            #[serde(deserialize_with = "deserialise_proportion")]
            value: Dimensionless,
        }

        let data: Data = toml::from_str("value = 0.5").unwrap();
        assert_eq!(data.value, Dimensionless(0.5));
        assert!(toml::from_str::<Data>("value = 1.5").is_err());
    }
}
