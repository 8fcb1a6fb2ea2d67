//! Code for reading the hourly time series CSV file.
use super::{input_err_msg, read_csv};
use crate::scenario::Demand;
use crate::time_step::{Horizon, TimeSeries};
use crate::units::{Energy, EmissionsPerEnergy, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const TIME_SERIES_FILE_NAME: &str = "time_series.csv";

/// Represents a row of the time series CSV file
#[derive(Deserialize, Debug, Clone, PartialEq)]
struct TimeSeriesRaw {
    step: u32,
    electric_demand: Energy,
    space_heating_demand: Energy,
    hot_water_demand: Energy,
    outdoor_temperature: f64,
    pv: Energy,
    st: Energy,
    spot_price: MoneyPerEnergy,
    grid_emissions: EmissionsPerEnergy,
    dh_energy_tariff: MoneyPerEnergy,
    dh_power_tariff: MoneyPerEnergy,
    grid_capacity: Option<Energy>,
}

/// Every per-time-step input series of a scenario
#[derive(Debug)]
pub(super) struct TimeSeriesData {
    pub demand: Demand,
    pub pv: TimeSeries<Energy>,
    pub st: TimeSeries<Energy>,
    pub spot_price: TimeSeries<MoneyPerEnergy>,
    pub grid_emissions: TimeSeries<EmissionsPerEnergy>,
    /// Present only if every row gives a grid capacity
    pub grid_capacity: Option<TimeSeries<Energy>>,
    pub dh_energy_tariff: TimeSeries<MoneyPerEnergy>,
    pub dh_power_tariff: TimeSeries<MoneyPerEnergy>,
}

/// Read the time series file, which must have one row per time step of the horizon
pub(super) fn read_time_series(scenario_dir: &Path, horizon: &Horizon) -> Result<TimeSeriesData> {
    let file_path = scenario_dir.join(TIME_SERIES_FILE_NAME);
    let rows: Vec<TimeSeriesRaw> = read_csv(&file_path)?;

    read_time_series_from_rows(&rows, horizon).with_context(|| input_err_msg(&file_path))
}

fn read_time_series_from_rows(rows: &[TimeSeriesRaw], horizon: &Horizon) -> Result<TimeSeriesData> {
    let num_steps = horizon.num_steps() as usize;
    ensure!(
        rows.len() == num_steps,
        "Expected {num_steps} rows ({} days of 24 time steps), found {}",
        horizon.days(),
        rows.len()
    );
    for (expected, row) in horizon.step_numbers().zip(rows) {
        ensure!(
            row.step == expected,
            "Time steps must be consecutive and start at 1: expected step {expected}, found {}",
            row.step
        );
    }

    let has_grid_capacity = rows.iter().any(|row| row.grid_capacity.is_some());
    let grid_capacity = if has_grid_capacity {
        let capacity = rows
            .iter()
            .map(|row| {
                row.grid_capacity
                    .with_context(|| format!("Missing grid_capacity at step {}", row.step))
            })
            .collect::<Result<TimeSeries<_>>>()?;
        Some(capacity)
    } else {
        None
    };

    Ok(TimeSeriesData {
        demand: Demand {
            electric: rows.iter().map(|row| row.electric_demand).collect(),
            heat: rows
                .iter()
                .map(|row| row.space_heating_demand + row.hot_water_demand)
                .collect(),
            outdoor_temperature: rows.iter().map(|row| row.outdoor_temperature).collect(),
        },
        pv: rows.iter().map(|row| row.pv).collect(),
        st: rows.iter().map(|row| row.st).collect(),
        spot_price: rows.iter().map(|row| row.spot_price).collect(),
        grid_emissions: rows.iter().map(|row| row.grid_emissions).collect(),
        grid_capacity,
        dh_energy_tariff: rows.iter().map(|row| row.dh_energy_tariff).collect(),
        dh_power_tariff: rows.iter().map(|row| row.dh_power_tariff).collect(),
    })
}
