//! The scenario: everything needed to build and solve one optimisation problem.
use crate::time_step::{Horizon, TimeSeries, TimeStep};
use crate::units::{Dimensionless, Energy, Money};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;

pub mod grid;
pub mod parameters;
pub mod storage;
pub mod unit;
use grid::{DistrictHeatingConnection, GridConnection};
use parameters::{MaintenanceSchedule, ScenarioParameters};
use storage::{StorageID, StorageMap};
use unit::{Unit, UnitID, UnitMap};

/// Electricity and heat demand in each time step
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    /// Electricity demand
    pub electric: TimeSeries<Energy>,
    /// Space heating plus hot water demand
    pub heat: TimeSeries<Energy>,
    /// Outdoor temperature, used only for reporting
    pub outdoor_temperature: TimeSeries<f64>,
}

/// The fixed costs of a solar installation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolarInstallation {
    /// Up-front investment cost
    pub investment: Money,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Operation and maintenance cost per year
    pub maintenance: Money,
}

/// Must-take solar output and the installations producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Renewables {
    /// PV electricity output in each time step
    pub pv: TimeSeries<Energy>,
    /// Solar thermal heat output in each time step
    pub st: TimeSeries<Energy>,
    /// The PV installation
    pub pv_installation: SolarInstallation,
    /// The solar thermal installation
    pub st_installation: SolarInstallation,
}

impl Renewables {
    /// Whether the solar installations are part of the scenario.
    ///
    /// Solar costs are only charged when the PV installation has an investment cost.
    pub fn has_installation_costs(&self) -> bool {
        self.pv_installation.investment > Money(0.0)
    }
}

/// Column bound overrides applied when building the problem
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fixings {
    /// Fixed output of units at particular time steps
    pub outputs: IndexMap<UnitID, IndexMap<TimeStep, Energy>>,
    /// Fixed build decisions
    pub built: IndexMap<UnitID, bool>,
    /// Fixed storage levels at particular time steps
    pub storage_levels: IndexMap<StorageID, IndexMap<TimeStep, Energy>>,
}

impl Fixings {
    /// The fixed output of a unit at a time step, if any
    pub fn output(&self, unit: &UnitID, step: TimeStep) -> Option<Energy> {
        self.outputs.get(unit)?.get(&step).copied()
    }

    /// The fixed storage level at a time step, if any
    pub fn storage_level(&self, storage: &StorageID, step: TimeStep) -> Option<Energy> {
        self.storage_levels.get(storage)?.get(&step).copied()
    }

    /// Fix a unit's output over a window of time steps
    pub fn fix_output<I: IntoIterator<Item = TimeStep>>(
        &mut self,
        unit: &UnitID,
        steps: I,
        value: Energy,
    ) {
        let entry = self.outputs.entry(unit.clone()).or_default();
        for step in steps {
            entry.insert(step, value);
        }
    }
}

/// All the data describing one optimisation problem
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Name used in reports
    pub name: String,
    /// Scalar parameters read from `scenario.toml`
    pub parameters: ScenarioParameters,
    /// The period being optimised
    pub horizon: Horizon,
    /// Electric and CHP generators
    pub generators: UnitMap,
    /// Heat-only units
    pub heaters: UnitMap,
    /// Batteries and thermal stores
    pub storage: StorageMap,
    /// Electricity and heat demand
    pub demand: Demand,
    /// Solar output and installations
    pub renewables: Renewables,
    /// The electricity grid
    pub grid: GridConnection,
    /// The district heating network
    pub district_heating: DistrictHeatingConnection,
    /// Column bound overrides
    pub fixings: Fixings,
}

impl Scenario {
    /// The horizon length as a fraction of a year
    pub fn period(&self) -> Dimensionless {
        self.horizon.period()
    }

    /// Iterate over all generators and heaters
    pub fn iter_units(&self) -> impl Iterator<Item = &Unit> {
        self.generators.values().chain(self.heaters.values())
    }

    /// Look up a generator or heater by name
    pub fn find_unit(&self, id: &str) -> Result<&Unit> {
        self.generators
            .get(id)
            .or_else(|| self.heaters.get(id))
            .with_context(|| format!("Unknown unit ID {id} found"))
    }

    /// Look up a generator or heater by name for modification
    pub fn find_unit_mut(&mut self, id: &str) -> Result<&mut Unit> {
        if self.generators.contains_key(id) {
            return self
                .generators
                .get_mut(id)
                .with_context(|| format!("Unknown unit ID {id} found"));
        }

        self.heaters
            .get_mut(id)
            .with_context(|| format!("Unknown unit ID {id} found"))
    }

    /// Check a window of time steps lies within the horizon
    pub fn time_step_window(&self, start: u32, duration: u32) -> Result<Vec<TimeStep>> {
        ensure!(duration > 0, "Duration must be greater than zero");
        let steps = self.horizon.step_numbers();
        let end = start.saturating_add(duration - 1);
        ensure!(
            steps.contains(&start) && steps.contains(&end),
            "Time steps {start} to {end} are outside the horizon (1 to {})",
            steps.end()
        );

        Ok((start..=end).map(TimeStep::new).collect())
    }

    /// Fix the output of units to zero during their maintenance periods
    pub fn apply_maintenance(&mut self, schedules: &[MaintenanceSchedule]) -> Result<()> {
        for schedule in schedules {
            let id = self.find_unit(&schedule.unit)?.id.clone();
            for start in &schedule.starts {
                let window = self
                    .time_step_window(*start, schedule.duration)
                    .with_context(|| format!("Invalid maintenance period for unit {id}"))?;
                self.fixings.fix_output(&id, window, Energy(0.0));
            }
        }

        Ok(())
    }

    /// Check that the scenario is structurally sound.
    ///
    /// Infeasibility (e.g. demand that cannot be met) is not detected here.
    pub fn validate(&self) -> Result<()> {
        let num_steps = self.horizon.num_steps() as usize;
        for (name, len) in [
            ("electric demand", self.demand.electric.len()),
            ("heat demand", self.demand.heat.len()),
            ("outdoor temperature", self.demand.outdoor_temperature.len()),
            ("PV output", self.renewables.pv.len()),
            ("solar thermal output", self.renewables.st.len()),
            ("spot price", self.grid.spot_price.len()),
            ("grid emissions", self.grid.emissions.len()),
            ("grid capacity", self.grid.capacity.len()),
            ("district heating energy tariff", self.district_heating.energy_tariff.len()),
            ("district heating power tariff", self.district_heating.power_tariff.len()),
        ] {
            ensure!(
                len == num_steps,
                "Time series for {name} has {len} values, but the horizon has {num_steps} time steps"
            );
        }

        for (name, series) in [
            ("electric demand", &self.demand.electric),
            ("heat demand", &self.demand.heat),
            ("PV output", &self.renewables.pv),
            ("solar thermal output", &self.renewables.st),
        ] {
            ensure!(
                series
                    .values()
                    .iter()
                    .all(|value| value.is_finite() && *value >= Energy(0.0)),
                "Time series for {name} must contain finite, non-negative values"
            );
        }

        for unit in self.iter_units() {
            unit.validate()?;
        }
        for asset in self.storage.values() {
            asset.validate()?;
        }
        for id in self.generators.keys() {
            ensure!(
                !self.heaters.contains_key(id),
                "Unit ID {id} is used by both a generator and a heater"
            );
        }
        self.grid.validate()?;
        self.district_heating.validate()?;

        for (id, outputs) in &self.fixings.outputs {
            let unit = self.find_unit(&id.0)?;
            for (step, value) in outputs {
                ensure!(
                    step.number() <= self.horizon.num_steps(),
                    "Fixed output of unit {id} at time step {step} is outside the horizon"
                );
                ensure!(
                    *value == Energy(0.0) || (*value >= unit.min && *value <= unit.max),
                    "Fixed output of unit {id} must be zero or between its min and max"
                );
            }
        }
        for id in self.fixings.built.keys() {
            self.find_unit(&id.0)?;
        }
        for (id, levels) in &self.fixings.storage_levels {
            let asset = self
                .storage
                .get(id)
                .with_context(|| format!("Unknown storage ID {id} found"))?;
            for (step, value) in levels {
                ensure!(
                    step.number() <= self.horizon.num_steps(),
                    "Fixed level of storage {id} at time step {step} is outside the horizon"
                );
                ensure!(
                    *value >= Energy(0.0) && *value <= asset.capacity_max,
                    "Fixed level of storage {id} must be between zero and its maximum capacity"
                );
            }
        }

        Ok(())
    }
}
