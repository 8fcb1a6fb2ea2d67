//! Defines the `ScenarioParameters` struct, which represents the contents of `scenario.toml`.
use crate::input::{input_err_msg, read_toml};
use crate::units::{
    Dimensionless, EmissionsPerEnergy, Energy, Money, MoneyPerEmissions, MoneyPerEnergy,
};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const SCENARIO_PARAMETERS_FILE_NAME: &str = "scenario.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_discount_rate, Dimensionless, 0.05);
define_unit_param_default!(default_tariff_tax_factor, Dimensionless, 1.25);
define_param_default!(default_start_day, u32, 1);
define_param_default!(default_allow_export, bool, true);

/// What the optimisation minimises
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum ObjectiveKind {
    /// Total cost over the horizon
    #[default]
    #[string = "cost"]
    Cost,
    /// Total energy imported from the grid
    #[string = "import"]
    Import,
}

/// Scalar parameters of the grid connection
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridParameters {
    /// Import limit per time step. Unlimited if omitted.
    pub capacity: Option<Energy>,
    /// Network charge per unit imported
    pub energy_tariff: MoneyPerEnergy,
    /// Fixed network charge per year
    pub fixed_tariff: Money,
    /// Charge per year for each unit of peak import
    pub power_tariff: MoneyPerEnergy,
    /// Peak import assumed for the power tariff. The peak is optimised if omitted.
    pub assumed_peak: Option<Energy>,
    /// Whether electricity may be exported
    pub allow_export: bool,
}

impl Default for GridParameters {
    fn default() -> Self {
        Self {
            capacity: None,
            energy_tariff: MoneyPerEnergy(0.0),
            fixed_tariff: Money(0.0),
            power_tariff: MoneyPerEnergy(0.0),
            assumed_peak: None,
            allow_export: default_allow_export(),
        }
    }
}

/// Scalar parameters of the district heating connection
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DistrictHeatingParameters {
    /// Maximum draw per time step
    pub capacity: Energy,
    /// Fixed charge per year
    pub fixed_tariff: Money,
    /// Emission intensity of delivered heat
    pub emissions: EmissionsPerEnergy,
}

/// Recurring periods during which a unit is shut down for maintenance
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MaintenanceSchedule {
    /// The unit being maintained
    pub unit: String,
    /// Time steps at which each maintenance period begins
    pub starts: Vec<u32>,
    /// Length of each maintenance period in time steps
    pub duration: u32,
}

/// Represents the contents of `scenario.toml`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioParameters {
    /// Name used in reports. Defaults to the name of the scenario directory.
    pub name: Option<String>,
    /// Number of days covered by the horizon
    pub days: u32,
    /// Day of the year (from 1) on which the horizon starts
    #[serde(default = "default_start_day")]
    pub start_day: u32,
    /// Discount rate used to annualise investments
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Dimensionless,
    /// What to minimise
    #[serde(default)]
    pub objective: ObjectiveKind,
    /// Whether the cost of emissions is included in the cost objective
    #[serde(default)]
    pub include_emission_cost: bool,
    /// Multiplier applied to grid and district heating tariffs
    #[serde(default = "default_tariff_tax_factor")]
    pub tariff_tax_factor: Dimensionless,
    /// Price of emissions
    #[serde(default)]
    pub carbon_price: MoneyPerEmissions,
    /// Credit received per unit of PV generation
    #[serde(default)]
    pub certificate_price: MoneyPerEnergy,
    /// Capacity of the electric boiler converting power to heat
    #[serde(default)]
    pub electric_boiler_capacity: Energy,
    /// The grid connection
    #[serde(default)]
    pub grid: GridParameters,
    /// The district heating connection
    #[serde(default)]
    pub district_heating: DistrictHeatingParameters,
    /// Planned maintenance of units
    #[serde(default)]
    pub maintenance: Vec<MaintenanceSchedule>,
}

/// Check a parameter is finite and non-negative
fn check_non_negative(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite, non-negative number"
    );

    Ok(())
}

impl ScenarioParameters {
    /// Read the scenario parameters from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `scenario_dir` - Folder containing scenario input files
    pub fn from_path<P: AsRef<Path>>(scenario_dir: P) -> Result<ScenarioParameters> {
        let file_path = scenario_dir.as_ref().join(SCENARIO_PARAMETERS_FILE_NAME);
        let params: ScenarioParameters = read_toml(&file_path)?;

        params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        ensure!(self.days > 0, "days must be greater than zero");
        check_non_negative("discount_rate", self.discount_rate.value())?;
        ensure!(
            self.tariff_tax_factor.is_finite() && self.tariff_tax_factor > Dimensionless(0.0),
            "tariff_tax_factor must be a finite number greater than zero"
        );
        check_non_negative("carbon_price", self.carbon_price.value())?;
        check_non_negative("certificate_price", self.certificate_price.value())?;
        check_non_negative(
            "electric_boiler_capacity",
            self.electric_boiler_capacity.value(),
        )?;

        for schedule in &self.maintenance {
            ensure!(
                schedule.duration > 0,
                "Maintenance of {}: duration must be greater than zero",
                schedule.unit
            );
            ensure!(
                schedule.starts.iter().all(|start| *start > 0),
                "Maintenance of {}: time steps are numbered from 1",
                schedule.unit
            );
        }

        // Grid and district heating parameters are checked with the time series
        Ok(())
    }
}
