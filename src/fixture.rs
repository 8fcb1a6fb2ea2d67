//! Fixtures for tests
use crate::scenario::grid::{DistrictHeatingConnection, GridConnection};
use crate::scenario::parameters::{
    DistrictHeatingParameters, GridParameters, ObjectiveKind, ScenarioParameters,
};
use crate::scenario::storage::{StorageAsset, StorageKind};
use crate::scenario::unit::{Unit, UnitKind};
use crate::scenario::{Demand, Fixings, Renewables, Scenario, SolarInstallation};
use crate::time_step::{HOURS_PER_YEAR, Horizon, TimeSeries};
use crate::units::{
    Dimensionless, EmissionsPerEnergy, Energy, Money, MoneyPerEmissions, MoneyPerEnergy,
};
use indexmap::IndexMap;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Number of time steps in the one-day test horizon
const NUM_STEPS: u32 = 24;

#[fixture]
pub fn horizon() -> Horizon {
    Horizon::new(1, 1).unwrap()
}

/// A cheap generator large enough to cover the test demand on its own
#[fixture]
pub fn generator() -> Unit {
    Unit {
        id: "gen".into(),
        kind: UnitKind::Generator,
        min: Energy(0.0),
        max: Energy(200.0),
        investment: Money(0.0),
        fuel_cost: MoneyPerEnergy(1.0),
        efficiency: Dimensionless(1.0),
        lifetime: 20,
        emissions: EmissionsPerEnergy(0.0),
        maintenance: Money(0.0),
        max_hours: HOURS_PER_YEAR,
        chp_factor: Dimensionless(0.0),
    }
}

/// A battery with a fixed capacity of 100
#[fixture]
pub fn battery() -> StorageAsset {
    StorageAsset {
        id: "battery".into(),
        kind: StorageKind::Electric,
        capacity: Energy(100.0),
        charge_efficiency: Dimensionless(0.9),
        discharge_efficiency: Dimensionless(0.9),
        max_rate: Energy(50.0),
        initial_level: Energy(20.0),
        min_level_fraction: Dimensionless(0.2),
        lifetime: 10,
        investment: MoneyPerEnergy(0.0),
        capacity_min: Energy(100.0),
        capacity_max: Energy(100.0),
    }
}

/// A grid connection with unlimited capacity, an import price of 2 and an export price of 0
#[fixture]
pub fn grid() -> GridConnection {
    GridConnection {
        spot_price: TimeSeries::constant(MoneyPerEnergy(0.0), NUM_STEPS),
        emissions: TimeSeries::constant(EmissionsPerEnergy(0.0), NUM_STEPS),
        capacity: TimeSeries::constant(Energy(f64::INFINITY), NUM_STEPS),
        energy_tariff: MoneyPerEnergy(2.0),
        fixed_tariff: Money(0.0),
        power_tariff: MoneyPerEnergy(0.0),
        assumed_peak: None,
        allow_export: true,
    }
}

/// A district heating connection which cannot supply any heat
#[fixture]
pub fn district_heating() -> DistrictHeatingConnection {
    DistrictHeatingConnection {
        energy_tariff: TimeSeries::constant(MoneyPerEnergy(0.0), NUM_STEPS),
        power_tariff: TimeSeries::constant(MoneyPerEnergy(0.0), NUM_STEPS),
        fixed_tariff: Money(0.0),
        emissions: EmissionsPerEnergy(0.0),
        capacity: Energy(0.0),
    }
}

#[fixture]
pub fn parameters() -> ScenarioParameters {
    ScenarioParameters {
        name: None,
        days: 1,
        start_day: 1,
        discount_rate: Dimensionless(0.05),
        objective: ObjectiveKind::Cost,
        include_emission_cost: false,
        tariff_tax_factor: Dimensionless(1.0),
        carbon_price: MoneyPerEmissions(0.0),
        certificate_price: MoneyPerEnergy(0.0),
        electric_boiler_capacity: Energy(0.0),
        grid: GridParameters::default(),
        district_heating: DistrictHeatingParameters::default(),
        maintenance: Vec::new(),
    }
}

/// A one-day scenario with a constant electricity demand of 100 and no heat demand
#[fixture]
pub fn scenario(
    parameters: ScenarioParameters,
    horizon: Horizon,
    generator: Unit,
    grid: GridConnection,
    district_heating: DistrictHeatingConnection,
) -> Scenario {
    Scenario {
        name: "test".into(),
        parameters,
        horizon,
        generators: [(generator.id.clone(), generator)].into_iter().collect(),
        heaters: IndexMap::new(),
        storage: IndexMap::new(),
        demand: Demand {
            electric: TimeSeries::constant(Energy(100.0), NUM_STEPS),
            heat: TimeSeries::constant(Energy(0.0), NUM_STEPS),
            outdoor_temperature: TimeSeries::constant(5.0, NUM_STEPS),
        },
        renewables: Renewables {
            pv: TimeSeries::constant(Energy(0.0), NUM_STEPS),
            st: TimeSeries::constant(Energy(0.0), NUM_STEPS),
            pv_installation: SolarInstallation::default(),
            st_installation: SolarInstallation::default(),
        },
        grid,
        district_heating,
        fixings: Fixings::default(),
    }
}
