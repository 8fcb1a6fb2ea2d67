//! Post-solve analysis of an optimal solution.
//!
//! Costs are evaluated with the same [`CostRates`] used to build the objective, so
//! [`CostBreakdown::total`] equals the objective value of a cost-minimising solve.
use crate::finance::lcoe;
use crate::optimisation::SolvedModel;
use crate::optimisation::objective::{CostRates, FixedCosts};
use crate::scenario::parameters::ObjectiveKind;
use crate::scenario::storage::{StorageID, StorageKind};
use crate::scenario::unit::{Unit, UnitID, UnitKind};
use crate::time_step::{TimeSeries, TimeStep};
use crate::units::{Dimensionless, Emissions, Energy, Money, MoneyPerEnergy};

/// Flows smaller than this are treated as zero when counting operating hours
const ACTIVITY_THRESHOLD: f64 = 1e-6;

/// Count the time steps in which a flow is non-zero
pub fn operating_hours(series: &TimeSeries<Energy>) -> u32 {
    series
        .values()
        .iter()
        .filter(|value| value.value() > ACTIVITY_THRESHOLD)
        .count() as u32
}

/// The largest value of a series over some time steps
fn peak<I: Iterator<Item = TimeStep>>(series: &TimeSeries<Energy>, steps: I) -> Energy {
    steps.map(|t| series[t]).fold(Energy(0.0), Energy::max)
}

/// Whether a unit's investment and maintenance are charged.
///
/// The import objective puts no cost on building, so the solver may leave an idle unit built. Under
/// that objective a unit only counts as built if it ran or its build decision was fixed.
fn counts_as_built(solution: &SolvedModel, unit: &Unit, hours: u32) -> bool {
    let scenario = solution.scenario();
    if !solution.unit_built(unit) {
        return false;
    }

    match scenario.parameters.objective {
        ObjectiveKind::Cost => true,
        ObjectiveKind::Import => {
            hours > 0 || scenario.fixings.built.get(&unit.id).copied() == Some(true)
        }
    }
}

/// Results for one generator or heater
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    /// The unit's ID
    pub id: UnitID,
    /// Whether the unit is a generator or a heater
    pub kind: UnitKind,
    /// Whether the unit was built
    pub built: bool,
    /// Electricity produced
    pub power: Energy,
    /// Heat produced, including CHP heat
    pub heat: Energy,
    /// Number of time steps with non-zero output
    pub hours: u32,
    /// Fuel cost
    pub fuel: Money,
    /// Investment charged to the horizon
    pub investment: Money,
    /// Maintenance charged to the horizon
    pub maintenance: Money,
    /// Emissions caused by the unit's output
    pub emissions: Emissions,
    /// Levelised cost of the unit's output
    pub lcoe: MoneyPerEnergy,
}

impl UnitReport {
    fn new(solution: &SolvedModel, rates: &CostRates, unit: &Unit) -> Self {
        let output = solution.unit_output(unit).total();
        let (power, heat) = match unit.kind {
            UnitKind::Generator => (output, output * unit.chp_factor),
            UnitKind::Heater => (Energy(0.0), output),
        };
        let hours = operating_hours(&solution.unit_output(unit));
        let built = counts_as_built(solution, unit, hours);
        let (investment, maintenance) = if built {
            (rates.unit_investment(unit), rates.unit_maintenance(unit))
        } else {
            (Money(0.0), Money(0.0))
        };
        let fuel = rates.fuel(unit) * output;

        Self {
            id: unit.id.clone(),
            kind: unit.kind,
            built,
            power,
            heat,
            hours,
            fuel,
            investment,
            maintenance,
            emissions: unit.emissions * output,
            lcoe: lcoe(power, heat, investment, maintenance, fuel),
        }
    }
}

/// Results for one storage asset
#[derive(Debug, Clone, PartialEq)]
pub struct StorageReport {
    /// The asset's ID
    pub id: StorageID,
    /// Whether the asset stores electricity or heat
    pub kind: StorageKind,
    /// The chosen capacity
    pub capacity: Energy,
    /// Investment charged to the horizon
    pub investment: Money,
    /// Total energy charged
    pub charged: Energy,
    /// Total energy discharged
    pub discharged: Energy,
}

/// Total flows of each carrier over the horizon
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarrierTotals {
    /// Electricity demand
    pub electric_demand: Energy,
    /// Heat demand
    pub heat_demand: Energy,
    /// Electricity from generators
    pub generation: Energy,
    /// Heat from CHP generators
    pub chp_heat: Energy,
    /// Heat from heaters
    pub heater_output: Energy,
    /// PV output
    pub pv: Energy,
    /// Solar thermal output
    pub st: Energy,
    /// Grid import
    pub import: Energy,
    /// Grid export
    pub export: Energy,
    /// District heat
    pub district_heat: Energy,
    /// Electric boiler conversion
    pub boiler: Energy,
    /// Energy charged into storage
    pub storage_charge: Energy,
    /// Energy discharged from storage
    pub storage_discharge: Energy,
}

/// The cost of a solution, split by source.
///
/// Under the import objective, storage capacity carries no cost in the problem, so the storage
/// part of `investment` reflects whichever of the equally good capacities the solver picked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CostBreakdown {
    /// Fuel for generators and heaters
    pub fuel: Money,
    /// Energy imported from the grid, including tariff and tax
    pub import: Money,
    /// Revenue from exports
    pub export_revenue: Money,
    /// District heat energy
    pub dh_energy: Money,
    /// Grid power and fixed tariffs
    pub grid_tariffs: Money,
    /// District heating power and fixed tariffs
    pub dh_tariffs: Money,
    /// Investment in units, storage and solar installations
    pub investment: Money,
    /// Maintenance of units and solar installations
    pub maintenance: Money,
    /// Credit earned for PV generation
    pub certificate_credit: Money,
    /// Cost of all emissions at the carbon price
    pub emission_cost: Money,
    /// Whether the emission cost is part of the total
    pub include_emission_cost: bool,
}

impl CostBreakdown {
    /// The net cost, as minimised by the cost objective
    pub fn total(&self) -> Money {
        let mut total = self.fuel + self.import - self.export_revenue
            + self.dh_energy
            + self.grid_tariffs
            + self.dh_tariffs
            + self.investment
            + self.maintenance
            - self.certificate_credit;
        if self.include_emission_cost {
            total += self.emission_cost;
        }

        total
    }

    /// What is paid for grid electricity
    pub fn electricity_bill(&self) -> Money {
        self.import + self.grid_tariffs - self.export_revenue
    }

    /// What is paid for district heat
    pub fn dh_bill(&self) -> Money {
        self.dh_energy + self.dh_tariffs
    }
}

/// Levelised costs of the non-dispatchable sources
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceLcoe {
    /// PV
    pub pv: MoneyPerEnergy,
    /// Solar thermal
    pub st: MoneyPerEnergy,
    /// Electricity grid
    pub grid: MoneyPerEnergy,
    /// District heating
    pub district_heating: MoneyPerEnergy,
}

/// Key indicators of a solution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Kpis {
    /// Share of demand met without the grid or district heating
    pub self_generation: Dimensionless,
    /// Mean outdoor temperature
    pub mean_outdoor_temperature: f64,
    /// Mean spot price
    pub mean_spot_price: MoneyPerEnergy,
    /// Ratio of heat demand to electricity demand
    pub heat_to_electric_ratio: Dimensionless,
    /// Net cost of grid electricity
    pub electricity_bill: Money,
    /// Cost of district heat
    pub dh_bill: Money,
}

/// Everything reported about a solution
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Per-unit results, generators first
    pub units: Vec<UnitReport>,
    /// Per-storage results
    pub storage: Vec<StorageReport>,
    /// Carrier totals
    pub totals: CarrierTotals,
    /// Cost breakdown
    pub costs: CostBreakdown,
    /// Total emissions
    pub emissions: Emissions,
    /// Levelised costs of PV, ST, grid and district heating
    pub lcoe: SourceLcoe,
    /// Key indicators
    pub kpis: Kpis,
}

/// Compute the self-generation fraction.
///
/// This is the share of total demand that is not met by imports or district heat. Returns zero if
/// there is no demand.
pub fn self_generation(totals: &CarrierTotals) -> Dimensionless {
    let demand = totals.electric_demand + totals.heat_demand;
    if demand == Energy(0.0) {
        return Dimensionless(0.0);
    }

    ((totals.electric_demand - totals.import) + (totals.heat_demand - totals.district_heat))
        / demand
}

fn carrier_totals(solution: &SolvedModel, units: &[UnitReport]) -> CarrierTotals {
    let scenario = solution.scenario();
    let mut totals = CarrierTotals {
        electric_demand: scenario.demand.electric.total(),
        heat_demand: scenario.demand.heat.total(),
        pv: scenario.renewables.pv.total(),
        st: scenario.renewables.st.total(),
        import: solution.import().total(),
        export: solution.export().total(),
        district_heat: solution.district_heat().total(),
        boiler: solution.boiler().total(),
        ..Default::default()
    };
    for report in units {
        match report.kind {
            UnitKind::Generator => {
                totals.generation += report.power;
                totals.chp_heat += report.heat;
            }
            UnitKind::Heater => totals.heater_output += report.heat,
        }
    }
    for id in scenario.storage.keys() {
        totals.storage_charge += solution.storage_charge(id).total();
        totals.storage_discharge += solution.storage_discharge(id).total();
    }

    totals
}

fn cost_breakdown(
    solution: &SolvedModel,
    rates: &CostRates,
    fixed: &FixedCosts,
    units: &[UnitReport],
    storage: &[StorageReport],
    emissions: Emissions,
) -> CostBreakdown {
    let scenario = solution.scenario();
    let import = solution.import();
    let export = solution.export();
    let district_heat = solution.district_heat();

    let mut costs = CostBreakdown {
        import: scenario
            .horizon
            .iter()
            .map(|t| rates.import(t) * import[t])
            .sum(),
        export_revenue: scenario
            .horizon
            .iter()
            .map(|t| rates.export(t) * export[t])
            .sum(),
        dh_energy: scenario
            .horizon
            .iter()
            .map(|t| rates.district_heat(t) * district_heat[t])
            .sum(),
        certificate_credit: fixed.certificate_credit,
        emission_cost: scenario.parameters.carbon_price * emissions,
        include_emission_cost: scenario.parameters.include_emission_cost,
        ..Default::default()
    };

    // Peaks are read from the flows, as peak columns carry no cost under the import objective
    costs.grid_tariffs = fixed.grid_tariff;
    if scenario.grid.has_modelled_peak() {
        costs.grid_tariffs += rates.grid_peak() * peak(&import, scenario.horizon.iter());
    }
    costs.dh_tariffs = fixed.dh_tariff;
    for bucket in scenario.horizon.peak_buckets() {
        costs.dh_tariffs += rates.dh_peak(&bucket) * peak(&district_heat, bucket.iter());
    }

    costs.investment = fixed.pv_investment + fixed.st_investment;
    costs.maintenance = fixed.pv_maintenance + fixed.st_maintenance;
    for report in units {
        costs.fuel += report.fuel;
        costs.investment += report.investment;
        costs.maintenance += report.maintenance;
    }
    for report in storage {
        costs.investment += report.investment;
    }

    costs
}

fn total_emissions(solution: &SolvedModel, units: &[UnitReport]) -> Emissions {
    let scenario = solution.scenario();
    let import = solution.import();
    let grid: Emissions = scenario
        .horizon
        .iter()
        .map(|t| scenario.grid.emissions[t] * import[t])
        .sum();
    let district_heating = scenario.district_heating.emissions * solution.district_heat().total();

    units.iter().map(|report| report.emissions).sum::<Emissions>() + grid + district_heating
}

fn mean<T: Copy + std::iter::Sum + std::ops::Div<Dimensionless, Output = T>>(
    series: &TimeSeries<T>,
) -> T {
    series.total() / Dimensionless(series.len() as f64)
}

/// Analyse an optimal solution
pub fn analyse(solution: &SolvedModel) -> Analysis {
    let scenario = solution.scenario();
    let rates = CostRates::new(scenario);
    let fixed = rates.fixed_costs();

    let units: Vec<_> = scenario
        .iter_units()
        .map(|unit| UnitReport::new(solution, &rates, unit))
        .collect();
    let storage: Vec<_> = scenario
        .storage
        .values()
        .map(|asset| {
            let capacity = solution.storage_capacity(&asset.id);
            StorageReport {
                id: asset.id.clone(),
                kind: asset.kind,
                capacity,
                investment: rates.storage_investment(asset) * capacity,
                charged: solution.storage_charge(&asset.id).total(),
                discharged: solution.storage_discharge(&asset.id).total(),
            }
        })
        .collect();

    let totals = carrier_totals(solution, &units);
    let emissions = total_emissions(solution, &units);
    let costs = cost_breakdown(solution, &rates, &fixed, &units, &storage, emissions);

    let lcoe = SourceLcoe {
        pv: lcoe(
            totals.pv,
            Energy(0.0),
            fixed.pv_investment,
            fixed.pv_maintenance,
            Money(0.0),
        ),
        st: lcoe(
            Energy(0.0),
            totals.st,
            fixed.st_investment,
            fixed.st_maintenance,
            Money(0.0),
        ),
        grid: lcoe(
            totals.import,
            Energy(0.0),
            Money(0.0),
            Money(0.0),
            costs.import + costs.grid_tariffs,
        ),
        district_heating: lcoe(
            Energy(0.0),
            totals.district_heat,
            Money(0.0),
            Money(0.0),
            costs.dh_bill(),
        ),
    };

    let heat_to_electric_ratio = if totals.electric_demand == Energy(0.0) {
        Dimensionless(0.0)
    } else {
        totals.heat_demand / totals.electric_demand
    };
    let kpis = Kpis {
        self_generation: self_generation(&totals),
        mean_outdoor_temperature: scenario.demand.outdoor_temperature.total()
            / scenario.demand.outdoor_temperature.len() as f64,
        mean_spot_price: mean(&scenario.grid.spot_price),
        heat_to_electric_ratio,
        electricity_bill: costs.electricity_bill(),
        dh_bill: costs.dh_bill(),
    };

    Analysis {
        units,
        storage,
        totals,
        costs,
        emissions,
        lcoe,
        kpis,
    }
}
