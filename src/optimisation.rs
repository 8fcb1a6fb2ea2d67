//! Code for building and solving the sizing and dispatch optimisation.
//!
//! The problem is a mixed-integer linear program solved with HiGHS. Each call to
//! [`perform_optimisation`] builds a fresh problem from a [`Scenario`], so solves never share
//! state.
use crate::scenario::Scenario;
use crate::scenario::storage::StorageID;
use crate::scenario::unit::{Unit, UnitID, UnitKind};
use crate::time_step::{PeakBucket, TimeSeries};
use crate::units::Energy;
use anyhow::{Context, Result};
use highs::{HighsModelStatus, HighsStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::{LevelFilter, debug, info};
use std::error::Error;
use std::fmt;
use std::ops::RangeInclusive;

mod constraints;
use constraints::add_model_constraints;
pub mod disjunction;
use disjunction::add_disjunctions;
pub mod objective;
use objective::ObjectiveCoefficients;

/// A decision variable in the optimisation.
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    col: highs::Col,
    index: usize,
}

impl Variable {
    /// The HiGHS column, for use in constraint rows
    fn col(self) -> highs::Col {
        self.col
    }
}

/// Add a continuous variable to the problem
fn add_variable(problem: &mut Problem, cost: f64, bounds: RangeInclusive<f64>) -> Variable {
    let index = problem.num_cols();
    let col = problem.add_column(cost, bounds);
    Variable { col, index }
}

/// Add a binary variable to the problem, optionally fixed to a value
fn add_binary_variable(problem: &mut Problem, cost: f64, fixed: Option<bool>) -> Variable {
    let bounds = match fixed {
        Some(value) => {
            let value = f64::from(u8::from(value));
            value..=value
        }
        None => 0.0..=1.0,
    };

    let index = problem.num_cols();
    let col = problem.add_integer_column(cost, bounds);
    Variable { col, index }
}

/// Variables for a generator or heater
struct UnitVariables {
    output: TimeSeries<Variable>,
    running: TimeSeries<Variable>,
    built: Variable,
}

/// Variables for a storage asset
struct StorageVariables {
    charge: TimeSeries<Variable>,
    discharge: TimeSeries<Variable>,
    level: TimeSeries<Variable>,
    charging: TimeSeries<Variable>,
    capacity: Variable,
}

/// A map for easy lookup of variables in the problem.
///
/// We use this data structure for two things:
///
/// 1. In order define constraints for the optimisation
/// 2. To keep track of what each variable corresponds to, for when we are reading the results of
///    the optimisation.
pub struct VariableMap {
    generators: IndexMap<UnitID, UnitVariables>,
    heaters: IndexMap<UnitID, UnitVariables>,
    storage: IndexMap<StorageID, StorageVariables>,
    import: TimeSeries<Variable>,
    export: TimeSeries<Variable>,
    district_heat: TimeSeries<Variable>,
    boiler: TimeSeries<Variable>,
    dh_peaks: Vec<(PeakBucket, Variable)>,
    grid_peak: Option<Variable>,
}

impl VariableMap {
    /// Add every variable of the scenario to the problem
    fn new(problem: &mut Problem, scenario: &Scenario, objective: &ObjectiveCoefficients) -> Self {
        let generators = scenario
            .generators
            .values()
            .map(|unit| {
                let vars = add_unit_variables(problem, scenario, objective, unit);
                (unit.id.clone(), vars)
            })
            .collect();
        let heaters = scenario
            .heaters
            .values()
            .map(|unit| {
                let vars = add_unit_variables(problem, scenario, objective, unit);
                (unit.id.clone(), vars)
            })
            .collect();
        let storage = scenario
            .storage
            .keys()
            .map(|id| {
                let vars = add_storage_variables(problem, scenario, objective, id);
                (id.clone(), vars)
            })
            .collect();

        let horizon = &scenario.horizon;
        let grid = &scenario.grid;
        let import = horizon
            .iter()
            .map(|t| add_variable(problem, objective.import(t), 0.0..=grid.capacity[t].value()))
            .collect();
        let export_limit = if grid.allow_export { f64::INFINITY } else { 0.0 };
        let export = horizon
            .iter()
            .map(|t| add_variable(problem, objective.export(t), 0.0..=export_limit))
            .collect();
        let dh_capacity = scenario.district_heating.capacity.value();
        let district_heat = horizon
            .iter()
            .map(|t| add_variable(problem, objective.district_heat(t), 0.0..=dh_capacity))
            .collect();
        let boiler_capacity = scenario.parameters.electric_boiler_capacity.value();
        let boiler = horizon
            .iter()
            .map(|_| add_variable(problem, 0.0, 0.0..=boiler_capacity))
            .collect();

        let dh_peaks = horizon
            .peak_buckets()
            .into_iter()
            .map(|bucket| {
                let var = add_variable(problem, objective.dh_peak(&bucket), 0.0..=f64::INFINITY);
                (bucket, var)
            })
            .collect();
        let grid_peak = grid
            .has_modelled_peak()
            .then(|| add_variable(problem, objective.grid_peak(), 0.0..=f64::INFINITY));

        Self {
            generators,
            heaters,
            storage,
            import,
            export,
            district_heat,
            boiler,
            dh_peaks,
            grid_peak,
        }
    }

    /// Get the variables for a generator or heater
    fn unit(&self, unit: &Unit) -> &UnitVariables {
        let map = match unit.kind {
            UnitKind::Generator => &self.generators,
            UnitKind::Heater => &self.heaters,
        };

        map.get(&unit.id).expect("No variables found for unit")
    }

    /// Get the variables for a storage asset
    fn storage(&self, id: &StorageID) -> &StorageVariables {
        self.storage.get(id).expect("No variables found for storage")
    }
}

/// Add output, running and build variables for a unit.
///
/// Fixed outputs also fix the running indicator, so a unit fixed at zero is off and a unit fixed
/// at a positive output is on.
fn add_unit_variables(
    problem: &mut Problem,
    scenario: &Scenario,
    objective: &ObjectiveCoefficients,
    unit: &Unit,
) -> UnitVariables {
    let fixings = &scenario.fixings;
    let output_cost = objective.unit_output(unit);
    let mut output = Vec::new();
    let mut running = Vec::new();
    for t in scenario.horizon.iter() {
        let fixed = fixings.output(&unit.id, t);
        let bounds = fixed.map_or(0.0..=unit.max.value(), |value| value.value()..=value.value());
        output.push(add_variable(problem, output_cost, bounds));
        running.push(add_binary_variable(
            problem,
            0.0,
            fixed.map(|value| value > Energy(0.0)),
        ));
    }
    let built = add_binary_variable(
        problem,
        objective.unit_built(unit),
        fixings.built.get(&unit.id).copied(),
    );

    UnitVariables {
        output: TimeSeries::new(output),
        running: TimeSeries::new(running),
        built,
    }
}

/// Add flow, level, mode and capacity variables for a storage asset
fn add_storage_variables(
    problem: &mut Problem,
    scenario: &Scenario,
    objective: &ObjectiveCoefficients,
    id: &StorageID,
) -> StorageVariables {
    let asset = &scenario.storage[id];
    let max_rate = asset.max_rate.value();
    let mut charge = Vec::new();
    let mut discharge = Vec::new();
    let mut level = Vec::new();
    let mut charging = Vec::new();
    for t in scenario.horizon.iter() {
        charge.push(add_variable(problem, 0.0, 0.0..=max_rate));
        discharge.push(add_variable(problem, 0.0, 0.0..=max_rate));
        let level_bounds = scenario
            .fixings
            .storage_level(id, t)
            .map_or(0.0..=asset.capacity_max.value(), |value| {
                value.value()..=value.value()
            });
        level.push(add_variable(problem, 0.0, level_bounds));
        charging.push(add_binary_variable(problem, 0.0, None));
    }
    let capacity = add_variable(
        problem,
        objective.storage_capacity(asset),
        asset.capacity_min.value()..=asset.capacity_max.value(),
    );

    StorageVariables {
        charge: TimeSeries::new(charge),
        discharge: TimeSeries::new(discharge),
        level: TimeSeries::new(level),
        charging: TimeSeries::new(charging),
        capacity,
    }
}

/// Defines the possible errors that can occur when running the solver
#[derive(Debug, Clone)]
pub enum ModelError {
    /// The model definition is incoherent.
    ///
    /// Users should not be able to trigger this error.
    Incoherent(HighsStatus),
    /// An optimal solution could not be found
    NonOptimal(HighsModelStatus),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Incoherent(status) => write!(f, "Incoherent model: {status:?}"),
            ModelError::NonOptimal(status) => {
                write!(f, "Could not find optimal result: {status:?}")
            }
        }
    }
}

impl Error for ModelError {}

/// Try to solve the model, returning an error if the model is incoherent or result is non-optimal
pub fn solve_optimal(model: highs::Model) -> Result<highs::SolvedModel, ModelError> {
    let solved = model.try_solve().map_err(ModelError::Incoherent)?;

    match solved.status() {
        HighsModelStatus::Optimal => Ok(solved),
        status => Err(ModelError::NonOptimal(status)),
    }
}

/// Options passed to the solver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOptions {
    /// Maximum time to spend solving, in seconds
    pub time_limit: Option<f64>,
}

/// The values of all decision variables after an optimal solve.
///
/// This can only be obtained from [`perform_optimisation`], so holding one guarantees the solver
/// reported an optimal solution.
pub struct SolvedModel<'a> {
    scenario: &'a Scenario,
    variables: VariableMap,
    columns: Vec<f64>,
    objective_value: f64,
}

impl<'a> SolvedModel<'a> {
    /// The scenario that was solved
    pub fn scenario(&self) -> &'a Scenario {
        self.scenario
    }

    /// The objective value, including terms which do not depend on any variable.
    ///
    /// This is a cost for [`ObjectiveKind::Cost`](crate::scenario::parameters::ObjectiveKind) and
    /// an amount of energy for `ObjectiveKind::Import`.
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    fn value(&self, var: Variable) -> f64 {
        self.columns[var.index]
    }

    fn energy_series(&self, vars: &TimeSeries<Variable>) -> TimeSeries<Energy> {
        vars.map(|var| Energy(self.value(*var)))
    }

    /// Output of a unit in each time step
    pub fn unit_output(&self, unit: &Unit) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.unit(unit).output)
    }

    /// Whether a unit is running in each time step
    pub fn unit_running(&self, unit: &Unit) -> TimeSeries<bool> {
        self.variables
            .unit(unit)
            .running
            .map(|var| self.value(*var) > 0.5)
    }

    /// Whether a unit is built
    pub fn unit_built(&self, unit: &Unit) -> bool {
        self.value(self.variables.unit(unit).built) > 0.5
    }

    /// Energy imported from the grid in each time step
    pub fn import(&self) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.import)
    }

    /// Energy exported to the grid in each time step
    pub fn export(&self) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.export)
    }

    /// Heat drawn from the district heating network in each time step
    pub fn district_heat(&self) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.district_heat)
    }

    /// Electricity converted to heat by the electric boiler in each time step
    pub fn boiler(&self) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.boiler)
    }

    /// Energy charged into a storage asset in each time step
    pub fn storage_charge(&self, id: &StorageID) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.storage(id).charge)
    }

    /// Energy discharged from a storage asset in each time step
    pub fn storage_discharge(&self, id: &StorageID) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.storage(id).discharge)
    }

    /// Stored energy at each time step
    pub fn storage_level(&self, id: &StorageID) -> TimeSeries<Energy> {
        self.energy_series(&self.variables.storage(id).level)
    }

    /// Whether a storage asset is in charging mode in each time step
    pub fn storage_charging(&self, id: &StorageID) -> TimeSeries<bool> {
        self.variables
            .storage(id)
            .charging
            .map(|var| self.value(*var) > 0.5)
    }

    /// The chosen capacity of a storage asset
    pub fn storage_capacity(&self, id: &StorageID) -> Energy {
        Energy(self.value(self.variables.storage(id).capacity))
    }

    /// Peak district heating draw in each tariff bucket
    pub fn dh_peaks(&self) -> impl Iterator<Item = (&PeakBucket, Energy)> {
        self.variables
            .dh_peaks
            .iter()
            .map(|(bucket, var)| (bucket, Energy(self.value(*var))))
    }

    /// The modelled peak grid import, if the peak is not assumed
    pub fn grid_peak(&self) -> Option<Energy> {
        self.variables.grid_peak.map(|var| Energy(self.value(var)))
    }
}

/// Build the optimisation problem for a scenario.
///
/// # Returns
///
/// The problem, a map of its variables and the constant term of the objective.
fn build_problem(scenario: &Scenario) -> (Problem, VariableMap, f64) {
    let objective = ObjectiveCoefficients::new(scenario);
    let mut problem = Problem::default();
    let variables = VariableMap::new(&mut problem, scenario, &objective);
    add_model_constraints(&mut problem, &variables, scenario);
    add_disjunctions(&mut problem, &variables, scenario);

    (problem, variables, objective.constant())
}

/// Build and solve the optimisation problem for a scenario.
///
/// # Arguments
///
/// * `scenario` - The scenario to optimise
/// * `options` - Options passed to the solver
///
/// # Returns
///
/// The optimal solution, or an error if the scenario is invalid or the solver could not find an
/// optimal solution. In the latter case the error wraps a [`ModelError`].
pub fn perform_optimisation<'a>(
    scenario: &'a Scenario,
    options: &SolverOptions,
) -> Result<SolvedModel<'a>> {
    scenario
        .validate()
        .with_context(|| format!("Invalid scenario {}", scenario.name))?;

    let (problem, variables, constant) = build_problem(scenario);
    info!(
        "Built problem for scenario {}: {} variables, {} constraints",
        scenario.name,
        problem.num_cols(),
        problem.num_rows()
    );

    let mut model = problem.optimise(Sense::Minimise);
    model.set_option("output_flag", log::max_level() >= LevelFilter::Debug);
    if let Some(time_limit) = options.time_limit {
        model.set_option("time_limit", time_limit);
    }

    let solved = solve_optimal(model)
        .with_context(|| format!("Failed to solve scenario {}", scenario.name))?;
    let objective_value = solved.objective_value() + constant;
    debug!("Objective value for {}: {objective_value}", scenario.name);

    Ok(SolvedModel {
        scenario,
        variables,
        columns: solved.get_solution().columns().to_vec(),
        objective_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{battery, generator, scenario};
    use crate::scenario::parameters::ObjectiveKind;
    use crate::scenario::storage::{StorageAsset, StorageKind};
    use crate::time_step::TimeStep;
    use crate::units::{Dimensionless, Money, MoneyPerEnergy};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    const TOLERANCE: f64 = 1e-6;

    fn solve(scenario: &Scenario) -> SolvedModel<'_> {
        perform_optimisation(scenario, &SolverOptions::default()).unwrap()
    }

    fn generator_id() -> UnitID {
        UnitID::new("gen")
    }

    #[rstest]
    fn test_cheap_generator_covers_demand(scenario: Scenario) {
        let solved = solve(&scenario);
        let unit = &scenario.generators[&generator_id()];

        assert_approx_eq!(f64, solved.objective_value(), 2400.0, epsilon = TOLERANCE);
        assert_approx_eq!(
            Energy,
            solved.unit_output(unit).total(),
            Energy(2400.0),
            epsilon = TOLERANCE
        );
        assert_approx_eq!(Energy, solved.import().total(), Energy(0.0), epsilon = TOLERANCE);
    }

    #[rstest]
    fn test_small_generator_needs_import(mut scenario: Scenario) {
        scenario.generators[&generator_id()].max = Energy(50.0);
        let solved = solve(&scenario);
        let unit = &scenario.generators[&generator_id()];

        assert_approx_eq!(f64, solved.objective_value(), 3600.0, epsilon = TOLERANCE);
        for t in scenario.horizon.iter() {
            let output = solved.unit_output(unit)[t];
            assert_approx_eq!(Energy, output, Energy(50.0), epsilon = TOLERANCE);
            assert_approx_eq!(Energy, solved.import()[t], Energy(50.0), epsilon = TOLERANCE);
        }
    }

    #[rstest]
    fn test_output_is_zero_or_within_range(mut scenario: Scenario) {
        // Demand alternates between 30 and 120, below and above the minimum output of 60
        scenario.demand.electric = scenario
            .horizon
            .iter()
            .map(|t| Energy(if t.number() % 2 == 0 { 120.0 } else { 30.0 }))
            .collect();
        let id = generator_id();
        scenario.generators[&id].min = Energy(60.0);
        let solved = solve(&scenario);

        let unit = &scenario.generators[&id];
        let running = solved.unit_running(unit);
        for (t, output) in solved.unit_output(unit).iter() {
            assert!(
                output.value().abs() < TOLERANCE
                    || (output.value() >= 60.0 - TOLERANCE && output.value() <= 200.0 + TOLERANCE),
                "Output {output} at step {t} is neither zero nor within range"
            );
            if !running[t] {
                assert!(output.value().abs() < TOLERANCE);
            }
        }
    }

    #[rstest]
    fn test_grid_peak_tracks_import(mut scenario: Scenario) {
        scenario.generators[&generator_id()].max = Energy(50.0);
        scenario.grid.power_tariff = MoneyPerEnergy(876.0);
        let solved = solve(&scenario);

        // 3600 for energy plus 2.4 for each unit of peak import
        assert_approx_eq!(
            Energy,
            solved.grid_peak().unwrap(),
            Energy(50.0),
            epsilon = TOLERANCE
        );
        assert_approx_eq!(f64, solved.objective_value(), 3720.0, epsilon = 1e-5);
        assert_eq!(solved.dh_peaks().count(), 1);
    }

    #[rstest]
    fn test_assumed_peak_has_no_column(mut scenario: Scenario) {
        scenario.grid.power_tariff = MoneyPerEnergy(876.0);
        scenario.grid.assumed_peak = Some(Energy(10.0));
        let solved = solve(&scenario);
        assert!(solved.grid_peak().is_none());
    }

    #[rstest]
    fn test_power_balance_holds(mut scenario: Scenario, battery: StorageAsset) {
        scenario.storage.insert(battery.id.clone(), battery);
        let solved = solve(&scenario);
        let battery = &scenario.storage[0];
        let unit = &scenario.generators[&generator_id()];

        let output = solved.unit_output(unit);
        let import = solved.import();
        let export = solved.export();
        let charge = solved.storage_charge(&battery.id);
        let discharge = solved.storage_discharge(&battery.id);
        let boiler = solved.boiler();
        for t in scenario.horizon.iter() {
            let supply = output[t]
                + import[t]
                + scenario.renewables.pv[t]
                + discharge[t] * battery.discharge_efficiency;
            let use_ = scenario.demand.electric[t] + export[t] + charge[t] + boiler[t];
            assert_approx_eq!(Energy, supply, use_, epsilon = 1e-5);
        }
    }

    #[rstest]
    fn test_heat_balance_holds(mut scenario: Scenario, generator: Unit, battery: StorageAsset) {
        let chp = Unit {
            id: "chp".into(),
            max: Energy(40.0),
            fuel_cost: MoneyPerEnergy(0.5),
            chp_factor: Dimensionless(1.5),
            ..generator.clone()
        };
        let heater = Unit {
            id: "gas_boiler".into(),
            kind: UnitKind::Heater,
            min: Energy(20.0),
            max: Energy(60.0),
            fuel_cost: MoneyPerEnergy(3.0),
            ..generator
        };
        let tank = StorageAsset {
            id: "tank".into(),
            kind: StorageKind::Heat,
            ..battery
        };
        scenario.generators.insert(chp.id.clone(), chp);
        scenario.heaters.insert(heater.id.clone(), heater);
        scenario.storage.insert(tank.id.clone(), tank);
        scenario.parameters.electric_boiler_capacity = Energy(15.0);
        scenario.district_heating.capacity = Energy(30.0);
        scenario.district_heating.energy_tariff = scenario
            .horizon
            .iter()
            .map(|t| MoneyPerEnergy(if t.number() % 3 == 0 { 1.0 } else { 6.0 }))
            .collect();
        scenario.demand.heat = scenario
            .horizon
            .iter()
            .map(|t| Energy(40.0 + 30.0 * f64::from(t.number() % 4)))
            .collect();
        scenario.renewables.st = scenario
            .horizon
            .iter()
            .map(|t| Energy(if (10..=15).contains(&t.number()) { 10.0 } else { 0.0 }))
            .collect();
        let solved = solve(&scenario);

        let tank = &scenario.storage[0];
        let charge = solved.storage_charge(&tank.id);
        let discharge = solved.storage_discharge(&tank.id);
        let district_heat = solved.district_heat();
        let boiler = solved.boiler();
        for t in scenario.horizon.iter() {
            let mut supply = district_heat[t]
                + scenario.renewables.st[t]
                + discharge[t] * tank.discharge_efficiency
                + boiler[t];
            for unit in scenario.generators.values() {
                supply += solved.unit_output(unit)[t] * unit.chp_factor;
            }
            for unit in scenario.heaters.values() {
                supply += solved.unit_output(unit)[t];
            }
            let use_ = scenario.demand.heat[t] + charge[t];
            assert_approx_eq!(Energy, supply, use_, epsilon = 1e-5);
        }

        let heater = &scenario.heaters[0];
        let running = solved.unit_running(heater);
        for (t, output) in solved.unit_output(heater).iter() {
            assert!(
                output.value().abs() < TOLERANCE
                    || (output.value() >= 20.0 - TOLERANCE && output.value() <= 60.0 + TOLERANCE),
                "Heater output {output} at step {t} is neither zero nor within range"
            );
            if !running[t] {
                assert!(output.value().abs() < TOLERANCE);
            }
        }
        assert!(district_heat.total() > Energy(0.0));
        assert!(solved.unit_output(&scenario.generators[1]).total() > Energy(0.0));
    }

    #[rstest]
    fn test_no_charge_beyond_capacity_in_last_step(
        mut scenario: Scenario,
        battery: StorageAsset,
    ) {
        // Being paid to import in the last step makes charging attractive even if nothing is kept
        let last = scenario.horizon.last();
        scenario.grid.spot_price[last] = MoneyPerEnergy(-10.0);
        scenario
            .fixings
            .storage_levels
            .insert(battery.id.clone(), [(last, Energy(100.0))].into_iter().collect());
        scenario.storage.insert(battery.id.clone(), battery);
        let solved = solve(&scenario);

        let asset = &scenario.storage[0];
        let charge = solved.storage_charge(&asset.id);
        let level = solved.storage_level(&asset.id);
        assert_approx_eq!(Energy, level[last], Energy(100.0), epsilon = 1e-5);
        assert_approx_eq!(Energy, charge[last], Energy(0.0), epsilon = 1e-5);
    }

    #[rstest]
    fn test_import_objective(mut scenario: Scenario) {
        scenario.parameters.objective = ObjectiveKind::Import;
        let solved = solve(&scenario);
        assert_approx_eq!(f64, solved.objective_value(), 0.0, epsilon = TOLERANCE);
        assert_approx_eq!(Energy, solved.import().total(), Energy(0.0), epsilon = TOLERANCE);
    }

    #[rstest]
    fn test_infeasible_scenario(mut scenario: Scenario) {
        scenario.grid.capacity = TimeSeries::constant(Energy(0.0), 24);
        scenario.generators[&generator_id()].max = Energy(50.0);

        let err = perform_optimisation(&scenario, &SolverOptions::default())
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::NonOptimal(HighsModelStatus::Infeasible))
        ));
    }

    #[rstest]
    fn test_fixed_build_decision(mut scenario: Scenario) {
        scenario.fixings.built.insert(generator_id(), false);
        let solved = solve(&scenario);
        let unit = &scenario.generators[&generator_id()];

        assert!(!solved.unit_built(unit));
        let output = solved.unit_output(unit).total();
        assert_approx_eq!(Energy, output, Energy(0.0), epsilon = TOLERANCE);
        assert_approx_eq!(f64, solved.objective_value(), 4800.0, epsilon = TOLERANCE);
    }

    #[rstest]
    fn test_fixed_output(mut scenario: Scenario) {
        let id = generator_id();
        scenario
            .fixings
            .fix_output(&id, [TimeStep::new(1), TimeStep::new(2)], Energy(0.0));
        let solved = solve(&scenario);
        let output = solved.unit_output(&scenario.generators[&id]);

        assert_approx_eq!(Energy, output[TimeStep::new(1)], Energy(0.0), epsilon = TOLERANCE);
        assert_approx_eq!(Energy, output[TimeStep::new(2)], Energy(0.0), epsilon = TOLERANCE);
        assert_approx_eq!(Energy, output[TimeStep::new(3)], Energy(100.0), epsilon = TOLERANCE);
    }

    #[rstest]
    fn test_storage_level_recurrence(mut scenario: Scenario, battery: StorageAsset) {
        // Cheap power in the first half of the day makes storing energy worthwhile
        scenario.fixings.built.insert(generator_id(), false);
        for t in scenario.horizon.iter() {
            scenario.grid.spot_price[t] = if t.number() <= 12 {
                MoneyPerEnergy(0.0)
            } else {
                MoneyPerEnergy(5.0)
            };
        }
        scenario.storage.insert(battery.id.clone(), battery);
        let solved = solve(&scenario);
        let asset = &scenario.storage[0];

        let level = solved.storage_level(&asset.id);
        let charge = solved.storage_charge(&asset.id);
        let discharge = solved.storage_discharge(&asset.id);
        let charging = solved.storage_charging(&asset.id);
        let capacity = solved.storage_capacity(&asset.id);
        let min_level = capacity * asset.min_level_fraction;

        assert_approx_eq!(Energy, level[TimeStep::new(1)], min_level, epsilon = 1e-5);
        for t in scenario.horizon.iter() {
            assert!(level[t].value() <= capacity.value() + 1e-5);
            assert!(level[t].value() >= min_level.value() - 1e-5);
            assert!(charge[t].value().min(discharge[t].value()) < 1e-5);
            if charge[t].value() > 1e-5 {
                assert!(charging[t]);
            }
            if let Some(prev) = t.previous() {
                let expected =
                    level[prev] + (charge[prev] - discharge[prev]) * asset.charge_efficiency;
                assert_approx_eq!(Energy, level[t], expected, epsilon = 1e-5);
            }
        }
        assert!(discharge.total() > Energy(0.0));
    }

    #[rstest]
    fn test_investment_charged_when_built(mut scenario: Scenario) {
        let id = generator_id();
        {
            let unit = &mut scenario.generators[&id];
            unit.investment = Money(8760.0);
            unit.lifetime = 1;
        }
        scenario.parameters.discount_rate = Dimensionless(0.0);
        let solved = solve(&scenario);

        // Annualised investment for one day is 24; still cheaper than importing
        assert!(solved.unit_built(&scenario.generators[&id]));
        assert_approx_eq!(f64, solved.objective_value(), 2424.0, epsilon = TOLERANCE);
    }
}
