//! Code for adding the balance, operating-hour, storage and peak constraints to the problem.
use super::{StorageVariables, UnitVariables, VariableMap};
use crate::scenario::Scenario;
use crate::scenario::storage::{StorageAsset, StorageKind};
use crate::scenario::unit::Unit;
use crate::time_step::TimeStep;
use highs::RowProblem as Problem;

/// Add every non-disjunctive constraint of the model.
///
/// Column bounds already cover grid capacity, district heating capacity and fixings, so they do
/// not appear here.
pub fn add_model_constraints(problem: &mut Problem, variables: &VariableMap, scenario: &Scenario) {
    add_power_balance_constraints(problem, variables, scenario);
    add_heat_balance_constraints(problem, variables, scenario);
    add_operating_hours_constraints(problem, variables, scenario);
    for asset in scenario.storage.values() {
        add_storage_constraints(problem, variables.storage(&asset.id), asset, scenario);
    }
    add_peak_constraints(problem, variables, scenario);
}

/// Iterate over the storage assets of one kind along with their variables
fn storage_of_kind<'a>(
    variables: &'a VariableMap,
    scenario: &'a Scenario,
    kind: StorageKind,
) -> impl Iterator<Item = (&'a StorageAsset, &'a StorageVariables)> {
    scenario
        .storage
        .values()
        .filter(move |asset| asset.kind == kind)
        .map(move |asset| (asset, variables.storage(&asset.id)))
}

/// Add one power balance equality per time step.
///
/// The must-take PV output moves to the right-hand side:
///
/// ```text
/// Σ gen + import + Σ eff·discharge − export − Σ charge − boiler = demand − pv
/// ```
fn add_power_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    scenario: &Scenario,
) {
    for t in scenario.horizon.iter() {
        let mut terms = Vec::new();
        for unit in scenario.generators.values() {
            terms.push((variables.unit(unit).output[t].col(), 1.0));
        }
        terms.push((variables.import[t].col(), 1.0));
        terms.push((variables.export[t].col(), -1.0));
        terms.push((variables.boiler[t].col(), -1.0));
        for (asset, vars) in storage_of_kind(variables, scenario, StorageKind::Electric) {
            terms.push((vars.discharge[t].col(), asset.discharge_efficiency.value()));
            terms.push((vars.charge[t].col(), -1.0));
        }

        let rhs = (scenario.demand.electric[t] - scenario.renewables.pv[t]).value();
        problem.add_row(rhs..=rhs, terms);
    }
}

/// Add one heat balance equality per time step.
///
/// CHP generators contribute `chp_factor` units of heat per unit of electricity and the electric
/// boiler converts electricity to heat one for one.
fn add_heat_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    scenario: &Scenario,
) {
    for t in scenario.horizon.iter() {
        let mut terms = Vec::new();
        for unit in scenario.generators.values().filter(|unit| unit.is_chp()) {
            terms.push((variables.unit(unit).output[t].col(), unit.chp_factor.value()));
        }
        for unit in scenario.heaters.values() {
            terms.push((variables.unit(unit).output[t].col(), 1.0));
        }
        terms.push((variables.district_heat[t].col(), 1.0));
        terms.push((variables.boiler[t].col(), 1.0));
        for (asset, vars) in storage_of_kind(variables, scenario, StorageKind::Heat) {
            terms.push((vars.discharge[t].col(), asset.discharge_efficiency.value()));
            terms.push((vars.charge[t].col(), -1.0));
        }

        let rhs = (scenario.demand.heat[t] - scenario.renewables.st[t]).value();
        problem.add_row(rhs..=rhs, terms);
    }
}

/// Limit the number of time steps in which each unit runs
fn add_operating_hours_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    scenario: &Scenario,
) {
    let num_steps = scenario.horizon.num_steps();
    for unit in scenario.iter_units() {
        // Redundant when the unit could run for the whole horizon
        if unit.max_hours >= num_steps {
            continue;
        }

        add_operating_hours_constraint(problem, variables.unit(unit), unit);
    }
}

fn add_operating_hours_constraint(problem: &mut Problem, vars: &UnitVariables, unit: &Unit) {
    let terms = vars.running.values().iter().map(|var| (var.col(), 1.0));
    problem.add_row(..=f64::from(unit.max_hours), terms);
}

/// Add the state-of-charge constraints of a storage asset.
///
/// The level at the first time step is the minimum level. Afterwards it follows
/// `level[t] = level[t-1] + charge_efficiency × (charge[t-1] − discharge[t-1])`. Flows in the
/// final time step cannot take the level outside its bounds.
fn add_storage_constraints(
    problem: &mut Problem,
    vars: &StorageVariables,
    asset: &StorageAsset,
    scenario: &Scenario,
) {
    let min_fraction = asset.min_level_fraction.value();
    let eta = asset.charge_efficiency.value();
    let capacity = vars.capacity.col();

    let first = scenario.horizon.first();
    problem.add_row(
        0.0..=0.0,
        [(vars.level[first].col(), 1.0), (capacity, -min_fraction)],
    );

    for t in scenario.horizon.iter() {
        if let Some(prev) = t.previous() {
            add_level_recurrence(problem, vars, t, prev, eta);
        }

        // min_fraction × capacity ≤ level ≤ capacity
        let level = vars.level[t].col();
        problem.add_row(..=0.0, [(level, 1.0), (capacity, -1.0)]);
        problem.add_row(0.0.., [(level, 1.0), (capacity, -min_fraction)]);
    }

    let last = scenario.horizon.last();
    problem.add_row(
        ..=0.0,
        [
            (vars.discharge[last].col(), 1.0),
            (vars.level[last].col(), -1.0),
            (capacity, min_fraction),
        ],
    );
    problem.add_row(
        ..=0.0,
        [
            (vars.charge[last].col(), eta),
            (vars.level[last].col(), 1.0),
            (capacity, -1.0),
        ],
    );
}

fn add_level_recurrence(
    problem: &mut Problem,
    vars: &StorageVariables,
    t: TimeStep,
    prev: TimeStep,
    eta: f64,
) {
    problem.add_row(
        0.0..=0.0,
        [
            (vars.level[t].col(), 1.0),
            (vars.level[prev].col(), -1.0),
            (vars.charge[prev].col(), -eta),
            (vars.discharge[prev].col(), eta),
        ],
    );
}

/// Tie the peak variables to the flows they bound.
///
/// District heating draw in each bucket is bounded by that bucket's peak. Grid import is bounded
/// by the grid peak when the peak is modelled.
fn add_peak_constraints(problem: &mut Problem, variables: &VariableMap, scenario: &Scenario) {
    for (bucket, peak) in &variables.dh_peaks {
        for t in bucket.iter() {
            problem.add_row(
                ..=0.0,
                [(variables.district_heat[t].col(), 1.0), (peak.col(), -1.0)],
            );
        }
    }

    if let Some(peak) = variables.grid_peak {
        for t in scenario.horizon.iter() {
            problem.add_row(
                ..=0.0,
                [(variables.import[t].col(), 1.0), (peak.col(), -1.0)],
            );
        }
    }
}
