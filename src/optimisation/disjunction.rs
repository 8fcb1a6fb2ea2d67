//! Linear encodings of the either/or choices in the model.
//!
//! Each [`Disjunction`] is translated into big-M rows, where M is the bound of the quantity being
//! governed (a unit's maximum output or a storage asset's maximum rate).
use super::{Variable, VariableMap};
use crate::scenario::Scenario;
use highs::RowProblem as Problem;

/// An either/or choice over decision variables
#[derive(Debug, Clone)]
pub enum Disjunction {
    /// A unit is either off (zero output) or running within its operating range
    OffOrWithinRange {
        /// Output in one time step
        output: Variable,
        /// Binary running indicator for the same time step
        running: Variable,
        /// Minimum output when running
        min: f64,
        /// Maximum output when running
        max: f64,
    },
    /// A unit can only run if it is built
    BuiltOrIdle {
        /// Binary build decision
        built: Variable,
        /// Running indicators which must be zero when the unit is not built
        gated: Vec<Variable>,
    },
    /// A storage asset either charges or discharges in a time step, never both
    ChargeOrDischarge {
        /// Energy charged
        charge: Variable,
        /// Energy discharged
        discharge: Variable,
        /// Binary mode indicator, one when charging
        charging: Variable,
        /// Maximum charge and discharge rate
        max_rate: f64,
    },
}

impl Disjunction {
    /// Append the linear encoding of this disjunction to the problem
    pub fn translate(&self, problem: &mut Problem) {
        match self {
            Disjunction::OffOrWithinRange {
                output,
                running,
                min,
                max,
            } => {
                // output ≤ max × running
                problem.add_row(..=0.0, [(output.col(), 1.0), (running.col(), -max)]);
                // output ≥ min × running
                problem.add_row(0.0.., [(output.col(), 1.0), (running.col(), -min)]);
            }
            Disjunction::BuiltOrIdle { built, gated } => {
                for running in gated {
                    problem.add_row(..=0.0, [(running.col(), 1.0), (built.col(), -1.0)]);
                }
            }
            Disjunction::ChargeOrDischarge {
                charge,
                discharge,
                charging,
                max_rate,
            } => {
                problem.add_row(..=0.0, [(charge.col(), 1.0), (charging.col(), -max_rate)]);
                problem.add_row(
                    ..=*max_rate,
                    [(discharge.col(), 1.0), (charging.col(), *max_rate)],
                );
            }
        }
    }
}

/// All the disjunctions of a scenario
fn disjunctions(variables: &VariableMap, scenario: &Scenario) -> Vec<Disjunction> {
    let mut disjunctions = Vec::new();
    for unit in scenario.iter_units() {
        let vars = variables.unit(unit);
        for t in scenario.horizon.iter() {
            disjunctions.push(Disjunction::OffOrWithinRange {
                output: vars.output[t],
                running: vars.running[t],
                min: unit.min.value(),
                max: unit.max.value(),
            });
        }
        disjunctions.push(Disjunction::BuiltOrIdle {
            built: vars.built,
            gated: vars.running.values().to_vec(),
        });
    }

    for asset in scenario.storage.values() {
        let vars = variables.storage(&asset.id);
        for t in scenario.horizon.iter() {
            disjunctions.push(Disjunction::ChargeOrDischarge {
                charge: vars.charge[t],
                discharge: vars.discharge[t],
                charging: vars.charging[t],
                max_rate: asset.max_rate.value(),
            });
        }
    }

    disjunctions
}

/// Translate every disjunction of the scenario into rows of the problem
pub fn add_disjunctions(problem: &mut Problem, variables: &VariableMap, scenario: &Scenario) {
    for disjunction in disjunctions(variables, scenario) {
        disjunction.translate(problem);
    }
}
