//! Declarative variants of a base scenario.
//!
//! A variant is a named list of overrides. Applying a variant clones the base scenario, so the
//! base is never modified and every variant gets a fresh problem.
use crate::input::{input_err_msg, read_toml};
use crate::scenario::Scenario;
use crate::scenario::parameters::ObjectiveKind;
use crate::scenario::storage::StorageID;
use crate::time_step::TimeStep;
use crate::units::{Energy, MoneyPerEnergy};
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

/// The name of the sweep definition file
pub const SWEEP_FILE_NAME: &str = "sweep.toml";

/// A change to a scenario
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Override {
    /// Fix a unit's output over a window of time steps
    FixOutput {
        /// The unit
        unit: String,
        /// The fixed output
        value: Energy,
        /// First time step of the window
        start: u32,
        /// Number of time steps in the window
        duration: u32,
    },
    /// Remove all fixed outputs of a unit, including maintenance periods
    ReleaseOutput {
        /// The unit
        unit: String,
    },
    /// Fix whether a unit is built
    FixBuilt {
        /// The unit
        unit: String,
        /// Whether the unit is built
        built: bool,
    },
    /// Disconnect the grid over a window of time steps
    Blackout {
        /// First time step of the window
        start: u32,
        /// Number of time steps in the window
        duration: u32,
    },
    /// Fix the level of a storage asset at one time step
    FixStorageLevel {
        /// The storage asset
        storage: String,
        /// The time step
        step: u32,
        /// The fixed level
        value: Energy,
    },
    /// Change a unit's fuel cost
    SetFuelCost {
        /// The unit
        unit: String,
        /// The new fuel cost
        value: MoneyPerEnergy,
    },
    /// Change what is minimised
    SetObjective {
        /// The new objective
        objective: ObjectiveKind,
    },
    /// Add a constant to the spot price at every time step
    SetSpotPriceOffset {
        /// The offset
        value: MoneyPerEnergy,
    },
}

impl Override {
    /// Apply the override to a scenario
    pub fn apply(&self, scenario: &mut Scenario) -> Result<()> {
        match self {
            Override::FixOutput {
                unit,
                value,
                start,
                duration,
            } => {
                let id = scenario.find_unit(unit)?.id.clone();
                let window = scenario.time_step_window(*start, *duration)?;
                scenario.fixings.fix_output(&id, window, *value);
            }
            Override::ReleaseOutput { unit } => {
                let id = scenario.find_unit(unit)?.id.clone();
                scenario.fixings.outputs.shift_remove(&id);
            }
            Override::FixBuilt { unit, built } => {
                let id = scenario.find_unit(unit)?.id.clone();
                scenario.fixings.built.insert(id, *built);
            }
            Override::Blackout { start, duration } => {
                for t in scenario.time_step_window(*start, *duration)? {
                    scenario.grid.capacity[t] = Energy(0.0);
                }
            }
            Override::FixStorageLevel {
                storage,
                step,
                value,
            } => {
                let id = scenario
                    .storage
                    .get(storage.as_str())
                    .with_context(|| format!("Unknown storage ID {storage} found"))?
                    .id
                    .clone();
                let step = scenario.time_step_window(*step, 1)?[0];
                fix_storage_level(scenario, id, step, *value);
            }
            Override::SetFuelCost { unit, value } => {
                scenario.find_unit_mut(unit)?.fuel_cost = *value;
            }
            Override::SetObjective { objective } => {
                scenario.parameters.objective = *objective;
            }
            Override::SetSpotPriceOffset { value } => {
                for t in scenario.horizon.iter() {
                    scenario.grid.spot_price[t] += *value;
                }
            }
        }

        Ok(())
    }
}

fn fix_storage_level(scenario: &mut Scenario, id: StorageID, step: TimeStep, value: Energy) {
    scenario
        .fixings
        .storage_levels
        .entry(id)
        .or_default()
        .insert(step, value);
}

/// A named list of overrides
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Variant {
    /// Name of the variant, used for its output directory
    pub name: String,
    /// Overrides applied in order
    #[serde(default)]
    pub overrides: Vec<Override>,
}

impl Variant {
    /// Create a variant of `base` with the overrides applied.
    ///
    /// The base scenario is left unchanged.
    pub fn apply(&self, base: &Scenario) -> Result<Scenario> {
        let mut scenario = base.clone();
        scenario.name = self.name.clone();
        for (i, over) in self.overrides.iter().enumerate() {
            over.apply(&mut scenario)
                .with_context(|| format!("Invalid override {} in variant {}", i + 1, self.name))?;
        }

        Ok(scenario)
    }
}

/// The variants to run in a sweep
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SweepDefinition {
    /// Variants in the order they are run
    pub variants: Vec<Variant>,
}

impl SweepDefinition {
    /// Read the sweep definition from `sweep.toml` in the given directory.
    ///
    /// # Arguments
    ///
    /// * `dir` - Folder containing the sweep file
    pub fn from_path<P: AsRef<Path>>(dir: P) -> Result<SweepDefinition> {
        let file_path = dir.as_ref().join(SWEEP_FILE_NAME);
        let sweep: SweepDefinition = read_toml(&file_path)?;
        sweep.validate().with_context(|| input_err_msg(&file_path))?;

        Ok(sweep)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.variants.is_empty(), "No variants defined");
        for variant in &self.variants {
            ensure!(
                !variant.name.is_empty()
                    && variant
                        .name
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '-'),
                "Invalid variant name '{}'. Names may only contain letters, digits, '_' and '-'",
                variant.name
            );
        }
        if let Some(name) = self.variants.iter().map(|v| &v.name).duplicates().next() {
            bail!("Duplicate variant name: {name}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, battery, scenario};
    use crate::scenario::storage::StorageAsset;
    use crate::scenario::unit::UnitID;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn variant(overrides: Vec<Override>) -> Variant {
        Variant {
            name: "variant".into(),
            overrides,
        }
    }

    #[rstest]
    fn test_apply_does_not_modify_base(scenario: Scenario) {
        let base = scenario.clone();
        let variant = variant(vec![
            Override::FixBuilt {
                unit: "gen".into(),
                built: false,
            },
            Override::SetObjective {
                objective: ObjectiveKind::Import,
            },
        ]);

        let new = variant.apply(&scenario).unwrap();
        assert_eq!(scenario, base);
        assert_eq!(new.name, "variant");
        assert!(!new.fixings.built[&UnitID::new("gen")]);
        assert_eq!(new.parameters.objective, ObjectiveKind::Import);
    }

    #[rstest]
    fn test_fix_and_release_output(scenario: Scenario) {
        let fixed = variant(vec![Override::FixOutput {
            unit: "gen".into(),
            value: Energy(50.0),
            start: 3,
            duration: 2,
        }])
        .apply(&scenario)
        .unwrap();
        let id = UnitID::new("gen");
        assert_eq!(fixed.fixings.output(&id, TimeStep::new(4)), Some(Energy(50.0)));
        assert_eq!(fixed.fixings.output(&id, TimeStep::new(5)), None);

        let released = variant(vec![Override::ReleaseOutput { unit: "gen".into() }])
            .apply(&fixed)
            .unwrap();
        assert_eq!(released.fixings.output(&id, TimeStep::new(4)), None);
    }

    #[rstest]
    fn test_blackout(scenario: Scenario) {
        let new = variant(vec![Override::Blackout {
            start: 10,
            duration: 3,
        }])
        .apply(&scenario)
        .unwrap();
        assert_eq!(new.grid.capacity[TimeStep::new(9)], Energy(f64::INFINITY));
        assert_eq!(new.grid.capacity[TimeStep::new(10)], Energy(0.0));
        assert_eq!(new.grid.capacity[TimeStep::new(12)], Energy(0.0));
        assert_eq!(new.grid.capacity[TimeStep::new(13)], Energy(f64::INFINITY));
    }

    #[rstest]
    fn test_fix_storage_level(mut scenario: Scenario, battery: StorageAsset) {
        scenario.storage.insert(battery.id.clone(), battery);
        let new = variant(vec![Override::FixStorageLevel {
            storage: "battery".into(),
            step: 12,
            value: Energy(80.0),
        }])
        .apply(&scenario)
        .unwrap();
        assert_eq!(
            new.fixings
                .storage_level(&StorageID::new("battery"), TimeStep::new(12)),
            Some(Energy(80.0))
        );
    }

    #[rstest]
    fn test_set_fuel_cost_and_spot_offset(scenario: Scenario) {
        let new = variant(vec![
            Override::SetFuelCost {
                unit: "gen".into(),
                value: MoneyPerEnergy(3.0),
            },
            Override::SetSpotPriceOffset {
                value: MoneyPerEnergy(0.5),
            },
        ])
        .apply(&scenario)
        .unwrap();
        assert_eq!(new.generators[0].fuel_cost, MoneyPerEnergy(3.0));
        assert_eq!(new.grid.spot_price[TimeStep::new(7)], MoneyPerEnergy(0.5));
    }

    #[rstest]
    fn test_unknown_unit(scenario: Scenario) {
        assert_error!(
            variant(vec![Override::FixBuilt {
                unit: "nope".into(),
                built: true,
            }])
            .apply(&scenario),
            "Invalid override 1 in variant variant"
        );
    }

    #[rstest]
    fn test_window_outside_horizon(scenario: Scenario) {
        let result = variant(vec![Override::Blackout {
            start: 20,
            duration: 10,
        }])
        .apply(&scenario);
        let err = result.unwrap_err();
        assert_eq!(
            err.chain().nth(1).unwrap().to_string(),
            "Time steps 20 to 29 are outside the horizon (1 to 24)"
        );
    }

    #[test]
    fn test_read_sweep_definition() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SWEEP_FILE_NAME)).unwrap();
            writeln!(
                file,
                r#"
[[variants]]
name = "base"

[[variants]]
name = "no_gen"
overrides = [
    {{ type = "fix_built", unit = "gen", built = false }},
    {{ type = "set_objective", objective = "import" }},
]
"#
            )
            .unwrap();
        }

        let sweep = SweepDefinition::from_path(dir.path()).unwrap();
        assert_eq!(sweep.variants.len(), 2);
        assert!(sweep.variants[0].overrides.is_empty());
        assert_eq!(
            sweep.variants[1].overrides,
            [
                Override::FixBuilt {
                    unit: "gen".into(),
                    built: false
                },
                Override::SetObjective {
                    objective: ObjectiveKind::Import
                }
            ]
        );
    }

    #[test]
    fn test_sweep_duplicate_names() {
        let sweep = SweepDefinition {
            variants: vec![variant(Vec::new()), variant(Vec::new())],
        };
        assert_error!(sweep.validate(), "Duplicate variant name: variant");
    }

    #[test]
    fn test_sweep_bad_name() {
        let mut bad = variant(Vec::new());
        bad.name = "../escape".into();
        let sweep = SweepDefinition {
            variants: vec![bad],
        };
        assert!(sweep.validate().is_err());
    }
}
