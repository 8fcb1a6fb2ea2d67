//! Integration tests which load and solve the demo scenario without the CLI.
use float_cmp::approx_eq;
use mgopt::analytics::analyse;
use mgopt::input::load_scenario;
use mgopt::optimisation::{SolverOptions, perform_optimisation};
use mgopt::time_step::TimeStep;
use mgopt::units::Energy;
use mgopt::variant::SweepDefinition;

const SCENARIO_DIR: &str = "demos/simple";

#[test]
fn test_load_scenario() {
    let scenario = load_scenario(SCENARIO_DIR).unwrap();
    assert_eq!(scenario.name, "simple");
    assert_eq!(scenario.horizon.num_steps(), 48);
    assert_eq!(scenario.generators.len(), 2);
    assert_eq!(scenario.heaters.len(), 1);
    assert_eq!(scenario.storage.len(), 2);

    // The CHP unit is down for maintenance from step 25 to 28
    let chp = scenario.generators.get("chp").unwrap();
    assert_eq!(
        scenario.fixings.output(&chp.id, TimeStep::new(26)),
        Some(Energy(0.0))
    );
    assert_eq!(scenario.fixings.output(&chp.id, TimeStep::new(29)), None);
}

#[test]
fn test_solve_demo() {
    let scenario = load_scenario(SCENARIO_DIR).unwrap();
    let solution = perform_optimisation(&scenario, &SolverOptions::default()).unwrap();
    let analysis = analyse(&solution);

    assert!(approx_eq!(
        f64,
        analysis.costs.total().value(),
        solution.objective_value(),
        epsilon = 1e-3
    ));
    let self_generation = analysis.kpis.self_generation.value();
    assert!((0.0..=1.0 + 1e-9).contains(&self_generation));

    // Maintenance is respected
    let chp = scenario.generators.get("chp").unwrap();
    let output = solution.unit_output(chp);
    for step in 25..=28 {
        assert!(approx_eq!(f64, output[TimeStep::new(step)].value(), 0.0, epsilon = 1e-6));
    }
}

#[test]
fn test_demo_sweep_variants_apply() {
    let scenario = load_scenario(SCENARIO_DIR).unwrap();
    let sweep = SweepDefinition::from_path(SCENARIO_DIR).unwrap();
    for variant in &sweep.variants {
        let new = variant.apply(&scenario).unwrap();
        new.validate().unwrap();
        assert_eq!(new.name, variant.name);
    }
}
