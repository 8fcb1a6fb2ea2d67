//! Drives the pipeline for a single scenario or a sweep of variants.
//!
//! Variants are solved one after another, each with a freshly built problem. A variant which
//! fails is logged and skipped so the remaining variants still run.
use crate::analytics::{Analysis, analyse};
use crate::optimisation::{SolverOptions, perform_optimisation};
use crate::output::{SummaryWriter, create_output_directory, write_results};
use crate::scenario::Scenario;
use crate::variant::{SweepDefinition, Variant};
use anyhow::{Context, Result, ensure};
use log::{error, info};
use std::path::Path;

/// Solve a scenario and write its results to `output_path`
pub fn solve_and_report(
    scenario: &Scenario,
    output_path: &Path,
    options: &SolverOptions,
) -> Result<Analysis> {
    let solution = perform_optimisation(scenario, options)?;
    let analysis = analyse(&solution);
    info!(
        "Scenario {}: total cost {:.2}, self-generation {:.1}%",
        scenario.name,
        analysis.costs.total().value(),
        analysis.kpis.self_generation.value() * 100.0
    );

    write_results(output_path, &solution, &analysis)
        .with_context(|| format!("Failed to write results for scenario {}", scenario.name))?;

    Ok(analysis)
}

/// Apply a variant to the base scenario, then solve it and write its results
fn run_variant(
    base: &Scenario,
    variant: &Variant,
    output_path: &Path,
    options: &SolverOptions,
    summary: &mut SummaryWriter,
) -> Result<()> {
    let scenario = variant.apply(base)?;
    let variant_dir = output_path.join(&variant.name);
    create_output_directory(&variant_dir, true)?;

    let solution = perform_optimisation(&scenario, options)?;
    let analysis = analyse(&solution);
    write_results(&variant_dir, &solution, &analysis)?;
    summary.write(&variant.name, solution.objective_value(), &analysis)?;
    info!(
        "Variant {}: total cost {:.2}, self-generation {:.1}%",
        variant.name,
        analysis.costs.total().value(),
        analysis.kpis.self_generation.value() * 100.0
    );

    Ok(())
}

/// Run every variant of a sweep.
///
/// Each variant writes its results to a subfolder of `output_path` named after it and adds a row
/// to the top-level `summary.csv`. Returns an error after all variants have run if any failed.
pub fn run_sweep(
    base: &Scenario,
    sweep: &SweepDefinition,
    output_path: &Path,
    options: &SolverOptions,
) -> Result<()> {
    let mut summary = SummaryWriter::create(output_path)?;
    let mut failed = Vec::new();
    for (i, variant) in sweep.variants.iter().enumerate() {
        info!(
            "Running variant {} ({} of {})",
            variant.name,
            i + 1,
            sweep.variants.len()
        );

        if let Err(err) = run_variant(base, variant, output_path, options, &mut summary) {
            error!("Variant {} failed: {err:?}", variant.name);
            failed.push(variant.name.as_str());
        }
    }
    summary.flush()?;

    ensure!(
        failed.is_empty(),
        "{} of {} variants failed: {}",
        failed.len(),
        sweep.variants.len(),
        failed.join(", ")
    );

    Ok(())
}
