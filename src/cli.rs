//! The command line interface for mgopt.
use crate::input::load_scenario;
use crate::log;
use crate::optimisation::SolverOptions;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use crate::sweep::{run_sweep, solve_and_report};
use crate::variant::{SWEEP_FILE_NAME, SweepDefinition};
use ::log::info;
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for mgopt.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run and sweep commands
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Optimise a scenario.
    Run {
        /// Path to the scenario directory.
        scenario_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Optimise every variant listed in the scenario's sweep.toml.
    Sweep {
        /// Path to the scenario directory.
        scenario_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example scenarios.
    Example {
        /// The available subcommands for managing example scenarios.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a scenario and its sweep file, if present.
    Validate {
        /// The path to the scenario directory.
        scenario_dir: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { scenario_dir, opts } => handle_run_command(&scenario_dir, &opts, None),
            Self::Sweep { scenario_dir, opts } => {
                handle_sweep_command(&scenario_dir, &opts, None)
            }
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { scenario_dir } => handle_validate_command(&scenario_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start mgopt
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ mgopt --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load settings, prepare the output folder and start the logger.
///
/// Returns the settings and the output folder.
fn prepare_run(
    scenario_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<(Settings, PathBuf)> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let output_path = if let Some(p) = &opts.output_dir {
        p.clone()
    } else {
        get_output_dir(scenario_path)?
    };

    create_output_directory(&output_path, opts.overwrite || settings.overwrite).with_context(
        || {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        },
    )?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(&output_path))
        .context("Failed to initialise logging.")?;

    Ok((settings, output_path))
}

/// Handle the `run` command.
pub fn handle_run_command(
    scenario_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let (settings, output_path) = prepare_run(scenario_path, opts, settings)?;

    let scenario = load_scenario(scenario_path).context("Failed to load scenario.")?;
    info!("Loaded scenario from {}", scenario_path.display());
    info!("Output folder: {}", output_path.display());

    write_metadata(&output_path, scenario_path, &[scenario.name.clone()])
        .context("Failed to save metadata.")?;
    let options = SolverOptions {
        time_limit: settings.time_limit,
    };
    solve_and_report(&scenario, &output_path, &options)?;
    info!("Optimisation complete!");

    Ok(())
}

/// Handle the `sweep` command.
pub fn handle_sweep_command(
    scenario_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let (settings, output_path) = prepare_run(scenario_path, opts, settings)?;

    let scenario = load_scenario(scenario_path).context("Failed to load scenario.")?;
    let sweep = SweepDefinition::from_path(scenario_path).context("Failed to load sweep.")?;
    info!(
        "Loaded scenario and {} variants from {}",
        sweep.variants.len(),
        scenario_path.display()
    );
    info!("Output folder: {}", output_path.display());

    let names: Vec<_> = sweep.variants.iter().map(|v| v.name.clone()).collect();
    write_metadata(&output_path, scenario_path, &names).context("Failed to save metadata.")?;
    let options = SolverOptions {
        time_limit: settings.time_limit,
    };
    run_sweep(&scenario, &sweep, &output_path, &options)?;
    info!("Sweep complete!");

    Ok(())
}

/// Handle the `validate` command.
///
/// If the scenario has a sweep file, every variant is also applied and checked.
pub fn handle_validate_command(scenario_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(settings.log_level.as_str()), None)
        .context("Failed to initialise logging.")?;

    let scenario = load_scenario(scenario_path).context("Failed to validate scenario.")?;
    if scenario_path.join(SWEEP_FILE_NAME).is_file() {
        let sweep =
            SweepDefinition::from_path(scenario_path).context("Failed to validate sweep.")?;
        for variant in &sweep.variants {
            variant
                .apply(&scenario)
                .and_then(|scenario| scenario.validate())
                .context("Failed to validate sweep.")?;
        }
        info!("Validated {} variants", sweep.variants.len());
    }
    info!("Scenario validation successful!");

    Ok(())
}
