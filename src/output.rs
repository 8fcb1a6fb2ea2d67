//! The module responsible for writing output data to disk.
use crate::analytics::{Analysis, CostBreakdown, UnitReport, operating_hours};
use crate::optimisation::SolvedModel;
use crate::optimisation::objective::CostRates;
use crate::time_step::TimeSeries;
use crate::units::{Dimensionless, Emissions, Energy, Money, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which scenario-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "mgopt_results";

/// The output file name for hourly energy flows
const ENERGY_FILE_NAME: &str = "energy.csv";

/// The output file name for per-source economics
const ECONOMICS_FILE_NAME: &str = "economics.csv";

/// The output file name for the one-row-per-scenario summary
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// Get the output folder for the scenario in the specified directory
pub fn get_output_dir(scenario_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let scenario_dir = scenario_dir
        .canonicalize()
        .context("Could not resolve path to scenario")?;

    let scenario_name = scenario_dir
        .file_name()
        .context("Scenario cannot be in root folder")?
        .to_str()
        .context("Invalid chars in scenario dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, scenario_name].iter().collect())
}

/// Create a new output directory.
///
/// An existing directory is reused if it is empty or `allow_overwrite` is set.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<()> {
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        ensure!(
            is_empty || allow_overwrite,
            "Output folder {} already exists and is not empty. Use --overwrite to replace its \
             contents.",
            output_dir.display()
        );
        return Ok(());
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(())
}

/// A column of the energy table
struct EnergyColumn {
    name: String,
    values: Vec<f64>,
    /// Whether the column is a flow, so has total and operating-hour rollups
    is_flow: bool,
}

impl EnergyColumn {
    fn flow(name: impl Into<String>, series: &TimeSeries<Energy>) -> Self {
        Self {
            name: name.into(),
            values: series.values().iter().map(|value| value.value()).collect(),
            is_flow: true,
        }
    }

    fn state(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            is_flow: false,
        }
    }
}

/// Every hourly series of a solution, as columns of the energy table
fn energy_columns(solution: &SolvedModel) -> Vec<EnergyColumn> {
    let scenario = solution.scenario();
    let mut columns = vec![
        EnergyColumn::flow("electric_demand", &scenario.demand.electric),
        EnergyColumn::flow("heat_demand", &scenario.demand.heat),
    ];
    for unit in scenario.generators.values() {
        let output = solution.unit_output(unit);
        if unit.is_chp() {
            let heat = output.map(|value| *value * unit.chp_factor);
            columns.push(EnergyColumn::flow(format!("{}_heat", unit.id), &heat));
        }
        columns.push(EnergyColumn::flow(unit.id.to_string(), &output));
    }
    for unit in scenario.heaters.values() {
        columns.push(EnergyColumn::flow(unit.id.to_string(), &solution.unit_output(unit)));
    }
    columns.extend([
        EnergyColumn::flow("pv", &scenario.renewables.pv),
        EnergyColumn::flow("st", &scenario.renewables.st),
        EnergyColumn::flow("import", &solution.import()),
        EnergyColumn::flow("export", &solution.export()),
        EnergyColumn::flow("district_heat", &solution.district_heat()),
        EnergyColumn::flow("boiler", &solution.boiler()),
    ]);
    for id in scenario.storage.keys() {
        let level = solution.storage_level(id);
        columns.push(EnergyColumn::state(
            format!("{id}_level"),
            level.values().iter().map(|value| value.value()).collect(),
        ));
        columns.push(EnergyColumn::flow(
            format!("{id}_charge"),
            &solution.storage_charge(id),
        ));
        columns.push(EnergyColumn::flow(
            format!("{id}_discharge"),
            &solution.storage_discharge(id),
        ));
    }
    columns.push(EnergyColumn::state(
        "outdoor_temperature",
        scenario.demand.outdoor_temperature.values().to_vec(),
    ));

    columns
}

/// Represents a row of the economics CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct EconomicsRow {
    source: String,
    built: bool,
    power: Energy,
    heat: Energy,
    hours: u32,
    investment: Money,
    maintenance: Money,
    fuel: Money,
    emissions: Emissions,
    lcoe: MoneyPerEnergy,
}

impl From<&UnitReport> for EconomicsRow {
    fn from(report: &UnitReport) -> Self {
        Self {
            source: report.id.to_string(),
            built: report.built,
            power: report.power,
            heat: report.heat,
            hours: report.hours,
            investment: report.investment,
            maintenance: report.maintenance,
            fuel: report.fuel,
            emissions: report.emissions,
            lcoe: report.lcoe,
        }
    }
}

/// Economics rows for every source, followed by a total row.
///
/// In the total row, `fuel` holds every operating cost net of revenue and credits, so `investment
/// + maintenance + fuel` is the total cost.
fn economics_rows(solution: &SolvedModel, analysis: &Analysis) -> Vec<EconomicsRow> {
    let scenario = solution.scenario();
    let fixed = CostRates::new(scenario).fixed_costs();
    let totals = &analysis.totals;
    let costs = &analysis.costs;
    let import = solution.import();
    let grid_emissions: Emissions = scenario
        .horizon
        .iter()
        .map(|t| scenario.grid.emissions[t] * import[t])
        .sum();

    let mut rows: Vec<EconomicsRow> = analysis.units.iter().map(EconomicsRow::from).collect();
    for report in &analysis.storage {
        rows.push(EconomicsRow {
            source: report.id.to_string(),
            built: report.capacity > Energy(0.0),
            power: Energy(0.0),
            heat: Energy(0.0),
            hours: operating_hours(&solution.storage_discharge(&report.id)),
            investment: report.investment,
            maintenance: Money(0.0),
            fuel: Money(0.0),
            emissions: Emissions(0.0),
            lcoe: MoneyPerEnergy(0.0),
        });
    }
    rows.push(EconomicsRow {
        source: "PV".into(),
        built: totals.pv > Energy(0.0),
        power: totals.pv,
        heat: Energy(0.0),
        hours: operating_hours(&scenario.renewables.pv),
        investment: fixed.pv_investment,
        maintenance: fixed.pv_maintenance,
        fuel: -fixed.certificate_credit,
        emissions: Emissions(0.0),
        lcoe: analysis.lcoe.pv,
    });
    rows.push(EconomicsRow {
        source: "ST".into(),
        built: totals.st > Energy(0.0),
        power: Energy(0.0),
        heat: totals.st,
        hours: operating_hours(&scenario.renewables.st),
        investment: fixed.st_investment,
        maintenance: fixed.st_maintenance,
        fuel: Money(0.0),
        emissions: Emissions(0.0),
        lcoe: analysis.lcoe.st,
    });
    rows.push(EconomicsRow {
        source: "grid".into(),
        built: true,
        power: totals.import,
        heat: Energy(0.0),
        hours: operating_hours(&import),
        investment: Money(0.0),
        maintenance: Money(0.0),
        fuel: costs.electricity_bill(),
        emissions: grid_emissions,
        lcoe: analysis.lcoe.grid,
    });
    rows.push(EconomicsRow {
        source: "district_heating".into(),
        built: true,
        power: Energy(0.0),
        heat: totals.district_heat,
        hours: operating_hours(&solution.district_heat()),
        investment: Money(0.0),
        maintenance: Money(0.0),
        fuel: costs.dh_bill(),
        emissions: scenario.district_heating.emissions * totals.district_heat,
        lcoe: analysis.lcoe.district_heating,
    });

    let total = costs.total();
    let demand = totals.electric_demand + totals.heat_demand;
    rows.push(EconomicsRow {
        source: "Total".into(),
        built: true,
        power: totals.electric_demand,
        heat: totals.heat_demand,
        hours: scenario.horizon.num_steps(),
        investment: costs.investment,
        maintenance: costs.maintenance,
        fuel: total - costs.investment - costs.maintenance,
        emissions: analysis.emissions,
        lcoe: if demand == Energy(0.0) {
            MoneyPerEnergy(0.0)
        } else {
            total / demand
        },
    });

    rows
}

/// Represents a row of the summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    scenario: String,
    objective_value: f64,
    total_cost: Money,
    fuel: Money,
    import: Money,
    export_revenue: Money,
    dh_energy: Money,
    grid_tariffs: Money,
    dh_tariffs: Money,
    investment: Money,
    maintenance: Money,
    certificate_credit: Money,
    emission_cost: Money,
    emissions: Emissions,
    self_generation: Dimensionless,
    import_energy: Energy,
    export_energy: Energy,
    district_heat: Energy,
    mean_outdoor_temperature: f64,
    mean_spot_price: MoneyPerEnergy,
    heat_to_electric_ratio: Dimensionless,
    electricity_bill: Money,
    dh_bill: Money,
}

impl SummaryRow {
    fn new(name: &str, objective_value: f64, analysis: &Analysis) -> Self {
        let CostBreakdown {
            fuel,
            import,
            export_revenue,
            dh_energy,
            grid_tariffs,
            dh_tariffs,
            investment,
            maintenance,
            certificate_credit,
            emission_cost,
            ..
        } = analysis.costs;
        let kpis = &analysis.kpis;

        Self {
            scenario: name.into(),
            objective_value,
            total_cost: analysis.costs.total(),
            fuel,
            import,
            export_revenue,
            dh_energy,
            grid_tariffs,
            dh_tariffs,
            investment,
            maintenance,
            certificate_credit,
            emission_cost,
            emissions: analysis.emissions,
            self_generation: kpis.self_generation,
            import_energy: analysis.totals.import,
            export_energy: analysis.totals.export,
            district_heat: analysis.totals.district_heat,
            mean_outdoor_temperature: kpis.mean_outdoor_temperature,
            mean_spot_price: kpis.mean_spot_price,
            heat_to_electric_ratio: kpis.heat_to_electric_ratio,
            electricity_bill: kpis.electricity_bill,
            dh_bill: kpis.dh_bill,
        }
    }
}

/// An object for writing the results of one solve to file
pub struct DataWriter {
    energy_writer: csv::Writer<File>,
    economics_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            energy_writer: new_writer(ENERGY_FILE_NAME)?,
            economics_writer: new_writer(ECONOMICS_FILE_NAME)?,
        })
    }

    /// Write hourly flows, followed by `Total` and `Hours` rollup rows
    pub fn write_energy(&mut self, solution: &SolvedModel) -> Result<()> {
        let columns = energy_columns(solution);
        let header = std::iter::once("step").chain(columns.iter().map(|col| col.name.as_str()));
        self.energy_writer.write_record(header)?;

        for t in solution.scenario().horizon.iter() {
            let values = columns.iter().map(|col| col.values[t.index()].to_string());
            self.energy_writer
                .write_record(std::iter::once(t.to_string()).chain(values))?;
        }

        let total = columns.iter().map(|col| {
            if col.is_flow {
                col.values.iter().sum::<f64>().to_string()
            } else {
                String::new()
            }
        });
        self.energy_writer
            .write_record(std::iter::once("Total".to_string()).chain(total))?;

        let hours = columns.iter().map(|col| {
            if col.is_flow {
                let series: TimeSeries<Energy> = col.values.iter().copied().map(Energy).collect();
                operating_hours(&series).to_string()
            } else {
                String::new()
            }
        });
        self.energy_writer
            .write_record(std::iter::once("Hours".to_string()).chain(hours))?;

        Ok(())
    }

    /// Write per-source economics and the cost total
    pub fn write_economics(&mut self, solution: &SolvedModel, analysis: &Analysis) -> Result<()> {
        for row in economics_rows(solution, analysis) {
            self.economics_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.energy_writer.flush()?;
        self.economics_writer.flush()?;

        Ok(())
    }
}

/// An object for writing one summary row per solved scenario
pub struct SummaryWriter {
    writer: csv::Writer<File>,
}

impl SummaryWriter {
    /// Open the summary CSV file in the given folder
    pub fn create(output_path: &Path) -> Result<Self> {
        let file_path = output_path.join(SUMMARY_FILE_NAME);
        Ok(Self {
            writer: csv::Writer::from_path(file_path)?,
        })
    }

    /// Write the summary of a solved scenario
    pub fn write(&mut self, name: &str, objective_value: f64, analysis: &Analysis) -> Result<()> {
        self.writer
            .serialize(SummaryRow::new(name, objective_value, analysis))?;

        Ok(())
    }

    /// Flush the underlying stream
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;

        Ok(())
    }
}

/// Write every result file for a solved scenario to `output_path`
pub fn write_results(
    output_path: &Path,
    solution: &SolvedModel,
    analysis: &Analysis,
) -> Result<()> {
    let mut writer = DataWriter::create(output_path)?;
    writer.write_energy(solution)?;
    writer.write_economics(solution, analysis)?;
    writer.flush()?;

    let mut summary = SummaryWriter::create(output_path)?;
    summary.write(&solution.scenario().name, solution.objective_value(), analysis)?;
    summary.flush()
}
