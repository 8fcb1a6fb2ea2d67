//! Objective coefficients for the optimisation.
//!
//! The same [`CostRates`] are used to build the cost objective and to evaluate the cost breakdown
//! of a solution, so the reported total cost always matches the objective value.
use crate::finance::annualised_investment;
use crate::scenario::Scenario;
use crate::scenario::parameters::ObjectiveKind;
use crate::scenario::storage::StorageAsset;
use crate::scenario::unit::Unit;
use crate::scenario::SolarInstallation;
use crate::time_step::{PeakBucket, TimeStep};
use crate::units::{Dimensionless, EmissionsPerEnergy, Money, MoneyPerEnergy};

/// Prices and annualised costs of a scenario, including tax where it applies
pub struct CostRates<'a> {
    scenario: &'a Scenario,
    tax: Dimensionless,
    period: Dimensionless,
}

impl<'a> CostRates<'a> {
    /// Create the cost rates for a scenario
    pub fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            tax: scenario.parameters.tariff_tax_factor,
            period: scenario.period(),
        }
    }

    /// Fuel cost per unit of a unit's output
    pub fn fuel(&self, unit: &Unit) -> MoneyPerEnergy {
        unit.fuel_cost_per_output()
    }

    /// Cost of emissions per unit of energy with the given emission intensity
    pub fn emission(&self, intensity: EmissionsPerEnergy) -> MoneyPerEnergy {
        self.scenario.parameters.carbon_price * intensity
    }

    /// Price of importing from the grid at `t`
    pub fn import(&self, t: TimeStep) -> MoneyPerEnergy {
        self.scenario.grid.import_price(t, self.tax)
    }

    /// Revenue from exporting to the grid at `t`
    pub fn export(&self, t: TimeStep) -> MoneyPerEnergy {
        self.scenario.grid.export_price(t)
    }

    /// Price of district heat at `t`
    pub fn district_heat(&self, t: TimeStep) -> MoneyPerEnergy {
        self.scenario.district_heating.energy_price(t, self.tax)
    }

    /// Price per unit of the peak district heating draw in a bucket
    pub fn dh_peak(&self, bucket: &PeakBucket) -> MoneyPerEnergy {
        self.scenario.district_heating.peak_price(bucket, self.tax)
    }

    /// Price per unit of the peak grid import over the horizon
    pub fn grid_peak(&self) -> MoneyPerEnergy {
        self.scenario.grid.power_tariff * self.period * self.tax
    }

    /// Investment in a unit charged to the horizon if it is built
    pub fn unit_investment(&self, unit: &Unit) -> Money {
        unit.investment_for_period(self.scenario.parameters.discount_rate, self.period)
    }

    /// Maintenance of a unit charged to the horizon if it is built
    pub fn unit_maintenance(&self, unit: &Unit) -> Money {
        unit.maintenance_for_period(self.period)
    }

    /// Investment per unit of storage capacity charged to the horizon
    pub fn storage_investment(&self, asset: &StorageAsset) -> MoneyPerEnergy {
        asset.investment_for_period(self.scenario.parameters.discount_rate, self.period)
    }

    fn solar_costs(&self, installation: &SolarInstallation) -> (Money, Money) {
        if !self.scenario.renewables.has_installation_costs() {
            return (Money(0.0), Money(0.0));
        }

        let investment = annualised_investment(
            installation.investment,
            installation.lifetime,
            self.scenario.parameters.discount_rate,
            self.period,
        );
        (investment, installation.maintenance * self.period)
    }

    /// Costs and credits which do not depend on any decision
    pub fn fixed_costs(&self) -> FixedCosts {
        let grid = &self.scenario.grid;
        let grid_tariff = match grid.assumed_peak {
            Some(peak) => (grid.power_tariff * peak + grid.fixed_tariff) * self.period * self.tax,
            None => grid.fixed_tariff * self.period * self.tax,
        };
        let (pv_investment, pv_maintenance) =
            self.solar_costs(&self.scenario.renewables.pv_installation);
        let (st_investment, st_maintenance) =
            self.solar_costs(&self.scenario.renewables.st_installation);

        FixedCosts {
            grid_tariff,
            dh_tariff: self.scenario.district_heating.fixed_tariff * self.period * self.tax,
            pv_investment,
            pv_maintenance,
            st_investment,
            st_maintenance,
            certificate_credit: self.scenario.parameters.certificate_price
                * self.scenario.renewables.pv.total(),
        }
    }
}

/// Costs and credits which are the same for every solution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FixedCosts {
    /// Fixed grid tariff, plus the power tariff when the peak is assumed
    pub grid_tariff: Money,
    /// Fixed district heating tariff
    pub dh_tariff: Money,
    /// Annualised PV investment
    pub pv_investment: Money,
    /// PV maintenance
    pub pv_maintenance: Money,
    /// Annualised solar thermal investment
    pub st_investment: Money,
    /// Solar thermal maintenance
    pub st_maintenance: Money,
    /// Credit earned for PV generation
    pub certificate_credit: Money,
}

impl FixedCosts {
    /// Net fixed cost
    pub fn total(&self) -> Money {
        self.grid_tariff
            + self.dh_tariff
            + self.pv_investment
            + self.pv_maintenance
            + self.st_investment
            + self.st_maintenance
            - self.certificate_credit
    }
}

/// The objective coefficient of every kind of column, plus the constant term.
///
/// For [`ObjectiveKind::Import`] only import columns carry a coefficient.
pub struct ObjectiveCoefficients<'a> {
    rates: CostRates<'a>,
    kind: ObjectiveKind,
    include_emission_cost: bool,
}

impl<'a> ObjectiveCoefficients<'a> {
    /// Create the objective for a scenario
    pub fn new(scenario: &'a Scenario) -> Self {
        Self {
            rates: CostRates::new(scenario),
            kind: scenario.parameters.objective,
            include_emission_cost: scenario.parameters.include_emission_cost,
        }
    }

    /// Evaluate a cost coefficient, which is zero unless minimising cost
    fn cost<F: FnOnce(&CostRates<'a>) -> f64>(&self, f: F) -> f64 {
        match self.kind {
            ObjectiveKind::Cost => f(&self.rates),
            ObjectiveKind::Import => 0.0,
        }
    }

    fn emission(&self, intensity: EmissionsPerEnergy) -> MoneyPerEnergy {
        if self.include_emission_cost {
            self.rates.emission(intensity)
        } else {
            MoneyPerEnergy(0.0)
        }
    }

    /// Coefficient of a unit's output
    pub fn unit_output(&self, unit: &Unit) -> f64 {
        self.cost(|rates| (rates.fuel(unit) + self.emission(unit.emissions)).value())
    }

    /// Coefficient of a unit's build decision
    pub fn unit_built(&self, unit: &Unit) -> f64 {
        self.cost(|rates| (rates.unit_investment(unit) + rates.unit_maintenance(unit)).value())
    }

    /// Coefficient of a storage asset's capacity
    pub fn storage_capacity(&self, asset: &StorageAsset) -> f64 {
        self.cost(|rates| rates.storage_investment(asset).value())
    }

    /// Coefficient of grid import at `t`
    pub fn import(&self, t: TimeStep) -> f64 {
        match self.kind {
            ObjectiveKind::Cost => {
                let emissions = self.rates.scenario.grid.emissions[t];
                (self.rates.import(t) + self.emission(emissions)).value()
            }
            ObjectiveKind::Import => 1.0,
        }
    }

    /// Coefficient of grid export at `t`
    pub fn export(&self, t: TimeStep) -> f64 {
        self.cost(|rates| -rates.export(t).value())
    }

    /// Coefficient of district heat at `t`
    pub fn district_heat(&self, t: TimeStep) -> f64 {
        self.cost(|rates| {
            let emissions = rates.scenario.district_heating.emissions;
            (rates.district_heat(t) + self.emission(emissions)).value()
        })
    }

    /// Coefficient of the peak district heating draw in a bucket
    pub fn dh_peak(&self, bucket: &PeakBucket) -> f64 {
        self.cost(|rates| rates.dh_peak(bucket).value())
    }

    /// Coefficient of the peak grid import
    pub fn grid_peak(&self) -> f64 {
        self.cost(|rates| rates.grid_peak().value())
    }

    /// The constant term, which the solver does not see
    pub fn constant(&self) -> f64 {
        self.cost(|rates| rates.fixed_costs().total().value())
    }
}
