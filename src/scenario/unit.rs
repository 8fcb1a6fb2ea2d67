//! Dispatchable generation and heat units.
use crate::finance::annualised_investment;
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Dimensionless, Energy, EmissionsPerEnergy, Money, MoneyPerEnergy};
use anyhow::{Result, ensure};
use indexmap::IndexMap;

define_id_type! {UnitID}

/// A map of units, keyed by ID, in input order
pub type UnitMap = IndexMap<UnitID, Unit>;

/// The carrier a unit's primary output feeds into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// An electric generator, possibly also producing heat (CHP)
    Generator,
    /// A unit producing only heat
    Heater,
}

/// A dispatchable unit with an optional build decision.
///
/// Output is either zero or between `min` and `max` in every time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Unique name of the unit
    pub id: UnitID,
    /// Whether this is a generator or a heater
    pub kind: UnitKind,
    /// Minimum output when running
    pub min: Energy,
    /// Maximum output
    pub max: Energy,
    /// Up-front investment cost
    pub investment: Money,
    /// Fuel cost per unit of fuel input
    pub fuel_cost: MoneyPerEnergy,
    /// Ratio of output to fuel input
    pub efficiency: Dimensionless,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Emission intensity per unit of output
    pub emissions: EmissionsPerEnergy,
    /// Operation and maintenance cost per year
    pub maintenance: Money,
    /// Maximum number of time steps in which the unit may run
    pub max_hours: u32,
    /// Heat produced per unit of electrical output (zero for pure generators and heaters)
    pub chp_factor: Dimensionless,
}
define_id_getter! {Unit, UnitID}

impl Unit {
    /// Fuel cost per unit of output
    pub fn fuel_cost_per_output(&self) -> MoneyPerEnergy {
        self.fuel_cost / self.efficiency
    }

    /// Investment charged to a horizon of length `period` (fraction of a year)
    pub fn investment_for_period(
        &self,
        discount_rate: Dimensionless,
        period: Dimensionless,
    ) -> Money {
        annualised_investment(self.investment, self.lifetime, discount_rate, period)
    }

    /// Maintenance charged to a horizon of length `period`
    pub fn maintenance_for_period(&self, period: Dimensionless) -> Money {
        self.maintenance * period
    }

    /// Whether the unit also produces heat
    pub fn is_chp(&self) -> bool {
        self.chp_factor > Dimensionless(0.0)
    }

    /// Check that the unit's parameters are consistent
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min >= Energy(0.0) && self.min.is_finite(),
            "Unit {}: min must be a finite, non-negative number",
            self.id
        );
        ensure!(
            self.max.is_finite() && self.max >= self.min,
            "Unit {}: max must be finite and at least min",
            self.id
        );
        ensure!(
            self.efficiency > Dimensionless(0.0) && self.efficiency.is_finite(),
            "Unit {}: efficiency must be greater than zero",
            self.id
        );
        ensure!(
            self.chp_factor >= Dimensionless(0.0) && self.chp_factor.is_finite(),
            "Unit {}: chp_factor cannot be negative",
            self.id
        );
        ensure!(
            self.kind == UnitKind::Generator || !self.is_chp(),
            "Unit {}: heaters cannot have a chp_factor",
            self.id
        );
        for (name, value) in [
            ("investment", self.investment.value()),
            ("fuel_cost", self.fuel_cost.value()),
            ("emissions", self.emissions.value()),
            ("maintenance", self.maintenance.value()),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Unit {}: {name} must be a finite, non-negative number",
                self.id
            );
        }

        Ok(())
    }
}
