//! Battery and thermal storage.
use crate::finance::annualised_investment;
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

define_id_type! {StorageID}

/// A map of storage assets, keyed by ID, in input order
pub type StorageMap = IndexMap<StorageID, StorageAsset>;

/// The carrier a storage asset holds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, DeserializeLabeledStringEnum, SerializeLabeledStringEnum,
)]
pub enum StorageKind {
    /// A battery, charged from and discharged to the power balance
    #[string = "electric"]
    Electric,
    /// A thermal store, charged from and discharged to the heat balance
    #[string = "heat"]
    Heat,
}

/// A storage asset whose capacity may be sized by the optimisation
#[derive(Debug, Clone, PartialEq)]
pub struct StorageAsset {
    /// Unique name of the asset
    pub id: StorageID,
    /// Which balance the asset takes part in
    pub kind: StorageKind,
    /// Nominal capacity
    pub capacity: Energy,
    /// Efficiency applied to the net flow in the level recurrence
    pub charge_efficiency: Dimensionless,
    /// Efficiency applied to discharged energy delivered to the balance
    pub discharge_efficiency: Dimensionless,
    /// Maximum charge or discharge per time step
    pub max_rate: Energy,
    /// Level at the start of the horizon, for reporting
    pub initial_level: Energy,
    /// Lowest permitted level as a fraction of capacity
    pub min_level_fraction: Dimensionless,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Investment cost per unit of capacity
    pub investment: MoneyPerEnergy,
    /// Smallest capacity the optimisation may choose
    pub capacity_min: Energy,
    /// Largest capacity the optimisation may choose
    pub capacity_max: Energy,
}
define_id_getter! {StorageAsset, StorageID}

impl StorageAsset {
    /// Investment charged per unit of capacity to a horizon of length `period`
    pub fn investment_for_period(
        &self,
        discount_rate: Dimensionless,
        period: Dimensionless,
    ) -> MoneyPerEnergy {
        let per_unit = annualised_investment(
            Money(self.investment.value()),
            self.lifetime,
            discount_rate,
            period,
        );
        MoneyPerEnergy(per_unit.value())
    }

    /// Check that the asset's parameters are consistent
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("capacity", self.capacity.value()),
            ("max_rate", self.max_rate.value()),
            ("initial_level", self.initial_level.value()),
            ("investment", self.investment.value()),
            ("capacity_min", self.capacity_min.value()),
            ("capacity_max", self.capacity_max.value()),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Storage {}: {name} must be a finite, non-negative number",
                self.id
            );
        }
        for (name, value) in [
            ("charge_efficiency", self.charge_efficiency),
            ("discharge_efficiency", self.discharge_efficiency),
        ] {
            ensure!(
                value > Dimensionless(0.0) && value <= Dimensionless(1.0),
                "Storage {}: {name} must be in the range (0, 1]",
                self.id
            );
        }
        ensure!(
            (0.0..1.0).contains(&self.min_level_fraction.value()),
            "Storage {}: min_level_fraction must be in the range [0, 1)",
            self.id
        );
        ensure!(
            self.capacity_min <= self.capacity_max,
            "Storage {}: capacity_min cannot exceed capacity_max",
            self.id
        );

        Ok(())
    }
}
