//! Connections to the electricity grid and the district heating network.
use crate::time_step::{PeakBucket, TimeSeries, TimeStep};
use crate::units::{Dimensionless, Energy, EmissionsPerEnergy, Money, MoneyPerEnergy};
use anyhow::{Result, ensure};

/// The connection to the electricity grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridConnection {
    /// Wholesale price in each time step
    pub spot_price: TimeSeries<MoneyPerEnergy>,
    /// Emission intensity of imported electricity in each time step
    pub emissions: TimeSeries<EmissionsPerEnergy>,
    /// Import limit in each time step (may be infinite)
    pub capacity: TimeSeries<Energy>,
    /// Network charge per unit imported, added to the spot price
    pub energy_tariff: MoneyPerEnergy,
    /// Fixed network charge per year
    pub fixed_tariff: Money,
    /// Charge per year for each unit of peak import
    pub power_tariff: MoneyPerEnergy,
    /// If set, the peak import used for the power tariff instead of the modelled peak
    pub assumed_peak: Option<Energy>,
    /// Whether electricity may be sold back to the grid
    pub allow_export: bool,
}

impl GridConnection {
    /// Price paid per unit imported at `step`, including tax
    pub fn import_price(&self, step: TimeStep, tax: Dimensionless) -> MoneyPerEnergy {
        (self.spot_price[step] + self.energy_tariff) * tax
    }

    /// Revenue per unit exported at `step`
    pub fn export_price(&self, step: TimeStep) -> MoneyPerEnergy {
        self.spot_price[step]
    }

    /// Whether the peak import is a decision of the model rather than an assumed constant
    pub fn has_modelled_peak(&self) -> bool {
        self.assumed_peak.is_none()
    }

    /// Check that the connection's parameters are consistent
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.capacity.values().iter().all(|c| *c >= Energy(0.0)),
            "Grid capacity cannot be negative"
        );
        ensure!(
            self.spot_price.values().iter().all(|p| p.is_finite()),
            "Spot prices must be finite"
        );
        ensure!(
            self.emissions
                .values()
                .iter()
                .all(|e| e.is_finite() && *e >= EmissionsPerEnergy(0.0)),
            "Grid emission intensities must be finite, non-negative numbers"
        );
        for (name, value) in [
            ("energy_tariff", self.energy_tariff.value()),
            ("fixed_tariff", self.fixed_tariff.value()),
            ("power_tariff", self.power_tariff.value()),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Grid {name} must be a finite, non-negative number"
            );
        }
        if let Some(peak) = self.assumed_peak {
            ensure!(
                peak.is_finite() && peak >= Energy(0.0),
                "Grid assumed_peak must be a finite, non-negative number"
            );
        }

        Ok(())
    }
}

/// The connection to the district heating network
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictHeatingConnection {
    /// Price per unit of heat in each time step
    pub energy_tariff: TimeSeries<MoneyPerEnergy>,
    /// Price per unit of peak draw, quoted for the bucket starting at each time step
    pub power_tariff: TimeSeries<MoneyPerEnergy>,
    /// Fixed charge per year
    pub fixed_tariff: Money,
    /// Emission intensity of delivered heat
    pub emissions: EmissionsPerEnergy,
    /// Maximum draw per time step
    pub capacity: Energy,
}

impl DistrictHeatingConnection {
    /// Price per unit of heat at `step`, including tax
    pub fn energy_price(&self, step: TimeStep, tax: Dimensionless) -> MoneyPerEnergy {
        self.energy_tariff[step] * tax
    }

    /// Price per unit of peak draw within a bucket, including tax
    pub fn peak_price(&self, bucket: &PeakBucket, tax: Dimensionless) -> MoneyPerEnergy {
        self.power_tariff[bucket.first] * bucket.price_factor * tax
    }

    /// Check that the connection's parameters are consistent
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.capacity.is_finite() && self.capacity >= Energy(0.0),
            "District heating capacity must be a finite, non-negative number"
        );
        ensure!(
            self.energy_tariff
                .values()
                .iter()
                .chain(self.power_tariff.values())
                .all(|p| p.is_finite() && *p >= MoneyPerEnergy(0.0)),
            "District heating tariffs must be finite, non-negative numbers"
        );
        ensure!(
            self.fixed_tariff.is_finite() && self.fixed_tariff >= Money(0.0),
            "District heating fixed_tariff must be a finite, non-negative number"
        );
        ensure!(
            self.emissions.is_finite() && self.emissions >= EmissionsPerEnergy(0.0),
            "District heating emissions must be a finite, non-negative number"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, district_heating, grid};
    use crate::time_step::Horizon;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_import_price(mut grid: GridConnection) {
        grid.spot_price[TimeStep::new(3)] = MoneyPerEnergy(0.5);
        grid.energy_tariff = MoneyPerEnergy(0.3);
        assert_approx_eq!(
            MoneyPerEnergy,
            grid.import_price(TimeStep::new(3), Dimensionless(1.25)),
            MoneyPerEnergy(1.0)
        );
        assert_eq!(grid.export_price(TimeStep::new(3)), MoneyPerEnergy(0.5));
    }

    #[rstest]
    fn test_grid_validate_negative_capacity(mut grid: GridConnection) {
        grid.capacity[TimeStep::new(1)] = Energy(-1.0);
        assert_error!(grid.validate(), "Grid capacity cannot be negative");
    }

    #[rstest]
    fn test_grid_validate_infinite_capacity(grid: GridConnection) {
        assert!(grid.validate().is_ok());
    }

    #[rstest]
    fn test_peak_price(mut district_heating: DistrictHeatingConnection) {
        district_heating.power_tariff[TimeStep::new(1)] = MoneyPerEnergy(40.0);
        let bucket = &Horizon::new(1, 1).unwrap().peak_buckets()[0];
        assert_approx_eq!(
            MoneyPerEnergy,
            district_heating.peak_price(bucket, Dimensionless(1.0)),
            MoneyPerEnergy(10.0)
        );
    }
}
