//! General functions related to finance.
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};

/// Calculates the annuity factor for a given lifetime and discount rate.
///
/// The annuity factor converts an up-front investment into an equivalent annual payment over the
/// lifetime of an asset: `r / (1 - (1 + r)^-n)`.
pub fn annuity_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(lifetime as f64);
    }
    let factor = (Dimensionless(1.0) + discount_rate).powi(lifetime as i32);
    (discount_rate * factor) / (factor - Dimensionless(1.0))
}

/// The share of an annualised investment that falls within a horizon of the given length.
///
/// `period` is the horizon length as a fraction of a year.
pub fn annualised_investment(
    investment: Money,
    lifetime: u32,
    discount_rate: Dimensionless,
    period: Dimensionless,
) -> Money {
    investment * annuity_factor(lifetime, discount_rate) * period
}

/// Calculates the levelised cost of energy.
///
/// Heat and power output are weighted equally. Returns zero if nothing was produced.
pub fn lcoe(
    power: Energy,
    heat: Energy,
    investment: Money,
    maintenance: Money,
    fuel: Money,
) -> MoneyPerEnergy {
    let output = power + heat;
    if output == Energy(0.0) {
        return MoneyPerEnergy(0.0);
    }

    (investment + maintenance + fuel) / output
}
