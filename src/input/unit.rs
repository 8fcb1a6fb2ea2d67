//! Code for reading the generators and heaters CSV files.
use super::{input_err_msg, read_csv, read_csv_optional};
use crate::id::collect_by_id;
use crate::scenario::unit::{Unit, UnitKind, UnitMap};
use crate::time_step::HOURS_PER_YEAR;
use crate::units::{Dimensionless, Energy, EmissionsPerEnergy, Money, MoneyPerEnergy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Represents a row of the generators or heaters CSV file
#[derive(Deserialize, Debug, PartialEq)]
struct UnitRaw {
    id: String,
    min: Energy,
    max: Energy,
    investment: Money,
    fuel_cost: MoneyPerEnergy,
    efficiency: Dimensionless,
    lifetime: u32,
    emissions: EmissionsPerEnergy,
    maintenance: Money,
    max_hours: Option<u32>,
    chp_factor: Option<Dimensionless>,
}

impl UnitRaw {
    fn into_unit(self, kind: UnitKind) -> Unit {
        Unit {
            id: self.id.into(),
            kind,
            min: self.min,
            max: self.max,
            investment: self.investment,
            fuel_cost: self.fuel_cost,
            efficiency: self.efficiency,
            lifetime: self.lifetime,
            emissions: self.emissions,
            maintenance: self.maintenance,
            max_hours: self.max_hours.unwrap_or(HOURS_PER_YEAR),
            chp_factor: self.chp_factor.unwrap_or(Dimensionless(0.0)),
        }
    }
}

/// Read units of the given kind from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `kind` - Whether the file describes generators or heaters
/// * `required` - Whether the file must exist and be non-empty
pub(super) fn read_units(file_path: &Path, kind: UnitKind, required: bool) -> Result<UnitMap> {
    let rows: Vec<UnitRaw> = if required {
        read_csv(file_path)?
    } else {
        read_csv_optional(file_path)?
    };

    read_units_from_iter(rows, kind).with_context(|| input_err_msg(file_path))
}

fn read_units_from_iter<I>(iter: I, kind: UnitKind) -> Result<UnitMap>
where
    I: IntoIterator<Item = UnitRaw>,
{
    let units = collect_by_id(iter.into_iter().map(|raw| raw.into_unit(kind)))?;
    for unit in units.values() {
        unit.validate()?;
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn raw(id: &str) -> UnitRaw {
        UnitRaw {
            id: id.into(),
            min: Energy(10.0),
            max: Energy(100.0),
            investment: Money(1000.0),
            fuel_cost: MoneyPerEnergy(0.5),
            efficiency: Dimensionless(0.4),
            lifetime: 20,
            emissions: EmissionsPerEnergy(0.2),
            maintenance: Money(10.0),
            max_hours: None,
            chp_factor: Some(Dimensionless(1.5)),
        }
    }

    #[test]
    fn test_read_units_from_iter() {
        let units = read_units_from_iter([raw("a"), raw("b")], UnitKind::Generator).unwrap();
        assert_eq!(units.len(), 2);
        let unit = &units["a"];
        assert_eq!(unit.max_hours, HOURS_PER_YEAR);
        assert_eq!(unit.chp_factor, Dimensionless(1.5));
        assert_eq!(unit.kind, UnitKind::Generator);
    }

    #[test]
    fn test_read_units_duplicate_id() {
        assert_error!(
            read_units_from_iter([raw("a"), raw("a")], UnitKind::Generator),
            "Duplicate ID found: a"
        );
    }

    #[test]
    fn test_read_units_heater_with_chp_factor() {
        assert_error!(
            read_units_from_iter([raw("boiler")], UnitKind::Heater),
            "Unit boiler: heaters cannot have a chp_factor"
        );
    }

    #[test]
    fn test_read_units_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("heaters.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(
                file,
                "id,min,max,investment,fuel_cost,efficiency,lifetime,emissions,maintenance,max_hours\n\
                 pellets,20,200,50000,0.04,0.9,20,0.02,500,4000"
            )
            .unwrap();
        }

        let units = read_units(&file_path, UnitKind::Heater, true).unwrap();
        let unit = &units["pellets"];
        assert_eq!(unit.max, Energy(200.0));
        assert_eq!(unit.max_hours, 4000);
        assert_eq!(unit.chp_factor, Dimensionless(0.0));
    }

    #[test]
    fn test_read_units_optional_missing() {
        let dir = tempdir().unwrap();
        let units = read_units(&dir.path().join("heaters.csv"), UnitKind::Heater, false).unwrap();
        assert!(units.is_empty());
    }
}
