//! Code for reading the storage CSV file.
use super::{deserialise_proportion, input_err_msg, read_csv_optional};
use crate::id::collect_by_id;
use crate::scenario::storage::{StorageAsset, StorageKind, StorageMap};
use crate::units::{Dimensionless, Energy, MoneyPerEnergy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const STORAGE_FILE_NAME: &str = "storage.csv";

/// Represents a row of the storage CSV file
#[derive(Deserialize, Debug, PartialEq)]
struct StorageRaw {
    id: String,
    kind: StorageKind,
    capacity: Energy,
    #[serde(deserialize_with = "deserialise_proportion")]
    charge_efficiency: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    discharge_efficiency: Dimensionless,
    max_rate: Energy,
    initial_level: Energy,
    #[serde(deserialize_with = "deserialise_proportion")]
    min_level_fraction: Dimensionless,
    lifetime: u32,
    investment: MoneyPerEnergy,
    capacity_min: Option<Energy>,
    capacity_max: Option<Energy>,
}

impl From<StorageRaw> for StorageAsset {
    fn from(raw: StorageRaw) -> Self {
        Self {
            id: raw.id.into(),
            kind: raw.kind,
            capacity: raw.capacity,
            charge_efficiency: raw.charge_efficiency,
            discharge_efficiency: raw.discharge_efficiency,
            max_rate: raw.max_rate,
            initial_level: raw.initial_level,
            min_level_fraction: raw.min_level_fraction,
            lifetime: raw.lifetime,
            investment: raw.investment,
            capacity_min: raw.capacity_min.unwrap_or(raw.capacity),
            capacity_max: raw.capacity_max.unwrap_or(raw.capacity),
        }
    }
}

/// Read storage assets from the scenario directory.
///
/// The file is optional. If `capacity_min` or `capacity_max` are omitted, they default to
/// `capacity`, so the capacity is fixed.
pub(super) fn read_storage(scenario_dir: &Path) -> Result<StorageMap> {
    let file_path = scenario_dir.join(STORAGE_FILE_NAME);
    let rows: Vec<StorageRaw> = read_csv_optional(&file_path)?;

    read_storage_from_iter(rows).with_context(|| input_err_msg(&file_path))
}

fn read_storage_from_iter<I>(iter: I) -> Result<StorageMap>
where
    I: IntoIterator<Item = StorageRaw>,
{
    let storage = collect_by_id(iter.into_iter().map(StorageAsset::from))?;
    for asset in storage.values() {
        asset.validate()?;
    }

    Ok(storage)
}
