//! CSV loading for the two reference tables.
//!
//! Each table is a plain CSV export with a header row. Columns are matched
//! by exact header name; any column other than the key may be absent. Cell
//! values are trimmed, and empty cells load as missing.

use crate::error::LoadError;
use crate::index::ReferenceIndex;
use csv::StringRecord;
use linegate_protocol::{BatchRecord, DeviceRecord};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Key column of the device table.
pub const DEVICE_KEY_COLUMN: &str = "Device ID";

/// Key column of the batch quality table.
pub const BATCH_KEY_COLUMN: &str = "Batch Id";

impl ReferenceIndex {
    /// Load and join the two reference tables.
    ///
    /// Fails when either file is unreachable, unparsable, or missing its
    /// key column. Rows with an empty key are skipped, not errors.
    pub fn load(devices_path: &Path, batches_path: &Path) -> Result<Self, LoadError> {
        let devices = load_devices(devices_path)?;
        let batches = load_batches(batches_path)?;
        Ok(Self::from_records(devices, batches))
    }
}

fn load_devices(path: &Path) -> Result<Vec<DeviceRecord>, LoadError> {
    let mut reader = open_reader(path)?;
    let columns = header_positions(path, &mut reader)?;
    require_column(path, &columns, DEVICE_KEY_COLUMN)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(DeviceRecord {
            device_id: cell(&row, &columns, DEVICE_KEY_COLUMN).unwrap_or_default(),
            batch_id: cell(&row, &columns, BATCH_KEY_COLUMN),
            factory_id: cell(&row, &columns, "Factory Id"),
            factory_location: cell(&row, &columns, "Factory Location"),
            shift: cell(&row, &columns, "Shift"),
            machine1: cell(&row, &columns, "Machine1"),
            machine1_time: cell(&row, &columns, "Machine1 Time"),
            machine2: cell(&row, &columns, "Machine2"),
            machine2_time: cell(&row, &columns, "Machine2 Time"),
            machine3: cell(&row, &columns, "Machine3"),
            machine3_time: cell(&row, &columns, "Machine3 Time"),
        });
    }
    debug!("Loaded {} device rows from {}", records.len(), path.display());
    Ok(records)
}

fn load_batches(path: &Path) -> Result<Vec<BatchRecord>, LoadError> {
    let mut reader = open_reader(path)?;
    let columns = header_positions(path, &mut reader)?;
    require_column(path, &columns, BATCH_KEY_COLUMN)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(BatchRecord {
            batch_id: cell(&row, &columns, BATCH_KEY_COLUMN).unwrap_or_default(),
            alcohol_content: cell(&row, &columns, "Alcohol Content"),
            microbial_efficacy: cell(&row, &columns, "Microbial Efficacy"),
            rohs: cell(&row, &columns, "RoHS"),
            quality_manager: cell(&row, &columns, "Quality Manager"),
            tool_operator: cell(&row, &columns, "Tool Operator"),
            manufacturing_date: cell(&row, &columns, "Manufacturing Date"),
            expiry_date: cell(&row, &columns, "EXPIRY DATE"),
        });
    }
    debug!("Loaded {} batch rows from {}", records.len(), path.display());
    Ok(records)
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
}

fn header_positions(
    path: &Path,
    reader: &mut csv::Reader<File>,
) -> Result<HashMap<String, usize>, LoadError> {
    let headers = reader.headers().map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(headers
        .iter()
        .enumerate()
        .map(|(position, name)| (name.trim().to_string(), position))
        .collect())
}

fn require_column(
    path: &Path,
    columns: &HashMap<String, usize>,
    column: &str,
) -> Result<(), LoadError> {
    if !columns.contains_key(column) {
        return Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        });
    }
    Ok(())
}

fn cell(row: &StringRecord, columns: &HashMap<String, usize>, column: &str) -> Option<String> {
    columns
        .get(column)
        .and_then(|&position| row.get(position))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
