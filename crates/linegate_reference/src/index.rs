use linegate_protocol::{BatchRecord, DeviceRecord};
use std::collections::HashMap;

/// Compliance flag assumed when a batch has no recorded RoHS value.
///
/// Fail-closed: absence of evidence is treated the same as explicit
/// non-compliance, so an unknown batch can never pass the gate.
pub const DEFAULT_COMPLIANCE: &str = "Not Safe";

/// Joined, read-only view over the device and batch reference tables.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    devices: HashMap<String, DeviceRecord>,
    batches: HashMap<String, BatchRecord>,
    /// Batch id -> trimmed RoHS flag, for O(1) decision lookups. Only
    /// batches with a non-empty flag are present.
    compliance: HashMap<String, String>,
}

impl ReferenceIndex {
    /// Build the index from already-parsed records.
    ///
    /// Records whose key is empty or all-whitespace are excluded - never
    /// indexed, never a build failure.
    pub fn from_records(devices: Vec<DeviceRecord>, batches: Vec<BatchRecord>) -> Self {
        let mut index = Self::default();

        for device in devices {
            let key = device.device_id.trim();
            if key.is_empty() {
                continue;
            }
            index.devices.insert(key.to_string(), device);
        }

        for batch in batches {
            let key = batch.batch_id.trim();
            if key.is_empty() {
                continue;
            }
            if let Some(rohs) = batch.rohs.as_deref() {
                let rohs = rohs.trim();
                if !rohs.is_empty() {
                    index.compliance.insert(key.to_string(), rohs.to_string());
                }
            }
            index.batches.insert(key.to_string(), batch);
        }

        index
    }

    pub fn lookup(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.devices.get(device_id.trim())
    }

    pub fn batch_info(&self, batch_id: &str) -> Option<&BatchRecord> {
        self.batches.get(batch_id.trim())
    }

    /// The compliance flag for a batch, or [`DEFAULT_COMPLIANCE`] when the
    /// batch is unknown or carries no flag.
    pub fn compliance_of(&self, batch_id: &str) -> &str {
        self.compliance
            .get(batch_id.trim())
            .map(String::as_str)
            .unwrap_or(DEFAULT_COMPLIANCE)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}
