//! Fixed audit-row schema for the accepted and rejected streams.

use crate::types::Decision;

/// Sentinel rendered for any field the source records do not carry.
pub const MISSING_FIELD: &str = "N/A";

/// Wall-clock format of the audit timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column headers of both audit streams, in write order.
pub const AUDIT_COLUMNS: [&str; 19] = [
    "Timestamp",
    "Batch Id",
    "Device ID",
    "Factory Id",
    "Factory Location",
    "Shift",
    "Machine1",
    "Machine1 Time",
    "Machine2",
    "Machine2 Time",
    "Machine3",
    "Machine3 Time",
    "Alcohol Content",
    "Microbial Efficacy",
    "RoHS",
    "Quality Manager",
    "Tool Operator",
    "Manufacturing Date",
    "EXPIRY DATE",
];

/// One fully rendered audit row: every column present, missing source
/// fields already substituted with [`MISSING_FIELD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    fields: [String; 19],
}

impl AuditRow {
    pub fn from_decision(decision: &Decision) -> Self {
        let device = decision.device.as_ref();
        let batch = decision.batch.as_ref();

        let fields = [
            decision.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            field(device.and_then(|d| d.batch_id.as_deref())),
            field(device.map(|d| d.device_id.as_str())),
            field(device.and_then(|d| d.factory_id.as_deref())),
            field(device.and_then(|d| d.factory_location.as_deref())),
            field(device.and_then(|d| d.shift.as_deref())),
            field(device.and_then(|d| d.machine1.as_deref())),
            field(device.and_then(|d| d.machine1_time.as_deref())),
            field(device.and_then(|d| d.machine2.as_deref())),
            field(device.and_then(|d| d.machine2_time.as_deref())),
            field(device.and_then(|d| d.machine3.as_deref())),
            field(device.and_then(|d| d.machine3_time.as_deref())),
            field(batch.and_then(|b| b.alcohol_content.as_deref())),
            field(batch.and_then(|b| b.microbial_efficacy.as_deref())),
            field(batch.and_then(|b| b.rohs.as_deref())),
            field(batch.and_then(|b| b.quality_manager.as_deref())),
            field(batch.and_then(|b| b.tool_operator.as_deref())),
            field(batch.and_then(|b| b.manufacturing_date.as_deref())),
            field(batch.and_then(|b| b.expiry_date.as_deref())),
        ];

        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

fn field(value: Option<&str>) -> String {
    value.map(str::to_string).unwrap_or_else(|| MISSING_FIELD.to_string())
}
