//! Scan, record, and decision types.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// One row from the device reference table.
///
/// The serde field names match the source table's column headers; the same
/// names appear in the actuator payload so downstream tooling sees the
/// records exactly as the reference data spells them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "Device ID")]
    pub device_id: String,
    #[serde(rename = "Batch Id")]
    pub batch_id: Option<String>,
    #[serde(rename = "Factory Id")]
    pub factory_id: Option<String>,
    #[serde(rename = "Factory Location")]
    pub factory_location: Option<String>,
    #[serde(rename = "Shift")]
    pub shift: Option<String>,
    #[serde(rename = "Machine1")]
    pub machine1: Option<String>,
    #[serde(rename = "Machine1 Time")]
    pub machine1_time: Option<String>,
    #[serde(rename = "Machine2")]
    pub machine2: Option<String>,
    #[serde(rename = "Machine2 Time")]
    pub machine2_time: Option<String>,
    #[serde(rename = "Machine3")]
    pub machine3: Option<String>,
    #[serde(rename = "Machine3 Time")]
    pub machine3_time: Option<String>,
}

/// One row from the batch quality reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    #[serde(rename = "Batch Id")]
    pub batch_id: String,
    #[serde(rename = "Alcohol Content")]
    pub alcohol_content: Option<String>,
    #[serde(rename = "Microbial Efficacy")]
    pub microbial_efficacy: Option<String>,
    #[serde(rename = "RoHS")]
    pub rohs: Option<String>,
    #[serde(rename = "Quality Manager")]
    pub quality_manager: Option<String>,
    #[serde(rename = "Tool Operator")]
    pub tool_operator: Option<String>,
    #[serde(rename = "Manufacturing Date")]
    pub manufacturing_date: Option<String>,
    #[serde(rename = "EXPIRY DATE")]
    pub expiry_date: Option<String>,
}

/// One decoded symbology payload pulled from the acquisition feed.
///
/// Transient: produced once per decoded frame, consumed immediately by the
/// pipeline. The arrival instant drives the debounce window.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub code: String,
    pub seen_at: Instant,
}

impl ScanEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self::at(code, Instant::now())
    }

    pub fn at(code: impl Into<String>, seen_at: Instant) -> Self {
        Self {
            code: code.into(),
            seen_at,
        }
    }
}

/// Outcome of classifying one scanned unit.
/// This is the CANONICAL definition - use this everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionTag {
    /// Unit is compliant and may pass the gate
    Accepted,
    /// Unit is non-compliant and must be diverted
    Rejected,
    /// Scanned identifier has no device record
    Unresolved,
}

impl DecisionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionTag::Accepted => "accepted",
            DecisionTag::Rejected => "rejected",
            DecisionTag::Unresolved => "unresolved",
        }
    }

    /// The signal sent to the actuator. An unresolved scan signals reject:
    /// a device the line does not recognize is never waved through.
    pub fn actuator_status(&self) -> &'static str {
        match self {
            DecisionTag::Accepted => "accepted",
            DecisionTag::Rejected | DecisionTag::Unresolved => "rejected",
        }
    }
}

impl fmt::Display for DecisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DecisionTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accepted" => Ok(DecisionTag::Accepted),
            "rejected" => Ok(DecisionTag::Rejected),
            "unresolved" => Ok(DecisionTag::Unresolved),
            _ => Err(format!(
                "Invalid decision tag: '{}'. Expected: accepted, rejected, or unresolved",
                s
            )),
        }
    }
}

/// A classified scan: the tag plus everything resolved on the way there.
///
/// Lives for one processing cycle; the audit row and actuator payload are
/// both derived from it.
#[derive(Debug, Clone)]
pub struct Decision {
    pub tag: DecisionTag,
    /// Resolved device record; absent for unresolved scans.
    pub device: Option<DeviceRecord>,
    /// Resolved batch record; absent when the device or its batch is unknown.
    pub batch: Option<BatchRecord>,
    /// Compliance flag the decision was made on; absent for unresolved scans.
    pub status: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        self.tag == DecisionTag::Accepted
    }
}

/// JSON body POSTed to the actuator endpoint.
///
/// `details` carries the full device record for accepted units, device plus
/// batch context for rejected units, and is omitted entirely for unresolved
/// scans (the identifier is the whole story).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictPayload {
    pub status: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl VerdictPayload {
    pub fn from_decision(code: &str, decision: &Decision) -> Self {
        let details = match decision.tag {
            DecisionTag::Accepted => decision
                .device
                .as_ref()
                .map(|device| serde_json::to_value(device).unwrap_or(Value::Null)),
            DecisionTag::Rejected => {
                let batch_info = match &decision.batch {
                    Some(batch) => serde_json::to_value(batch).unwrap_or(Value::Null),
                    None => json!({}),
                };
                Some(json!({
                    "Device Info": decision.device,
                    "Batch Info": batch_info,
                }))
            }
            DecisionTag::Unresolved => None,
        };
        Self {
            status: decision.tag.actuator_status().to_string(),
            device_id: code.to_string(),
            details,
        }
    }
}
