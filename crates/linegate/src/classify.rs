//! Accept/reject decision rule.

use chrono::Local;
use linegate_protocol::{Decision, DecisionTag};
use linegate_reference::ReferenceIndex;

/// Compliance flag value that admits a unit. Compared case-insensitively;
/// every other value (including the fail-closed default) rejects.
const COMPLIANT_FLAG: &str = "safe";

/// Classify one scanned code against the reference index.
///
/// Pure over already-loaded state plus the wall clock: no I/O, no retries.
/// An unknown code yields `Unresolved` - the caller still signals a reject
/// to the actuator, but no audit row is produced for it.
pub fn classify(code: &str, index: &ReferenceIndex) -> Decision {
    let Some(device) = index.lookup(code) else {
        return Decision {
            tag: DecisionTag::Unresolved,
            device: None,
            batch: None,
            status: None,
            timestamp: Local::now(),
        };
    };

    let batch_id = device.batch_id.as_deref().unwrap_or_default().trim();
    let batch = index.batch_info(batch_id).cloned();
    let status = index.compliance_of(batch_id);

    let tag = if status.eq_ignore_ascii_case(COMPLIANT_FLAG) {
        DecisionTag::Accepted
    } else {
        DecisionTag::Rejected
    };

    Decision {
        tag,
        device: Some(device.clone()),
        batch,
        status: Some(status.to_string()),
        timestamp: Local::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linegate_protocol::{BatchRecord, DeviceRecord};

    fn device(id: &str, batch: &str) -> DeviceRecord {
        DeviceRecord {
            device_id: id.to_string(),
            batch_id: Some(batch.to_string()),
            factory_id: None,
            factory_location: None,
            shift: None,
            machine1: None,
            machine1_time: None,
            machine2: None,
            machine2_time: None,
            machine3: None,
            machine3_time: None,
        }
    }

    fn batch(id: &str, rohs: Option<&str>) -> BatchRecord {
        BatchRecord {
            batch_id: id.to_string(),
            alcohol_content: None,
            microbial_efficacy: None,
            rohs: rohs.map(str::to_string),
            quality_manager: None,
            tool_operator: None,
            manufacturing_date: None,
            expiry_date: None,
        }
    }

    fn index(rohs: Option<&str>) -> ReferenceIndex {
        ReferenceIndex::from_records(
            vec![device("DEV001", "B1")],
            vec![batch("B1", rohs)],
        )
    }

    #[test]
    fn test_safe_batch_is_accepted() {
        let decision = classify("DEV001", &index(Some("Safe")));
        assert_eq!(decision.tag, DecisionTag::Accepted);
        assert_eq!(decision.status.as_deref(), Some("Safe"));
        assert_eq!(
            decision.device.as_ref().map(|d| d.device_id.as_str()),
            Some("DEV001")
        );
        assert!(decision.batch.is_some());
    }

    #[test]
    fn test_compliance_comparison_ignores_case() {
        assert_eq!(classify("DEV001", &index(Some("SAFE"))).tag, DecisionTag::Accepted);
        assert_eq!(classify("DEV001", &index(Some("sAfE"))).tag, DecisionTag::Accepted);
    }

    #[test]
    fn test_unsafe_batch_is_rejected() {
        let decision = classify("DEV001", &index(Some("Not Safe")));
        assert_eq!(decision.tag, DecisionTag::Rejected);
        assert_eq!(decision.status.as_deref(), Some("Not Safe"));
    }

    #[test]
    fn test_missing_compliance_rejects_by_default() {
        let decision = classify("DEV001", &index(None));
        assert_eq!(decision.tag, DecisionTag::Rejected);
        assert_eq!(decision.status.as_deref(), Some("Not Safe"));
        // The batch record itself still resolves.
        assert!(decision.batch.is_some());
    }

    #[test]
    fn test_unknown_device_is_unresolved() {
        let decision = classify("DEV999", &index(Some("Safe")));
        assert_eq!(decision.tag, DecisionTag::Unresolved);
        assert!(decision.device.is_none());
        assert!(decision.batch.is_none());
        assert!(decision.status.is_none());
    }

    #[test]
    fn test_device_without_batch_link_rejects() {
        let orphan = DeviceRecord {
            batch_id: None,
            ..device("DEV010", "unused")
        };
        let idx = ReferenceIndex::from_records(vec![orphan], Vec::new());
        let decision = classify("DEV010", &idx);
        assert_eq!(decision.tag, DecisionTag::Rejected);
        assert!(decision.batch.is_none());
    }
}
