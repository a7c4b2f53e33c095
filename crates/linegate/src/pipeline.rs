//! Scan-event orchestration: debounce, resolve, classify, emit.

use crate::actuator::ActuatorNotifier;
use crate::classify;
use crate::debounce::Debouncer;
use linegate_protocol::{AuditRow, Decision, DecisionTag, ScanEvent, AUDIT_COLUMNS};
use linegate_reference::ReferenceIndex;
use linegate_sinks::AuditSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Minimum time before a repeated identical scan is reprocessed.
pub const SCAN_COOLDOWN: Duration = Duration::from_secs(3);

/// One scan's processing: debounce gate, reference lookup, decision, then
/// two dispatched side effects.
///
/// The index is read-only and shared; the debouncer is owned here and
/// mutated only by the task driving `submit`.
pub struct Pipeline {
    index: Arc<ReferenceIndex>,
    sink: Arc<AuditSink>,
    notifier: Option<Arc<ActuatorNotifier>>,
    debouncer: Debouncer,
}

/// A processed scan plus handles for its in-flight side effects.
///
/// The run loop drops the handles - audit and notification complete on
/// their own time and never stall the next frame. Tests await them.
pub struct ScanOutcome {
    decision: Decision,
    audit: JoinHandle<()>,
    notify: Option<JoinHandle<()>>,
}

impl ScanOutcome {
    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    /// Wait for both side effects to finish, then yield the decision.
    pub async fn settled(self) -> Decision {
        let _ = self.audit.await;
        if let Some(notify) = self.notify {
            let _ = notify.await;
        }
        self.decision
    }
}

impl Pipeline {
    pub fn new(
        index: Arc<ReferenceIndex>,
        sink: Arc<AuditSink>,
        notifier: Option<ActuatorNotifier>,
        cooldown: Duration,
    ) -> Self {
        Self {
            index,
            sink,
            notifier: notifier.map(Arc::new),
            debouncer: Debouncer::new(cooldown),
        }
    }

    /// Process one decoded payload.
    ///
    /// Returns `None` when the scan was suppressed (debounced or empty);
    /// otherwise the decision plus its side-effect handles. Side effects
    /// are dispatched concurrently with each other and with whatever the
    /// caller does next; each one logs and swallows its own failure.
    pub fn submit(&mut self, event: &ScanEvent) -> Option<ScanOutcome> {
        let code = event.code.trim();
        if code.is_empty() {
            return None;
        }
        if !self.debouncer.should_process(code, event.seen_at) {
            return None;
        }

        info!("Scanned: {}", code);
        let decision = classify::classify(code, &self.index);
        self.report(code, &decision);

        let audit = self.dispatch_audit(&decision);
        let notify = self.dispatch_notify(code, &decision);

        Some(ScanOutcome {
            decision,
            audit,
            notify,
        })
    }

    fn dispatch_audit(&self, decision: &Decision) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let decision = decision.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(err) = sink.append(&decision) {
                warn!("Could not append audit row: {}", err);
            }
        })
    }

    fn dispatch_notify(&self, code: &str, decision: &Decision) -> Option<JoinHandle<()>> {
        let notifier = Arc::clone(self.notifier.as_ref()?);
        let decision = decision.clone();
        let code = code.to_string();
        Some(tokio::spawn(async move {
            if let Err(err) = notifier.notify(&code, &decision).await {
                warn!("Actuator send error: {}", err);
            }
        }))
    }

    fn report(&self, code: &str, decision: &Decision) {
        match decision.tag {
            DecisionTag::Accepted => {
                let batch_id = decision
                    .device
                    .as_ref()
                    .and_then(|device| device.batch_id.as_deref())
                    .unwrap_or("-");
                info!(
                    "ACCEPTED {} (batch {}, RoHS {})",
                    code,
                    batch_id,
                    decision.status.as_deref().unwrap_or("-")
                );
            }
            DecisionTag::Rejected => {
                info!(
                    "REJECTED {} due to RoHS non-compliance (RoHS {})",
                    code,
                    decision.status.as_deref().unwrap_or("-")
                );
                let row = AuditRow::from_decision(decision);
                for (column, value) in AUDIT_COLUMNS.iter().zip(row.fields()) {
                    info!("  {}: {}", column, value);
                }
            }
            DecisionTag::Unresolved => {
                warn!("No match for device id {}", code);
            }
        }
    }
}
