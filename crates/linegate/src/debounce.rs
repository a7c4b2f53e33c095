//! Duplicate-scan suppression.

use std::time::{Duration, Instant};

/// Suppresses reprocessing of a code that re-appears in consecutive frames.
///
/// The gate is per-value: a code different from the last accepted one is
/// always processed, cooldown or not. Only accepted attempts advance the
/// window - a suppressed read leaves state untouched, so a unit held in
/// front of the camera is reprocessed once per cooldown, not never.
///
/// State is single-threaded; the pipeline task is the only caller.
#[derive(Debug)]
pub struct Debouncer {
    cooldown: Duration,
    last_code: Option<String>,
    last_seen_at: Option<Instant>,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_code: None,
            last_seen_at: None,
        }
    }

    /// True when the code should be processed; false to suppress.
    pub fn should_process(&mut self, code: &str, now: Instant) -> bool {
        let repeated = self.last_code.as_deref() == Some(code);
        let within_cooldown = self
            .last_seen_at
            .is_some_and(|seen| now.duration_since(seen) <= self.cooldown);

        if repeated && within_cooldown {
            return false;
        }

        self.last_code = Some(code.to_string());
        self.last_seen_at = Some(now);
        true
    }
}
