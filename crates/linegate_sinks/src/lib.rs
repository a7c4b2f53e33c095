//! Audit stream writers for accepted and rejected scan decisions.
//!
//! Each stream is an append-only CSV file carrying the fixed 19-column
//! schema from `linegate_protocol::audit`. Streams are created lazily: the
//! file (and its header row) appears on the first append, so a run that
//! never rejects a unit never creates a rejected stream.
//!
//! Sinks handle:
//! - File management (lazy create, append mode, parent directories)
//! - Header setup on new/empty files
//! - Row writing with per-row flush

use linegate_protocol::{AuditRow, Decision, DecisionTag, AUDIT_COLUMNS};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by audit stream writes.
///
/// The pipeline logs these and keeps processing; an audit failure is never
/// allowed to stall the scan loop.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open audit stream {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to append to audit stream {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to flush audit stream {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Audit stream {path} writer state poisoned")]
    Poisoned { path: PathBuf },
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// The pair of audit streams a gate writes to.
///
/// `append` takes `&self`: each stream guards its writer with a mutex so
/// appends may be dispatched from spawned blocking tasks.
#[derive(Debug)]
pub struct AuditSink {
    accepted: AuditStream,
    rejected: AuditStream,
}

impl AuditSink {
    /// Cheap to construct; no file is touched until the first append.
    pub fn new(accepted_path: impl Into<PathBuf>, rejected_path: impl Into<PathBuf>) -> Self {
        Self {
            accepted: AuditStream::new(accepted_path.into()),
            rejected: AuditStream::new(rejected_path.into()),
        }
    }

    /// Append one audit row for the decision.
    ///
    /// Accepted and rejected decisions go to their respective streams.
    /// Unresolved decisions append nothing: there is no batch context to
    /// log meaningfully, and the actuator signal is the record of those.
    pub fn append(&self, decision: &Decision) -> SinkResult<()> {
        let stream = match decision.tag {
            DecisionTag::Accepted => &self.accepted,
            DecisionTag::Rejected => &self.rejected,
            DecisionTag::Unresolved => return Ok(()),
        };
        stream.append(&AuditRow::from_decision(decision))
    }

    pub fn accepted_path(&self) -> &Path {
        &self.accepted.path
    }

    pub fn rejected_path(&self) -> &Path {
        &self.rejected.path
    }
}

#[derive(Debug)]
struct AuditStream {
    path: PathBuf,
    writer: Mutex<Option<csv::Writer<File>>>,
}

impl AuditStream {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            writer: Mutex::new(None),
        }
    }

    fn append(&self, row: &AuditRow) -> SinkResult<()> {
        let mut guard = self.writer.lock().map_err(|_| SinkError::Poisoned {
            path: self.path.clone(),
        })?;

        match guard.as_mut() {
            Some(writer) => self.write_row(writer, row),
            None => {
                let mut writer = self.open()?;
                self.write_row(&mut writer, row)?;
                *guard = Some(writer);
                Ok(())
            }
        }
    }

    fn write_row(&self, writer: &mut csv::Writer<File>, row: &AuditRow) -> SinkResult<()> {
        writer
            .write_record(row.fields())
            .map_err(|source| SinkError::Append {
                path: self.path.clone(),
                source,
            })?;
        // Flush per row: the audit stream is the authoritative record, so a
        // decision must be durable before the write is reported done.
        writer.flush().map_err(|source| SinkError::Flush {
            path: self.path.clone(),
            source,
        })?;

        debug!("Appended audit row to {}", self.path.display());
        Ok(())
    }

    fn open(&self) -> SinkResult<csv::Writer<File>> {
        let open_err = |source| SinkError::Open {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(open_err)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(open_err)?;
        let needs_header = file.metadata().map_err(open_err)?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            info!("Initializing audit stream: {}", self.path.display());
            writer
                .write_record(AUDIT_COLUMNS)
                .map_err(|source| SinkError::Append {
                    path: self.path.clone(),
                    source,
                })?;
            writer.flush().map_err(|source| SinkError::Flush {
                path: self.path.clone(),
                source,
            })?;
        }

        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use linegate_protocol::{BatchRecord, DeviceRecord};
    use tempfile::tempdir;

    fn decision(tag: DecisionTag) -> Decision {
        let resolved = tag != DecisionTag::Unresolved;
        Decision {
            tag,
            device: resolved.then(|| DeviceRecord {
                device_id: "DEV001".to_string(),
                batch_id: Some("B1".to_string()),
                factory_id: None,
                factory_location: None,
                shift: None,
                machine1: None,
                machine1_time: None,
                machine2: None,
                machine2_time: None,
                machine3: None,
                machine3_time: None,
            }),
            batch: resolved.then(|| BatchRecord {
                batch_id: "B1".to_string(),
                alcohol_content: None,
                microbial_efficacy: None,
                rohs: Some("Safe".to_string()),
                quality_manager: None,
                tool_operator: None,
                manufacturing_date: None,
                expiry_date: None,
            }),
            status: resolved.then(|| "Safe".to_string()),
            timestamp: Local::now(),
        }
    }

    #[test]
    fn test_streams_are_created_lazily() {
        let dir = tempdir().unwrap();
        let accepted = dir.path().join("accepted.csv");
        let rejected = dir.path().join("rejected.csv");
        let sink = AuditSink::new(&accepted, &rejected);
        assert_eq!(sink.accepted_path(), accepted);
        assert_eq!(sink.rejected_path(), rejected);

        assert!(!accepted.exists());
        sink.append(&decision(DecisionTag::Accepted)).unwrap();
        assert!(accepted.exists());
        assert!(!rejected.exists());
    }

    #[test]
    fn test_unresolved_appends_nothing() {
        let dir = tempdir().unwrap();
        let accepted = dir.path().join("accepted.csv");
        let rejected = dir.path().join("rejected.csv");
        let sink = AuditSink::new(&accepted, &rejected);

        sink.append(&decision(DecisionTag::Unresolved)).unwrap();
        assert!(!accepted.exists());
        assert!(!rejected.exists());
    }

    #[test]
    fn test_rows_route_by_tag() {
        let dir = tempdir().unwrap();
        let accepted = dir.path().join("accepted.csv");
        let rejected = dir.path().join("rejected.csv");
        let sink = AuditSink::new(&accepted, &rejected);

        sink.append(&decision(DecisionTag::Accepted)).unwrap();
        sink.append(&decision(DecisionTag::Rejected)).unwrap();

        let accepted_rows = read_rows(&accepted);
        let rejected_rows = read_rows(&rejected);
        assert_eq!(accepted_rows.len(), 1);
        assert_eq!(rejected_rows.len(), 1);
        assert_eq!(accepted_rows[0].len(), AUDIT_COLUMNS.len());
        assert_eq!(accepted_rows[0][2], "DEV001");
    }

    #[test]
    fn test_header_written_once_across_reopen() {
        let dir = tempdir().unwrap();
        let accepted = dir.path().join("accepted.csv");
        let rejected = dir.path().join("rejected.csv");

        {
            let sink = AuditSink::new(&accepted, &rejected);
            sink.append(&decision(DecisionTag::Accepted)).unwrap();
        }
        {
            // A fresh sink over an existing stream must not repeat the header.
            let sink = AuditSink::new(&accepted, &rejected);
            sink.append(&decision(DecisionTag::Accepted)).unwrap();
        }

        let contents = fs::read_to_string(&accepted).unwrap();
        let header_lines = contents
            .lines()
            .filter(|line| line.starts_with("Timestamp,"))
            .count();
        assert_eq!(header_lines, 1);
        assert_eq!(read_rows(&accepted).len(), 2);
    }

    #[test]
    fn test_parent_directories_are_created() {
        let dir = tempdir().unwrap();
        let accepted = dir.path().join("audit/streams/accepted.csv");
        let rejected = dir.path().join("audit/streams/rejected.csv");
        let sink = AuditSink::new(&accepted, &rejected);

        sink.append(&decision(DecisionTag::Rejected)).unwrap();
        assert!(rejected.exists());
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            AUDIT_COLUMNS.to_vec()
        );
        reader
            .records()
            .map(|row| row.unwrap().iter().map(str::to_string).collect())
            .collect()
    }
}
