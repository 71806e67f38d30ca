use std::fmt;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const LEDGER_HEADER: [&str; 6] = [
    "group-name",
    "group_id",
    "status",
    "mode",
    "source-id",
    "timestamp(UTC)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Batch,
    Interactive,
}

impl RunMode {
    pub fn from_batch(batch: bool) -> Self {
        if batch {
            RunMode::Batch
        } else {
            RunMode::Interactive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Batch => "batch",
            RunMode::Interactive => "interactive",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome for one desired group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Created,
    Recreated,
    AlreadyExists,
    SkippedNotCreated,
    SkippedCapabilityMismatch,
    SkippedSourceIdNotUpdated,
    SkippedSourceIdMismatch,
    SkippedMissingDataset,
    SkippedAmbiguousName,
    /// The replacement group was created but removing the old one failed.
    CreatedOldNotDeleted,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Recreated => "recreated",
            Status::AlreadyExists => "already-exists (verified)",
            Status::SkippedNotCreated => "skipped (not created)",
            Status::SkippedCapabilityMismatch => "skipped (capability mismatch)",
            Status::SkippedSourceIdNotUpdated => "skipped (source id not updated)",
            Status::SkippedSourceIdMismatch => "skipped (source id mismatch)",
            Status::SkippedMissingDataset => "skipped (missing dataset)",
            Status::SkippedAmbiguousName => "skipped (ambiguous name)",
            Status::CreatedOldNotDeleted => "created (old group not deleted)",
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Status::SkippedNotCreated
                | Status::SkippedCapabilityMismatch
                | Status::SkippedSourceIdNotUpdated
                | Status::SkippedSourceIdMismatch
                | Status::SkippedMissingDataset
                | Status::SkippedAmbiguousName
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub group_name: String,
    pub group_id: Option<i64>,
    pub status: Status,
    pub mode: RunMode,
    pub source_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct LedgerRow<'a> {
    group_name: &'a str,
    group_id: String,
    status: &'static str,
    mode: &'static str,
    source_id: &'a str,
    timestamp: String,
}

impl<'a> From<&'a AuditRecord> for LedgerRow<'a> {
    fn from(record: &'a AuditRecord) -> Self {
        Self {
            group_name: &record.group_name,
            group_id: record
                .group_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            status: record.status.as_str(),
            mode: record.mode.as_str(),
            source_id: record.source_id.as_deref().filter(|s| !s.is_empty()).unwrap_or("-"),
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Append-only list of audit records, in processing order.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    records: Vec<AuditRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AuditRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count(&self, status: Status) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Writes the header and one row per record.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(LEDGER_HEADER)?;
        for record in &self.records {
            wtr.serialize(LedgerRow::from(record))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
