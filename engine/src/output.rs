use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::analytics::{IamReport, SourceDocuments};
use crate::ledger::Ledger;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Writes `value` as JSON indented by four spaces.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(BufWriter::new(file), formatter);
    value
        .serialize(&mut ser)
        .with_context(|| format!("writing {}", path.display()))?;
    ser.into_inner().flush()?;
    Ok(())
}

pub fn ledger_file_name(at: DateTime<Utc>) -> String {
    format!("CDF_Group_Report_{}.csv", at.format("%b_%d_%y_%H-%M-%S"))
}

/// Writes the ledger into `dir` and returns the file path.
pub fn write_ledger(dir: &Path, ledger: &Ledger, at: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(ledger_file_name(at));
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    ledger
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Ledger with {} rows written to {}", ledger.len(), path.display());
    Ok(path)
}

/// Writes one document per report bucket into `dir`.
pub fn write_report(dir: &Path, report: &IamReport) -> Result<Vec<PathBuf>> {
    let files = [
        ("sa_with_groups.json", serde_json::to_value(&report.sa_with_groups)?),
        ("sa_without_groups.json", serde_json::to_value(&report.sa_without_groups)?),
        ("sa_with_emails.json", serde_json::to_value(&report.sa_with_emails)?),
        ("sa_without_emails.json", serde_json::to_value(&report.sa_without_emails)?),
        ("groups_with_source_ids.json", serde_json::to_value(&report.groups_with_source_ids)?),
        (
            "groups_without_capabilities.json",
            serde_json::to_value(&report.groups_without_capabilities)?,
        ),
        ("groups_with_capabilities.json", serde_json::to_value(&report.groups_with_capabilities)?),
        ("groups_with_sa.json", serde_json::to_value(&report.groups_with_sa)?),
        ("groups_without_sa.json", serde_json::to_value(&report.groups_without_sa)?),
        ("groups_can_be_merged.json", serde_json::to_value(&report.groups_can_be_merged)?),
        (
            "groups_with_duplicate_capabilities.json",
            serde_json::to_value(&report.duplicate_capabilities)?,
        ),
    ];
    let written = write_documents(dir, files)?;
    info!("Wrote {} IAM documents to {}", written.len(), dir.display());
    Ok(written)
}

/// Writes the provisioning inputs derived from a report into `dir`.
pub fn write_source_documents(dir: &Path, docs: &SourceDocuments) -> Result<Vec<PathBuf>> {
    let files = [
        ("APP_Registrations.json", serde_json::to_value(&docs.app_registrations)?),
        ("AAD_Groups.json", serde_json::to_value(&docs.aad_groups)?),
        ("AAD_Group_Memberships_Apps.json", serde_json::to_value(&docs.memberships_apps)?),
        ("AAD_Group_Memberships_Users.json", serde_json::to_value(&docs.memberships_users)?),
    ];
    let written = write_documents(dir, files)?;
    info!("Wrote {} source documents to {}", written.len(), dir.display());
    Ok(written)
}

fn write_documents<'a>(
    dir: &Path,
    files: impl IntoIterator<Item = (&'a str, Value)>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (name, value) in files {
        let path = dir.join(name);
        write_json(&path, &value)?;
        written.push(path);
    }
    Ok(written)
}
