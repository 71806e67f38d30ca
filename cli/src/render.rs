use std::path::{Path, PathBuf};

use colored::*;
use engine::{IamReport, Ledger, MembershipValidation, Status};

const STATUSES: [Status; 10] = [
    Status::Created,
    Status::Recreated,
    Status::AlreadyExists,
    Status::CreatedOldNotDeleted,
    Status::SkippedNotCreated,
    Status::SkippedCapabilityMismatch,
    Status::SkippedSourceIdNotUpdated,
    Status::SkippedSourceIdMismatch,
    Status::SkippedMissingDataset,
    Status::SkippedAmbiguousName,
];

fn status_color(status: Status) -> Color {
    match status {
        Status::Created | Status::Recreated => Color::Green,
        Status::AlreadyExists => Color::Blue,
        Status::CreatedOldNotDeleted => Color::Red,
        _ => Color::Yellow,
    }
}

pub fn ledger_summary(ledger: &Ledger, path: &Path) {
    println!("\n{}", "Reconciliation summary".bright_cyan().bold());
    for status in STATUSES {
        let count = ledger.count(status);
        if count == 0 {
            continue;
        }
        println!(
            "  {:34} {}",
            status.as_str().color(status_color(status)),
            count.to_string().bold()
        );
    }
    println!("  {:34} {}", "total".dimmed(), ledger.len());
    println!("{} {}\n", "Ledger written to".dimmed(), path.display());
}

pub fn report_summary(report: &IamReport, written: &[PathBuf]) {
    println!("\n{}", "IAM report".bright_cyan().bold());
    println!("  {:32} {}", "Service accounts:", report.total_service_accounts);
    println!("  {:32} {}", "  with groups:", report.sa_with_groups.len());
    println!("  {:32} {}", "  without groups:", report.sa_without_groups.len());
    println!("  {:32} {}", "  email-like names:", report.sa_with_emails.len());
    println!("  {:32} {}", "Groups:", report.total_groups);
    println!("  {:32} {}", "  with source ids:", report.groups_with_source_ids.len());
    println!("  {:32} {}", "  without capabilities:", report.groups_without_capabilities.len());
    println!("  {:32} {}", "  without service accounts:", report.groups_without_sa.len());

    let duplicates = report.duplicate_capabilities.len();
    let line = format!("  {:32} {}", "Duplicate capability pairs:", duplicates);
    if duplicates > 0 {
        println!("{}", line.yellow());
        for pair in &report.duplicate_capabilities {
            println!(
                "    {} ({}) = {} ({})",
                pair.group1.name, pair.group1.id, pair.group2.name, pair.group2.id
            );
        }
    } else {
        println!("{}", line);
    }

    for set in &report.groups_can_be_merged {
        println!("  {} {:?}", "Mergeable group set:".yellow(), set);
    }
    println!("{} {} files\n", "Wrote".dimmed(), written.len());
}

pub fn validation(result: &MembershipValidation) {
    println!("\n{}", "Membership validation".bright_cyan().bold());
    if result.memberships_valid() {
        println!("  {}", "✓ All memberships reference known apps and groups".bright_green());
    } else {
        findings("Unknown service principals", &result.invalid_apps);
        findings("Unknown groups", &result.invalid_groups);
    }

    if result.duplicate_groups.is_empty() {
        println!("  {}", "✓ No case-insensitive duplicate group names".bright_green());
    } else {
        findings("Group names differing only by case", &result.duplicate_groups);
    }
    println!();
}

fn findings(title: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("  {} ({})", title.red().bold(), names.len());
    for name in names {
        println!("    - {}", name);
    }
}
