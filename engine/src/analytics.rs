use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use common::{
    AadGroup, AppRegistration, Capability, ExistingGroup, MembershipRecord, ServiceAccount,
};
use log::info;
use regex::Regex;
use serde::Serialize;

use crate::client::TargetClient;

static EMAIL_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*@.*\..*$").expect("email pattern is valid"));

/// Whether a principal name looks like a user mailbox rather than an app.
pub fn is_email_like(name: &str) -> bool {
    EMAIL_LIKE.is_match(name)
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub name: String,
    pub id: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountWithGroups {
    pub name: String,
    pub id: i64,
    pub groups: Vec<i64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub name: String,
    pub capabilities: Vec<Capability>,
    pub source_id: Option<String>,
    pub id: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LinkedGroup {
    pub id: i64,
    pub name: String,
    pub capabilities: Vec<Capability>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePair {
    pub group1: GroupRef,
    pub group2: GroupRef,
}

/// Every classification bucket computed from one snapshot of CDF.
#[derive(Debug, Default, Clone)]
pub struct IamReport {
    pub total_service_accounts: usize,
    pub total_groups: usize,
    pub sa_with_groups: Vec<AccountWithGroups>,
    pub sa_without_groups: Vec<AccountRef>,
    pub sa_with_emails: Vec<AccountRef>,
    pub sa_without_emails: Vec<AccountRef>,
    pub groups_with_source_ids: Vec<GroupSummary>,
    pub groups_without_capabilities: Vec<GroupSummary>,
    pub groups_with_capabilities: Vec<GroupSummary>,
    pub groups_with_sa: Vec<LinkedGroup>,
    pub groups_without_sa: Vec<GroupRef>,
    pub duplicate_capabilities: Vec<DuplicatePair>,
    pub groups_can_be_merged: Vec<Vec<i64>>,
}

/// Lists every group and service account and classifies them.
pub async fn fetch_report<C: TargetClient>(client: &C) -> Result<IamReport> {
    let groups = client
        .list_groups(true)
        .await
        .context("listing groups")?;
    let accounts = client
        .list_service_accounts()
        .await
        .context("listing service accounts")?;
    info!(
        "Classifying {} groups and {} service accounts",
        groups.len(),
        accounts.len()
    );
    Ok(IamReport::build(&groups, &accounts))
}

impl IamReport {
    pub fn build(groups: &[ExistingGroup], accounts: &[ServiceAccount]) -> Self {
        let mut report = IamReport {
            total_service_accounts: accounts.len(),
            total_groups: groups.len(),
            ..Default::default()
        };

        for sa in accounts {
            let account = AccountRef {
                name: sa.name.clone(),
                id: sa.id,
            };
            if is_email_like(&sa.name) {
                report.sa_with_emails.push(account.clone());
            } else {
                report.sa_without_emails.push(account.clone());
            }

            if sa.groups.is_empty() {
                report.sa_without_groups.push(account);
            } else {
                report.sa_with_groups.push(AccountWithGroups {
                    name: sa.name.clone(),
                    id: sa.id,
                    groups: sa.groups.clone(),
                });
            }
        }

        for group in groups {
            let summary = GroupSummary {
                name: group.name.clone(),
                capabilities: group.capabilities.clone(),
                source_id: group.source_id.clone(),
                id: group.id,
            };
            if group.source_id().is_some() {
                report.groups_with_source_ids.push(summary.clone());
            }
            if group.capabilities.is_empty() {
                report.groups_without_capabilities.push(summary);
            } else {
                report.groups_with_capabilities.push(summary);
            }

            if accounts.iter().any(|sa| sa.groups.contains(&group.id)) {
                report.groups_with_sa.push(LinkedGroup {
                    id: group.id,
                    name: group.name.clone(),
                    capabilities: group.capabilities.clone(),
                });
            } else {
                report.groups_without_sa.push(GroupRef {
                    id: group.id,
                    name: group.name.clone(),
                });
            }
        }

        report.duplicate_capabilities = duplicate_capability_pairs(groups);
        report.groups_can_be_merged = mergeable_group_sets(accounts);
        report
    }
}

/// Pairs of distinct groups with the same capability entries, each pair
/// once, in the orientation first seen.
///
/// Entries are paired one to one and must be identical, action order
/// included; [`crate::compare::equivalent`] is not used. Two groups without
/// capabilities count as duplicates.
pub fn duplicate_capability_pairs(groups: &[ExistingGroup]) -> Vec<DuplicatePair> {
    let mut pairs = Vec::new();
    let mut seen: HashSet<(i64, i64)> = HashSet::new();

    for a in groups {
        for b in groups {
            if a.id == b.id || !same_entries(&a.capabilities, &b.capabilities) {
                continue;
            }
            if seen.contains(&(b.id, a.id)) || !seen.insert((a.id, b.id)) {
                continue;
            }
            pairs.push(DuplicatePair {
                group1: GroupRef { id: a.id, name: a.name.clone() },
                group2: GroupRef { id: b.id, name: b.name.clone() },
            });
        }
    }
    pairs
}

fn same_entries(a: &[Capability], b: &[Capability]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut unpaired: Vec<&Capability> = b.iter().collect();
    for entry in a {
        match unpaired.iter().position(|candidate| *candidate == entry) {
            Some(i) => {
                unpaired.swap_remove(i);
            }
            None => return false,
        }
    }
    true
}

/// Group sets shared by two service accounts (at least two groups) that a
/// third account's memberships also fully contain. Each set is sorted and
/// reported once.
pub fn mergeable_group_sets(accounts: &[ServiceAccount]) -> Vec<Vec<i64>> {
    let memberships: Vec<BTreeSet<i64>> = accounts
        .iter()
        .map(|sa| sa.groups.iter().copied().collect())
        .collect();
    let mut found: BTreeSet<Vec<i64>> = BTreeSet::new();

    for (i, first) in memberships.iter().enumerate() {
        for (j, second) in memberships.iter().enumerate().skip(i + 1) {
            if accounts[i].id == accounts[j].id {
                continue;
            }
            let common: BTreeSet<i64> = first.intersection(second).copied().collect();
            if common.len() < 2 {
                continue;
            }
            let used_elsewhere = memberships.iter().enumerate().any(|(k, other)| {
                k != i
                    && k != j
                    && accounts[k].id != accounts[i].id
                    && accounts[k].id != accounts[j].id
                    && common.is_subset(other)
            });
            if used_elsewhere {
                found.insert(common.into_iter().collect());
            }
        }
    }
    found.into_iter().collect()
}

/// Input files for the Azure AD provisioning scripts, derived from a report.
#[derive(Debug, Default, Clone)]
pub struct SourceDocuments {
    pub app_registrations: Vec<AppRegistration>,
    pub aad_groups: Vec<AadGroup>,
    pub memberships_apps: Vec<MembershipRecord>,
    pub memberships_users: Vec<MembershipRecord>,
}

impl SourceDocuments {
    pub fn from_report(report: &IamReport) -> Self {
        let app_registrations = report
            .sa_without_emails
            .iter()
            .map(|sa| AppRegistration {
                app_name: sa.name.clone(),
            })
            .collect();

        let aad_groups = report
            .groups_with_sa
            .iter()
            .map(|g| AadGroup {
                group: g.name.clone(),
                cdf_alias: g.name.clone(),
                capabilities: g.capabilities.clone(),
            })
            .collect();

        let mut memberships_apps = Vec::new();
        let mut memberships_users = Vec::new();
        for sa in &report.sa_with_groups {
            let groups: Vec<String> = sa
                .groups
                .iter()
                .flat_map(|id| {
                    report
                        .groups_with_sa
                        .iter()
                        .filter(move |g| g.id == *id)
                        .map(|g| g.name.clone())
                })
                .collect();
            if is_email_like(&sa.name) {
                memberships_users.push(MembershipRecord::for_user(sa.name.clone(), groups));
            } else {
                memberships_apps.push(MembershipRecord::for_app(sa.name.clone(), groups));
            }
        }

        Self {
            app_registrations,
            aad_groups,
            memberships_apps,
            memberships_users,
        }
    }
}
