use anyhow::{Context, Result};
use chrono::Utc;
use common::{
    DesiredGroup, DuplicateNamePolicy, ExistingGroup, NewGroup, ReconcileConfig, DATASET_SCOPE,
};
use log::{error, info, warn};
use thiserror::Error;

use crate::client::TargetClient;
use crate::compare::equivalent;
use crate::confirm::ConfirmationSource;
use crate::index::{GroupIndex, Lookup};
use crate::ledger::{AuditRecord, Ledger, RunMode, Status};

/// A run stopped by an unexpected failure.
#[derive(Debug, Error)]
#[error("reconciliation aborted after {} recorded group(s): {source}", .ledger.len())]
pub struct RunAborted {
    /// Records produced before the failure, including the failing group's
    /// record when one was written.
    pub ledger: Ledger,
    #[source]
    pub source: anyhow::Error,
}

enum ScopeResolution {
    Resolved,
    MissingDataset(i64),
}

pub struct Reconciler<'a, C, P> {
    client: &'a C,
    confirm: &'a mut P,
    mode: RunMode,
    duplicate_names: DuplicateNamePolicy,
}

impl<'a, C: TargetClient, P: ConfirmationSource> Reconciler<'a, C, P> {
    pub fn new(client: &'a C, confirm: &'a mut P, settings: &ReconcileConfig) -> Self {
        Self {
            client,
            confirm,
            mode: RunMode::from_batch(settings.batch),
            duplicate_names: settings.duplicate_names,
        }
    }

    /// Reconciles `desired` in order against the groups currently in CDF.
    pub async fn run(&mut self, desired: Vec<DesiredGroup>) -> Result<Ledger, RunAborted> {
        let mut ledger = Ledger::new();

        let existing = match self.client.list_groups(true).await {
            Ok(groups) => groups,
            Err(e) => {
                error!("Failed to list existing groups: {}", e);
                return Err(RunAborted {
                    ledger,
                    source: anyhow::Error::new(e).context("listing existing groups"),
                });
            }
        };
        let index = GroupIndex::build(existing);
        info!("Loaded {} existing groups", index.len());
        for (name, ids) in index.duplicate_names() {
            warn!("Group name {} is used by {} groups {:?}", name, ids.len(), ids);
        }

        for group in desired {
            let name = group.name.clone();
            if let Err(e) = self.reconcile_group(&index, group, &mut ledger).await {
                error!("Failed to reconcile group {}: {:#}", name, e);
                return Err(RunAborted {
                    ledger,
                    source: e.context(format!("reconciling group {}", name)),
                });
            }
        }

        Ok(ledger)
    }

    async fn reconcile_group(
        &mut self,
        index: &GroupIndex,
        mut group: DesiredGroup,
        ledger: &mut Ledger,
    ) -> Result<()> {
        match self.resolve_scopes(&mut group).await? {
            ScopeResolution::Resolved => {}
            ScopeResolution::MissingDataset(id) => {
                warn!("Dataset {} does not exist for group {}, skipped", id, group.name);
                let source_id = Some(group.source_id.clone());
                let record =
                    self.record(&group.name, None, Status::SkippedMissingDataset, source_id);
                ledger.push(record);
                return Ok(());
            }
        }

        match index.lookup(&group.name, self.duplicate_names) {
            Lookup::Missing => self.create_missing(&group, ledger).await,
            Lookup::Found(existing) => self.reconcile_existing(existing, &group, ledger).await,
            Lookup::Ambiguous(candidates) => {
                let ids: Vec<i64> = candidates.iter().map(|g| g.id).collect();
                warn!("Group {} matches several existing groups {:?}, skipped", group.name, ids);
                ledger.push(self.record(&group.name, None, Status::SkippedAmbiguousName, None));
                Ok(())
            }
        }
    }

    /// Replaces every data set id with the id CDF confirms, or reports the
    /// first one that does not exist. The group is only usable when resolved.
    async fn resolve_scopes(&self, group: &mut DesiredGroup) -> Result<ScopeResolution> {
        for capability in group.capabilities.iter_mut() {
            if capability.scope.kind != DATASET_SCOPE {
                continue;
            }
            let ids = capability
                .scope
                .ids()
                .with_context(|| format!("reading data set ids of {}", capability.acl))?;

            let mut confirmed = Vec::with_capacity(ids.len());
            for id in ids {
                match self.client.retrieve_dataset(id).await? {
                    Some(data_set) => confirmed.push(data_set.id),
                    None => return Ok(ScopeResolution::MissingDataset(id)),
                }
            }
            capability.scope = capability.scope.replace_ids(&confirmed);
        }
        Ok(ScopeResolution::Resolved)
    }

    async fn create_missing(&mut self, group: &DesiredGroup, ledger: &mut Ledger) -> Result<()> {
        let prompt = format!("Creating group: {} in CDF. Proceed?", group.name);
        if !self.confirm.confirm(&prompt)? {
            info!("Group {} not created", group.name);
            ledger.push(self.record(&group.name, None, Status::SkippedNotCreated, None));
            return Ok(());
        }

        let created = self.client.create_group(&NewGroup::from(group)).await?;
        info!("Group {} created with id {}", group.name, created.id);
        let source_id = created.source_id.clone();
        ledger.push(self.record(&group.name, Some(created.id), Status::Created, source_id));
        Ok(())
    }

    async fn reconcile_existing(
        &mut self,
        existing: &ExistingGroup,
        group: &DesiredGroup,
        ledger: &mut Ledger,
    ) -> Result<()> {
        let existing_source = existing.source_id.clone();

        if !equivalent(&existing.capabilities, &group.capabilities) {
            warn!("Existing group {} has different capabilities, skipped", group.name);
            ledger.push(self.record(
                &group.name,
                Some(existing.id),
                Status::SkippedCapabilityMismatch,
                existing_source,
            ));
            return Ok(());
        }

        match existing.source_id() {
            None => self.recreate(existing, group, ledger).await,
            Some(source_id) if source_id != group.source_id => {
                warn!(
                    "Group {} exists with source id {} instead of {}, skipped",
                    group.name, source_id, group.source_id
                );
                ledger.push(self.record(
                    &group.name,
                    Some(existing.id),
                    Status::SkippedSourceIdMismatch,
                    existing_source,
                ));
                Ok(())
            }
            Some(_) => {
                info!("Group {} exists with the same source id, verified", group.name);
                ledger.push(self.record(
                    &group.name,
                    Some(existing.id),
                    Status::AlreadyExists,
                    existing_source,
                ));
                Ok(())
            }
        }
    }

    /// Replaces a group lacking a source id. The new group is created before
    /// the old one is deleted; a failed delete is not rolled back.
    async fn recreate(
        &mut self,
        existing: &ExistingGroup,
        group: &DesiredGroup,
        ledger: &mut Ledger,
    ) -> Result<()> {
        let prompt = format!("Updating source id of group: {} in CDF. Proceed?", group.name);
        if !self.confirm.confirm(&prompt)? {
            info!("Source id of group {} not updated", group.name);
            ledger.push(self.record(&group.name, None, Status::SkippedSourceIdNotUpdated, None));
            return Ok(());
        }

        info!("Group {} exists without source id, re-creating it", group.name);
        let created = self.client.create_group(&NewGroup::from(group)).await?;
        let source_id = created.source_id.clone();

        if let Err(e) = self.client.delete_group(existing.id).await {
            ledger.push(self.record(
                &group.name,
                Some(created.id),
                Status::CreatedOldNotDeleted,
                source_id,
            ));
            return Err(anyhow::Error::new(e).context(format!(
                "deleting group {} after creating replacement {}",
                existing.id, created.id
            )));
        }

        info!("Group {} re-created as {}, removed {}", group.name, created.id, existing.id);
        ledger.push(self.record(&group.name, Some(created.id), Status::Recreated, source_id));
        Ok(())
    }

    fn record(
        &self,
        group_name: &str,
        group_id: Option<i64>,
        status: Status,
        source_id: Option<String>,
    ) -> AuditRecord {
        AuditRecord {
            group_name: group_name.to_string(),
            group_id,
            status,
            mode: self.mode,
            source_id,
            timestamp: Utc::now(),
        }
    }
}
