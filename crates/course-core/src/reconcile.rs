//! Reconciliation of one level of the hierarchy
//!
//! The same set-diff runs at every level: fetched children are created or
//! updated by external id, persisted children of the parent that were not
//! fetched are deleted together with their descendants. Failures are recorded
//! per child and never stop the loop. The store is flushed once per parent.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::model::{EntityFields, Level, Record};
use crate::source::{SourceError, SourceResult};
use crate::store::{EntityStore, UpsertRequest};
use crate::sync::{IssueKind, SyncIssue};

/// What to do with persisted children absent from the fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicy {
    Delete,
    Keep,
}

/// A fetched child, or the error that stopped it from being prepared
#[derive(Debug, Clone)]
pub struct Candidate<F> {
    pub external_id: String,
    pub prepared: SourceResult<F>,
}

impl<F> Candidate<F> {
    pub fn ready(external_id: impl Into<String>, fields: F) -> Self {
        Self {
            external_id: external_id.into(),
            prepared: Ok(fields),
        }
    }

    pub fn failed(external_id: impl Into<String>, error: SourceError) -> Self {
        Self {
            external_id: external_id.into(),
            prepared: Err(error),
        }
    }
}

/// Counts and issues from reconciling one parent's children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Children written (or, on a dry run, that would be written), in fetch order
    pub upserted: Vec<String>,
    pub issues: Vec<SyncIssue>,
    pub actions: Vec<String>,
}

pub struct ReconciliationEngine<'a, S: ?Sized> {
    store: &'a S,
    dry_run: bool,
    synced_at: DateTime<Utc>,
}

impl<'a, S: ?Sized> ReconciliationEngine<'a, S> {
    pub fn new(store: &'a S, dry_run: bool, synced_at: DateTime<Utc>) -> Self {
        Self {
            store,
            dry_run,
            synced_at,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Reconcile the children of `parent_id` at level `F::LEVEL`.
    ///
    /// `persisted` must be the stored children of `parent_id`. A child whose
    /// preparation failed is reported and left untouched: it counts as seen,
    /// so its stored copy is not deleted.
    pub async fn reconcile<F>(
        &self,
        parent_id: &str,
        fetched: Vec<Candidate<F>>,
        persisted: Vec<Record<F>>,
        orphans: OrphanPolicy,
    ) -> LevelOutcome
    where
        F: EntityFields,
        S: EntityStore<F>,
    {
        let level = F::LEVEL;
        let mut outcome = LevelOutcome::default();
        let existing: HashSet<&str> = persisted.iter().map(|r| r.external_id.as_str()).collect();
        let mut seen: HashSet<String> = HashSet::new();

        for candidate in fetched {
            let id = candidate.external_id;
            if !seen.insert(id.clone()) {
                tracing::warn!(%level, %id, parent = parent_id, "Duplicate child in source listing");
                outcome.issues.push(SyncIssue::recoverable(
                    level,
                    id,
                    IssueKind::SourceFetch,
                    format!("duplicate {level} in source listing of {parent_id}"),
                ));
                continue;
            }

            let fields = match candidate.prepared {
                Ok(fields) => fields,
                Err(e) => {
                    tracing::warn!(%level, %id, error = %e, "Skipping child that could not be fetched");
                    let kind = match e {
                        SourceError::StructureMissing { .. } => IssueKind::StructureMissing,
                        _ => IssueKind::SourceFetch,
                    };
                    outcome
                        .issues
                        .push(SyncIssue::recoverable(level, id, kind, e.to_string()));
                    continue;
                }
            };

            let is_update = existing.contains(id.as_str());
            let verb = if is_update { "update" } else { "create" };

            if self.dry_run {
                outcome
                    .actions
                    .push(format!("[dry-run] Would {verb} {level} {id}"));
            } else {
                let request = UpsertRequest {
                    external_id: id.clone(),
                    parent_id: parent_id.to_string(),
                    fields,
                    synced_at: self.synced_at,
                };
                if let Err(e) = self.store.upsert(request).await {
                    tracing::warn!(%level, %id, error = %e, "Failed to {verb} child");
                    outcome.issues.push(SyncIssue::recoverable(
                        level,
                        id,
                        IssueKind::ReconciliationWrite,
                        format!("failed to {verb} {level}: {e}"),
                    ));
                    continue;
                }
                tracing::debug!(%level, %id, parent = parent_id, "{verb}d");
            }

            if is_update {
                outcome.updated += 1;
            } else {
                outcome.created += 1;
            }
            outcome.upserted.push(id);
        }

        if orphans == OrphanPolicy::Delete {
            let orphan_ids: Vec<String> = persisted
                .iter()
                .filter(|r| !seen.contains(&r.external_id))
                .map(|r| r.external_id.clone())
                .collect();
            self.delete_orphans(level, parent_id, orphan_ids, &mut outcome)
                .await;
        }

        if !self.dry_run
            && let Err(e) = EntityStore::<F>::flush(self.store).await
        {
            tracing::warn!(%level, parent = parent_id, error = %e, "Failed to save reconciled children");
            outcome.issues.push(SyncIssue::recoverable(
                level,
                parent_id,
                IssueKind::ReconciliationWrite,
                format!("failed to save {level}s of {parent_id}: {e}"),
            ));
        }

        outcome
    }

    async fn delete_orphans<F>(
        &self,
        level: Level,
        parent_id: &str,
        orphan_ids: Vec<String>,
        outcome: &mut LevelOutcome,
    ) where
        F: EntityFields,
        S: EntityStore<F>,
    {
        if orphan_ids.is_empty() {
            return;
        }

        if self.dry_run {
            outcome.deleted += orphan_ids.len();
            outcome.actions.extend(
                orphan_ids
                    .iter()
                    .map(|id| format!("[dry-run] Would delete {level} {id}")),
            );
            return;
        }

        match EntityStore::<F>::delete_many(self.store, &orphan_ids).await {
            Ok(deleted) => {
                tracing::debug!(%level, parent = parent_id, deleted, "Deleted orphans");
                outcome.deleted += deleted;
            }
            Err(e) => {
                tracing::warn!(%level, parent = parent_id, error = %e, "Failed to delete orphans");
                outcome.issues.push(SyncIssue::recoverable(
                    level,
                    parent_id,
                    IssueKind::ReconciliationWrite,
                    format!("failed to delete {} orphaned {level}(s): {e}", orphan_ids.len()),
                ));
            }
        }
    }
}
