//! Snapshot owner: "mutate, then reload everything".
//!
//! # Responsibility
//! - Rebuild the full snapshot for a user from the document store.
//! - Settle every mutation with a reload, success or failure.
//! - Clear state when the session ends.
//!
//! # Invariants
//! - The snapshot is replaced in one assignment after it is fully built;
//!   a failed reload leaves the previous snapshot visible.
//! - No optimistic patching: the view reflects a mutation only after the
//!   remote round trip and the reload complete.
//! - Mutations rejected by validation made no remote call and skip reload.

use crate::model::snapshot::{Snapshot, SnapshotList};
use crate::model::user::User;
use crate::repo::list_store::ListStore;
use crate::repo::task_store::TaskStore;
use crate::repo::{RepoError, RepoResult};
use crate::store::DocumentStore;
use futures::future::try_join_all;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Owns the snapshot presented to the view.
pub struct SyncController {
    lists: ListStore,
    tasks: TaskStore,
    snapshot: Snapshot,
    generation: u64,
}

impl SyncController {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            lists: ListStore::new(Arc::clone(&store)),
            tasks: TaskStore::new(store),
            snapshot: Snapshot::empty(),
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Number of snapshot replacements so far, clears included.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fetches every list of `owner` and, concurrently per list, its tasks,
    /// then swaps the result in.
    pub async fn reload(&mut self, owner: &User) -> RepoResult<()> {
        let started_at = Instant::now();
        match self.fetch_snapshot(owner).await {
            Ok(snapshot) => {
                info!(
                    "event=snapshot_reload module=sync status=ok lists={} tasks={} duration_ms={}",
                    snapshot.list_count(),
                    snapshot.task_count(),
                    started_at.elapsed().as_millis()
                );
                self.replace(snapshot);
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_reload module=sync status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Builds a snapshot without publishing it.
    pub async fn fetch_snapshot(&self, owner: &User) -> RepoResult<Snapshot> {
        let lists = self.lists.list_lists(owner).await?;
        let entries = try_join_all(lists.into_iter().map(|list| async move {
            let tasks = self.tasks.list_tasks(owner, &list.id).await?;
            Ok::<_, RepoError>(SnapshotList { list, tasks })
        }))
        .await?;
        Ok(Snapshot::new(entries))
    }

    /// Completes a mutation: reloads unless the input was rejected up front,
    /// then hands the mutation's own outcome back unchanged.
    ///
    /// A failing reload is logged and does not mask the mutation outcome.
    pub async fn settle<T>(
        &mut self,
        owner: &User,
        action: &'static str,
        outcome: RepoResult<T>,
    ) -> RepoResult<T> {
        if let Err(RepoError::Validation(err)) = &outcome {
            debug!("event={action} module=sync status=rejected reason={err}");
            return outcome;
        }
        if let Err(err) = &outcome {
            warn!("event={action} module=sync status=error error={err}");
        }
        if let Err(err) = self.reload(owner).await {
            debug!("event={action} module=sync status=stale reason=reload_failed error={err}");
        }
        outcome
    }

    /// Session start reloads for the new user; session end clears.
    pub async fn on_session_change(&mut self, user: Option<&User>) -> RepoResult<()> {
        match user {
            Some(user) => self.reload(user).await,
            None => {
                self.clear();
                Ok(())
            }
        }
    }

    pub fn clear(&mut self) {
        self.replace(Snapshot::empty());
    }

    fn replace(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.generation += 1;
    }
}
