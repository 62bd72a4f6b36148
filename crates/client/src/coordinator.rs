//! Resource cache & mutation coordinator for projects.
//!
//! [`ProjectCoordinator`] sits between consumers and a
//! [`ResourceStoreClient`]. Reads are served from the [`QueryCache`] with
//! stale-while-revalidate semantics. Every mutation follows the same steps,
//! strictly in this order for itself:
//!
//! 1. validate the input (rejections have no side effects)
//! 2. snapshot the cached list and apply the expected effect locally
//! 3. call the store
//! 4. on failure, put the snapshot back verbatim and report
//! 5. settle: invalidate and refetch the list from the store
//!
//! Mutations are not serialised against each other. Two racing mutations
//! each snapshot, apply and settle independently, and whichever settle
//! refresh lands last is what readers see.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use outreach_core::project::{
    dedup_by_id, insert_ordered, remove_by_id, sort_newest_first, Project, ProjectDraft,
    ProjectFilter, ProjectId, ProjectPatch,
};

use crate::cache::{Lookup, QueryCache, QueryKey};
use crate::error::{CoordinatorError, Operation, StoreError};
use crate::sink::{ObservabilitySink, OperationReport};
use crate::store::ResourceStoreClient;

/// How long a successful fetch is served without revalidation.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

const LIST: QueryKey = QueryKey::ProjectList;

struct Inner {
    store: Arc<dyn ResourceStoreClient>,
    sink: Arc<dyn ObservabilitySink>,
    lists: QueryCache<QueryKey, Vec<Project>>,
    details: QueryCache<ProjectId, Project>,
    stale_time: Duration,
    creating: MutationState,
    updating: MutationState,
    deleting: MutationState,
}

/// In-flight count and latest outcome of one kind of mutation.
#[derive(Default)]
struct MutationState {
    pending: AtomicUsize,
    last_error: Mutex<Option<String>>,
}

/// Cheaply cloneable handle; clones share one cache.
#[derive(Clone)]
pub struct ProjectCoordinator {
    inner: Arc<Inner>,
}

/// Counts a mutation as pending until dropped.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ProjectCoordinator {
    pub fn new(store: Arc<dyn ResourceStoreClient>, sink: Arc<dyn ObservabilitySink>) -> Self {
        Self::with_stale_time(store, sink, DEFAULT_STALE_TIME)
    }

    pub fn with_stale_time(
        store: Arc<dyn ResourceStoreClient>,
        sink: Arc<dyn ObservabilitySink>,
        stale_time: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                sink,
                lists: QueryCache::new(),
                details: QueryCache::new(),
                stale_time,
                creating: MutationState::default(),
                updating: MutationState::default(),
                deleting: MutationState::default(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All projects, newest first.
    ///
    /// A fresh cached list is returned as is. A stale or invalidated one is
    /// returned as is while a background refetch runs. With nothing cached
    /// the caller waits for the store.
    pub async fn list_projects(&self) -> Result<Vec<Project>, CoordinatorError> {
        match self.inner.lists.lookup(&LIST, self.inner.stale_time).await {
            Lookup::Fresh(list) => Ok(list),
            Lookup::Stale(list) => {
                self.spawn_revalidation().await;
                Ok(list)
            }
            Lookup::Missing => self.fetch_list().await,
        }
    }

    /// All projects straight from the store, bypassing the cache for the read.
    ///
    /// On failure nothing falls back; the previous list is still available
    /// through [`cached_projects`](Self::cached_projects).
    pub async fn refresh_projects(&self) -> Result<Vec<Project>, CoordinatorError> {
        self.fetch_list().await
    }

    /// The cached list as readers currently see it, without touching the store.
    pub async fn cached_projects(&self) -> Option<Vec<Project>> {
        self.inner.lists.get(&LIST).await
    }

    /// The cached list narrowed by `filter`, order preserved.
    pub async fn filtered_projects(&self, filter: &ProjectFilter) -> Option<Vec<Project>> {
        self.cached_projects().await.map(|list| filter.apply(&list))
    }

    /// Message of the last failed list fetch, if the latest attempt failed.
    pub async fn last_fetch_error(&self) -> Option<String> {
        self.inner.lists.last_error(&LIST).await
    }

    /// Mark the list as needing a refetch on its next read.
    pub async fn invalidate_projects(&self) {
        self.inner.lists.invalidate(&LIST).await;
    }

    /// A single project, cached under its own key with the same stale time.
    pub async fn get_project(&self, id: &ProjectId) -> Result<Project, CoordinatorError> {
        if let Lookup::Fresh(project) = self.inner.details.lookup(id, self.inner.stale_time).await {
            return Ok(project);
        }

        match self.inner.store.get(id).await {
            Ok(project) => {
                self.inner.details.set(id.clone(), project.clone()).await;
                Ok(project)
            }
            Err(source) => {
                self.inner.details.record_error(id.clone(), source.to_string()).await;
                let err = CoordinatorError::FetchFailed {
                    operation: Operation::Get,
                    id: Some(id.clone()),
                    source,
                };
                self.report_error(Operation::Get, &err);
                Err(err)
            }
        }
    }

    /// Number of mutations between their optimistic apply and their settle.
    pub fn pending_mutations(&self) -> usize {
        [Operation::Create, Operation::Update, Operation::Delete]
            .into_iter()
            .map(|op| self.pending(op))
            .sum()
    }

    /// In-flight mutations of one kind. Always 0 for queries.
    pub fn pending(&self, operation: Operation) -> usize {
        self.mutation_state(operation)
            .map_or(0, |state| state.pending.load(Ordering::SeqCst))
    }

    /// Message of the last failure of this kind of mutation. Cleared by the
    /// next one that succeeds.
    pub async fn last_mutation_error(&self, operation: Operation) -> Option<String> {
        match self.mutation_state(operation) {
            Some(state) => state.last_error.lock().await.clone(),
            None => None,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a project.
    ///
    /// A provisional entry (`tmp-` id, current time) is visible in the cached
    /// list until the settle refresh replaces it with the stored record.
    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Project, CoordinatorError> {
        let state = &self.inner.creating;
        if let Err(err) = self.validated(Operation::Create, draft.check()) {
            return Self::finish(state, Err(err)).await;
        }
        let _pending = PendingGuard::new(&state.pending);

        let provisional = Project::provisional(&draft, Utc::now());
        let snapshot = self
            .inner
            .lists
            .apply_optimistic(&LIST, |list| insert_ordered(list, provisional))
            .await
            .map(|(snapshot, ())| snapshot);

        let outcome = match self.inner.store.create(&draft).await {
            Ok(project) => {
                self.report(OperationReport::info(
                    Operation::Create,
                    Some(project.id.clone()),
                    "Project created successfully",
                ));
                Ok(project)
            }
            Err(source) => Err(self.roll_back(Operation::Create, None, snapshot, source).await),
        };

        self.settle().await;
        Self::finish(state, outcome).await
    }

    /// Merge `patch` into the project with `id`.
    ///
    /// If the id is not in the cached list a [`CoordinatorError::NotFoundLocally`]
    /// is reported and the store is asked anyway.
    pub async fn update_project(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, CoordinatorError> {
        let state = &self.inner.updating;
        if let Err(err) = self.validated(Operation::Update, patch.check()) {
            return Self::finish(state, Err(err)).await;
        }
        let _pending = PendingGuard::new(&state.pending);

        let now = Utc::now();
        let applied = self
            .inner
            .lists
            .apply_optimistic(&LIST, |list| match list.iter_mut().find(|p| &p.id == id) {
                Some(project) => {
                    project.apply_patch(&patch, now);
                    true
                }
                None => false,
            })
            .await;

        let snapshot = match applied {
            Some((snapshot, true)) => Some(snapshot),
            Some((snapshot, false)) => {
                self.report_not_found_locally(Operation::Update, id);
                Some(snapshot)
            }
            None => {
                self.report_not_found_locally(Operation::Update, id);
                None
            }
        };

        let outcome = match self.inner.store.update(id, &patch).await {
            Ok(project) => {
                self.inner.details.set(id.clone(), project.clone()).await;
                self.report(OperationReport::info(
                    Operation::Update,
                    Some(id.clone()),
                    "Project updated successfully",
                ));
                Ok(project)
            }
            Err(source) => {
                self.inner.details.invalidate(id).await;
                Err(self
                    .roll_back(Operation::Update, Some(id.clone()), snapshot, source)
                    .await)
            }
        };

        self.settle().await;
        Self::finish(state, outcome).await
    }

    /// Delete the project with `id`.
    ///
    /// Deleting an id that is not cached is fine locally; whether the call
    /// succeeds is decided by the store.
    pub async fn delete_project(&self, id: &ProjectId) -> Result<ProjectId, CoordinatorError> {
        let state = &self.inner.deleting;
        let _pending = PendingGuard::new(&state.pending);

        let applied = self
            .inner
            .lists
            .apply_optimistic(&LIST, |list| remove_by_id(list, id))
            .await;
        if !matches!(applied, Some((_, true))) {
            tracing::debug!(project_id = %id, "Delete target not in local cache");
        }
        let snapshot = applied.map(|(snapshot, _)| snapshot);

        let outcome = match self.inner.store.delete(id).await {
            Ok(()) => {
                self.inner.details.remove(id).await;
                self.report(OperationReport::info(
                    Operation::Delete,
                    Some(id.clone()),
                    "Project deleted successfully",
                ));
                Ok(id.clone())
            }
            Err(source) => {
                self.inner.details.invalidate(id).await;
                Err(self
                    .roll_back(Operation::Delete, Some(id.clone()), snapshot, source)
                    .await)
            }
        };

        self.settle().await;
        Self::finish(state, outcome).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Fetch the list, sort it, and write it back unless an optimistic
    /// update happened while the request was in flight.
    async fn fetch_list(&self) -> Result<Vec<Project>, CoordinatorError> {
        let generation = self.inner.lists.generation(&LIST).await;

        match self.inner.store.list().await {
            Ok(mut list) => {
                sort_newest_first(&mut list);
                dedup_by_id(&mut list);
                let written = self
                    .inner
                    .lists
                    .set_if_generation(LIST, list.clone(), generation)
                    .await;
                if !written {
                    tracing::debug!(generation, "Discarding list fetch superseded by a local mutation");
                }
                Ok(list)
            }
            Err(source) => {
                self.inner.lists.record_error(LIST, source.to_string()).await;
                let err = CoordinatorError::FetchFailed {
                    operation: Operation::List,
                    id: None,
                    source,
                };
                self.report_error(Operation::List, &err);
                Err(err)
            }
        }
    }

    async fn spawn_revalidation(&self) {
        if !self.inner.lists.begin_revalidation(&LIST).await {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            // Failures are already reported by fetch_list.
            let _ = this.fetch_list().await;
            this.inner.lists.end_revalidation(&LIST).await;
        });
    }

    /// Invalidate the list and refetch it so the cache matches the store.
    async fn settle(&self) {
        self.inner.lists.invalidate(&LIST).await;
        if self.fetch_list().await.is_err() {
            tracing::warn!("Settle refresh failed; list stays invalidated");
        }
    }

    /// Restore the pre-mutation list, report, and build the caller's error.
    async fn roll_back(
        &self,
        operation: Operation,
        id: Option<ProjectId>,
        snapshot: Option<Vec<Project>>,
        source: StoreError,
    ) -> CoordinatorError {
        if let Some(snapshot) = snapshot {
            self.inner.lists.restore(LIST, snapshot).await;
        }
        let err = CoordinatorError::MutationFailed {
            operation,
            id,
            source,
        };
        self.report_error(operation, &err);
        err
    }

    fn mutation_state(&self, operation: Operation) -> Option<&MutationState> {
        match operation {
            Operation::Create => Some(&self.inner.creating),
            Operation::Update => Some(&self.inner.updating),
            Operation::Delete => Some(&self.inner.deleting),
            Operation::List | Operation::Get => None,
        }
    }

    /// Record the mutation's outcome as its latest error state.
    async fn finish<T>(
        state: &MutationState,
        outcome: Result<T, CoordinatorError>,
    ) -> Result<T, CoordinatorError> {
        *state.last_error.lock().await = outcome.as_ref().err().map(ToString::to_string);
        outcome
    }

    fn validated(
        &self,
        operation: Operation,
        check: Result<(), outreach_core::error::CoreError>,
    ) -> Result<(), CoordinatorError> {
        check.map_err(|e| {
            let err = CoordinatorError::from(e);
            self.report_error(operation, &err);
            err
        })
    }

    fn report_not_found_locally(&self, operation: Operation, id: &ProjectId) {
        let err = CoordinatorError::NotFoundLocally {
            operation,
            id: id.clone(),
        };
        self.report_error(operation, &err);
    }

    fn report_error(&self, operation: Operation, err: &CoordinatorError) {
        self.report(OperationReport::from_error(operation, err));
    }

    fn report(&self, report: OperationReport) {
        self.inner.sink.report(&report);
    }
}
