//! Error types for the store bindings and the coordinator.

use std::fmt;

use outreach_core::error::CoreError;
use outreach_core::project::ProjectId;

/// The coordinator operation an error or report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a [`ResourceStoreClient`](crate::store::ResourceStoreClient) binding.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The REST API answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the JSON body, or the raw body.
        message: String,
    },

    /// The table has no project with this id.
    #[error("Project {0} not found")]
    NotFound(ProjectId),

    /// The API URL or a project id cannot form a request URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// Direct table access failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store answered with something that is not a project payload.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Errors surfaced by the [`ProjectCoordinator`](crate::coordinator::ProjectCoordinator).
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A list or single-project query could not complete. Any previously
    /// cached data is left in place.
    #[error("Failed to fetch project{}: {source}", fetch_target(.id))]
    FetchFailed {
        operation: Operation,
        id: Option<ProjectId>,
        #[source]
        source: StoreError,
    },

    /// A mutation failed remotely after its optimistic apply; the cache has
    /// been rolled back to the pre-mutation snapshot.
    #[error("Failed to {operation} project{}: {source}", id_suffix(.id))]
    MutationFailed {
        operation: Operation,
        id: Option<ProjectId>,
        #[source]
        source: StoreError,
    },

    /// An update or delete targeted an id missing from the local cache.
    /// Reported, but the remote call still goes ahead.
    #[error("Project {id} is not in the local cache ({operation})")]
    NotFoundLocally { operation: Operation, id: ProjectId },

    /// The draft or patch was rejected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl StoreError {
    /// The HTTP status the API answered with, for REST failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api { status, .. } => Some(*status),
            StoreError::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the store reported the addressed resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::Api { status: 404, .. })
    }
}

impl CoordinatorError {
    /// The operation this error belongs to, when it can be attributed.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            CoordinatorError::FetchFailed { operation, .. }
            | CoordinatorError::MutationFailed { operation, .. }
            | CoordinatorError::NotFoundLocally { operation, .. } => Some(*operation),
            CoordinatorError::Validation(_) => None,
        }
    }

    /// The project this error is about, if any.
    pub fn project_id(&self) -> Option<&ProjectId> {
        match self {
            CoordinatorError::FetchFailed { id, .. }
            | CoordinatorError::MutationFailed { id, .. } => id.as_ref(),
            CoordinatorError::NotFoundLocally { id, .. } => Some(id),
            _ => None,
        }
    }

    /// The underlying store error, if the failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            CoordinatorError::FetchFailed { source, .. }
            | CoordinatorError::MutationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CoreError> for CoordinatorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => CoordinatorError::Validation(msg),
            other => CoordinatorError::Validation(other.to_string()),
        }
    }
}

fn fetch_target(id: &Option<ProjectId>) -> String {
    match id {
        Some(id) => format!(" {id}"),
        None => "s".to_string(),
    }
}

fn id_suffix(id: &Option<ProjectId>) -> String {
    id.as_ref().map(|id| format!(" {id}")).unwrap_or_default()
}
