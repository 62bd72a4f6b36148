//! `TableStore` against a real database, alone and behind the coordinator.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::RecordingSink;
use outreach_client::{
    CoordinatorError, ObservabilitySink, ProjectCoordinator, ResourceStoreClient, StoreError,
    TableStore,
};
use outreach_core::project::{ProjectDraft, ProjectId, ProjectPatch};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_crud_through_table_store(pool: PgPool) {
    let store = TableStore::new(pool);

    let created = store.create(&ProjectDraft::new("Clean Water")).await.unwrap();
    assert!(!created.id.is_provisional());

    let fetched = store.get(&created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = store
        .update(
            &created.id,
            &ProjectPatch {
                status: Some("archived".into()),
                ..ProjectPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status.as_deref(), Some("archived"));
    assert_eq!(updated.title, "Clean Water");

    store.delete(&created.id).await.unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_rows(pool: PgPool) {
    let store = TableStore::new(pool);
    let absent = ProjectId::from(uuid::Uuid::new_v4());
    let not_a_uuid = ProjectId::from("tmp-123");

    assert_matches!(store.get(&absent).await, Err(StoreError::NotFound(_)));
    assert_matches!(store.get(&not_a_uuid).await, Err(StoreError::NotFound(_)));
    assert_matches!(
        store.update(&absent, &ProjectPatch::default()).await,
        Err(StoreError::NotFound(_))
    );
    // Deleting nothing is not an error for a table.
    store.delete(&absent).await.unwrap();
    store.delete(&not_a_uuid).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_coordinator_over_table_store(pool: PgPool) {
    let sink = Arc::new(RecordingSink::default());
    let coordinator = ProjectCoordinator::new(
        Arc::new(TableStore::new(pool)) as Arc<dyn ResourceStoreClient>,
        Arc::clone(&sink) as Arc<dyn ObservabilitySink>,
    );
    assert!(coordinator.list_projects().await.unwrap().is_empty());

    let first = coordinator
        .create_project(ProjectDraft::new("First"))
        .await
        .unwrap();
    let second = coordinator
        .create_project(ProjectDraft::new("Second"))
        .await
        .unwrap();

    let list = coordinator.list_projects().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, second.id);
    assert_eq!(list[1].id, first.id);

    coordinator
        .update_project(
            &first.id,
            ProjectPatch {
                title: Some("First, renamed".into()),
                ..ProjectPatch::default()
            },
        )
        .await
        .unwrap();
    coordinator.delete_project(&second.id).await.unwrap();
    coordinator.delete_project(&second.id).await.unwrap();

    let list = coordinator.list_projects().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "First, renamed");

    assert_matches!(
        coordinator
            .update_project(&second.id, ProjectPatch::default())
            .await,
        Err(CoordinatorError::MutationFailed { source: StoreError::NotFound(_), .. })
    );
}
