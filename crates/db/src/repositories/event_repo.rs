//! Repository for the `events` table.

use outreach_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::Event;

/// Column list for `events` queries.
const EVENT_COLUMNS: &str =
    "id, event_type, source_entity_type, source_entity_id, actor_user_id, payload, created_at";

/// Provides read/write operations for diagnostic events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(
        pool: &PgPool,
        event_type: &str,
        source_entity_type: Option<&str>,
        source_entity_id: Option<&str>,
        actor_user_id: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events \
                (event_type, source_entity_type, source_entity_id, actor_user_id, payload) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(event_type)
        .bind(source_entity_type)
        .bind(source_entity_id)
        .bind(actor_user_id)
        .bind(payload)
        .fetch_one(pool)
        .await
    }

    /// List recent events ordered newest-first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
