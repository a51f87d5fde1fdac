//! Activity log repository for cove.
//!
//! Every mutating library operation records an entry here so that
//! administrators can audit who changed what.

use crate::access::EntityKind;
use crate::db::DbPool;
use crate::{CoveError, Result};

/// A single activity log entry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityEntry {
    /// Unique entry ID.
    pub id: i64,
    /// User who performed the action (0 for system).
    pub actor_user_id: i64,
    /// Action key, e.g. "delete_folder_subtree".
    pub action: String,
    /// Entity type the action targeted ("folder" or "file").
    pub entity_type: String,
    /// Entity ID the action targeted.
    pub entity_id: i64,
    /// Optional JSON metadata.
    pub meta: Option<String>,
    /// When the action happened.
    pub created_at: String,
}

/// Repository for activity log operations.
pub struct ActivityRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ActivityRepository<'a> {
    /// Create a new ActivityRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Record an action against an entity.
    pub async fn record(
        &self,
        actor_user_id: i64,
        action: &str,
        kind: EntityKind,
        entity_id: i64,
        meta: Option<serde_json::Value>,
    ) -> Result<()> {
        let meta_text = meta.map(|m| m.to_string());
        sqlx::query(
            "INSERT INTO activity (actor_user_id, action, entity_type, entity_id, meta)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(actor_user_id)
        .bind(action)
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(meta_text)
        .execute(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(())
    }

    /// List the most recent entries, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            "SELECT id, actor_user_id, action, entity_type, entity_id, meta, created_at
             FROM activity ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(entries)
    }

    /// List entries targeting a specific entity, newest first.
    pub async fn for_entity(&self, kind: EntityKind, entity_id: i64) -> Result<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            "SELECT id, actor_user_id, action, entity_type, entity_id, meta, created_at
             FROM activity WHERE entity_type = ? AND entity_id = ? ORDER BY id DESC",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_record_and_recent() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ActivityRepository::new(db.pool());

        repo.record(
            7,
            "create_folder",
            EntityKind::Folder,
            1,
            Some(serde_json::json!({"name": "Reports"})),
        )
        .await
        .unwrap();
        repo.record(7, "rename_folder", EntityKind::Folder, 1, None)
            .await
            .unwrap();

        let entries = repo.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "rename_folder");
        assert_eq!(entries[1].action, "create_folder");
        assert!(entries[1].meta.as_deref().unwrap().contains("Reports"));
    }

    #[tokio::test]
    async fn test_for_entity_filters() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ActivityRepository::new(db.pool());

        repo.record(1, "upload_file", EntityKind::File, 10, None)
            .await
            .unwrap();
        repo.record(1, "create_folder", EntityKind::Folder, 10, None)
            .await
            .unwrap();

        let entries = repo.for_entity(EntityKind::File, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "upload_file");
    }
}
