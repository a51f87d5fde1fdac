//! Grant storage for cove access control.
//!
//! A grant associates a subject (role or user) with a capability on an
//! entity (folder or file). The write path stores only `view` grants;
//! `manage` is derived from ownership or administrator status and never
//! persisted.

use super::capability::{Capability, EntityKind, SubjectType};
use crate::db::DbPool;
use crate::identity::Actor;
use crate::{CoveError, Result};

/// A stored permission grant.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Grant {
    /// Unique grant ID.
    pub id: i64,
    /// Entity type ("folder" or "file").
    pub entity_type: String,
    /// Entity ID the grant targets.
    pub entity_id: i64,
    /// Subject type of the grant.
    #[sqlx(try_from = "String")]
    pub subject_type: SubjectType,
    /// Role identifier or decimal user id.
    pub subject_key: String,
    /// Granted capability.
    #[sqlx(try_from = "String")]
    pub capability: Capability,
    /// User who created the grant.
    pub created_by: i64,
    /// When the grant was created.
    pub created_at: String,
}

/// Repository for permission grant operations.
pub struct GrantRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> GrantRepository<'a> {
    /// Create a new GrantRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a single `view` grant.
    pub async fn add_view_grant(
        &self,
        kind: EntityKind,
        entity_id: i64,
        subject_type: SubjectType,
        subject_key: &str,
        created_by: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO permissions (entity_type, entity_id, subject_type, subject_key, capability, created_by)
             VALUES (?, ?, ?, ?, 'view', ?)",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(subject_type.as_str())
        .bind(subject_key)
        .bind(created_by)
        .execute(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(())
    }

    /// List all `view` grants on an entity, ordered by subject.
    pub async fn list_view_grants(&self, kind: EntityKind, entity_id: i64) -> Result<Vec<Grant>> {
        let grants = sqlx::query_as::<_, Grant>(
            "SELECT id, entity_type, entity_id, subject_type, subject_key, capability, created_by, created_at
             FROM permissions
             WHERE entity_type = ? AND entity_id = ? AND capability = 'view'
             ORDER BY subject_type, subject_key",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(grants)
    }

    /// Subject keys holding a `view` grant on an entity, for one subject type.
    pub async fn direct_view_subjects(
        &self,
        kind: EntityKind,
        entity_id: i64,
        subject_type: SubjectType,
    ) -> Result<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT subject_key FROM permissions
             WHERE entity_type = ? AND entity_id = ? AND subject_type = ? AND capability = 'view'
             ORDER BY subject_key",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(subject_type.as_str())
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(keys)
    }

    /// Whether any `view` grant exists on the entity.
    pub async fn has_any_view_grant(&self, kind: EntityKind, entity_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM permissions
             WHERE entity_type = ? AND entity_id = ? AND capability = 'view'",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Replace the `view` grants for one subject type on an entity.
    ///
    /// Existing `view` grants for that subject type are deleted, then the
    /// given keys are inserted.
    pub async fn replace_view_grants(
        &self,
        kind: EntityKind,
        entity_id: i64,
        subject_type: SubjectType,
        subject_keys: &[String],
        created_by: i64,
    ) -> Result<()> {
        sqlx::query(
            "DELETE FROM permissions
             WHERE entity_type = ? AND entity_id = ? AND subject_type = ? AND capability = 'view'",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(subject_type.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        for key in subject_keys {
            self.add_view_grant(kind, entity_id, subject_type, key, created_by)
                .await?;
        }

        Ok(())
    }

    /// Copy `view` grants from one entity to another.
    ///
    /// When `overwrite` is false and the destination already has any `view`
    /// grant of its own, this is a no-op: explicitly customized entities
    /// keep their grants.
    pub async fn copy_view_grants(
        &self,
        from_kind: EntityKind,
        from_id: i64,
        to_kind: EntityKind,
        to_id: i64,
        overwrite: bool,
        created_by: i64,
    ) -> Result<()> {
        if !overwrite && self.has_any_view_grant(to_kind, to_id).await? {
            return Ok(());
        }

        let source = self.list_view_grants(from_kind, from_id).await?;

        sqlx::query(
            "DELETE FROM permissions
             WHERE entity_type = ? AND entity_id = ? AND capability = 'view'",
        )
        .bind(to_kind.as_str())
        .bind(to_id)
        .execute(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        for grant in &source {
            self.add_view_grant(
                to_kind,
                to_id,
                grant.subject_type,
                &grant.subject_key,
                created_by,
            )
            .await?;
        }

        Ok(())
    }

    /// Delete all grants for an entity, regardless of capability.
    pub async fn delete_for_entity(&self, kind: EntityKind, entity_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM permissions WHERE entity_type = ? AND entity_id = ?")
            .bind(kind.as_str())
            .bind(entity_id)
            .execute(self.pool)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(())
    }

    /// Maximum capability the actor holds through grants stored directly on
    /// the entity, with no inheritance.
    ///
    /// Considers user-subject grants matching the actor's id (any stored
    /// capability) and role-subject `view` grants matching any of the
    /// actor's roles.
    pub async fn direct_capability(
        &self,
        kind: EntityKind,
        entity_id: i64,
        actor: &Actor,
    ) -> Result<Capability> {
        let mut best = 0u8;

        let user_caps: Vec<String> = sqlx::query_scalar(
            "SELECT capability FROM permissions
             WHERE entity_type = ? AND entity_id = ? AND subject_type = 'user' AND subject_key = ?",
        )
        .bind(kind.as_str())
        .bind(entity_id)
        .bind(actor.user_key())
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        for cap in &user_caps {
            if let Ok(cap) = cap.parse::<Capability>() {
                best = best.max(cap.rank());
            }
        }

        if !actor.roles.is_empty() {
            let placeholders: String = actor
                .roles
                .iter()
                .map(|_| "?")
                .collect::<Vec<_>>()
                .join(",");
            let query = format!(
                "SELECT capability FROM permissions
                 WHERE entity_type = ? AND entity_id = ? AND subject_type = 'role'
                   AND capability = 'view' AND subject_key IN ({placeholders})"
            );

            let mut query_builder = sqlx::query_scalar::<_, String>(&query)
                .bind(kind.as_str())
                .bind(entity_id);
            for role in &actor.roles {
                query_builder = query_builder.bind(role);
            }

            let role_caps = query_builder
                .fetch_all(self.pool)
                .await
                .map_err(|e| CoveError::Database(e.to_string()))?;

            for cap in &role_caps {
                if let Ok(cap) = cap.parse::<Capability>() {
                    best = best.max(cap.rank());
                }
            }
        }

        Ok(Capability::from_rank(best))
    }
}
