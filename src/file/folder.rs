//! Folder types and repository for the cove file library.

use sqlx::{QueryBuilder, Sqlite};

use crate::db::DbPool;
use crate::{CoveError, Result};

/// Maximum ancestor-chain depth walked when building folder paths.
///
/// The data model promises acyclic parentage; the bound keeps walks finite
/// if that invariant is ever violated upstream.
pub const MAX_ANCESTOR_DEPTH: usize = 50;

/// A folder in the library hierarchy.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Parent folder ID (0 for root folders).
    pub parent_id: i64,
    /// Folder name.
    pub name: String,
    /// Owning user ID (0 for no owner). Owners always resolve to manage.
    pub owner_user_id: i64,
    /// Private folders are excluded from tree output entirely.
    pub is_private: bool,
    /// User who created the folder.
    pub created_by: i64,
    /// When the folder was created.
    pub created_at: String,
    /// When the folder was last renamed or moved.
    pub updated_at: String,
}

impl Folder {
    /// Whether this is a root folder.
    pub fn is_root(&self) -> bool {
        self.parent_id == 0
    }

    /// Whether the given user owns this folder.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_user_id != 0 && self.owner_user_id == user_id
    }
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Parent folder ID (0 for root).
    pub parent_id: i64,
    /// Owning user ID (0 for no owner).
    pub owner_user_id: i64,
    /// Whether the folder is private.
    pub is_private: bool,
    /// User creating the folder.
    pub created_by: i64,
}

impl NewFolder {
    /// Create a new root-level, unowned, public folder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: 0,
            owner_user_id: 0,
            is_private: false,
            created_by: 0,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Set the owning user.
    pub fn with_owner(mut self, owner_user_id: i64) -> Self {
        self.owner_user_id = owner_user_id;
        self
    }

    /// Mark the folder private.
    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    /// Set the creating user.
    pub fn with_created_by(mut self, created_by: i64) -> Self {
        self.created_by = created_by;
        self
    }
}

/// Builder for updating a folder.
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    /// New folder name.
    pub name: Option<String>,
    /// New parent folder ID.
    pub parent_id: Option<i64>,
    /// New owning user ID.
    pub owner_user_id: Option<i64>,
    /// New privacy flag.
    pub is_private: Option<bool>,
}

impl FolderUpdate {
    /// Create a new FolderUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the parent folder ID.
    pub fn parent_id(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the owning user ID.
    pub fn owner_user_id(mut self, owner_user_id: i64) -> Self {
        self.owner_user_id = Some(owner_user_id);
        self
    }

    /// Set the privacy flag.
    pub fn is_private(mut self, is_private: bool) -> Self {
        self.is_private = Some(is_private);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.parent_id.is_none()
            && self.owner_user_id.is_none()
            && self.is_private.is_none()
    }
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new folder.
    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO folders (parent_id, name, owner_user_id, is_private, created_by)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(folder.parent_id)
        .bind(&folder.name)
        .bind(folder.owner_user_id)
        .bind(folder.is_private)
        .bind(folder.created_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoveError::NotFound("folder".to_string()))
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, parent_id, name, owner_user_id, is_private, created_by, created_at, updated_at
             FROM folders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// Check whether a folder exists.
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM folders WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Find a root-level folder by name.
    pub async fn find_root_by_name(&self, name: &str) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, parent_id, name, owner_user_id, is_private, created_by, created_at, updated_at
             FROM folders WHERE parent_id = 0 AND name = ? ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// List every folder, ordered by name then id.
    pub async fn list_all(&self) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT id, parent_id, name, owner_user_id, is_private, created_by, created_at, updated_at
             FROM folders ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// List child folders of a parent, ordered by name then id.
    pub async fn list_children(&self, parent_id: i64) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT id, parent_id, name, owner_user_id, is_private, created_by, created_at, updated_at
             FROM folders WHERE parent_id = ? ORDER BY name, id",
        )
        .bind(parent_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// Update a folder. Bumps `updated_at`.
    pub async fn update(&self, id: i64, update: &FolderUpdate) -> Result<Option<Folder>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE folders SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }

        if let Some(parent_id) = update.parent_id {
            separated.push("parent_id = ");
            separated.push_bind_unseparated(parent_id);
        }

        if let Some(owner_user_id) = update.owner_user_id {
            separated.push("owner_user_id = ");
            separated.push_bind_unseparated(owner_user_id);
        }

        if let Some(is_private) = update.is_private {
            separated.push("is_private = ");
            separated.push_bind_unseparated(is_private);
        }

        separated.push("updated_at = datetime('now')");

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Get the path from root to a folder (breadcrumbs).
    ///
    /// Bounded by [`MAX_ANCESTOR_DEPTH`] and a visited-set guard so a
    /// corrupted parent cycle cannot hang the walk.
    pub async fn path(&self, id: i64) -> Result<Vec<Folder>> {
        let mut path = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut current = self.get_by_id(id).await?;
        let mut depth = 0;

        while let Some(folder) = current {
            depth += 1;
            if depth > MAX_ANCESTOR_DEPTH || !seen.insert(folder.id) {
                break;
            }
            let parent_id = folder.parent_id;
            path.push(folder);
            current = if parent_id != 0 {
                self.get_by_id(parent_id).await?
            } else {
                None
            };
        }

        path.reverse();
        Ok(path)
    }

    /// Count files in a folder.
    pub async fn count_files(&self, folder_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(count)
    }
}
