//! File record types and repository.
//!
//! A record tracks one stored file: its folder, original and stored names,
//! and upload metadata. Blob bytes live on disk under the storage root;
//! rows here only describe them.

use crate::db::DbPool;
use crate::{CoveError, Result};

/// A file stored in the library.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Folder containing the file.
    pub folder_id: i64,
    /// Name the file was uploaded with.
    pub original_name: String,
    /// Opaque on-disk name under the folder's storage directory.
    pub stored_name: String,
    /// MIME type reported at upload.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// SHA-256 hex digest of the contents, when computed.
    pub content_hash: Option<String>,
    /// User who uploaded the file.
    pub uploader_user_id: i64,
    /// When the record was created.
    pub created_at: String,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Folder to place the file in.
    pub folder_id: i64,
    /// Name the file was uploaded with.
    pub original_name: String,
    /// On-disk name under the folder's storage directory.
    pub stored_name: String,
    /// MIME type reported at upload.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// SHA-256 hex digest of the contents.
    pub content_hash: Option<String>,
    /// Uploading user.
    pub uploader_user_id: i64,
}

/// Repository for file record operations.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new file record.
    pub async fn create(&self, record: &NewFileRecord) -> Result<FileRecord> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (folder_id, original_name, stored_name, mime_type, size, content_hash, uploader_user_id)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(record.folder_id)
        .bind(&record.original_name)
        .bind(&record.stored_name)
        .bind(&record.mime_type)
        .bind(record.size)
        .bind(&record.content_hash)
        .bind(record.uploader_user_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoveError::NotFound("file".to_string()))
    }

    /// Get a file record by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            "SELECT id, folder_id, original_name, stored_name, mime_type, size, content_hash, uploader_user_id, created_at
             FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(record)
    }

    /// List files in a folder, ordered by original name then id.
    pub async fn list_by_folder(&self, folder_id: i64) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(
            "SELECT id, folder_id, original_name, stored_name, mime_type, size, content_hash, uploader_user_id, created_at
             FROM files WHERE folder_id = ? ORDER BY original_name, id",
        )
        .bind(folder_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(records)
    }

    /// List files in any of the given folders.
    pub async fn list_by_folders(&self, folder_ids: &[i64]) -> Result<Vec<FileRecord>> {
        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: String = folder_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(",");
        let query = format!(
            "SELECT id, folder_id, original_name, stored_name, mime_type, size, content_hash, uploader_user_id, created_at
             FROM files WHERE folder_id IN ({placeholders}) ORDER BY folder_id, original_name, id"
        );

        let mut query_builder = sqlx::query_as::<_, FileRecord>(&query);
        for id in folder_ids {
            query_builder = query_builder.bind(id);
        }

        let records = query_builder
            .fetch_all(self.pool)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(records)
    }

    /// Move a file record to another folder.
    pub async fn set_folder(&self, id: i64, folder_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE files SET folder_id = ? WHERE id = ?")
            .bind(folder_id)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a file record.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::folder::{FolderRepository, NewFolder};
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample(folder_id: i64, name: &str) -> NewFileRecord {
        NewFileRecord {
            folder_id,
            original_name: name.to_string(),
            stored_name: format!("{name}.bin"),
            mime_type: "application/pdf".to_string(),
            size: 1024,
            content_hash: Some("abc123".to_string()),
            uploader_user_id: 1,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup_db().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        let folder = folders.create(&NewFolder::new("Docs")).await.unwrap();
        let record = files.create(&sample(folder.id, "report.pdf")).await.unwrap();

        assert_eq!(record.folder_id, folder.id);
        assert_eq!(record.original_name, "report.pdf");
        assert_eq!(record.content_hash.as_deref(), Some("abc123"));

        let fetched = files.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.stored_name, record.stored_name);
    }

    #[tokio::test]
    async fn test_list_by_folder() {
        let db = setup_db().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        let folder = folders.create(&NewFolder::new("Docs")).await.unwrap();
        files.create(&sample(folder.id, "b.pdf")).await.unwrap();
        files.create(&sample(folder.id, "a.pdf")).await.unwrap();

        let listed = files.list_by_folder(folder.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].original_name, "a.pdf");
        assert_eq!(listed[1].original_name, "b.pdf");
    }

    #[tokio::test]
    async fn test_list_by_folders() {
        let db = setup_db().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        let a = folders.create(&NewFolder::new("A")).await.unwrap();
        let b = folders.create(&NewFolder::new("B")).await.unwrap();
        let c = folders.create(&NewFolder::new("C")).await.unwrap();
        files.create(&sample(a.id, "one.pdf")).await.unwrap();
        files.create(&sample(b.id, "two.pdf")).await.unwrap();
        files.create(&sample(c.id, "three.pdf")).await.unwrap();

        let listed = files.list_by_folders(&[a.id, b.id]).await.unwrap();
        assert_eq!(listed.len(), 2);

        let none = files.list_by_folders(&[]).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_set_folder_and_delete() {
        let db = setup_db().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        let a = folders.create(&NewFolder::new("A")).await.unwrap();
        let b = folders.create(&NewFolder::new("B")).await.unwrap();
        let record = files.create(&sample(a.id, "doc.pdf")).await.unwrap();

        assert!(files.set_folder(record.id, b.id).await.unwrap());
        let moved = files.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(moved.folder_id, b.id);

        assert!(files.delete(record.id).await.unwrap());
        assert!(!files.delete(record.id).await.unwrap());
        assert!(files.get_by_id(record.id).await.unwrap().is_none());
    }
}
