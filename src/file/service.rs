//! Library service: folder and file operations with activity logging.
//!
//! The service composes the repositories, blob storage, and grant writes
//! into the operations callers actually perform. Authorization is the
//! caller's job; the service assumes the actor has already been checked
//! against [`crate::access::CapabilityResolver`].

use std::collections::HashSet;

use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::folder::{Folder, FolderRepository, FolderUpdate, NewFolder};
use super::record::{FileRecord, FileRepository, NewFileRecord};
use super::storage::FileStorage;
use crate::access::capability::{EntityKind, SubjectType};
use crate::access::grant::GrantRepository;
use crate::db::{ActivityRepository, DbPool};
use crate::identity::Actor;
use crate::{CoveError, Result};

/// Maximum descendant-chain depth checked when validating a folder move.
const MAX_MOVE_DEPTH: usize = 100;

/// Row counts removed by a cascading folder delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Folders removed, the requested folder included.
    pub folders_deleted: usize,
    /// File records removed.
    pub files_deleted: usize,
}

/// High-level folder and file operations.
pub struct LibraryService<'a> {
    pool: &'a DbPool,
    storage: FileStorage,
}

impl<'a> LibraryService<'a> {
    /// Create a service over the given pool and blob storage.
    pub fn new(pool: &'a DbPool, storage: FileStorage) -> Self {
        Self { pool, storage }
    }

    /// Create a folder.
    pub async fn create_folder(&self, actor: &Actor, folder: NewFolder) -> Result<Folder> {
        let folder = NewFolder {
            created_by: actor.user_id,
            ..folder
        };
        if folder.parent_id != 0 && !FolderRepository::new(self.pool).exists(folder.parent_id).await?
        {
            return Err(CoveError::NotFound("parent folder".to_string()));
        }

        let created = FolderRepository::new(self.pool).create(&folder).await?;
        info!(folder_id = created.id, name = %created.name, "folder created");
        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "folder.create",
                EntityKind::Folder,
                created.id,
                Some(json!({ "name": created.name, "parent_id": created.parent_id })),
            )
            .await?;

        Ok(created)
    }

    /// Find a root folder by name, creating it if missing.
    ///
    /// Used at startup to guarantee well-known pools (such as the reserved
    /// product-documents folder) exist before their id lands in config.
    pub async fn ensure_root_folder(&self, actor: &Actor, name: &str) -> Result<Folder> {
        if let Some(existing) = FolderRepository::new(self.pool)
            .find_root_by_name(name)
            .await?
        {
            return Ok(existing);
        }
        self.create_folder(actor, NewFolder::new(name)).await
    }

    /// Rename a folder.
    pub async fn rename_folder(&self, actor: &Actor, folder_id: i64, name: &str) -> Result<Folder> {
        let repo = FolderRepository::new(self.pool);
        let updated = repo
            .update(folder_id, &FolderUpdate::new().name(name))
            .await?
            .ok_or_else(|| CoveError::NotFound("folder".to_string()))?;

        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "folder.rename",
                EntityKind::Folder,
                folder_id,
                Some(json!({ "name": name })),
            )
            .await?;

        Ok(updated)
    }

    /// Move a folder under a new parent (0 for the root level).
    ///
    /// Rejects moving a folder into itself or any of its descendants, so
    /// the parent graph stays acyclic.
    pub async fn move_folder(
        &self,
        actor: &Actor,
        folder_id: i64,
        new_parent_id: i64,
    ) -> Result<Folder> {
        if folder_id == new_parent_id {
            return Err(CoveError::InvalidArgument(
                "a folder cannot be its own parent".to_string(),
            ));
        }

        let repo = FolderRepository::new(self.pool);
        if !repo.exists(folder_id).await? {
            return Err(CoveError::NotFound("folder".to_string()));
        }
        if new_parent_id != 0 {
            if !repo.exists(new_parent_id).await? {
                return Err(CoveError::NotFound("target folder".to_string()));
            }
            if self.is_descendant(new_parent_id, folder_id).await? {
                return Err(CoveError::CycleRejected);
            }
        }

        let updated = repo
            .update(folder_id, &FolderUpdate::new().parent_id(new_parent_id))
            .await?
            .ok_or_else(|| CoveError::NotFound("folder".to_string()))?;

        info!(folder_id, new_parent_id, "folder moved");
        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "folder.move",
                EntityKind::Folder,
                folder_id,
                Some(json!({ "parent_id": new_parent_id })),
            )
            .await?;

        Ok(updated)
    }

    /// Whether `node` sits inside the subtree rooted at `ancestor`.
    async fn is_descendant(&self, node: i64, ancestor: i64) -> Result<bool> {
        let repo = FolderRepository::new(self.pool);
        let mut seen: HashSet<i64> = HashSet::new();
        let mut current = node;
        let mut depth = 0;

        while current != 0 && depth < MAX_MOVE_DEPTH {
            depth += 1;
            if current == ancestor {
                return Ok(true);
            }
            if !seen.insert(current) {
                break;
            }
            current = match repo.get_by_id(current).await? {
                Some(folder) => folder.parent_id,
                None => break,
            };
        }

        Ok(false)
    }

    /// Delete a folder and everything beneath it.
    ///
    /// Blob deletion is best-effort and happens first; the row deletes for
    /// files, grants, and folders then run in one transaction, so a store
    /// failure leaves every row in place.
    pub async fn delete_folder_subtree(
        &self,
        actor: &Actor,
        folder_id: i64,
    ) -> Result<DeleteOutcome> {
        let folders = FolderRepository::new(self.pool);
        if !folders.exists(folder_id).await? {
            return Err(CoveError::NotFound("folder".to_string()));
        }

        // Collect the subtree depth-first. The visited set keeps a corrupted
        // parent cycle from looping the walk.
        let all = folders.list_all().await?;
        let mut children_of: std::collections::HashMap<i64, Vec<i64>> =
            std::collections::HashMap::new();
        for folder in &all {
            children_of.entry(folder.parent_id).or_default().push(folder.id);
        }

        let mut subtree: Vec<i64> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut stack = vec![folder_id];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            subtree.push(id);
            if let Some(children) = children_of.get(&id) {
                stack.extend(children);
            }
        }

        let files = FileRepository::new(self.pool).list_by_folders(&subtree).await?;

        for file in &files {
            if let Err(e) = self.storage.delete(file.folder_id, &file.stored_name) {
                warn!(file_id = file.id, error = %e, "could not delete blob");
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        for file in &files {
            sqlx::query("DELETE FROM permissions WHERE entity_type = 'file' AND entity_id = ?")
                .bind(file.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| CoveError::Database(e.to_string()))?;
        }

        let placeholders: String = subtree.iter().map(|_| "?").collect::<Vec<_>>().join(",");

        let delete_files = format!("DELETE FROM files WHERE folder_id IN ({placeholders})");
        let mut query = sqlx::query(&delete_files);
        for id in &subtree {
            query = query.bind(id);
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        let delete_grants = format!(
            "DELETE FROM permissions WHERE entity_type = 'folder' AND entity_id IN ({placeholders})"
        );
        let mut query = sqlx::query(&delete_grants);
        for id in &subtree {
            query = query.bind(id);
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        let delete_folders = format!("DELETE FROM folders WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&delete_folders);
        for id in &subtree {
            query = query.bind(id);
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CoveError::Database(e.to_string()))?;

        for id in &subtree {
            self.storage.remove_folder_dir(*id);
        }

        let outcome = DeleteOutcome {
            folders_deleted: subtree.len(),
            files_deleted: files.len(),
        };
        info!(
            folder_id,
            folders = outcome.folders_deleted,
            files = outcome.files_deleted,
            "folder subtree deleted"
        );
        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "folder.delete",
                EntityKind::Folder,
                folder_id,
                Some(json!({
                    "folders_deleted": outcome.folders_deleted,
                    "files_deleted": outcome.files_deleted,
                })),
            )
            .await?;

        Ok(outcome)
    }

    /// Store a new file in a folder.
    pub async fn add_file(
        &self,
        actor: &Actor,
        folder_id: i64,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<FileRecord> {
        if !FolderRepository::new(self.pool).exists(folder_id).await? {
            return Err(CoveError::NotFound("folder".to_string()));
        }

        let stored_name = FileStorage::stored_name_for(original_name);
        self.storage.save(folder_id, &stored_name, data)?;

        let content_hash = format!("{:x}", Sha256::digest(data));
        let record = FileRepository::new(self.pool)
            .create(&NewFileRecord {
                folder_id,
                original_name: original_name.to_string(),
                stored_name: stored_name.clone(),
                mime_type: mime_type.to_string(),
                size: data.len() as i64,
                content_hash: Some(content_hash),
                uploader_user_id: actor.user_id,
            })
            .await;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                // The blob is orphaned if the row never landed
                if let Err(cleanup) = self.storage.delete(folder_id, &stored_name) {
                    warn!(error = %cleanup, "could not remove orphaned blob");
                }
                return Err(e);
            }
        };

        info!(file_id = record.id, folder_id, name = %original_name, "file added");
        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "file.add",
                EntityKind::File,
                record.id,
                Some(json!({ "name": original_name, "folder_id": folder_id })),
            )
            .await?;

        Ok(record)
    }

    /// Read a file's contents.
    pub async fn read_file(&self, file_id: i64) -> Result<(FileRecord, Vec<u8>)> {
        let record = FileRepository::new(self.pool)
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| CoveError::NotFound("file".to_string()))?;
        let data = self.storage.load(record.folder_id, &record.stored_name)?;
        Ok((record, data))
    }

    /// Remove a file: blob, record, and grants.
    pub async fn remove_file(&self, actor: &Actor, file_id: i64) -> Result<()> {
        let record = FileRepository::new(self.pool)
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| CoveError::NotFound("file".to_string()))?;

        if let Err(e) = self.storage.delete(record.folder_id, &record.stored_name) {
            warn!(file_id, error = %e, "could not delete blob");
        }
        GrantRepository::new(self.pool)
            .delete_for_entity(EntityKind::File, file_id)
            .await?;
        FileRepository::new(self.pool).delete(file_id).await?;

        info!(file_id, "file removed");
        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "file.remove",
                EntityKind::File,
                file_id,
                Some(json!({ "name": record.original_name })),
            )
            .await?;

        Ok(())
    }

    /// Move a file to another folder.
    ///
    /// The target folder's `view` grants are copied onto the file unless it
    /// already carries grants of its own.
    pub async fn move_file(
        &self,
        actor: &Actor,
        file_id: i64,
        target_folder_id: i64,
    ) -> Result<FileRecord> {
        let files = FileRepository::new(self.pool);
        let record = files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| CoveError::NotFound("file".to_string()))?;
        if !FolderRepository::new(self.pool).exists(target_folder_id).await? {
            return Err(CoveError::NotFound("target folder".to_string()));
        }

        if record.folder_id != target_folder_id {
            self.storage
                .relocate(record.folder_id, target_folder_id, &record.stored_name)?;
            files.set_folder(file_id, target_folder_id).await?;
            GrantRepository::new(self.pool)
                .copy_view_grants(
                    EntityKind::Folder,
                    target_folder_id,
                    EntityKind::File,
                    file_id,
                    false,
                    actor.user_id,
                )
                .await?;
        }

        info!(file_id, target_folder_id, "file moved");
        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "file.move",
                EntityKind::File,
                file_id,
                Some(json!({ "folder_id": target_folder_id })),
            )
            .await?;

        files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| CoveError::NotFound("file".to_string()))
    }

    /// Replace the role `view` grants on an entity.
    ///
    /// Role names are normalized: lowercased, deduplicated, and stripped of
    /// `administrator`, which needs no grant.
    pub async fn set_role_view_grants(
        &self,
        actor: &Actor,
        kind: EntityKind,
        entity_id: i64,
        roles: &[String],
    ) -> Result<Vec<String>> {
        let normalized = normalize_roles(roles);
        GrantRepository::new(self.pool)
            .replace_view_grants(kind, entity_id, SubjectType::Role, &normalized, actor.user_id)
            .await?;

        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "grants.set_roles",
                kind,
                entity_id,
                Some(json!({ "roles": normalized })),
            )
            .await?;

        Ok(normalized)
    }

    /// Replace the user `view` grants on an entity.
    pub async fn set_user_view_grants(
        &self,
        actor: &Actor,
        kind: EntityKind,
        entity_id: i64,
        user_ids: &[i64],
    ) -> Result<()> {
        let mut seen: HashSet<i64> = HashSet::new();
        let keys: Vec<String> = user_ids
            .iter()
            .filter(|id| **id > 0 && seen.insert(**id))
            .map(|id| id.to_string())
            .collect();

        GrantRepository::new(self.pool)
            .replace_view_grants(kind, entity_id, SubjectType::User, &keys, actor.user_id)
            .await?;

        ActivityRepository::new(self.pool)
            .record(
                actor.user_id,
                "grants.set_users",
                kind,
                entity_id,
                Some(json!({ "users": keys })),
            )
            .await?;

        Ok(())
    }
}

/// Normalize role identifiers for grant storage.
///
/// Lowercases, trims, drops empties and `administrator`, and deduplicates
/// while preserving order.
pub fn normalize_roles(roles: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    roles
        .iter()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty() && r != "administrator" && seen.insert(r.clone()))
        .collect()
}
