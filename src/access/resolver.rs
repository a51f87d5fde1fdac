//! Effective capability resolution.
//!
//! Resolution order for folders: administrator, then ownership anywhere on
//! the ancestor chain, then the maximum rank of direct grants accumulated
//! while walking toward the root. A file answers from its own grants when
//! they give the actor anything; otherwise it falls back to its folder.
//! Product entitlements can only raise a file's result, never lower it.

use std::collections::HashSet;

use chrono::Utc;
use tracing::debug;

use super::capability::{Capability, EntityKind};
use super::grant::GrantRepository;
use crate::db::DbPool;
use crate::entitlement::EntitlementProvider;
use crate::file::folder::{FolderRepository, MAX_ANCESTOR_DEPTH};
use crate::file::record::FileRepository;
use crate::identity::Actor;
use crate::Result;

/// Resolves the effective capability of an actor on folders and files.
pub struct CapabilityResolver<'a> {
    pool: &'a DbPool,
    entitlements: Option<&'a dyn EntitlementProvider>,
}

impl<'a> CapabilityResolver<'a> {
    /// Create a resolver without an entitlement provider.
    pub fn new(pool: &'a DbPool) -> Self {
        Self {
            pool,
            entitlements: None,
        }
    }

    /// Attach an entitlement provider consulted during file resolution.
    pub fn with_entitlements(mut self, provider: &'a dyn EntitlementProvider) -> Self {
        self.entitlements = Some(provider);
        self
    }

    /// Effective capability of `actor` on the given entity.
    ///
    /// A missing entity resolves to [`Capability::None`]; only store
    /// failures surface as errors.
    pub async fn effective_capability(
        &self,
        actor: &Actor,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<Capability> {
        match kind {
            EntityKind::Folder => self.folder_capability(actor, entity_id).await,
            EntityKind::File => self.file_capability(actor, entity_id).await,
        }
    }

    /// Convenience check against a required level.
    pub async fn allows(
        &self,
        actor: &Actor,
        kind: EntityKind,
        entity_id: i64,
        required: Capability,
    ) -> Result<bool> {
        let effective = self.effective_capability(actor, kind, entity_id).await?;
        Ok(effective.allows(required))
    }

    async fn folder_capability(&self, actor: &Actor, folder_id: i64) -> Result<Capability> {
        if actor.is_admin {
            return Ok(Capability::Manage);
        }

        let folders = FolderRepository::new(self.pool);
        let grants = GrantRepository::new(self.pool);

        let Some(folder) = folders.get_by_id(folder_id).await? else {
            return Ok(Capability::None);
        };

        let mut best = 0u8;
        let mut seen: HashSet<i64> = HashSet::new();
        let mut current = Some(folder);
        let mut depth = 0;

        while let Some(node) = current {
            depth += 1;
            if depth > MAX_ANCESTOR_DEPTH || !seen.insert(node.id) {
                debug!(folder_id, node = node.id, "ancestor walk cut short");
                break;
            }

            if node.is_owned_by(actor.user_id) {
                return Ok(Capability::Manage);
            }

            let direct = grants
                .direct_capability(EntityKind::Folder, node.id, actor)
                .await?;
            best = best.max(direct.rank());

            current = if node.parent_id != 0 {
                folders.get_by_id(node.parent_id).await?
            } else {
                None
            };
        }

        Ok(Capability::from_rank(best))
    }

    async fn file_capability(&self, actor: &Actor, file_id: i64) -> Result<Capability> {
        if actor.is_admin {
            return Ok(Capability::Manage);
        }

        let files = FileRepository::new(self.pool);
        let grants = GrantRepository::new(self.pool);

        let Some(record) = files.get_by_id(file_id).await? else {
            return Ok(Capability::None);
        };

        // Grants on the file itself take precedence; folder inheritance
        // applies only when they say nothing about this actor.
        let direct = grants
            .direct_capability(EntityKind::File, file_id, actor)
            .await?;
        let base = if direct != Capability::None {
            direct
        } else {
            self.folder_capability(actor, record.folder_id).await?
        };

        Ok(base.max(self.entitlement_capability(actor, file_id)))
    }

    fn entitlement_capability(&self, actor: &Actor, file_id: i64) -> Capability {
        let Some(provider) = self.entitlements else {
            return Capability::None;
        };

        let today = Utc::now().date_naive();
        for link in provider.linked_products(file_id) {
            if link.is_expired(today) {
                continue;
            }
            if provider.user_holds_entitlement(actor.user_id, link.product_id) {
                return Capability::View;
            }
        }

        Capability::None
    }
}
