//! Visible folder tree computation.
//!
//! Builds the forest of folders an actor may see: private folders are
//! filtered out unconditionally, the reserved product-documents folder is
//! hidden from non-administrators, and every remaining folder is kept if
//! the actor resolves to at least `view` on it or it sits on the ancestor
//! chain of one that does.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::capability::{Capability, EntityKind};
use super::resolver::CapabilityResolver;
use crate::db::DbPool;
use crate::entitlement::EntitlementProvider;
use crate::file::folder::{Folder, FolderRepository, MAX_ANCESTOR_DEPTH};
use crate::identity::Actor;
use crate::Result;

/// A folder in the visible tree, with its visible children.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Folder ID.
    pub id: i64,
    /// Parent folder ID (0 for root folders).
    pub parent_id: i64,
    /// Folder name.
    pub name: String,
    /// Privacy flag; always false in tree output, private folders are
    /// filtered before assembly.
    pub is_private: bool,
    /// Owning user ID (0 for no owner).
    pub owner_user_id: i64,
    /// Whether this is the reserved product-documents folder.
    pub is_reserved: bool,
    /// Visible children, ordered by name then id.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn from_folder(folder: &Folder, reserved_folder_id: i64) -> Self {
        Self {
            id: folder.id,
            parent_id: folder.parent_id,
            name: folder.name.clone(),
            is_private: folder.is_private,
            owner_user_id: folder.owner_user_id,
            is_reserved: reserved_folder_id != 0 && folder.id == reserved_folder_id,
            children: Vec::new(),
        }
    }

    /// Total node count in this subtree, self included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// Always false; a node counts itself.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Options for tree construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeOptions {
    /// Reserved folder hidden from non-administrators (0 for none).
    pub reserved_folder_id: i64,
}

/// Computes the forest of folders visible to an actor.
pub struct TreeBuilder<'a> {
    pool: &'a DbPool,
    entitlements: Option<&'a dyn EntitlementProvider>,
    options: TreeOptions,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder with the given options.
    pub fn new(pool: &'a DbPool, options: TreeOptions) -> Self {
        Self {
            pool,
            entitlements: None,
            options,
        }
    }

    /// Attach an entitlement provider forwarded to capability resolution.
    pub fn with_entitlements(mut self, provider: &'a dyn EntitlementProvider) -> Self {
        self.entitlements = Some(provider);
        self
    }

    /// Build the visible forest for an actor.
    ///
    /// Roots are folders whose parent is 0 or whose parent did not make the
    /// cut; both cases surface at the top level, ordered by name then id.
    pub async fn visible_tree(&self, actor: &Actor) -> Result<Vec<TreeNode>> {
        let folders = FolderRepository::new(self.pool);
        let mut resolver = CapabilityResolver::new(self.pool);
        if let Some(provider) = self.entitlements {
            resolver = resolver.with_entitlements(provider);
        }

        // Candidates: public folders, minus the reserved folder for
        // non-administrators.
        let all = folders.list_all().await?;
        let candidates: Vec<&Folder> = all
            .iter()
            .filter(|f| !f.is_private)
            .filter(|f| {
                actor.is_admin
                    || self.options.reserved_folder_id == 0
                    || f.id != self.options.reserved_folder_id
            })
            .collect();
        let by_id: HashMap<i64, &Folder> = candidates.iter().map(|f| (f.id, *f)).collect();

        // Directly visible folders. Each resolution memoizes nothing across
        // folders; the walk itself is bounded, and candidate counts are
        // library-sized, not filesystem-sized.
        let mut visible: HashSet<i64> = HashSet::new();
        if actor.is_admin {
            visible.extend(by_id.keys());
        } else {
            for folder in &candidates {
                let cap = resolver
                    .effective_capability(actor, EntityKind::Folder, folder.id)
                    .await?;
                if cap >= Capability::View {
                    visible.insert(folder.id);
                }
            }
        }

        // Ancestor inclusion: a visible folder pulls its chain of public
        // ancestors in so the tree stays connected.
        let mut included = visible.clone();
        for id in &visible {
            let mut parent_id = by_id.get(id).map(|f| f.parent_id).unwrap_or(0);
            let mut depth = 0;
            let mut seen: HashSet<i64> = HashSet::new();
            while parent_id != 0 && depth < MAX_ANCESTOR_DEPTH {
                depth += 1;
                if !seen.insert(parent_id) {
                    debug!(folder_id = id, "ancestor inclusion cut short");
                    break;
                }
                let Some(parent) = by_id.get(&parent_id) else {
                    break;
                };
                included.insert(parent.id);
                parent_id = parent.parent_id;
            }
        }

        // Assemble, preserving the name-then-id order of the candidate list.
        let mut children_of: HashMap<i64, Vec<&Folder>> = HashMap::new();
        let mut roots: Vec<&Folder> = Vec::new();
        for folder in &candidates {
            if !included.contains(&folder.id) {
                continue;
            }
            if folder.parent_id == 0 || !included.contains(&folder.parent_id) {
                roots.push(folder);
            } else {
                children_of.entry(folder.parent_id).or_default().push(folder);
            }
        }

        let mut building: HashSet<i64> = HashSet::new();
        let forest = roots
            .into_iter()
            .map(|root| self.build_node(root, &children_of, &mut building))
            .collect();

        Ok(forest)
    }

    fn build_node(
        &self,
        folder: &Folder,
        children_of: &HashMap<i64, Vec<&Folder>>,
        building: &mut HashSet<i64>,
    ) -> TreeNode {
        let mut node = TreeNode::from_folder(folder, self.options.reserved_folder_id);
        if !building.insert(folder.id) {
            return node;
        }

        if let Some(children) = children_of.get(&folder.id) {
            node.children = children
                .iter()
                .map(|child| self.build_node(child, children_of, building))
                .collect();
        }

        node
    }
}
