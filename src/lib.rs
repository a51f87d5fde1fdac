//! cove - private file library with folder-tree access control.
//!
//! Folders form a hierarchy with rank-ordered capabilities resolved by
//! walking ancestor chains; files inherit from their folder unless they
//! carry grants of their own, and product entitlements can open files to
//! buyers. Everything is backed by SQLite with blobs on disk.

pub mod access;
pub mod config;
pub mod db;
pub mod entitlement;
pub mod error;
pub mod file;
pub mod identity;
pub mod logging;

pub use access::{Capability, CapabilityResolver, EntityKind, SubjectType, TreeBuilder, TreeNode, TreeOptions};
pub use config::Config;
pub use db::Database;
pub use entitlement::{EntitlementProvider, ProductLink, StaticEntitlements};
pub use error::{CoveError, Result};
pub use file::{FileStorage, LibraryService};
pub use identity::Actor;
