//! Access control: capabilities, grants, resolution, and the visible tree.

pub mod capability;
pub mod grant;
pub mod resolver;
pub mod tree;

pub use capability::{Capability, EntityKind, SubjectType};
pub use grant::{Grant, GrantRepository};
pub use resolver::CapabilityResolver;
pub use tree::{TreeBuilder, TreeNode, TreeOptions};
