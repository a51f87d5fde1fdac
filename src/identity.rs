//! Actor identity consumed by the access engine.
//!
//! Authentication happens outside this crate; callers hand the engine a
//! resolved `(user id, roles, is admin)` triple.

/// The acting user, as resolved by an external identity provider.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Unique user ID.
    pub user_id: i64,
    /// Role identifiers held by the user, lowercased.
    pub roles: Vec<String>,
    /// Whether the identity provider marks the user an administrator.
    pub is_admin: bool,
}

impl Actor {
    /// Create a regular (non-admin) actor.
    pub fn new(user_id: i64, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            user_id,
            roles: roles
                .into_iter()
                .map(|r| r.into().to_lowercase())
                .collect(),
            is_admin: false,
        }
    }

    /// Create an administrator actor.
    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            roles: vec!["administrator".to_string()],
            is_admin: true,
        }
    }

    /// Subject key used for user-targeted grants.
    pub fn user_key(&self) -> String {
        self.user_id.to_string()
    }

    /// Check whether the actor holds a role (case-insensitive).
    pub fn has_role(&self, role: &str) -> bool {
        let role = role.to_lowercase();
        self.roles.iter().any(|r| *r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lowercases_roles() {
        let actor = Actor::new(5, ["Editor", "STAFF"]);
        assert_eq!(actor.roles, vec!["editor", "staff"]);
        assert!(!actor.is_admin);
    }

    #[test]
    fn test_admin() {
        let actor = Actor::admin(1);
        assert!(actor.is_admin);
        assert!(actor.has_role("administrator"));
    }

    #[test]
    fn test_user_key() {
        assert_eq!(Actor::new(42, Vec::<String>::new()).user_key(), "42");
    }

    #[test]
    fn test_has_role_case_insensitive() {
        let actor = Actor::new(5, ["editor"]);
        assert!(actor.has_role("Editor"));
        assert!(!actor.has_role("viewer"));
    }
}
