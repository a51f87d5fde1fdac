//! Product entitlement side channel.
//!
//! Files can be linked to purchasable products; a user who holds a
//! non-expired entitlement to a linked product gets at least `view` on the
//! file, independent of role/user grants. The commerce system answering
//! "does this user hold this product" lives outside the crate, behind
//! [`EntitlementProvider`].

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

/// A link between a file and a product, with an optional expiry date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink {
    /// Product the file is attached to.
    pub product_id: i64,
    /// Last day the link is valid (inclusive). None means no expiry.
    pub expires: Option<NaiveDate>,
}

impl ProductLink {
    /// Create a link without an expiry date.
    pub fn new(product_id: i64) -> Self {
        Self {
            product_id,
            expires: None,
        }
    }

    /// Create a link valid through the given date.
    pub fn expiring(product_id: i64, expires: NaiveDate) -> Self {
        Self {
            product_id,
            expires: Some(expires),
        }
    }

    /// Whether the link has expired as of `today`.
    ///
    /// A link is valid through the end of its expiry day.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        match self.expires {
            Some(expires) => expires < today,
            None => false,
        }
    }
}

/// External commerce collaborator resolving product entitlements.
pub trait EntitlementProvider: Send + Sync {
    /// Products a file is linked to.
    fn linked_products(&self, file_id: i64) -> Vec<ProductLink>;

    /// Whether the user holds a (purchased, still valid) entitlement to the
    /// product.
    fn user_holds_entitlement(&self, user_id: i64, product_id: i64) -> bool;
}

/// In-memory entitlement provider for tests and simple deployments where
/// the file-to-product mapping is static metadata.
#[derive(Debug, Default)]
pub struct StaticEntitlements {
    links: HashMap<i64, Vec<ProductLink>>,
    holdings: HashSet<(i64, i64)>,
}

impl StaticEntitlements {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a file to a product.
    pub fn link_file(&mut self, file_id: i64, link: ProductLink) {
        self.links.entry(file_id).or_default().push(link);
    }

    /// Record that a user holds a product.
    pub fn grant_product(&mut self, user_id: i64, product_id: i64) {
        self.holdings.insert((user_id, product_id));
    }
}

impl EntitlementProvider for StaticEntitlements {
    fn linked_products(&self, file_id: i64) -> Vec<ProductLink> {
        self.links.get(&file_id).cloned().unwrap_or_default()
    }

    fn user_holds_entitlement(&self, user_id: i64, product_id: i64) -> bool {
        self.holdings.contains(&(user_id, product_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_link_without_expiry_never_expires() {
        let link = ProductLink::new(10);
        assert!(!link.is_expired(date(2999, 12, 31)));
    }

    #[test]
    fn test_link_valid_through_expiry_day() {
        let link = ProductLink::expiring(10, date(2026, 6, 30));
        assert!(!link.is_expired(date(2026, 6, 30)));
        assert!(link.is_expired(date(2026, 7, 1)));
    }

    #[test]
    fn test_static_provider() {
        let mut provider = StaticEntitlements::new();
        provider.link_file(5, ProductLink::new(100));
        provider.grant_product(42, 100);

        assert_eq!(provider.linked_products(5).len(), 1);
        assert!(provider.linked_products(6).is_empty());
        assert!(provider.user_holds_entitlement(42, 100));
        assert!(!provider.user_holds_entitlement(42, 101));
        assert!(!provider.user_holds_entitlement(43, 100));
    }
}
