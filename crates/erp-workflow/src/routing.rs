//! Reviewer routing
//!
//! Provides [`RoutingTable`], mapping each entity kind to the reviewer roles
//! whose decision it awaits.

use erp_store::{EntityKind, RoleId};
use std::collections::{BTreeMap, BTreeSet};

/// Reviews fixed deposits
pub const ACCOUNTS_REVIEWER: &str = "ACCOUNTS_REVIEWER";
/// Reviews HSN/SAC codes
pub const TAX_REVIEWER: &str = "TAX_REVIEWER";
/// Reviews base item codes, specifications and units
pub const MASTER_DATA_REVIEWER: &str = "MASTER_DATA_REVIEWER";
/// Reviews client purchase orders
pub const SALES_REVIEWER: &str = "SALES_REVIEWER";
/// May review every kind
pub const ADMIN: &str = "ADMIN";

/// Entity kind -> required approver roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: BTreeMap<EntityKind, BTreeSet<RoleId>>,
    superusers: BTreeSet<RoleId>,
}

impl RoutingTable {
    /// Create empty table (nobody may review anything)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create table with the built-in reviewer roles
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.route(EntityKind::FixedDeposit, ACCOUNTS_REVIEWER);
        table.route(EntityKind::HsnCode, TAX_REVIEWER);
        table.route(EntityKind::BaseItemCode, MASTER_DATA_REVIEWER);
        table.route(EntityKind::Specification, MASTER_DATA_REVIEWER);
        table.route(EntityKind::Unit, MASTER_DATA_REVIEWER);
        table.route(EntityKind::ClientPurchaseOrder, SALES_REVIEWER);
        table.add_superuser(ADMIN);
        table
    }

    /// Route `kind` to `role` (in addition to existing routes)
    pub fn route(&mut self, kind: EntityKind, role: impl Into<RoleId>) {
        self.routes.entry(kind).or_default().insert(role.into());
    }

    /// Replace every route for `kind`
    pub fn set_routes<I, R>(&mut self, kind: EntityKind, roles: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.routes
            .insert(kind, roles.into_iter().map(Into::into).collect());
    }

    /// Allow `role` to review every kind
    pub fn add_superuser(&mut self, role: impl Into<RoleId>) {
        self.superusers.insert(role.into());
    }

    /// Roles routed for `kind`, superusers excluded
    #[must_use]
    pub fn roles_for(&self, kind: EntityKind) -> Vec<RoleId> {
        self.routes
            .get(&kind)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `role` decides entities of `kind`
    #[must_use]
    pub fn may_review(&self, kind: EntityKind, role: &RoleId) -> bool {
        self.superusers.contains(role)
            || self
                .routes
                .get(&kind)
                .is_some_and(|roles| roles.contains(role))
    }

    /// Kinds `role` decides, in declaration order
    #[must_use]
    pub fn kinds_for(&self, role: &RoleId) -> Vec<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| self.may_review(*kind, role))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_route_each_kind() {
        let table = RoutingTable::with_defaults();
        for kind in EntityKind::ALL {
            assert!(!table.roles_for(kind).is_empty(), "{kind} has no reviewer");
        }
        assert!(table.may_review(EntityKind::HsnCode, &RoleId::new("tax_reviewer")));
        assert!(!table.may_review(EntityKind::HsnCode, &RoleId::new(ACCOUNTS_REVIEWER)));
    }

    #[test]
    fn superuser_reviews_everything() {
        let table = RoutingTable::with_defaults();
        assert_eq!(table.kinds_for(&RoleId::new(ADMIN)), EntityKind::ALL.to_vec());
    }

    #[test]
    fn kinds_for_shared_role() {
        let table = RoutingTable::with_defaults();
        assert_eq!(
            table.kinds_for(&RoleId::new(MASTER_DATA_REVIEWER)),
            vec![EntityKind::BaseItemCode, EntityKind::Specification, EntityKind::Unit]
        );
    }

    #[test]
    fn set_routes_replaces() {
        let mut table = RoutingTable::with_defaults();
        table.set_routes(EntityKind::HsnCode, ["GST_OFFICER"]);
        assert!(!table.may_review(EntityKind::HsnCode, &RoleId::new(TAX_REVIEWER)));
        assert!(table.may_review(EntityKind::HsnCode, &RoleId::new("gst_officer")));
    }
}
