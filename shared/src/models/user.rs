//! Roles and capabilities

use serde::{Deserialize, Serialize};

/// Role assigned to a user account by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Staff,
}

/// Operations guarded by role checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    RecordSale,
    ViewSales,
    AdjustStock,
    ManageCatalog,
    DeleteCatalog,
    ViewInventoryLog,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::RecordSale,
        Capability::ViewSales,
        Capability::AdjustStock,
        Capability::ManageCatalog,
        Capability::DeleteCatalog,
        Capability::ViewInventoryLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::RecordSale => "record_sale",
            Capability::ViewSales => "view_sales",
            Capability::AdjustStock => "adjust_stock",
            Capability::ManageCatalog => "manage_catalog",
            Capability::DeleteCatalog => "delete_catalog",
            Capability::ViewInventoryLog => "view_inventory_log",
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    /// Whether this role may perform the given operation
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Role::Superadmin | Role::Admin => true,
            Role::Staff => !matches!(capability, Capability::DeleteCatalog),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role or capability: {0}")]
pub struct UnknownRole(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_roles_allow_everything() {
        for capability in Capability::ALL {
            assert!(Role::Superadmin.allows(capability));
            assert!(Role::Admin.allows(capability));
        }
    }

    #[test]
    fn test_staff_cannot_delete_catalog() {
        assert!(!Role::Staff.allows(Capability::DeleteCatalog));
        assert!(Role::Staff.allows(Capability::RecordSale));
        assert!(Role::Staff.allows(Capability::AdjustStock));
        assert!(Role::Staff.allows(Capability::ViewInventoryLog));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("staff".parse::<Role>(), Ok(Role::Staff));
        assert_eq!("superadmin".parse::<Role>(), Ok(Role::Superadmin));
        assert!("Admin".parse::<Role>().is_err());
        assert_eq!(
            serde_json::to_string(&Role::Admin).unwrap(),
            "\"admin\""
        );
    }

    #[test]
    fn test_capability_names_round_trip() {
        for capability in Capability::ALL {
            assert_eq!(capability.as_str().parse::<Capability>(), Ok(capability));
        }
    }
}
