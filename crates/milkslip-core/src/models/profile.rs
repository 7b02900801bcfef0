use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant role governing what a profile may do with receipts.
///
/// Every authenticated profile can read every receipt in the tenant;
/// creation requires Admin or Member, mutation and deletion require Admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "profile_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    Viewer,
}

impl Role {
    /// May this role create new receipts?
    pub fn can_create(self) -> bool {
        matches!(self, Role::Admin | Role::Member)
    }

    /// May this role update or delete persisted receipts?
    pub fn can_mutate(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// One profile per account; auto-created on signup defaulting to Member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_create());
        assert!(Role::Admin.can_mutate());
        assert!(Role::Member.can_create());
        assert!(!Role::Member.can_mutate());
        assert!(!Role::Viewer.can_create());
        assert!(!Role::Viewer.can_mutate());
    }
}
