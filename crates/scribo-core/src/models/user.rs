use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "text", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

/// Authenticated identity attached to a request.
///
/// Authorization is owner-or-admin: a caller may act on a file when they own
/// it or hold the admin role.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn may_access(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_may_access() {
        let owner = Uuid::new_v4();
        let caller = Caller {
            user_id: owner,
            role: Role::User,
        };
        assert!(caller.may_access(owner));
        assert!(!caller.may_access(Uuid::new_v4()));
    }

    #[test]
    fn test_admin_may_access_any() {
        let caller = Caller {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(caller.may_access(Uuid::new_v4()));
    }

    #[test]
    fn test_role_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
