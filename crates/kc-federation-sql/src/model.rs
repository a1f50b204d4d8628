//! Entities read from the external store.
//!
//! Built fresh from every result row and never cached.

use serde::Serialize;

/// A user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Id in the external store.
    pub id: String,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: Option<String>,
}

/// A role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    /// Id in the external store.
    pub id: String,
    /// Role name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// A user together with the roles granted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithRoles {
    /// The user.
    #[serde(flatten)]
    pub user: User,
    /// Roles, in result-set order.
    pub roles: Vec<Role>,
}
