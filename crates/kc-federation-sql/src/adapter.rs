//! Conversion into the host's federation shapes.

use kc_federation::{FederatedRole, FederatedUser, StorageId};

use crate::model::{Role, UserWithRoles};

/// Converts a role; the provider component is the role's container.
#[must_use]
pub fn to_federated_role(role: Role, component_id: &str) -> FederatedRole {
    FederatedRole {
        id: role.id,
        name: role.name,
        description: role.description,
        container_id: component_id.to_string(),
    }
}

/// Converts a user and its roles, giving the user a host storage id.
#[must_use]
pub fn to_federated_user(found: UserWithRoles, component_id: &str) -> FederatedUser {
    let UserWithRoles { user, roles } = found;
    FederatedUser {
        id: StorageId::new(component_id, user.id).to_string(),
        username: user.username,
        email: user.email,
        federation_link: component_id.to_string(),
        roles: roles
            .into_iter()
            .map(|role| to_federated_role(role, component_id))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    #[test]
    fn builds_storage_id_and_links() {
        let found = UserWithRoles {
            user: User {
                id: "42".to_string(),
                username: "jdoe".to_string(),
                email: Some("jdoe@example.com".to_string()),
            },
            roles: vec![Role {
                id: "r1".to_string(),
                name: "admin".to_string(),
                description: Some("Administrators".to_string()),
            }],
        };

        let user = to_federated_user(found, "provider");
        assert_eq!(user.id, "f:provider:42");
        assert_eq!(user.storage_id().external_id(), "42");
        assert_eq!(user.federation_link, "provider");
        assert_eq!(user.roles[0].container_id, "provider");
        assert!(user.has_role("admin"));
    }
}
