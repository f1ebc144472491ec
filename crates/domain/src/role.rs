use citadel_core::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::{AffiliationGrant, PermissionGrant, RoleId, User};

/// Named bundle of permissions, affiliations and users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    title: NonEmptyString,
}

impl Role {
    /// Creates a role from persisted values.
    #[must_use]
    pub fn new(id: RoleId, title: NonEmptyString) -> Self {
        Self { id, title }
    }

    /// Placeholder title given to a role provisioned by id.
    #[must_use]
    pub fn provisioned_title(id: RoleId) -> String {
        format!("role-{id}")
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the unique role title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }
}

/// Selects which relation sets are loaded alongside roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleInclude {
    /// Load permission links.
    pub permissions: bool,
    /// Load member users.
    pub users: bool,
    /// Load affiliation links.
    pub affiliations: bool,
}

impl RoleInclude {
    /// Loads every relation set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            permissions: true,
            users: true,
            affiliations: true,
        }
    }

    /// Loads only the role rows.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            permissions: false,
            users: false,
            affiliations: false,
        }
    }
}

/// Role with its related sets attached for presentation.
///
/// Sets that were not requested through [`RoleInclude`] are left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteRole {
    /// Role row.
    pub role: Role,
    /// Permission links ordered by permission title.
    pub permissions: Vec<PermissionGrant>,
    /// Member users ordered by name.
    pub users: Vec<User>,
    /// Affiliation links ordered by type and target id.
    pub affiliations: Vec<AffiliationGrant>,
}

impl CompleteRole {
    /// Wraps a role with empty relation sets.
    #[must_use]
    pub fn bare(role: Role) -> Self {
        Self {
            role,
            permissions: Vec::new(),
            users: Vec::new(),
            affiliations: Vec::new(),
        }
    }

    /// Returns the link for a permission title, if present.
    #[must_use]
    pub fn permission(&self, title: &str) -> Option<&PermissionGrant> {
        self.permissions
            .iter()
            .find(|grant| grant.permission.title() == title)
    }
}
