use citadel_core::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::PermissionId;

/// Named capability that a role can be granted or explicitly denied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    title: NonEmptyString,
}

impl Permission {
    /// Creates a permission from persisted values.
    #[must_use]
    pub fn new(id: PermissionId, title: NonEmptyString) -> Self {
        Self { id, title }
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the unique permission title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }
}

/// Role-to-permission link with its inverse flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Linked permission.
    pub permission: Permission,
    /// Marks the link as an explicit denial.
    pub inverse: bool,
}
