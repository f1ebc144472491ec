use std::sync::Arc;

use citadel_core::{AppError, AppResult, NonEmptyString};
use citadel_domain::{
    AffiliationId, AffiliationKey, CompleteRole, PermissionId, Role, RoleId, RoleInclude, UserId,
};
use tracing::{debug, info};

use crate::{AclRepository, UserDirectory};

mod access;
mod affiliations;
mod permissions;
mod roles;
mod users;

#[cfg(test)]
mod tests;

/// Application service owning role, permission and affiliation administration.
#[derive(Clone)]
pub struct AclService {
    repository: Arc<dyn AclRepository>,
    user_directory: Arc<dyn UserDirectory>,
}

impl AclService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(repository: Arc<dyn AclRepository>, user_directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            repository,
            user_directory,
        }
    }

    /// Returns a role, failing with `NotFound` when it does not exist.
    pub async fn get_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| role_not_found(role_id))
    }
}

fn role_not_found(role_id: RoleId) -> AppError {
    AppError::NotFound(format!("role '{role_id}' was not found"))
}

fn parse_titles(titles: &[impl AsRef<str>]) -> AppResult<Vec<NonEmptyString>> {
    titles
        .iter()
        .map(|title| NonEmptyString::new(title.as_ref()))
        .collect()
}
