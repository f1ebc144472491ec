use super::*;

impl AclService {
    /// Returns a role with its permissions, users and affiliations attached.
    pub async fn get_complete_role(&self, role_id: RoleId) -> AppResult<CompleteRole> {
        self.repository
            .load_roles(Some(role_id), RoleInclude::all())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| role_not_found(role_id))
    }

    /// Returns every role with its permissions, users and affiliations attached.
    pub async fn list_complete_roles(&self) -> AppResult<Vec<CompleteRole>> {
        self.repository.load_roles(None, RoleInclude::all()).await
    }

    /// Loads roles with an explicit selection of relation sets.
    pub async fn load_roles(
        &self,
        role_id: Option<RoleId>,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        let roles = self.repository.load_roles(role_id, include).await?;
        match role_id {
            Some(role_id) if roles.is_empty() => Err(role_not_found(role_id)),
            _ => Ok(roles),
        }
    }

    /// Creates a role. Fails with `Conflict` when the title is already taken.
    pub async fn add_role(&self, title: &str) -> AppResult<Role> {
        let title = NonEmptyString::new(title)?;
        let role = self.repository.create_role(title).await?;

        info!(role_id = %role.id(), title = role.title(), "role created");
        Ok(role)
    }

    /// Deletes a role and its links. Returns 0 when the role does not exist.
    pub async fn remove_role(&self, role_id: RoleId) -> AppResult<u64> {
        let removed = self.repository.delete_role(role_id).await?;
        if removed == 0 {
            debug!(role_id = %role_id, "role removal skipped, no such role");
        } else {
            info!(role_id = %role_id, "role removed");
        }

        Ok(removed)
    }

    /// Deletes the role with this title, trimmed the same way `add_role` stores it.
    pub async fn remove_role_by_title(&self, title: &str) -> AppResult<()> {
        let title = title.trim();
        let role = self
            .repository
            .find_role_by_title(title)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role titled '{title}' was not found")))?;

        self.remove_role(role.id()).await.map(|_| ())
    }
}
