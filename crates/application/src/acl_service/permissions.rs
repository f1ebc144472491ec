use citadel_domain::Permission;

use super::*;

impl AclService {
    /// Returns the permission with this title, creating it on first use.
    pub async fn find_or_create_permission(&self, title: &str) -> AppResult<Permission> {
        let title = NonEmptyString::new(title)?;
        self.repository.find_or_create_permission(title).await
    }

    /// Grants, or with `inverse` explicitly denies, a permission to a role.
    ///
    /// Repeating the call is a no-op; a call with a different `inverse`
    /// value replaces the flag on the existing link.
    pub async fn give_role_permission(
        &self,
        role_id: RoleId,
        permission_title: &str,
        inverse: bool,
    ) -> AppResult<()> {
        self.give_role_permissions(role_id, &[permission_title], inverse)
            .await
    }

    /// Applies [`Self::give_role_permission`] to every title as one atomic batch.
    pub async fn give_role_permissions(
        &self,
        role_id: RoleId,
        permission_titles: &[impl AsRef<str> + Sync],
        inverse: bool,
    ) -> AppResult<()> {
        let titles = parse_titles(permission_titles)?;
        self.get_role(role_id).await?;

        self.repository
            .attach_permissions(role_id, &titles, inverse)
            .await?;

        info!(
            role_id = %role_id,
            permission_count = titles.len(),
            inverse,
            "permissions attached to role"
        );
        Ok(())
    }

    /// Detaches a permission from a role. A missing link is not an error.
    pub async fn remove_permission_from_role(
        &self,
        permission_id: PermissionId,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.get_role(role_id).await?;

        if self
            .repository
            .detach_permission(role_id, permission_id)
            .await?
        {
            info!(role_id = %role_id, permission_id = %permission_id, "permission detached");
        } else {
            debug!(role_id = %role_id, permission_id = %permission_id, "permission was not attached");
        }

        Ok(())
    }
}
