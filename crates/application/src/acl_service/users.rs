use super::*;

impl AclService {
    /// Adds a user to a role, provisioning the role by id when needed.
    pub async fn give_user_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        let user = self
            .user_directory
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))?;

        self.repository.attach_users(role_id, &[user.id()]).await?;

        info!(role_id = %role_id, user_id = %user_id, "user added to role");
        Ok(())
    }

    /// Adds users to a role by login name.
    ///
    /// Every name is resolved before anything is written: if any name is
    /// unknown the call fails with `NotFound` listing all unknown names and
    /// no membership is changed.
    pub async fn give_usernames_role(
        &self,
        user_names: &[impl AsRef<str> + Sync],
        role_id: RoleId,
    ) -> AppResult<()> {
        let mut user_ids = Vec::with_capacity(user_names.len());
        let mut missing = Vec::new();

        for user_name in user_names {
            let user_name = user_name.as_ref();
            match self.user_directory.find_user_by_name(user_name).await? {
                Some(user) => user_ids.push(user.id()),
                None => missing.push(format!("'{user_name}'")),
            }
        }

        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "users {} were not found",
                missing.join(", ")
            )));
        }

        if user_ids.is_empty() {
            return Ok(());
        }

        self.repository.attach_users(role_id, &user_ids).await?;

        info!(role_id = %role_id, user_count = user_ids.len(), "users added to role");
        Ok(())
    }

    /// Removes a user from a role. A missing membership is not an error.
    pub async fn remove_user_from_role(&self, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.get_role(role_id).await?;

        if self.repository.detach_user(role_id, user_id).await? {
            info!(role_id = %role_id, user_id = %user_id, "user removed from role");
        } else {
            debug!(role_id = %role_id, user_id = %user_id, "user was not a member of role");
        }

        Ok(())
    }

    /// Returns every role the user belongs to, fully loaded.
    pub async fn roles_for_user(&self, user_id: UserId) -> AppResult<Vec<CompleteRole>> {
        self.repository
            .list_roles_for_user(user_id, RoleInclude::all())
            .await
    }
}
