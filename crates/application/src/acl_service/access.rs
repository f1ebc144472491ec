use citadel_domain::{AccessDecision, evaluate_affiliation, evaluate_permission};

use super::*;

impl AclService {
    /// Resolves a permission for a user across all of their roles.
    pub async fn permission_decision(
        &self,
        user_id: UserId,
        permission_title: &str,
    ) -> AppResult<AccessDecision> {
        let roles = self
            .repository
            .list_roles_for_user(
                user_id,
                RoleInclude {
                    permissions: true,
                    ..RoleInclude::none()
                },
            )
            .await?;

        Ok(evaluate_permission(&roles, permission_title.trim()))
    }

    /// Returns whether any role grants the permission and none denies it.
    pub async fn user_has_permission(
        &self,
        user_id: UserId,
        permission_title: &str,
    ) -> AppResult<bool> {
        let decision = self.permission_decision(user_id, permission_title).await?;
        debug!(user_id = %user_id, permission = permission_title, ?decision, "permission evaluated");
        Ok(decision.is_granted())
    }

    /// Returns whether any role is affiliated with the target and none denies it.
    pub async fn user_affiliation_access(
        &self,
        user_id: UserId,
        key: AffiliationKey,
    ) -> AppResult<bool> {
        let roles = self
            .repository
            .list_roles_for_user(
                user_id,
                RoleInclude {
                    affiliations: true,
                    ..RoleInclude::none()
                },
            )
            .await?;

        let decision = evaluate_affiliation(&roles, key);
        debug!(user_id = %user_id, affiliation = %key, ?decision, "affiliation evaluated");
        Ok(decision.is_granted())
    }
}
