use async_trait::async_trait;

use citadel_core::{AppResult, NonEmptyString};
use citadel_domain::{
    Affiliation, AffiliationId, AffiliationKey, CompleteRole, Permission, PermissionId, Role,
    RoleId, RoleInclude, User, UserId,
};

/// Repository port for roles, permissions, affiliations and their links.
///
/// Attach methods are idempotent per link and update the `inverse` flag of an
/// existing link. Batch methods apply all items or none.
#[async_trait]
pub trait AclRepository: Send + Sync {
    /// Finds a role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by exact title.
    async fn find_role_by_title(&self, title: &str) -> AppResult<Option<Role>>;

    /// Creates a role, failing with `Conflict` when the title is taken.
    async fn create_role(&self, title: NonEmptyString) -> AppResult<Role>;

    /// Deletes a role and its link rows. Returns the number of roles removed.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<u64>;

    /// Loads one role, or every role when `role_id` is `None`, ordered by title.
    async fn load_roles(
        &self,
        role_id: Option<RoleId>,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>>;

    /// Loads every role the user is a member of, ordered by title.
    async fn list_roles_for_user(
        &self,
        user_id: UserId,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>>;

    /// Returns the permission with this title, creating it on first use.
    async fn find_or_create_permission(&self, title: NonEmptyString) -> AppResult<Permission>;

    /// Links permissions to an existing role, creating missing permission rows.
    async fn attach_permissions(
        &self,
        role_id: RoleId,
        titles: &[NonEmptyString],
        inverse: bool,
    ) -> AppResult<()>;

    /// Removes a permission link. Returns whether a link existed.
    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool>;

    /// Links users to a role, provisioning the role by id when it is missing.
    async fn attach_users(&self, role_id: RoleId, user_ids: &[UserId]) -> AppResult<()>;

    /// Removes a user link. Returns whether a link existed.
    async fn detach_user(&self, role_id: RoleId, user_id: UserId) -> AppResult<bool>;

    /// Returns the affiliation with this natural key, creating it on first use.
    async fn find_or_create_affiliation(&self, key: AffiliationKey) -> AppResult<Affiliation>;

    /// Links affiliations to an existing role, creating missing affiliation rows.
    async fn attach_affiliations(
        &self,
        role_id: RoleId,
        keys: &[AffiliationKey],
        inverse: bool,
    ) -> AppResult<()>;

    /// Removes an affiliation link. Returns whether a link existed.
    async fn detach_affiliation(
        &self,
        role_id: RoleId,
        affiliation_id: AffiliationId,
    ) -> AppResult<bool>;
}

/// Read-only port onto the identity subsystem that owns users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by identifier.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Finds a user by exact login name.
    async fn find_user_by_name(&self, name: &str) -> AppResult<Option<User>>;
}
