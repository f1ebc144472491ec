use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use citadel_application::AclRepository;
use citadel_core::{AppError, AppResult, NonEmptyString};
use citadel_domain::{
    Affiliation, AffiliationGrant, AffiliationId, AffiliationKey, CompleteRole, Permission,
    PermissionGrant, PermissionId, Role, RoleId, RoleInclude, User, UserId,
};

use crate::InMemoryUserDirectory;


#[derive(Debug, Default)]
struct AclState {
    last_role_id: i64,
    last_permission_id: i64,
    last_affiliation_id: i64,
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    affiliations: BTreeMap<AffiliationId, Affiliation>,
    role_permissions: BTreeMap<(RoleId, PermissionId), bool>,
    role_users: BTreeSet<(RoleId, UserId)>,
    role_affiliations: BTreeMap<(RoleId, AffiliationId), bool>,
}

impl AclState {
    fn require_role(&self, role_id: RoleId) -> AppResult<()> {
        if self.roles.contains_key(&role_id) {
            return Ok(());
        }

        Err(AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    fn title_taken(&self, title: &str) -> bool {
        self.roles.values().any(|role| role.title() == title)
    }

    fn permission_or_insert(&mut self, title: &NonEmptyString) -> Permission {
        if let Some(permission) = self
            .permissions
            .values()
            .find(|permission| permission.title() == title.as_str())
        {
            return permission.clone();
        }

        self.last_permission_id += 1;
        let permission = Permission::new(PermissionId::new(self.last_permission_id), title.clone());
        self.permissions.insert(permission.id(), permission.clone());
        permission
    }

    fn affiliation_or_insert(&mut self, key: AffiliationKey) -> Affiliation {
        if let Some(affiliation) = self
            .affiliations
            .values()
            .find(|affiliation| affiliation.key() == key)
        {
            return affiliation.clone();
        }

        self.last_affiliation_id += 1;
        let affiliation = Affiliation::new(AffiliationId::new(self.last_affiliation_id), key);
        self.affiliations.insert(affiliation.id(), affiliation.clone());
        affiliation
    }

    fn complete(
        &self,
        role: &Role,
        include: RoleInclude,
        users: &BTreeMap<UserId, User>,
    ) -> CompleteRole {
        let role_id = role.id();
        let mut complete = CompleteRole::bare(role.clone());

        if include.permissions {
            complete.permissions = self
                .role_permissions
                .iter()
                .filter(|((linked_role_id, _), _)| *linked_role_id == role_id)
                .filter_map(|((_, permission_id), inverse)| {
                    self.permissions
                        .get(permission_id)
                        .map(|permission| PermissionGrant {
                            permission: permission.clone(),
                            inverse: *inverse,
                        })
                })
                .collect();
            complete
                .permissions
                .sort_by(|left, right| left.permission.title().cmp(right.permission.title()));
        }

        if include.users {
            complete.users = self
                .role_users
                .iter()
                .filter(|(linked_role_id, _)| *linked_role_id == role_id)
                .filter_map(|(_, user_id)| users.get(user_id).cloned())
                .collect();
            complete
                .users
                .sort_by(|left, right| left.name().cmp(right.name()));
        }

        if include.affiliations {
            complete.affiliations = self
                .role_affiliations
                .iter()
                .filter(|((linked_role_id, _), _)| *linked_role_id == role_id)
                .filter_map(|((_, affiliation_id), inverse)| {
                    self.affiliations
                        .get(affiliation_id)
                        .map(|affiliation| AffiliationGrant {
                            affiliation: affiliation.clone(),
                            inverse: *inverse,
                        })
                })
                .collect();
            complete.affiliations.sort_by_key(|grant| {
                (
                    grant.affiliation.affiliation_type().as_str(),
                    grant.affiliation.affiliation_target_id(),
                )
            });
        }

        complete
    }

    fn sorted_by_title(mut roles: Vec<CompleteRole>) -> Vec<CompleteRole> {
        roles.sort_by(|left, right| left.role.title().cmp(right.role.title()));
        roles
    }
}

/// In-memory ACL repository implementation.
///
/// All mutations take a single write guard, so batches are applied whole.
#[derive(Debug)]
pub struct InMemoryAclRepository {
    state: RwLock<AclState>,
    user_directory: Arc<InMemoryUserDirectory>,
}

impl InMemoryAclRepository {
    /// Creates an empty repository resolving members through `user_directory`.
    #[must_use]
    pub fn new(user_directory: Arc<InMemoryUserDirectory>) -> Self {
        Self {
            state: RwLock::new(AclState::default()),
            user_directory,
        }
    }

    /// Returns the number of stored permission rows.
    pub async fn permission_count(&self) -> usize {
        self.state.read().await.permissions.len()
    }

    /// Returns the number of stored affiliation rows.
    pub async fn affiliation_count(&self) -> usize {
        self.state.read().await.affiliations.len()
    }

    /// Returns the number of link rows that reference the role.
    pub async fn link_count(&self, role_id: RoleId) -> usize {
        let state = self.state.read().await;
        state
            .role_permissions
            .keys()
            .filter(|(linked_role_id, _)| *linked_role_id == role_id)
            .count()
            + state
                .role_users
                .iter()
                .filter(|(linked_role_id, _)| *linked_role_id == role_id)
                .count()
            + state
                .role_affiliations
                .keys()
                .filter(|(linked_role_id, _)| *linked_role_id == role_id)
                .count()
    }
}

#[async_trait]
impl AclRepository for InMemoryAclRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_title(&self, title: &str) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .values()
            .find(|role| role.title() == title)
            .cloned())
    }

    async fn create_role(&self, title: NonEmptyString) -> AppResult<Role> {
        let mut state = self.state.write().await;
        if state.title_taken(title.as_str()) {
            return Err(AppError::Conflict(format!("role '{title}' already exists")));
        }

        let next_id = state.last_role_id + 1;
        state.last_role_id = next_id;
        let role = Role::new(RoleId::new(next_id), title);
        state.roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut state = self.state.write().await;
        if state.roles.remove(&role_id).is_none() {
            return Ok(0);
        }

        state
            .role_permissions
            .retain(|(linked_role_id, _), _| *linked_role_id != role_id);
        state
            .role_users
            .retain(|(linked_role_id, _)| *linked_role_id != role_id);
        state
            .role_affiliations
            .retain(|(linked_role_id, _), _| *linked_role_id != role_id);
        Ok(1)
    }

    async fn load_roles(
        &self,
        role_id: Option<RoleId>,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        let users = self.user_directory.snapshot().await;
        let state = self.state.read().await;

        let roles = state
            .roles
            .values()
            .filter(|role| role_id.is_none_or(|role_id| role.id() == role_id))
            .map(|role| state.complete(role, include, &users))
            .collect();

        Ok(AclState::sorted_by_title(roles))
    }

    async fn list_roles_for_user(
        &self,
        user_id: UserId,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        let users = self.user_directory.snapshot().await;
        if !users.contains_key(&user_id) {
            return Ok(Vec::new());
        }
        let state = self.state.read().await;

        let roles = state
            .role_users
            .iter()
            .filter(|(_, member_id)| *member_id == user_id)
            .filter_map(|(role_id, _)| state.roles.get(role_id))
            .map(|role| state.complete(role, include, &users))
            .collect();

        Ok(AclState::sorted_by_title(roles))
    }

    async fn find_or_create_permission(&self, title: NonEmptyString) -> AppResult<Permission> {
        Ok(self.state.write().await.permission_or_insert(&title))
    }

    async fn attach_permissions(
        &self,
        role_id: RoleId,
        titles: &[NonEmptyString],
        inverse: bool,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_role(role_id)?;

        for title in titles {
            let permission = state.permission_or_insert(title);
            state
                .role_permissions
                .insert((role_id, permission.id()), inverse);
        }

        Ok(())
    }

    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .role_permissions
            .remove(&(role_id, permission_id))
            .is_some())
    }

    async fn attach_users(&self, role_id: RoleId, user_ids: &[UserId]) -> AppResult<()> {
        let users = self.user_directory.snapshot().await;
        if let Some(missing) = user_ids.iter().find(|user_id| !users.contains_key(*user_id)) {
            return Err(AppError::NotFound(format!("user '{missing}' was not found")));
        }

        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            let title = NonEmptyString::new(Role::provisioned_title(role_id))?;
            if state.title_taken(title.as_str()) {
                return Err(AppError::Conflict(format!(
                    "role '{role_id}' cannot be provisioned: title '{title}' is taken"
                )));
            }

            state.last_role_id = state.last_role_id.max(role_id.as_i64());
            state.roles.insert(role_id, Role::new(role_id, title));
            info!(role_id = %role_id, "provisioned role by id");
        }

        for user_id in user_ids {
            state.role_users.insert((role_id, *user_id));
        }

        Ok(())
    }

    async fn detach_user(&self, role_id: RoleId, user_id: UserId) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .role_users
            .remove(&(role_id, user_id)))
    }

    async fn find_or_create_affiliation(&self, key: AffiliationKey) -> AppResult<Affiliation> {
        Ok(self.state.write().await.affiliation_or_insert(key))
    }

    async fn attach_affiliations(
        &self,
        role_id: RoleId,
        keys: &[AffiliationKey],
        inverse: bool,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_role(role_id)?;

        for key in keys {
            let affiliation = state.affiliation_or_insert(*key);
            state
                .role_affiliations
                .insert((role_id, affiliation.id()), inverse);
        }

        Ok(())
    }

    async fn detach_affiliation(
        &self,
        role_id: RoleId,
        affiliation_id: AffiliationId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .role_affiliations
            .remove(&(role_id, affiliation_id))
            .is_some())
    }
}
