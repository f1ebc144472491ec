use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use citadel_core::{AppError, AppResult, NonEmptyString};
use citadel_domain::{
    Affiliation, AffiliationGrant, AffiliationId, AffiliationKey, CompleteRole, Permission,
    PermissionGrant, PermissionId, Role, RoleId, RoleInclude, User, UserId,
};

use crate::{AclRepository, UserDirectory};

use super::AclService;

fn title(value: &str) -> NonEmptyString {
    NonEmptyString::new(value).unwrap_or_else(|_| unreachable!())
}

#[derive(Default)]
struct FakeAclRepository {
    roles: Mutex<Vec<Role>>,
    permission_attachments: Mutex<Vec<(RoleId, Vec<String>, bool)>>,
    user_attachments: Mutex<Vec<(RoleId, Vec<UserId>)>>,
    affiliation_attachments: Mutex<Vec<(RoleId, Vec<AffiliationKey>, bool)>>,
    detached: Mutex<Vec<String>>,
    roles_by_user: HashMap<UserId, Vec<CompleteRole>>,
}

impl FakeAclRepository {
    fn with_role(role_id: i64, role_title: &str) -> Self {
        Self {
            roles: Mutex::new(vec![Role::new(RoleId::new(role_id), title(role_title))]),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AclRepository for FakeAclRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn find_role_by_title(&self, role_title: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.title() == role_title)
            .cloned())
    }

    async fn create_role(&self, role_title: NonEmptyString) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        let next_id = roles.iter().map(|role| role.id().as_i64()).max().unwrap_or(0) + 1;
        let role = Role::new(RoleId::new(next_id), role_title);
        roles.push(role.clone());
        Ok(role)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut roles = self.roles.lock().await;
        let before = roles.len();
        roles.retain(|role| role.id() != role_id);
        Ok((before - roles.len()) as u64)
    }

    async fn load_roles(
        &self,
        role_id: Option<RoleId>,
        _include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|role| role_id.is_none_or(|role_id| role.id() == role_id))
            .cloned()
            .map(CompleteRole::bare)
            .collect())
    }

    async fn list_roles_for_user(
        &self,
        user_id: UserId,
        _include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        Ok(self
            .roles_by_user
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_or_create_permission(&self, value: NonEmptyString) -> AppResult<Permission> {
        Ok(Permission::new(PermissionId::new(1), value))
    }

    async fn attach_permissions(
        &self,
        role_id: RoleId,
        titles: &[NonEmptyString],
        inverse: bool,
    ) -> AppResult<()> {
        self.permission_attachments.lock().await.push((
            role_id,
            titles.iter().map(|value| value.as_str().to_owned()).collect(),
            inverse,
        ));
        Ok(())
    }

    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.detached
            .lock()
            .await
            .push(format!("permission:{role_id}:{permission_id}"));
        Ok(false)
    }

    async fn attach_users(&self, role_id: RoleId, user_ids: &[UserId]) -> AppResult<()> {
        self.user_attachments
            .lock()
            .await
            .push((role_id, user_ids.to_vec()));
        Ok(())
    }

    async fn detach_user(&self, role_id: RoleId, user_id: UserId) -> AppResult<bool> {
        self.detached
            .lock()
            .await
            .push(format!("user:{role_id}:{user_id}"));
        Ok(false)
    }

    async fn find_or_create_affiliation(&self, key: AffiliationKey) -> AppResult<Affiliation> {
        Ok(Affiliation::new(AffiliationId::new(1), key))
    }

    async fn attach_affiliations(
        &self,
        role_id: RoleId,
        keys: &[AffiliationKey],
        inverse: bool,
    ) -> AppResult<()> {
        self.affiliation_attachments
            .lock()
            .await
            .push((role_id, keys.to_vec(), inverse));
        Ok(())
    }

    async fn detach_affiliation(
        &self,
        role_id: RoleId,
        affiliation_id: AffiliationId,
    ) -> AppResult<bool> {
        self.detached
            .lock()
            .await
            .push(format!("affiliation:{role_id}:{affiliation_id}"));
        Ok(true)
    }
}

struct FakeUserDirectory {
    users: Vec<User>,
}

impl FakeUserDirectory {
    fn with_users(names: &[&str]) -> Self {
        Self {
            users: names
                .iter()
                .enumerate()
                .map(|(index, name)| User::new(UserId::new(index as i64 + 1), *name))
                .collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for FakeUserDirectory {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.iter().find(|user| user.id() == user_id).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> AppResult<Option<User>> {
        Ok(self.users.iter().find(|user| user.name() == name).cloned())
    }
}

fn build_service(
    repository: FakeAclRepository,
    users: &[&str],
) -> (AclService, Arc<FakeAclRepository>) {
    let repository = Arc::new(repository);
    let service = AclService::new(
        repository.clone(),
        Arc::new(FakeUserDirectory::with_users(users)),
    );
    (service, repository)
}

#[tokio::test]
async fn add_role_rejects_blank_title() {
    let (service, repository) = build_service(FakeAclRepository::default(), &[]);

    let result = service.add_role("   ").await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(repository.roles.lock().await.is_empty());
}

#[tokio::test]
async fn add_role_then_get_role_returns_title() {
    let (service, _) = build_service(FakeAclRepository::default(), &[]);

    let created = service
        .add_role("fleet-commander")
        .await
        .unwrap_or_else(|_| unreachable!());
    let loaded = service.get_role(created.id()).await;

    assert!(loaded.is_ok());
    assert_eq!(
        loaded.unwrap_or_else(|_| unreachable!()).title(),
        "fleet-commander"
    );
}

#[tokio::test]
async fn get_complete_role_fails_for_unknown_role() {
    let (service, _) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let result = service.get_complete_role(RoleId::new(2)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn load_roles_without_id_returns_every_role() {
    let (service, _) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let roles = service.load_roles(None, RoleInclude::none()).await;

    assert_eq!(roles.map(|roles| roles.len()).unwrap_or_default(), 1);
}

#[tokio::test]
async fn remove_role_by_title_fails_for_unknown_title() {
    let (service, _) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let result = service.remove_role_by_title("nonexistent").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn remove_role_by_title_deletes_matching_role() {
    let (service, repository) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let result = service.remove_role_by_title("director").await;

    assert!(result.is_ok());
    assert!(repository.roles.lock().await.is_empty());
}

#[tokio::test]
async fn remove_role_by_title_matches_the_trimmed_title() {
    let (service, repository) = build_service(FakeAclRepository::default(), &[]);
    let added = service.add_role(" ops ").await;
    assert!(added.is_ok());

    let result = service.remove_role_by_title(" ops ").await;

    assert!(result.is_ok());
    assert!(repository.roles.lock().await.is_empty());
}

#[tokio::test]
async fn remove_role_for_unknown_id_returns_zero() {
    let (service, _) = build_service(FakeAclRepository::default(), &[]);

    let removed = service.remove_role(RoleId::new(44)).await;

    assert_eq!(removed.unwrap_or(u64::MAX), 0);
}

#[tokio::test]
async fn give_role_permissions_requires_existing_role() {
    let (service, repository) = build_service(FakeAclRepository::default(), &[]);

    let result = service
        .give_role_permissions(RoleId::new(9), &["hangar.view"], false)
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(repository.permission_attachments.lock().await.is_empty());
}

#[tokio::test]
async fn give_role_permissions_passes_trimmed_titles_as_one_batch() {
    let (service, repository) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let result = service
        .give_role_permissions(RoleId::new(1), &[" hangar.view", "hangar.withdraw "], true)
        .await;

    assert!(result.is_ok());
    let attachments = repository.permission_attachments.lock().await;
    assert_eq!(attachments.len(), 1);
    assert_eq!(
        attachments[0],
        (
            RoleId::new(1),
            vec!["hangar.view".to_owned(), "hangar.withdraw".to_owned()],
            true
        )
    );
}

#[tokio::test]
async fn give_role_permissions_rejects_blank_title_before_writing() {
    let (service, repository) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let result = service
        .give_role_permissions(RoleId::new(1), &["hangar.view", " "], false)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(repository.permission_attachments.lock().await.is_empty());
}

#[tokio::test]
async fn give_user_role_requires_existing_user() {
    let (service, repository) = build_service(FakeAclRepository::default(), &["alice"]);

    let result = service.give_user_role(UserId::new(77), RoleId::new(1)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(repository.user_attachments.lock().await.is_empty());
}

#[tokio::test]
async fn give_user_role_does_not_require_existing_role() {
    let (service, repository) = build_service(FakeAclRepository::default(), &["alice"]);

    let result = service.give_user_role(UserId::new(1), RoleId::new(5)).await;

    assert!(result.is_ok());
    assert_eq!(
        repository.user_attachments.lock().await.as_slice(),
        &[(RoleId::new(5), vec![UserId::new(1)])]
    );
}

#[tokio::test]
async fn give_usernames_role_fails_whole_batch_on_unknown_names() {
    let (service, repository) =
        build_service(FakeAclRepository::with_role(1, "director"), &["alice", "bob"]);

    let result = service
        .give_usernames_role(&["alice", "mallory", "bob", "trudy"], RoleId::new(1))
        .await;

    match result {
        Err(AppError::NotFound(message)) => {
            assert!(message.contains("'mallory'"));
            assert!(message.contains("'trudy'"));
        }
        other => panic!("expected not found error, got {other:?}"),
    }
    assert!(repository.user_attachments.lock().await.is_empty());
}

#[tokio::test]
async fn give_usernames_role_attaches_resolved_users_in_order() {
    let (service, repository) =
        build_service(FakeAclRepository::with_role(1, "director"), &["alice", "bob"]);

    let result = service
        .give_usernames_role(&["bob", "alice"], RoleId::new(1))
        .await;

    assert!(result.is_ok());
    assert_eq!(
        repository.user_attachments.lock().await.as_slice(),
        &[(RoleId::new(1), vec![UserId::new(2), UserId::new(1)])]
    );
}

#[tokio::test]
async fn remove_user_from_role_tolerates_missing_membership() {
    let (service, repository) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let result = service
        .remove_user_from_role(UserId::new(999), RoleId::new(1))
        .await;

    assert!(result.is_ok());
    assert_eq!(
        repository.detached.lock().await.as_slice(),
        &["user:1:999".to_owned()]
    );
}

#[tokio::test]
async fn detach_operations_require_existing_role() {
    let (service, repository) = build_service(FakeAclRepository::default(), &[]);

    let permission = service
        .remove_permission_from_role(PermissionId::new(1), RoleId::new(3))
        .await;
    let affiliation = service
        .remove_affiliation_from_role(RoleId::new(3), AffiliationId::new(1))
        .await;

    assert!(matches!(permission, Err(AppError::NotFound(_))));
    assert!(matches!(affiliation, Err(AppError::NotFound(_))));
    assert!(repository.detached.lock().await.is_empty());
}

#[tokio::test]
async fn character_affiliations_are_keyed_by_character_type() {
    let (service, repository) = build_service(FakeAclRepository::with_role(1, "director"), &[]);

    let result = service
        .give_role_character_affiliations(RoleId::new(1), &[90_000_001, 90_000_002], true)
        .await;

    assert!(result.is_ok());
    assert_eq!(
        repository.affiliation_attachments.lock().await.as_slice(),
        &[(
            RoleId::new(1),
            vec![
                AffiliationKey::character(90_000_001),
                AffiliationKey::character(90_000_002)
            ],
            true
        )]
    );
}

#[tokio::test]
async fn user_has_permission_honours_explicit_denial() {
    let granting = |role_id: i64, inverse: bool| {
        let mut role = CompleteRole::bare(Role::new(RoleId::new(role_id), title("r")));
        role.permissions.push(PermissionGrant {
            permission: Permission::new(PermissionId::new(10), title("wallet.view")),
            inverse,
        });
        role.affiliations.push(AffiliationGrant {
            affiliation: Affiliation::new(AffiliationId::new(4), AffiliationKey::corporation(98)),
            inverse: false,
        });
        role
    };
    let repository = FakeAclRepository {
        roles_by_user: HashMap::from([
            (UserId::new(1), vec![granting(1, false)]),
            (UserId::new(2), vec![granting(1, false), granting(2, true)]),
        ]),
        ..FakeAclRepository::default()
    };
    let (service, _) = build_service(repository, &[]);

    assert!(matches!(
        service.user_has_permission(UserId::new(1), "wallet.view").await,
        Ok(true)
    ));
    assert!(matches!(
        service.user_has_permission(UserId::new(2), "wallet.view").await,
        Ok(false)
    ));
    assert!(matches!(
        service.user_has_permission(UserId::new(3), "wallet.view").await,
        Ok(false)
    ));
    assert!(matches!(
        service
            .user_affiliation_access(UserId::new(1), AffiliationKey::corporation(98))
            .await,
        Ok(true)
    ));
}
