use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::info;

use citadel_application::AclRepository;
use citadel_core::{AppError, AppResult, NonEmptyString};
use citadel_domain::{
    Affiliation, AffiliationId, AffiliationKey, AffiliationType, CompleteRole, Permission,
    PermissionId, Role, RoleId, RoleInclude, UserId,
};

mod affiliations;
mod loading;
mod permissions;
mod roles;
mod users;


/// PostgreSQL-backed repository for roles, permissions and affiliations.
#[derive(Clone)]
pub struct PostgresAclRepository {
    pool: PgPool,
}

impl PostgresAclRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    title: String,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: i64,
    title: String,
}

#[derive(Debug, FromRow)]
struct AffiliationRow {
    id: i64,
    affiliation_target_id: i64,
    affiliation_type: String,
}

#[async_trait]
impl AclRepository for PostgresAclRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.find_role_impl(role_id).await
    }

    async fn find_role_by_title(&self, title: &str) -> AppResult<Option<Role>> {
        self.find_role_by_title_impl(title).await
    }

    async fn create_role(&self, title: NonEmptyString) -> AppResult<Role> {
        self.create_role_impl(title).await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<u64> {
        self.delete_role_impl(role_id).await
    }

    async fn load_roles(
        &self,
        role_id: Option<RoleId>,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        self.load_roles_impl(role_id, include).await
    }

    async fn list_roles_for_user(
        &self,
        user_id: UserId,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        self.list_roles_for_user_impl(user_id, include).await
    }

    async fn find_or_create_permission(&self, title: NonEmptyString) -> AppResult<Permission> {
        self.find_or_create_permission_impl(title).await
    }

    async fn attach_permissions(
        &self,
        role_id: RoleId,
        titles: &[NonEmptyString],
        inverse: bool,
    ) -> AppResult<()> {
        self.attach_permissions_impl(role_id, titles, inverse).await
    }

    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        self.detach_permission_impl(role_id, permission_id).await
    }

    async fn attach_users(&self, role_id: RoleId, user_ids: &[UserId]) -> AppResult<()> {
        self.attach_users_impl(role_id, user_ids).await
    }

    async fn detach_user(&self, role_id: RoleId, user_id: UserId) -> AppResult<bool> {
        self.detach_user_impl(role_id, user_id).await
    }

    async fn find_or_create_affiliation(&self, key: AffiliationKey) -> AppResult<Affiliation> {
        self.find_or_create_affiliation_impl(key).await
    }

    async fn attach_affiliations(
        &self,
        role_id: RoleId,
        keys: &[AffiliationKey],
        inverse: bool,
    ) -> AppResult<()> {
        self.attach_affiliations_impl(role_id, keys, inverse).await
    }

    async fn detach_affiliation(
        &self,
        role_id: RoleId,
        affiliation_id: AffiliationId,
    ) -> AppResult<bool> {
        self.detach_affiliation_impl(role_id, affiliation_id).await
    }
}

/// Takes a shared lock on the role row so it cannot be deleted mid-transaction.
async fn lock_role(connection: &mut PgConnection, role_id: RoleId) -> AppResult<()> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM acl_roles
        WHERE id = $1
        FOR SHARE
        "#,
    )
    .bind(role_id.as_i64())
    .fetch_optional(&mut *connection)
    .await
    .map_err(|error| AppError::Persistence(format!("failed to lock role: {error}")))?
    .map(|_| ())
    .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
}

fn role_from_row(row: RoleRow) -> AppResult<Role> {
    let title = NonEmptyString::new(row.title).map_err(|error| {
        AppError::Persistence(format!("invalid stored title for role '{}': {error}", row.id))
    })?;

    Ok(Role::new(RoleId::new(row.id), title))
}

fn permission_from_row(row: PermissionRow) -> AppResult<Permission> {
    let title = NonEmptyString::new(row.title).map_err(|error| {
        AppError::Persistence(format!(
            "invalid stored title for permission '{}': {error}",
            row.id
        ))
    })?;

    Ok(Permission::new(PermissionId::new(row.id), title))
}

fn affiliation_from_row(row: AffiliationRow) -> AppResult<Affiliation> {
    let affiliation_type =
        AffiliationType::from_str(row.affiliation_type.as_str()).map_err(|error| {
            AppError::Persistence(format!(
                "invalid stored type for affiliation '{}': {error}",
                row.id
            ))
        })?;

    Ok(Affiliation::new(
        AffiliationId::new(row.id),
        AffiliationKey {
            affiliation_target_id: row.affiliation_target_id,
            affiliation_type,
        },
    ))
}

/// Returns the violated constraint name for unique violations.
fn unique_violation_constraint(error: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(database_error) = error else {
        return None;
    };
    if database_error.code().as_deref() != Some("23505") {
        return None;
    }

    Some(database_error.constraint().unwrap_or_default().to_owned())
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23503"))
}
