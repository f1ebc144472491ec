use std::collections::HashMap;

use citadel_domain::{AffiliationGrant, PermissionGrant, User};

use super::*;

#[derive(Debug, FromRow)]
struct RolePermissionRow {
    role_id: i64,
    #[sqlx(flatten)]
    permission: PermissionRow,
    inverse: bool,
}

#[derive(Debug, FromRow)]
struct RoleUserRow {
    role_id: i64,
    user_id: i64,
    user_name: String,
}

#[derive(Debug, FromRow)]
struct RoleAffiliationRow {
    role_id: i64,
    #[sqlx(flatten)]
    affiliation: AffiliationRow,
    inverse: bool,
}

impl PostgresAclRepository {
    pub(super) async fn load_roles_impl(
        &self,
        role_id: Option<RoleId>,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, title
            FROM acl_roles
            WHERE $1::BIGINT IS NULL OR id = $1
            ORDER BY title
            "#,
        )
        .bind(role_id.map(|role_id| role_id.as_i64()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to list roles: {error}")))?;

        self.attach_relations(rows, include).await
    }

    pub(super) async fn list_roles_for_user_impl(
        &self,
        user_id: UserId,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT roles.id, roles.title
            FROM acl_roles AS roles
            INNER JOIN acl_role_users AS links
                ON links.role_id = roles.id
            WHERE links.user_id = $1
            ORDER BY roles.title
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to list user roles: {error}")))?;

        self.attach_relations(rows, include).await
    }

    async fn attach_relations(
        &self,
        rows: Vec<RoleRow>,
        include: RoleInclude,
    ) -> AppResult<Vec<CompleteRole>> {
        let mut roles = rows
            .into_iter()
            .map(|row| role_from_row(row).map(CompleteRole::bare))
            .collect::<AppResult<Vec<_>>>()?;
        if roles.is_empty() {
            return Ok(roles);
        }

        let role_ids = roles
            .iter()
            .map(|role| role.role.id().as_i64())
            .collect::<Vec<_>>();
        let positions = role_ids
            .iter()
            .enumerate()
            .map(|(position, role_id)| (*role_id, position))
            .collect::<HashMap<_, _>>();

        if include.permissions {
            for row in self.fetch_permission_links(&role_ids).await? {
                if let Some(position) = positions.get(&row.role_id) {
                    roles[*position].permissions.push(PermissionGrant {
                        permission: permission_from_row(row.permission)?,
                        inverse: row.inverse,
                    });
                }
            }
        }

        if include.users {
            for row in self.fetch_user_links(&role_ids).await? {
                if let Some(position) = positions.get(&row.role_id) {
                    roles[*position]
                        .users
                        .push(User::new(UserId::new(row.user_id), row.user_name));
                }
            }
        }

        if include.affiliations {
            for row in self.fetch_affiliation_links(&role_ids).await? {
                if let Some(position) = positions.get(&row.role_id) {
                    roles[*position].affiliations.push(AffiliationGrant {
                        affiliation: affiliation_from_row(row.affiliation)?,
                        inverse: row.inverse,
                    });
                }
            }
        }

        Ok(roles)
    }

    async fn fetch_permission_links(&self, role_ids: &[i64]) -> AppResult<Vec<RolePermissionRow>> {
        sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT
                links.role_id,
                permissions.id,
                permissions.title,
                links.inverse
            FROM acl_role_permissions AS links
            INNER JOIN acl_permissions AS permissions
                ON permissions.id = links.permission_id
            WHERE links.role_id = ANY($1)
            ORDER BY permissions.title
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to load role permissions: {error}"))
        })
    }

    async fn fetch_user_links(&self, role_ids: &[i64]) -> AppResult<Vec<RoleUserRow>> {
        sqlx::query_as::<_, RoleUserRow>(
            r#"
            SELECT
                links.role_id,
                users.id AS user_id,
                users.name AS user_name
            FROM acl_role_users AS links
            INNER JOIN users
                ON users.id = links.user_id
            WHERE links.role_id = ANY($1)
            ORDER BY users.name
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to load role users: {error}")))
    }

    async fn fetch_affiliation_links(
        &self,
        role_ids: &[i64],
    ) -> AppResult<Vec<RoleAffiliationRow>> {
        sqlx::query_as::<_, RoleAffiliationRow>(
            r#"
            SELECT
                links.role_id,
                affiliations.id,
                affiliations.affiliation_target_id,
                affiliations.affiliation_type,
                links.inverse
            FROM acl_role_affiliations AS links
            INNER JOIN acl_affiliations AS affiliations
                ON affiliations.id = links.affiliation_id
            WHERE links.role_id = ANY($1)
            ORDER BY affiliations.affiliation_type, affiliations.affiliation_target_id
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to load role affiliations: {error}"))
        })
    }
}
