use super::*;

impl PostgresAclRepository {
    pub(super) async fn find_role_impl(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, title
            FROM acl_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to find role: {error}")))?
        .map(role_from_row)
        .transpose()
    }

    pub(super) async fn find_role_by_title_impl(&self, title: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, title
            FROM acl_roles
            WHERE title = $1
            LIMIT 1
            "#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to find role by title: {error}")))?
        .map(role_from_row)
        .transpose()
    }

    pub(super) async fn create_role_impl(&self, title: NonEmptyString) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO acl_roles (title)
            VALUES ($1)
            RETURNING id, title
            "#,
        )
        .bind(title.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, title.as_str()))?;

        role_from_row(row)
    }

    pub(super) async fn delete_role_impl(&self, role_id: RoleId) -> AppResult<u64> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM acl_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to delete role: {error}")))?
        .rows_affected();

        Ok(rows_affected)
    }
}

fn map_role_conflict(error: sqlx::Error, title: &str) -> AppError {
    match unique_violation_constraint(&error).as_deref() {
        Some("acl_roles_pkey") => AppError::Conflict(format!(
            "role '{title}' was assigned an id already taken by a provisioned role"
        )),
        Some(_) => AppError::Conflict(format!("role '{title}' already exists")),
        None => AppError::Persistence(format!("failed to create role: {error}")),
    }
}
