use super::*;

impl PostgresAclRepository {
    pub(super) async fn find_or_create_permission_impl(
        &self,
        title: NonEmptyString,
    ) -> AppResult<Permission> {
        let mut connection = self.pool.acquire().await.map_err(|error| {
            AppError::Persistence(format!("failed to acquire connection: {error}"))
        })?;

        upsert_permission(&mut *connection, title.as_str()).await
    }

    pub(super) async fn attach_permissions_impl(
        &self,
        role_id: RoleId,
        titles: &[NonEmptyString],
        inverse: bool,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Persistence(format!("failed to begin transaction: {error}"))
            })?;

        lock_role(&mut *transaction, role_id).await?;

        for title in titles {
            let permission = upsert_permission(&mut *transaction, title.as_str()).await?;

            sqlx::query(
                r#"
                INSERT INTO acl_role_permissions (role_id, permission_id, inverse)
                VALUES ($1, $2, $3)
                ON CONFLICT (role_id, permission_id) DO UPDATE
                SET inverse = EXCLUDED.inverse
                "#,
            )
            .bind(role_id.as_i64())
            .bind(permission.id().as_i64())
            .bind(inverse)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Persistence(format!("failed to attach permission: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Persistence(format!("failed to commit transaction: {error}"))
        })
    }

    pub(super) async fn detach_permission_impl(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM acl_role_permissions
            WHERE role_id = $1 AND permission_id = $2
            "#,
        )
        .bind(role_id.as_i64())
        .bind(permission_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to detach permission: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

async fn upsert_permission(connection: &mut PgConnection, title: &str) -> AppResult<Permission> {
    let row = sqlx::query_as::<_, PermissionRow>(
        r#"
        INSERT INTO acl_permissions (title)
        VALUES ($1)
        ON CONFLICT (title) DO UPDATE
        SET title = EXCLUDED.title
        RETURNING id, title
        "#,
    )
    .bind(title)
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| AppError::Persistence(format!("failed to resolve permission: {error}")))?;

    permission_from_row(row)
}
