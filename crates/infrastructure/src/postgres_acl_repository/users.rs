use super::*;

impl PostgresAclRepository {
    pub(super) async fn attach_users_impl(
        &self,
        role_id: RoleId,
        user_ids: &[UserId],
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Persistence(format!("failed to begin transaction: {error}"))
            })?;

        provision_role(&mut *transaction, role_id).await?;

        for user_id in user_ids {
            sqlx::query(
                r#"
                INSERT INTO acl_role_users (role_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (role_id, user_id) DO NOTHING
                "#,
            )
            .bind(role_id.as_i64())
            .bind(user_id.as_i64())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    return AppError::NotFound(format!("user '{user_id}' was not found"));
                }
                AppError::Persistence(format!("failed to attach user: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Persistence(format!("failed to commit transaction: {error}"))
        })
    }

    pub(super) async fn detach_user_impl(
        &self,
        role_id: RoleId,
        user_id: UserId,
    ) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM acl_role_users
            WHERE role_id = $1 AND user_id = $2
            "#,
        )
        .bind(role_id.as_i64())
        .bind(user_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to detach user: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

/// Ensures a role row exists for this id, inserting a placeholder when absent.
async fn provision_role(connection: &mut PgConnection, role_id: RoleId) -> AppResult<()> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO acl_roles (id, title)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(role_id.as_i64())
    .bind(Role::provisioned_title(role_id))
    .execute(&mut *connection)
    .await
    .map_err(|error| AppError::Persistence(format!("failed to provision role: {error}")))?
    .rows_affected();

    if inserted > 0 {
        advance_role_sequence(&mut *connection, role_id).await?;
        info!(role_id = %role_id, "provisioned role by id");
    }

    lock_role(connection, role_id).await.map_err(|error| match error {
        AppError::NotFound(_) => AppError::Conflict(format!(
            "role '{role_id}' cannot be provisioned: title '{}' is taken",
            Role::provisioned_title(role_id)
        )),
        other => other,
    })
}

/// Moves the role id sequence forward past an explicitly inserted id.
///
/// The sequence never moves backwards, so ids handed out to uncommitted
/// inserts stay reserved.
async fn advance_role_sequence(connection: &mut PgConnection, role_id: RoleId) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('acl_roles_id_seq'))")
        .execute(&mut *connection)
        .await
        .map_err(|error| {
            AppError::Persistence(format!("failed to lock role sequence: {error}"))
        })?;

    sqlx::query(
        r#"
        SELECT setval('acl_roles_id_seq', $1, true)
        FROM acl_roles_id_seq
        WHERE $1 > CASE WHEN is_called THEN last_value ELSE last_value - 1 END
        "#,
    )
    .bind(role_id.as_i64())
    .execute(&mut *connection)
    .await
    .map_err(|error| AppError::Persistence(format!("failed to advance role sequence: {error}")))?;

    Ok(())
}
