use super::*;

impl PostgresAclRepository {
    pub(super) async fn find_or_create_affiliation_impl(
        &self,
        key: AffiliationKey,
    ) -> AppResult<Affiliation> {
        let mut connection = self.pool.acquire().await.map_err(|error| {
            AppError::Persistence(format!("failed to acquire connection: {error}"))
        })?;

        upsert_affiliation(&mut *connection, key).await
    }

    pub(super) async fn attach_affiliations_impl(
        &self,
        role_id: RoleId,
        keys: &[AffiliationKey],
        inverse: bool,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Persistence(format!("failed to begin transaction: {error}"))
            })?;

        lock_role(&mut *transaction, role_id).await?;

        for key in keys {
            let affiliation = upsert_affiliation(&mut *transaction, *key).await?;

            sqlx::query(
                r#"
                INSERT INTO acl_role_affiliations (role_id, affiliation_id, inverse)
                VALUES ($1, $2, $3)
                ON CONFLICT (role_id, affiliation_id) DO UPDATE
                SET inverse = EXCLUDED.inverse
                "#,
            )
            .bind(role_id.as_i64())
            .bind(affiliation.id().as_i64())
            .bind(inverse)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Persistence(format!("failed to attach affiliation: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Persistence(format!("failed to commit transaction: {error}"))
        })
    }

    pub(super) async fn detach_affiliation_impl(
        &self,
        role_id: RoleId,
        affiliation_id: AffiliationId,
    ) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM acl_role_affiliations
            WHERE role_id = $1 AND affiliation_id = $2
            "#,
        )
        .bind(role_id.as_i64())
        .bind(affiliation_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to detach affiliation: {error}")))?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

async fn upsert_affiliation(
    connection: &mut PgConnection,
    key: AffiliationKey,
) -> AppResult<Affiliation> {
    let row = sqlx::query_as::<_, AffiliationRow>(
        r#"
        INSERT INTO acl_affiliations (affiliation_target_id, affiliation_type)
        VALUES ($1, $2)
        ON CONFLICT (affiliation_target_id, affiliation_type) DO UPDATE
        SET affiliation_type = EXCLUDED.affiliation_type
        RETURNING id, affiliation_target_id, affiliation_type
        "#,
    )
    .bind(key.affiliation_target_id)
    .bind(key.affiliation_type.as_str())
    .fetch_one(&mut *connection)
    .await
    .map_err(|error| AppError::Persistence(format!("failed to resolve affiliation: {error}")))?;

    affiliation_from_row(row)
}
