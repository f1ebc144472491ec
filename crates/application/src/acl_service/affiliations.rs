use citadel_domain::Affiliation;

use super::*;

impl AclService {
    /// Returns the affiliation with this natural key, creating it on first use.
    pub async fn find_or_create_affiliation(&self, key: AffiliationKey) -> AppResult<Affiliation> {
        self.repository.find_or_create_affiliation(key).await
    }

    /// Links a corporation affiliation to a role.
    pub async fn give_role_corporation_affiliation(
        &self,
        role_id: RoleId,
        corporation_id: i64,
        inverse: bool,
    ) -> AppResult<()> {
        self.give_role_corporation_affiliations(role_id, &[corporation_id], inverse)
            .await
    }

    /// Links corporation affiliations to a role as one atomic batch.
    pub async fn give_role_corporation_affiliations(
        &self,
        role_id: RoleId,
        corporation_ids: &[i64],
        inverse: bool,
    ) -> AppResult<()> {
        let keys = corporation_ids
            .iter()
            .copied()
            .map(AffiliationKey::corporation)
            .collect::<Vec<_>>();
        self.give_role_affiliations(role_id, &keys, inverse).await
    }

    /// Links a character affiliation to a role.
    pub async fn give_role_character_affiliation(
        &self,
        role_id: RoleId,
        character_id: i64,
        inverse: bool,
    ) -> AppResult<()> {
        self.give_role_character_affiliations(role_id, &[character_id], inverse)
            .await
    }

    /// Links character affiliations to a role as one atomic batch.
    pub async fn give_role_character_affiliations(
        &self,
        role_id: RoleId,
        character_ids: &[i64],
        inverse: bool,
    ) -> AppResult<()> {
        let keys = character_ids
            .iter()
            .copied()
            .map(AffiliationKey::character)
            .collect::<Vec<_>>();
        self.give_role_affiliations(role_id, &keys, inverse).await
    }

    /// Links affiliations of any type to a role as one atomic batch.
    ///
    /// Repeating a link is a no-op; a different `inverse` value replaces the
    /// flag on the existing link.
    pub async fn give_role_affiliations(
        &self,
        role_id: RoleId,
        keys: &[AffiliationKey],
        inverse: bool,
    ) -> AppResult<()> {
        self.get_role(role_id).await?;

        self.repository
            .attach_affiliations(role_id, keys, inverse)
            .await?;

        info!(
            role_id = %role_id,
            affiliation_count = keys.len(),
            inverse,
            "affiliations attached to role"
        );
        Ok(())
    }

    /// Detaches an affiliation from a role. A missing link is not an error.
    pub async fn remove_affiliation_from_role(
        &self,
        role_id: RoleId,
        affiliation_id: AffiliationId,
    ) -> AppResult<()> {
        self.get_role(role_id).await?;

        if self
            .repository
            .detach_affiliation(role_id, affiliation_id)
            .await?
        {
            info!(role_id = %role_id, affiliation_id = %affiliation_id, "affiliation detached");
        } else {
            debug!(role_id = %role_id, affiliation_id = %affiliation_id, "affiliation was not attached");
        }

        Ok(())
    }
}
