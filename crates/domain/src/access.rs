use serde::{Deserialize, Serialize};

use crate::{AffiliationKey, CompleteRole};

/// Outcome of evaluating one capability across a user's roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// At least one role grants it and no role denies it.
    Granted,
    /// At least one role links it with the inverse flag.
    Denied,
    /// No role links it at all.
    NotGranted,
}

impl AccessDecision {
    /// Returns whether access is allowed.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    fn from_links(links: impl Iterator<Item = bool>) -> Self {
        let mut decision = Self::NotGranted;
        for inverse in links {
            if inverse {
                return Self::Denied;
            }
            decision = Self::Granted;
        }

        decision
    }
}

/// Evaluates a permission title across roles. Explicit denial wins.
#[must_use]
pub fn evaluate_permission(roles: &[CompleteRole], permission_title: &str) -> AccessDecision {
    AccessDecision::from_links(roles.iter().flat_map(|role| {
        role.permissions
            .iter()
            .filter(move |grant| grant.permission.title() == permission_title)
            .map(|grant| grant.inverse)
    }))
}

/// Evaluates an affiliation across roles. Explicit denial wins.
#[must_use]
pub fn evaluate_affiliation(roles: &[CompleteRole], key: AffiliationKey) -> AccessDecision {
    AccessDecision::from_links(roles.iter().flat_map(|role| {
        role.affiliations
            .iter()
            .filter(move |grant| grant.affiliation.key() == key)
            .map(|grant| grant.inverse)
    }))
}
