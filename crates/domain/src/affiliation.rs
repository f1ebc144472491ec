use std::str::FromStr;

use citadel_core::AppError;
use serde::{Deserialize, Serialize};

use crate::AffiliationId;

/// Kind of organizational entity an affiliation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AffiliationType {
    /// An EVE corporation.
    #[serde(rename = "corp")]
    Corporation,
    /// An EVE character.
    #[serde(rename = "char")]
    Character,
}

impl AffiliationType {
    /// Returns the stable storage value for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corporation => "corp",
            Self::Character => "char",
        }
    }
}

impl FromStr for AffiliationType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "corp" => Ok(Self::Corporation),
            "char" => Ok(Self::Character),
            _ => Err(AppError::Validation(format!(
                "unknown affiliation type '{value}'"
            ))),
        }
    }
}

impl std::fmt::Display for AffiliationType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Natural key of an affiliation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AffiliationKey {
    /// Corporation or character id.
    pub affiliation_target_id: i64,
    /// Kind of the target.
    #[serde(rename = "type")]
    pub affiliation_type: AffiliationType,
}

impl AffiliationKey {
    /// Key for a corporation affiliation.
    #[must_use]
    pub fn corporation(corporation_id: i64) -> Self {
        Self {
            affiliation_target_id: corporation_id,
            affiliation_type: AffiliationType::Corporation,
        }
    }

    /// Key for a character affiliation.
    #[must_use]
    pub fn character(character_id: i64) -> Self {
        Self {
            affiliation_target_id: character_id,
            affiliation_type: AffiliationType::Character,
        }
    }
}

impl std::fmt::Display for AffiliationKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}:{}",
            self.affiliation_type, self.affiliation_target_id
        )
    }
}

/// Linkage of roles to a corporation or character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Affiliation {
    id: AffiliationId,
    #[serde(flatten)]
    key: AffiliationKey,
}

impl Affiliation {
    /// Creates an affiliation from persisted values.
    #[must_use]
    pub fn new(id: AffiliationId, key: AffiliationKey) -> Self {
        Self { id, key }
    }

    /// Returns the affiliation identifier.
    #[must_use]
    pub fn id(&self) -> AffiliationId {
        self.id
    }

    /// Returns the natural key.
    #[must_use]
    pub fn key(&self) -> AffiliationKey {
        self.key
    }

    /// Returns the corporation or character id.
    #[must_use]
    pub fn affiliation_target_id(&self) -> i64 {
        self.key.affiliation_target_id
    }

    /// Returns the affiliation type.
    #[must_use]
    pub fn affiliation_type(&self) -> AffiliationType {
        self.key.affiliation_type
    }
}

/// Role-to-affiliation link with its inverse flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationGrant {
    /// Linked affiliation.
    pub affiliation: Affiliation,
    /// Marks the link as an explicit denial.
    pub inverse: bool,
}
