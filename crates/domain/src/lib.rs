//! Domain entities and invariants for roles, permissions and affiliations.

#![forbid(unsafe_code)]

mod access;
mod affiliation;
mod ids;
mod permission;
mod role;
mod user;

pub use access::{AccessDecision, evaluate_affiliation, evaluate_permission};
pub use affiliation::{Affiliation, AffiliationGrant, AffiliationKey, AffiliationType};
pub use ids::{AffiliationId, PermissionId, RoleId, UserId};
pub use permission::{Permission, PermissionGrant};
pub use role::{CompleteRole, Role, RoleInclude};
pub use user::User;
