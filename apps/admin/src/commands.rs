use clap::{Parser, Subcommand, ValueEnum};

use citadel_application::AclService;
use citadel_core::{AppError, AppResult};
use citadel_domain::{
    AffiliationId, AffiliationKey, AffiliationType, PermissionId, RoleId, UserId,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(
    name = "citadel-admin",
    version,
    about = "Manage Citadel roles, permissions and affiliations"
)]
pub struct AdminCli {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum AdminCommand {
    /// Apply pending database migrations and exit
    Migrate,
    /// List every role with its permissions, users and affiliations
    #[command(name = "roles")]
    ListRoles,
    /// Show one role with its permissions, users and affiliations
    #[command(name = "role")]
    ShowRole { role_id: RoleId },
    /// Create a role
    AddRole { title: String },
    /// Delete a role and its links
    RemoveRole { role_id: RoleId },
    /// Delete the role with this title
    RemoveRoleByTitle { title: String },
    /// Grant permissions to a role, creating missing permissions
    GrantPermissions {
        role_id: RoleId,
        /// Record the links as explicit denials
        #[arg(long)]
        deny: bool,
        #[arg(required = true, num_args = 1..)]
        titles: Vec<String>,
    },
    /// Remove one permission link from a role
    RevokePermission {
        role_id: RoleId,
        permission_id: PermissionId,
    },
    /// Add a user to a role, provisioning the role when absent
    AssignUser { role_id: RoleId, user_id: UserId },
    /// Add users to a role by name
    AssignUsers {
        role_id: RoleId,
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Remove a user from a role
    UnassignUser { role_id: RoleId, user_id: UserId },
    /// Grant corporation or character affiliations to a role
    GrantAffiliations {
        role_id: RoleId,
        #[arg(value_enum)]
        kind: AffiliationKind,
        /// Record the links as explicit denials
        #[arg(long)]
        deny: bool,
        #[arg(required = true, num_args = 1..)]
        target_ids: Vec<i64>,
    },
    /// Remove one affiliation link from a role
    RevokeAffiliation {
        role_id: RoleId,
        affiliation_id: AffiliationId,
    },
    /// List the roles a user belongs to
    UserRoles { user_id: UserId },
    /// Evaluate a permission for a user
    Check { user_id: UserId, permission: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AffiliationKind {
    #[value(name = "corp")]
    Corporation,
    #[value(name = "char")]
    Character,
}

impl From<AffiliationKind> for AffiliationType {
    fn from(kind: AffiliationKind) -> Self {
        match kind {
            AffiliationKind::Corporation => Self::Corporation,
            AffiliationKind::Character => Self::Character,
        }
    }
}

impl AdminCommand {
    pub async fn execute(self, service: &AclService) -> AppResult<Value> {
        match self {
            Self::Migrate => Ok(Value::Null),
            Self::ListRoles => render(&service.list_complete_roles().await?),
            Self::ShowRole { role_id } => render(&service.get_complete_role(role_id).await?),
            Self::AddRole { title } => render(&service.add_role(title.as_str()).await?),
            Self::RemoveRole { role_id } => render(&service.remove_role(role_id).await?),
            Self::RemoveRoleByTitle { title } => {
                service.remove_role_by_title(title.as_str()).await?;
                Ok(Value::Null)
            }
            Self::GrantPermissions {
                role_id,
                deny,
                titles,
            } => {
                service.give_role_permissions(role_id, &titles, deny).await?;
                render(&service.get_complete_role(role_id).await?)
            }
            Self::RevokePermission {
                role_id,
                permission_id,
            } => {
                service
                    .remove_permission_from_role(permission_id, role_id)
                    .await?;
                render(&service.get_complete_role(role_id).await?)
            }
            Self::AssignUser { role_id, user_id } => {
                service.give_user_role(user_id, role_id).await?;
                render(&service.get_complete_role(role_id).await?)
            }
            Self::AssignUsers { role_id, names } => {
                service.give_usernames_role(&names, role_id).await?;
                render(&service.get_complete_role(role_id).await?)
            }
            Self::UnassignUser { role_id, user_id } => {
                service.remove_user_from_role(user_id, role_id).await?;
                render(&service.get_complete_role(role_id).await?)
            }
            Self::GrantAffiliations {
                role_id,
                kind,
                deny,
                target_ids,
            } => {
                let keys = target_ids
                    .into_iter()
                    .map(|affiliation_target_id| AffiliationKey {
                        affiliation_target_id,
                        affiliation_type: kind.into(),
                    })
                    .collect::<Vec<_>>();
                service.give_role_affiliations(role_id, &keys, deny).await?;
                render(&service.get_complete_role(role_id).await?)
            }
            Self::RevokeAffiliation {
                role_id,
                affiliation_id,
            } => {
                service
                    .remove_affiliation_from_role(role_id, affiliation_id)
                    .await?;
                render(&service.get_complete_role(role_id).await?)
            }
            Self::UserRoles { user_id } => render(&service.roles_for_user(user_id).await?),
            Self::Check {
                user_id,
                permission,
            } => render(
                &service
                    .permission_decision(user_id, permission.as_str())
                    .await?,
            ),
        }
    }
}

fn render(value: &impl Serialize) -> AppResult<Value> {
    serde_json::to_value(value)
        .map_err(|error| AppError::Validation(format!("failed to render output: {error}")))
}
