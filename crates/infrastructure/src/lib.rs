//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_acl_repository;
mod in_memory_user_directory;
mod postgres_acl_repository;
mod postgres_user_directory;

pub use in_memory_acl_repository::InMemoryAclRepository;
pub use in_memory_user_directory::InMemoryUserDirectory;
pub use postgres_acl_repository::PostgresAclRepository;
pub use postgres_user_directory::PostgresUserDirectory;

/// Embedded SQL migrations for the ACL schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
