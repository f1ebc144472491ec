//! Application services and ports.

#![forbid(unsafe_code)]

mod acl_ports;
mod acl_service;

pub use acl_ports::{AclRepository, UserDirectory};
pub use acl_service::AclService;
