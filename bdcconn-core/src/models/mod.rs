//! Data models for `bdcconn`
//!
//! This module contains the entity types shared by the controller tree
//! registry and the connection coordinator: connection profiles, cluster
//! endpoints, and persisted controller entries.

mod endpoint;
mod profile;

pub use endpoint::{ControllerEntry, EndPoint, SQL_MASTER_ENDPOINT_NAME};
pub use profile::{
    AuthenticationType, ConnectionProfile, AZURE_ACCOUNT_TOKEN_OPTION, MSSQL_PROVIDER,
};
