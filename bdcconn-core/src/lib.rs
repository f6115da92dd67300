//! `BdcConn` Core Library
//!
//! This crate provides the core functionality for the `BdcConn` big data
//! cluster controller manager: the controller tree registry, connection
//! lifecycle coordination, configuration persistence, and the shared
//! domain models.

pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod tree;

pub use config::ControllerConfigManager;
pub use connection::{
    Account, AccountManagementService, ActiveConnection, ConnectionCompletionOptions,
    ConnectionCoordinator, ConnectionDialogParams, ConnectionDialogService, ConnectionProfileGroup,
    ConnectionProvider, ConnectionResult, ConnectionStatusManager, ConnectionStoreService,
    ConnectionType, DashboardService, FirewallRuleInfo, LanguageFlavorChange, ProviderError,
    ResourceProviderService, SecurityToken,
};
pub use error::{BdcError, ConfigError, ConfigResult, ConnectionError, CoordinationResult, Result};
pub use models::{
    AuthenticationType, ConnectionProfile, ControllerEntry, EndPoint, MSSQL_PROVIDER,
    SQL_MASTER_ENDPOINT_NAME,
};
pub use tree::{
    ControllerRegistry, ControllerState, CredentialCheck, NodeKind, RemovedController, TreeChange,
    TreeNode, SQL_SERVERS_FOLDER_LABEL,
};
