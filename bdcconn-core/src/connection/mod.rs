//! Connection lifecycle coordination
//!
//! This module contains the `ConnectionCoordinator`, the URI-keyed
//! connection status tracking behind it, the collaborator service seams it
//! orchestrates (dialog, store, providers, resource provider, accounts,
//! dashboard), and the request/result types flowing between them.

mod coordinator;
mod services;
mod status;
mod types;

pub use coordinator::ConnectionCoordinator;
pub use services::{
    AccountManagementService, ConnectionDialogService, ConnectionProvider,
    ConnectionStoreService, DashboardService, ResourceProviderService,
};
pub use status::{ActiveConnection, ConnectionStatusManager};
pub use types::{
    Account, ConnectionCompletionOptions, ConnectionDialogParams, ConnectionProfileGroup,
    ConnectionResult, ConnectionType, FirewallRuleInfo, LanguageFlavorChange, ProviderError,
    SecurityToken,
};
