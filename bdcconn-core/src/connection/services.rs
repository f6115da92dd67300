//! Collaborator service seams for the connection coordinator
//!
//! These traits define the interfaces the coordinator orchestrates. The
//! host supplies the implementations (dialogs, credential store, wire
//! providers); the coordinator only sequences them.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::CoordinationResult;
use crate::models::ConnectionProfile;

use super::types::{
    Account, ConnectionDialogParams, ConnectionProfileGroup, ConnectionResult, FirewallRuleInfo,
    ProviderError, SecurityToken,
};

/// A connection provider, registered under its provider name
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Attempts to establish a connection for the given owner URI
    ///
    /// Failure is data: a [`ProviderError`] is a recoverable connection
    /// failure, never a configuration error.
    ///
    /// # Errors
    /// Returns `ProviderError` when the connection attempt fails
    async fn connect(
        &self,
        uri: &str,
        profile: &ConnectionProfile,
    ) -> Result<String, ProviderError>;
}

/// Host dialog used to collect or correct connection profiles
#[async_trait]
pub trait ConnectionDialogService: Send + Sync {
    /// Shows the connection dialog
    ///
    /// `profile` pre-fills the form; `previous` carries the structured
    /// failure that triggered the reopen. Returns the profile the user
    /// confirmed, or `None` when the dialog was dismissed.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the dialog cannot be shown
    async fn show_dialog(
        &self,
        params: Option<&ConnectionDialogParams>,
        profile: Option<&ConnectionProfile>,
        previous: Option<&ConnectionResult>,
    ) -> CoordinationResult<Option<ConnectionProfile>>;
}

/// Credential and profile store
#[async_trait]
pub trait ConnectionStoreService: Send + Sync {
    /// Persists a profile, assigning its stored identity
    ///
    /// # Errors
    /// Returns `ConnectionError` if persistence fails
    async fn save_profile(
        &self,
        profile: &ConnectionProfile,
    ) -> CoordinationResult<ConnectionProfile>;

    /// Resolves the saved password for a profile
    ///
    /// Returns the (possibly updated) profile and whether a saved
    /// credential was found.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the store cannot be read
    async fn add_saved_password(
        &self,
        profile: ConnectionProfile,
    ) -> CoordinationResult<(ConnectionProfile, bool)>;

    /// Returns true if the profile's authentication scheme needs a password
    async fn is_password_required(&self, profile: &ConnectionProfile) -> bool;

    /// Returns the persisted profile groups
    async fn connection_profile_groups(&self) -> Vec<ConnectionProfileGroup>;
}

/// Resource provider handling out-of-band firewall remediation
#[async_trait]
pub trait ResourceProviderService: Send + Sync {
    /// Asks whether a failed connection is eligible for firewall remediation
    ///
    /// # Errors
    /// Returns `ConnectionError` if the resource provider cannot be reached
    async fn handle_firewall_rule(
        &self,
        error_code: Option<i32>,
        error_message: &str,
        provider_name: &str,
    ) -> CoordinationResult<FirewallRuleInfo>;

    /// Shows the firewall rule dialog
    ///
    /// `Ok(true)` means the rule was added, `Ok(false)` means the user
    /// declined.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the dialog itself fails
    async fn show_firewall_rule_dialog(
        &self,
        profile: &ConnectionProfile,
        ip_address: &str,
        resource_provider_id: &str,
    ) -> CoordinationResult<bool>;
}

/// Account management collaborator for cloud-authenticated profiles
#[async_trait]
pub trait AccountManagementService: Send + Sync {
    /// Lists accounts registered for a cloud provider
    ///
    /// # Errors
    /// Returns `ConnectionError` if the account service cannot be reached
    async fn accounts_for_provider(
        &self,
        provider_id: &str,
    ) -> CoordinationResult<Vec<Account>>;

    /// Fetches the per-tenant security token map for an account
    ///
    /// # Errors
    /// Returns `ConnectionError` if the token fetch fails
    async fn security_token(
        &self,
        account: &Account,
    ) -> CoordinationResult<HashMap<String, SecurityToken>>;
}

/// Editor collaborator that opens the dashboard for a connection
#[async_trait]
pub trait DashboardService: Send + Sync {
    /// Opens the dashboard editor for an established connection
    ///
    /// # Errors
    /// Returns `ConnectionError` if the editor cannot be opened
    async fn show_dashboard(
        &self,
        uri: &str,
        profile: &ConnectionProfile,
    ) -> CoordinationResult<()>;
}
