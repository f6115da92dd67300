//! Connection coordinator
//!
//! Orchestrates the full connect lifecycle for a request: credential
//! pre-flight, provider dispatch, profile persistence, one-shot firewall
//! remediation, and user-visible error surfacing. Coordinator state is
//! only touched between suspension points; per-URI attempt generations
//! make sure a provider response that arrives after cancellation is
//! discarded instead of applied.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::error::{ConnectionError, CoordinationResult};
use crate::models::{
    AuthenticationType, ConnectionProfile, AZURE_ACCOUNT_TOKEN_OPTION,
};

use super::services::{
    AccountManagementService, ConnectionDialogService, ConnectionProvider,
    ConnectionStoreService, DashboardService, ResourceProviderService,
};
use super::status::{ActiveConnection, ConnectionStatusManager};
use super::types::{
    ConnectionCompletionOptions, ConnectionDialogParams, ConnectionProfileGroup, ConnectionResult,
    LanguageFlavorChange, ProviderError,
};

/// Cloud provider id used to look up accounts for Azure profiles
const AZURE_ACCOUNT_PROVIDER: &str = "azure";

/// Tenant key holding the public-cloud default token
const PUBLIC_CLOUD_TENANT: &str = "azurePublicCloud";

/// Language emitted with default flavor events
const DEFAULT_LANGUAGE: &str = "sql";

const FLAVOR_CHANGE_CAPACITY: usize = 64;

/// Coordinates connection lifecycle across the collaborating services
///
/// Owns the URI-keyed connection state exclusively; callers read through
/// the query operations and mutate through the published commands only.
pub struct ConnectionCoordinator {
    /// Providers registered by name
    providers: RwLock<HashMap<String, Arc<dyn ConnectionProvider>>>,
    /// Flavor emitted by `ensure_default_language_flavor`; first registered
    /// provider unless overridden
    default_flavor: RwLock<Option<String>>,
    /// URI-keyed connection state
    status: Mutex<ConnectionStatusManager>,
    dialog: Arc<dyn ConnectionDialogService>,
    store: Arc<dyn ConnectionStoreService>,
    resource_provider: Arc<dyn ResourceProviderService>,
    accounts: Arc<dyn AccountManagementService>,
    dashboard: Arc<dyn DashboardService>,
    flavor_changes: broadcast::Sender<LanguageFlavorChange>,
}

impl ConnectionCoordinator {
    /// Creates a coordinator wired to the given collaborators
    #[must_use]
    pub fn new(
        dialog: Arc<dyn ConnectionDialogService>,
        store: Arc<dyn ConnectionStoreService>,
        resource_provider: Arc<dyn ResourceProviderService>,
        accounts: Arc<dyn AccountManagementService>,
        dashboard: Arc<dyn DashboardService>,
    ) -> Self {
        let (flavor_changes, _) = broadcast::channel(FLAVOR_CHANGE_CAPACITY);
        Self {
            providers: RwLock::new(HashMap::new()),
            default_flavor: RwLock::new(None),
            status: Mutex::new(ConnectionStatusManager::new()),
            dialog,
            store,
            resource_provider,
            accounts,
            dashboard,
            flavor_changes,
        }
    }

    // ========== Provider registry ==========

    /// Registers a connection provider under its name
    ///
    /// The first registered provider becomes the default language flavor.
    pub fn register_provider(&self, name: impl Into<String>, provider: Arc<dyn ConnectionProvider>) {
        let name = name.into();
        let mut default = self
            .default_flavor
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if default.is_none() {
            *default = Some(name.clone());
        }
        drop(default);
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, provider);
    }

    /// Overrides the default language flavor
    pub fn set_default_flavor(&self, flavor: impl Into<String>) {
        *self
            .default_flavor
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(flavor.into());
    }

    fn provider(&self, name: &str) -> CoordinationResult<Arc<dyn ConnectionProvider>> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectionError::UnknownProvider(name.to_string()))
    }

    fn has_provider(&self, name: &str) -> bool {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    // ========== Connect lifecycle ==========

    /// Runs the full connect lifecycle for a profile against an owner URI
    ///
    /// An empty `uri` derives the deterministic default URI from the
    /// profile identity. Any attempt already pending for the URI is
    /// cancelled (and that cancellation awaited) before the new one
    /// starts. An unknown provider name is a fatal configuration error;
    /// every connection failure resolves into the returned
    /// [`ConnectionResult`].
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` for configuration-class failures only.
    pub async fn connect(
        &self,
        profile: ConnectionProfile,
        uri: &str,
        options: &ConnectionCompletionOptions,
    ) -> CoordinationResult<ConnectionResult> {
        let uri = if uri.is_empty() {
            Self::default_uri(&profile)
        } else {
            uri.to_string()
        };
        self.cancel_connection_for_uri(&uri).await?;
        self.connect_internal(profile, &uri, options).await
    }

    async fn connect_internal(
        &self,
        profile: ConnectionProfile,
        uri: &str,
        options: &ConnectionCompletionOptions,
    ) -> CoordinationResult<ConnectionResult> {
        let (profile, saved_cred) = self.add_saved_password(profile).await?;
        let provider = self.provider(&profile.provider_name)?;

        // Pre-flight: with no password in hand and none saved, the provider
        // is never consulted; the request routes straight to the dialog.
        if profile.password_is_empty()
            && !saved_cred
            && self.store.is_password_required(&profile).await
        {
            debug!(uri, server = %profile.server_name, "no credential in hand, routing to dialog");
            self.dialog
                .show_dialog(options.params.as_ref(), Some(&profile), None)
                .await?;
            return Ok(ConnectionResult::not_connected());
        }

        let mut remediation_armed = options.show_firewall_rule_on_error;
        loop {
            let generation = self.status.lock().await.begin_attempt(uri);
            let response = provider.connect(uri, &profile).await;
            {
                let mut status = self.status.lock().await;
                if !status.attempt_is_current(uri, generation) {
                    debug!(uri, "provider response arrived after cancellation, discarding");
                    return Ok(ConnectionResult::canceled());
                }
                status.finish_attempt(uri, generation);
            }

            match response {
                Ok(connection_id) => {
                    self.status.lock().await.add_connection(
                        uri,
                        profile.clone(),
                        connection_id.clone(),
                    );
                    debug!(uri, connection_id, "connection established");
                    if options.save_the_connection {
                        if let Err(e) = self.store.save_profile(&profile).await {
                            warn!(uri, error = %e, "failed to persist profile after connect");
                        }
                    }
                    if options.show_dashboard {
                        if let Err(e) = self.dashboard.show_dashboard(uri, &profile).await {
                            warn!(uri, error = %e, "failed to open dashboard");
                        }
                    }
                    return Ok(ConnectionResult::connected(connection_id));
                }
                Err(error) => {
                    if remediation_armed {
                        // Exactly one remediation attempt per connect call.
                        remediation_armed = false;
                        if self.try_firewall_remediation(&profile, &error).await {
                            debug!(uri, "firewall rule added, retrying once");
                            continue;
                        }
                    }
                    let result = ConnectionResult::failed(error);
                    if options.show_connection_dialog_on_error {
                        if let Err(e) = self
                            .dialog
                            .show_dialog(options.params.as_ref(), Some(&profile), Some(&result))
                            .await
                        {
                            warn!(uri, error = %e, "failed to reopen connection dialog");
                        }
                    }
                    return Ok(result);
                }
            }
        }
    }

    async fn try_firewall_remediation(
        &self,
        profile: &ConnectionProfile,
        error: &ProviderError,
    ) -> bool {
        let info = match self
            .resource_provider
            .handle_firewall_rule(error.code, &error.message, &profile.provider_name)
            .await
        {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "resource provider lookup failed");
                return false;
            }
        };
        if !info.can_handle_firewall_rule {
            return false;
        }
        match self
            .resource_provider
            .show_firewall_rule_dialog(profile, &info.ip_address, &info.resource_provider_id)
            .await
        {
            Ok(added) => added,
            Err(e) => {
                warn!(error = %e, "firewall rule dialog failed");
                false
            }
        }
    }

    /// Cancels any pending attempt for the URI
    ///
    /// Always succeeds; cancelling a URI with nothing pending is a no-op.
    /// A provider response belonging to a cancelled attempt is discarded
    /// when it eventually arrives.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the call awaitable at the boundary
    /// where it is sequenced before a new connect.
    pub async fn cancel_connection_for_uri(&self, uri: &str) -> CoordinationResult<()> {
        self.status.lock().await.cancel_attempt(uri);
        Ok(())
    }

    /// Removes the active connection for a URI, if any
    pub async fn disconnect(&self, uri: &str) -> Option<ActiveConnection> {
        let mut status = self.status.lock().await;
        status.cancel_attempt(uri);
        status.remove_connection(uri)
    }

    // ========== Credential resolution ==========

    /// Resolves saved credentials for a profile
    ///
    /// Returns the (possibly updated) profile and whether a saved
    /// credential exists. Azure-authenticated profiles additionally get a
    /// security token written into their options; a missing account or
    /// token leaves the option unset and is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the credential store cannot be read.
    pub async fn add_saved_password(
        &self,
        profile: ConnectionProfile,
    ) -> CoordinationResult<(ConnectionProfile, bool)> {
        let (mut profile, saved_cred) = self.store.add_saved_password(profile).await?;
        if profile.authentication_type == AuthenticationType::AzureMfa {
            self.fill_azure_account_token(&mut profile).await;
        }
        Ok((profile, saved_cred))
    }

    async fn fill_azure_account_token(&self, profile: &mut ConnectionProfile) {
        let accounts = match self.accounts.accounts_for_provider(AZURE_ACCOUNT_PROVIDER).await {
            Ok(accounts) => accounts,
            Err(e) => {
                debug!(error = %e, "account lookup failed, leaving token unset");
                return;
            }
        };
        let Some(account) = accounts
            .into_iter()
            .find(|a| a.account_id == profile.user_name)
        else {
            debug!(user = %profile.user_name, "no account matches profile username");
            return;
        };
        let tokens = match self.accounts.security_token(&account).await {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!(error = %e, "security token fetch failed, leaving token unset");
                return;
            }
        };
        let tenant = profile
            .azure_tenant_id
            .as_deref()
            .filter(|t| tokens.contains_key(*t))
            .unwrap_or(PUBLIC_CLOUD_TENANT);
        if let Some(token) = tokens.get(tenant) {
            profile
                .options
                .insert(AZURE_ACCOUNT_TOKEN_OPTION.to_string(), token.token.clone());
        }
    }

    // ========== Language flavor ==========

    /// Subscribes to language flavor change events
    #[must_use]
    pub fn on_language_flavor_changed(&self) -> broadcast::Receiver<LanguageFlavorChange> {
        self.flavor_changes.subscribe()
    }

    /// Announces a language flavor change for a document URI
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::UnknownProvider` if `flavor` does not name
    /// a registered provider; nothing is emitted in that case.
    pub fn do_change_language_flavor(
        &self,
        uri: &str,
        language: &str,
        flavor: &str,
    ) -> CoordinationResult<()> {
        if !self.has_provider(flavor) {
            return Err(ConnectionError::UnknownProvider(flavor.to_string()));
        }
        // Send fails only when nobody is subscribed.
        let _ = self.flavor_changes.send(LanguageFlavorChange {
            uri: uri.to_string(),
            language: language.to_string(),
            flavor: flavor.to_string(),
        });
        Ok(())
    }

    /// Emits the default flavor for a URI with no active connection
    ///
    /// A connected URI's provider is authoritative, so nothing is emitted
    /// for it.
    pub async fn ensure_default_language_flavor(&self, uri: &str) {
        if self.status.lock().await.is_connected(uri) {
            return;
        }
        let default = self
            .default_flavor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(flavor) = default {
            let _ = self.flavor_changes.send(LanguageFlavorChange {
                uri: uri.to_string(),
                language: DEFAULT_LANGUAGE.to_string(),
                flavor,
            });
        }
    }

    // ========== Dialog ==========

    /// Shows the connection dialog
    ///
    /// When the requesting surface already has an active connection, its
    /// profile pre-fills the form.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the dialog cannot be shown.
    pub async fn show_connection_dialog(
        &self,
        params: Option<&ConnectionDialogParams>,
    ) -> CoordinationResult<Option<ConnectionProfile>> {
        let profile = match params.and_then(|p| p.uri.as_deref()) {
            Some(uri) => self.status.lock().await.profile_for_uri(uri).cloned(),
            None => None,
        };
        self.dialog.show_dialog(params, profile.as_ref(), None).await
    }

    // ========== Queries ==========

    /// Returns the persisted profile groups from the connection store
    pub async fn connection_profile_groups(&self) -> Vec<ConnectionProfileGroup> {
        self.store.connection_profile_groups().await
    }

    /// Gets the connected profile for an owner URI
    pub async fn get_connection_profile(&self, uri: &str) -> Option<ConnectionProfile> {
        self.status.lock().await.profile_for_uri(uri).cloned()
    }

    /// Returns true if the URI has an active connection
    pub async fn is_connected(&self, uri: &str) -> bool {
        self.status.lock().await.is_connected(uri)
    }

    /// Returns true if some URI is connected with this profile
    pub async fn is_profile_connected(&self, profile: &ConnectionProfile) -> bool {
        self.status
            .lock()
            .await
            .uri_for_options_key(&profile.options_key())
            .is_some()
    }

    /// Finds the owner URI connected with this profile
    pub async fn get_connection_uri(&self, profile: &ConnectionProfile) -> Option<String> {
        self.status
            .lock()
            .await
            .uri_for_options_key(&profile.options_key())
            .map(str::to_string)
    }

    /// Finds the owner URI of the active connection with the given id
    pub async fn get_connection_uri_from_id(&self, connection_id: &str) -> Option<String> {
        self.status
            .lock()
            .await
            .uri_for_connection_id(connection_id)
            .map(str::to_string)
    }

    fn default_uri(profile: &ConnectionProfile) -> String {
        let key = profile.options_key();
        if key.is_empty() {
            format!(
                "connection://{}:{}",
                profile.server_name, profile.database_name
            )
        } else {
            format!("connection://{key}")
        }
    }
}
