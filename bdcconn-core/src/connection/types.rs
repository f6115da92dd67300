//! Request and result types for connection coordination.

use crate::models::ConnectionProfile;

/// Surface a connection request originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionType {
    /// Stand-alone connection (object explorer, dashboards)
    #[default]
    Default,
    /// Connection owned by an editor surface
    Editor,
}

/// Dialog routing parameters accompanying a connection request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionDialogParams {
    /// Surface the request came from
    pub connection_type: ConnectionType,
    /// Owner URI of the requesting surface, if any
    pub uri: Option<String>,
}

/// Policy switches for one connect call
#[derive(Debug, Clone, Default)]
pub struct ConnectionCompletionOptions {
    /// Dialog routing parameters, if the request came from a surface
    pub params: Option<ConnectionDialogParams>,
    /// Persist the profile to the connection store on success
    pub save_the_connection: bool,
    /// Open the dashboard editor on success
    pub show_dashboard: bool,
    /// Reopen the connection dialog on failure
    pub show_connection_dialog_on_error: bool,
    /// Attempt firewall remediation on an eligible failure
    pub show_firewall_rule_on_error: bool,
}

/// Structured error reported by a connection provider
///
/// Provider failures are recoverable data, not `Err` values; the
/// coordinator folds them into a [`ConnectionResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    /// Human-readable message
    pub message: String,
    /// Provider-specific error code
    pub code: Option<i32>,
    /// Call stack captured by the provider, if any
    pub call_stack: Option<String>,
}

impl ProviderError {
    /// Creates a provider error with just a message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            call_stack: None,
        }
    }

    /// Sets the error code
    #[must_use]
    pub const fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the captured call stack
    #[must_use]
    pub fn with_call_stack(mut self, call_stack: impl Into<String>) -> Self {
        self.call_stack = Some(call_stack.into());
        self
    }
}

/// Outcome of a connect call
///
/// Always delivered through the success path of the asynchronous call;
/// only configuration errors surface as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionResult {
    /// Whether an active connection was established
    pub connected: bool,
    /// Provider-assigned connection id on success
    pub connection_id: Option<String>,
    /// Failure message, if any
    pub error_message: Option<String>,
    /// Failure code, if any
    pub error_code: Option<i32>,
    /// Failure call stack, if any
    pub call_stack: Option<String>,
}

impl ConnectionResult {
    /// Result for an established connection
    #[must_use]
    pub fn connected(connection_id: impl Into<String>) -> Self {
        Self {
            connected: true,
            connection_id: Some(connection_id.into()),
            ..Self::default()
        }
    }

    /// Result for a request resolved without reaching the provider
    /// (credential pre-flight routed to the dialog)
    #[must_use]
    pub fn not_connected() -> Self {
        Self::default()
    }

    /// Result for an attempt superseded by cancellation
    #[must_use]
    pub fn canceled() -> Self {
        Self::default()
    }

    /// Result for a provider-reported failure
    #[must_use]
    pub fn failed(error: ProviderError) -> Self {
        Self {
            connected: false,
            connection_id: None,
            error_message: Some(error.message),
            error_code: error.code,
            call_stack: error.call_stack,
        }
    }
}

/// Payload of a language flavor change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFlavorChange {
    /// Document URI the flavor applies to
    pub uri: String,
    /// Language identifier (e.g. "sql")
    pub language: String,
    /// Provider name serving the flavor
    pub flavor: String,
}

/// Resource provider verdict on a failed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRuleInfo {
    /// Whether the failure is eligible for firewall remediation
    pub can_handle_firewall_rule: bool,
    /// Client IP address to register
    pub ip_address: String,
    /// Resource provider able to perform the remediation
    pub resource_provider_id: String,
}

/// An account registered with the account management collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Account identifier (matched against profile usernames)
    pub account_id: String,
    /// Cloud provider the account belongs to
    pub provider_id: String,
}

/// A security token scoped to one tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityToken {
    /// The raw token value
    pub token: String,
}

/// A named group of persisted connection profiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfileGroup {
    /// Group identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Profiles contained in the group
    pub connections: Vec<ConnectionProfile>,
}
