//! Connection profile model and derived identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider name used for SQL master instances
pub const MSSQL_PROVIDER: &str = "MSSQL";

/// Option key under which an Azure security token is stored on a profile
pub const AZURE_ACCOUNT_TOKEN_OPTION: &str = "azureAccountToken";

/// Authentication scheme for a connection profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthenticationType {
    /// OS-integrated authentication
    Integrated,
    /// SQL login with username and password
    #[default]
    SqlLogin,
    /// Azure multi-factor authentication
    AzureMfa,
}

impl AuthenticationType {
    /// Returns the wire name of the authentication type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integrated => "integrated",
            Self::SqlLogin => "sqlLogin",
            Self::AzureMfa => "azureMFA",
        }
    }
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connection profile describing one target database connection
///
/// Identity is the derived [`options_key`](Self::options_key), not the
/// assigned `id`: a profile only receives an `id` once it has been persisted
/// by the connection store, but two profiles describe the same connection
/// whenever their options keys match.
///
/// An empty `password` combined with `save_password` means "use the saved
/// credential"; an empty password without one means the user still has to be
/// prompted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Identifier assigned by the connection store once persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Display name chosen by the user
    #[serde(default)]
    pub connection_name: String,
    /// Target server address
    pub server_name: String,
    /// Target database, empty for the server default
    #[serde(default)]
    pub database_name: String,
    /// Username, empty for integrated authentication
    #[serde(default)]
    pub user_name: String,
    /// Password; empty string means "use saved" when `save_password` is set
    #[serde(default)]
    pub password: String,
    /// Authentication scheme
    #[serde(default)]
    pub authentication_type: AuthenticationType,
    /// Whether the credential store holds a password for this profile
    #[serde(default)]
    pub save_password: bool,
    /// Identifier of the profile group this connection belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Full path of the profile group (e.g. "root/production")
    #[serde(default)]
    pub group_full_name: String,
    /// Name of the connection provider handling this profile
    pub provider_name: String,
    /// Azure tenant to request security tokens for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_tenant_id: Option<String>,
    /// Whether the profile should be persisted after a successful connect
    #[serde(default)]
    pub save_profile: bool,
    /// Provider-specific options
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl ConnectionProfile {
    /// Creates a profile with the connection-defining fields set
    #[must_use]
    pub fn new(
        server_name: impl Into<String>,
        database_name: impl Into<String>,
        user_name: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            connection_name: String::new(),
            server_name: server_name.into(),
            database_name: database_name.into(),
            user_name: user_name.into(),
            password: String::new(),
            authentication_type: AuthenticationType::default(),
            save_password: false,
            group_id: None,
            group_full_name: String::new(),
            provider_name: provider_name.into(),
            azure_tenant_id: None,
            save_profile: false,
            options: BTreeMap::new(),
        }
    }

    /// Sets the password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Sets the authentication type
    #[must_use]
    pub const fn with_authentication(mut self, authentication_type: AuthenticationType) -> Self {
        self.authentication_type = authentication_type;
        self
    }

    /// Flags the password as held by the credential store
    #[must_use]
    pub const fn with_saved_password(mut self, save_password: bool) -> Self {
        self.save_password = save_password;
        self
    }

    /// Derives the stable identity key for this profile
    ///
    /// The key is built from the connection-defining fields only; dialog
    /// state such as `connection_name` or `save_profile` does not
    /// participate. Extra options contribute in sorted key order so the
    /// result is deterministic.
    #[must_use]
    pub fn options_key(&self) -> String {
        let mut key = format!(
            "providerName:{}|authenticationType:{}|serverName:{}|databaseName:{}|userName:{}|groupId:{}",
            self.provider_name,
            self.authentication_type,
            self.server_name,
            self.database_name,
            self.user_name,
            self.group_id.as_deref().unwrap_or_default(),
        );
        for (name, value) in &self.options {
            if name == AZURE_ACCOUNT_TOKEN_OPTION {
                continue;
            }
            key.push('|');
            key.push_str(name);
            key.push(':');
            key.push_str(value);
        }
        key
    }

    /// Returns true if both profiles describe the same connection
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.options_key() == other.options_key()
    }

    /// Returns true if the profile has no usable password in hand
    #[must_use]
    pub fn password_is_empty(&self) -> bool {
        self.password.is_empty()
    }
}
