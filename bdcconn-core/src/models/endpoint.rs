//! Cluster endpoint and persisted controller models.

use serde::{Deserialize, Serialize};

/// Endpoint name under which a cluster exposes its SQL master instance
pub const SQL_MASTER_ENDPOINT_NAME: &str = "sql-server-master";

/// A service endpoint reported by a cluster controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndPoint {
    /// Role name of the endpoint (e.g. "sql-server-master", "management-proxy")
    pub name: String,
    /// Address the endpoint listens on (host or host:port)
    pub endpoint: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EndPoint {
    /// Creates a new endpoint record
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            description: None,
        }
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if this endpoint is the SQL master instance
    #[must_use]
    pub fn is_sql_master(&self) -> bool {
        self.name == SQL_MASTER_ENDPOINT_NAME
    }
}

/// One persisted controller record
///
/// The password is present only when the controller was saved with
/// "remember password" enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerEntry {
    /// Controller management URL
    pub url: String,
    /// Username used to authenticate against the controller
    pub username: String,
    /// Password, present only when remembered at save time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
