//! URI-keyed connection status tracking
//!
//! The `ConnectionStatusManager` owns the owner-URI to active-connection
//! map and the per-URI attempt generations used to discard provider
//! responses that arrive after cancellation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::ConnectionProfile;

/// An established connection registered against an owner URI
#[derive(Debug, Clone)]
pub struct ActiveConnection {
    /// The connected profile
    pub profile: ConnectionProfile,
    /// Provider-assigned connection id
    pub connection_id: String,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
}

/// Tracks active connections and in-flight attempts per owner URI
///
/// At most one active connection exists per URI; a profile may back any
/// number of URIs simultaneously. Attempt generations implement the
/// discard-after-cancel rule: a response is only applied while its
/// generation is still the current one for the URI.
#[derive(Debug, Default)]
pub struct ConnectionStatusManager {
    /// Active connections indexed by owner URI
    connections: HashMap<String, ActiveConnection>,
    /// Current attempt generation per URI with an in-flight attempt
    attempts: HashMap<String, u64>,
    /// Monotonic generation source
    next_attempt: u64,
}

impl ConnectionStatusManager {
    /// Creates an empty status manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new attempt for a URI, superseding any outstanding one
    pub fn begin_attempt(&mut self, uri: &str) -> u64 {
        self.next_attempt += 1;
        let generation = self.next_attempt;
        self.attempts.insert(uri.to_string(), generation);
        generation
    }

    /// Returns true if the attempt is still the current one for the URI
    #[must_use]
    pub fn attempt_is_current(&self, uri: &str, generation: u64) -> bool {
        self.attempts.get(uri) == Some(&generation)
    }

    /// Marks an attempt as settled, if it is still the current one
    pub fn finish_attempt(&mut self, uri: &str, generation: u64) {
        if self.attempt_is_current(uri, generation) {
            self.attempts.remove(uri);
        }
    }

    /// Invalidates any outstanding attempt for the URI
    ///
    /// A no-op when nothing is pending.
    pub fn cancel_attempt(&mut self, uri: &str) {
        self.attempts.remove(uri);
    }

    /// Registers an established connection, overwriting any previous one
    pub fn add_connection(
        &mut self,
        uri: &str,
        profile: ConnectionProfile,
        connection_id: String,
    ) {
        self.connections.insert(
            uri.to_string(),
            ActiveConnection {
                profile,
                connection_id,
                connected_at: Utc::now(),
            },
        );
    }

    /// Removes the active connection for a URI
    pub fn remove_connection(&mut self, uri: &str) -> Option<ActiveConnection> {
        self.connections.remove(uri)
    }

    /// Returns true if the URI has an active connection
    #[must_use]
    pub fn is_connected(&self, uri: &str) -> bool {
        self.connections.contains_key(uri)
    }

    /// Gets the active connection for a URI
    #[must_use]
    pub fn connection(&self, uri: &str) -> Option<&ActiveConnection> {
        self.connections.get(uri)
    }

    /// Gets the connected profile for a URI
    #[must_use]
    pub fn profile_for_uri(&self, uri: &str) -> Option<&ConnectionProfile> {
        self.connections.get(uri).map(|c| &c.profile)
    }

    /// Finds the URI connected with the profile identified by the options key
    #[must_use]
    pub fn uri_for_options_key(&self, options_key: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|(_, c)| c.profile.options_key() == options_key)
            .map(|(uri, _)| uri.as_str())
    }

    /// Finds the URI of the active connection with the given connection id
    #[must_use]
    pub fn uri_for_connection_id(&self, connection_id: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|(_, c)| c.connection_id == connection_id)
            .map(|(uri, _)| uri.as_str())
    }

    /// Returns the number of active connections
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MSSQL_PROVIDER;

    fn profile(server: &str) -> ConnectionProfile {
        ConnectionProfile::new(server, "db", "sa", MSSQL_PROVIDER)
    }

    #[test]
    fn one_active_connection_per_uri() {
        let mut status = ConnectionStatusManager::new();
        status.add_connection("uri-1", profile("a"), "id-1".to_string());
        status.add_connection("uri-1", profile("b"), "id-2".to_string());

        assert_eq!(status.active_count(), 1);
        assert_eq!(status.profile_for_uri("uri-1").unwrap().server_name, "b");
    }

    #[test]
    fn profile_may_back_many_uris() {
        let mut status = ConnectionStatusManager::new();
        status.add_connection("uri-1", profile("a"), "id-1".to_string());
        status.add_connection("uri-2", profile("a"), "id-2".to_string());
        assert_eq!(status.active_count(), 2);

        let key = profile("a").options_key();
        assert!(status.uri_for_options_key(&key).is_some());
    }

    #[test]
    fn cancel_supersedes_outstanding_attempt() {
        let mut status = ConnectionStatusManager::new();
        let generation = status.begin_attempt("uri-1");
        assert!(status.attempt_is_current("uri-1", generation));

        status.cancel_attempt("uri-1");
        assert!(!status.attempt_is_current("uri-1", generation));
    }

    #[test]
    fn new_attempt_supersedes_previous() {
        let mut status = ConnectionStatusManager::new();
        let first = status.begin_attempt("uri-1");
        let second = status.begin_attempt("uri-1");
        assert!(!status.attempt_is_current("uri-1", first));
        assert!(status.attempt_is_current("uri-1", second));
    }

    #[test]
    fn uri_lookup_by_connection_id() {
        let mut status = ConnectionStatusManager::new();
        status.add_connection("uri-1", profile("a"), "id-1".to_string());
        assert_eq!(status.uri_for_connection_id("id-1"), Some("uri-1"));
        assert_eq!(status.uri_for_connection_id("id-2"), None);
    }
}
