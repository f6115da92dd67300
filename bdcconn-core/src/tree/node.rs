//! Tree node types for the controller explorer.

use uuid::Uuid;

/// Mutable state carried by a controller node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    /// Controller management URL
    pub url: String,
    /// Username used to authenticate against the controller
    pub username: String,
    /// Password, absent until entered or loaded from a remembered entry
    pub password: Option<String>,
    /// Whether the password should be persisted on save
    pub remember_password: bool,
    /// Number of upcoming credential prompts to suppress
    pub skip_dialog: u32,
}

impl ControllerState {
    /// Returns true if the controller has no password in hand
    #[must_use]
    pub fn password_is_empty(&self) -> bool {
        self.password.as_deref().unwrap_or_default().is_empty()
    }
}

/// Closed set of node variants making up the controller tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The invisible single root
    Root,
    /// Placeholder shown when no controllers exist; never persisted
    AddControllerPlaceholder,
    /// A cluster controller, identified by its (url, username) pair
    Controller(ControllerState),
    /// Grouping folder (e.g. "SQL Servers")
    Folder,
    /// The SQL master instance of a cluster
    SqlMaster {
        /// Address of the master endpoint
        endpoint_address: String,
        /// Login used against the master instance
        username: String,
    },
    /// A generic cluster service endpoint; always a leaf
    EndPoint {
        /// Role name of the endpoint
        role: String,
        /// Address of the endpoint
        endpoint_address: String,
    },
}

/// One node of the controller tree
///
/// Ownership flows root-to-leaf through the registry's arena; `parent` is a
/// non-owning back-reference so the structure stays acyclic under
/// ownership tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Stable node identity
    pub id: Uuid,
    /// Display label
    pub label: String,
    /// Non-owning parent reference; `None` only for the root
    pub parent: Option<Uuid>,
    /// Ordered child node ids
    pub children: Vec<Uuid>,
    /// Variant payload
    pub kind: NodeKind,
}

impl TreeNode {
    pub(crate) fn new(label: impl Into<String>, parent: Option<Uuid>, kind: NodeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            parent,
            children: Vec::new(),
            kind,
        }
    }

    /// Returns true if this node can never have children
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::AddControllerPlaceholder
                | NodeKind::SqlMaster { .. }
                | NodeKind::EndPoint { .. }
        )
    }

    /// Returns the controller state if this node is a controller
    #[must_use]
    pub const fn as_controller(&self) -> Option<&ControllerState> {
        match &self.kind {
            NodeKind::Controller(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn as_controller_mut(&mut self) -> Option<&mut ControllerState> {
        match &mut self.kind {
            NodeKind::Controller(state) => Some(state),
            _ => None,
        }
    }
}

/// Derives the display label for a controller from its URL and username
///
/// The address normalization trims whitespace, strips the URL scheme, and
/// rewrites a trailing `:port` into `,port` (SQL Server address notation).
#[must_use]
pub(crate) fn controller_label(url: &str, username: &str) -> String {
    format!("controller: {} ({})", to_ip_and_port(url), username)
}

/// Derives the display label for a SQL master node
#[must_use]
pub(crate) fn master_label(endpoint_address: &str, username: &str) -> String {
    format!("master: {endpoint_address} ({username})")
}

/// Derives the display label for a generic endpoint node
#[must_use]
pub(crate) fn endpoint_label(role: &str, endpoint_address: &str) -> String {
    format!("{role}: {endpoint_address}")
}

fn to_ip_and_port(url: &str) -> String {
    let cleaned: String = url.trim().chars().filter(|c| *c != ' ').collect();
    let without_scheme = match cleaned.find("://") {
        Some(pos) => &cleaned[pos + 3..],
        None => cleaned.as_str(),
    };
    match without_scheme.rfind(':') {
        Some(pos) if without_scheme[pos + 1..].chars().all(|c| c.is_ascii_digit())
            && !without_scheme[pos + 1..].is_empty() =>
        {
            format!("{},{}", &without_scheme[..pos], &without_scheme[pos + 1..])
        }
        _ => without_scheme.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_label_strips_scheme_and_rewrites_port() {
        assert_eq!(
            controller_label("https://10.0.0.1:30080", "admin"),
            "controller: 10.0.0.1,30080 (admin)"
        );
    }

    #[test]
    fn controller_label_without_port() {
        assert_eq!(
            controller_label("  bdc.local  ", "admin"),
            "controller: bdc.local (admin)"
        );
    }

    #[test]
    fn leaf_nodes_are_leaves() {
        let node = TreeNode::new(
            "ep",
            None,
            NodeKind::EndPoint {
                role: "management-proxy".to_string(),
                endpoint_address: "host:443".to_string(),
            },
        );
        assert!(node.is_leaf());
        assert!(node.children.is_empty());
    }
}
