//! Controller registry for tree CRUD operations
//!
//! This module provides the `ControllerRegistry` which owns the controller
//! tree and handles adding, deleting, and querying controllers with
//! persistence through `ControllerConfigManager`. Endpoint data is never
//! fetched here; an external collaborator hands fetched endpoints back
//! through [`ControllerRegistry::apply_endpoints`].

use std::collections::HashMap;

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::config::ControllerConfigManager;
use crate::error::ConfigResult;
use crate::models::{
    AuthenticationType, ConnectionProfile, ControllerEntry, EndPoint, MSSQL_PROVIDER,
};

use super::node::{
    controller_label, endpoint_label, master_label, ControllerState, NodeKind, TreeNode,
};

/// Label of the implicit folder grouping SQL master instances
pub const SQL_SERVERS_FOLDER_LABEL: &str = "SQL Servers";

/// Login used against SQL master instances
const MASTER_USERNAME: &str = "sa";

const TREE_CHANGE_CAPACITY: usize = 64;

/// A tree change notification
///
/// `node: None` means the whole tree changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeChange {
    /// The changed node, or `None` for a whole-tree change
    pub node: Option<Uuid>,
}

/// Key data of a controller removed by [`ControllerRegistry::delete_controller`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedController {
    /// Controller management URL
    pub url: String,
    /// Username the controller was registered under
    pub username: String,
}

/// Outcome of a credential pre-check on a controller node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// A password is in hand; endpoint queries may proceed
    Ready,
    /// No password and no suppression left; the caller should prompt
    PromptRequired,
    /// No password, but one queued suppression was consumed
    PromptSuppressed,
}

/// Registry owning the controller tree
///
/// Nodes live in an id-keyed arena with non-owning parent back-references;
/// child order is the insertion order. All mutation goes through the
/// published commands, and every applied mutation is announced on the
/// broadcast channel after the fact.
#[derive(Debug)]
pub struct ControllerRegistry {
    /// Node arena indexed by id
    nodes: HashMap<Uuid, TreeNode>,
    /// Root node id
    root: Uuid,
    /// The "add controller" placeholder, shown only while the tree is empty
    placeholder: Uuid,
    /// Change notification channel
    changes: broadcast::Sender<TreeChange>,
}

impl ControllerRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        let root_node = TreeNode::new("root", None, NodeKind::Root);
        let root = root_node.id;
        let placeholder_node = TreeNode::new(
            "Add SQL Server big data cluster controller...",
            Some(root),
            NodeKind::AddControllerPlaceholder,
        );
        let placeholder = placeholder_node.id;
        nodes.insert(root, root_node);
        nodes.insert(placeholder, placeholder_node);
        let (changes, _) = broadcast::channel(TREE_CHANGE_CAPACITY);
        Self {
            nodes,
            root,
            placeholder,
            changes,
        }
    }

    /// Subscribes to tree change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TreeChange> {
        self.changes.subscribe()
    }

    /// Gets a node by id
    #[must_use]
    pub fn node(&self, id: Uuid) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Returns the number of controllers in the tree
    #[must_use]
    pub fn controller_count(&self) -> usize {
        self.nodes[&self.root].children.len()
    }

    /// Answers a structural children query
    ///
    /// A root call (`node: None`) yields the top-level controllers, or the
    /// single "add controller" placeholder while the tree is empty. The
    /// placeholder is not a controller and never reaches persistence.
    #[must_use]
    pub fn get_children(&self, node: Option<Uuid>) -> Vec<&TreeNode> {
        let parent = node.unwrap_or(self.root);
        if parent == self.root && self.nodes[&self.root].children.is_empty() {
            return vec![&self.nodes[&self.placeholder]];
        }
        self.nodes
            .get(&parent)
            .map(|n| n.children.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// Finds a controller by its composite `(url, username)` key
    #[must_use]
    pub fn controller_by_key(&self, url: &str, username: &str) -> Option<Uuid> {
        if url.is_empty() || username.is_empty() {
            return None;
        }
        self.nodes[&self.root]
            .children
            .iter()
            .copied()
            .find(|id| {
                self.nodes
                    .get(id)
                    .and_then(TreeNode::as_controller)
                    .is_some_and(|c| c.url == url && c.username == username)
            })
    }

    /// Adds a controller, or updates it in place when the key already exists
    ///
    /// An existing `(url, username)` match has its password and remember
    /// flag overwritten and its children cleared, invalidating stale
    /// endpoint data; duplicate add is an update, never an error. Empty
    /// `url` or `username` short-circuits to a no-op. When a master
    /// endpoint is supplied it is attached under the implicit "SQL Servers"
    /// folder.
    pub fn add_controller(
        &mut self,
        url: &str,
        username: &str,
        password: Option<&str>,
        remember_password: bool,
        master: Option<&EndPoint>,
    ) -> Option<Uuid> {
        if url.is_empty() || username.is_empty() {
            return None;
        }

        let controller = match self.controller_by_key(url, username) {
            Some(existing) => {
                self.clear_children(existing);
                let state = self
                    .nodes
                    .get_mut(&existing)
                    .and_then(TreeNode::as_controller_mut)
                    .expect("key lookup returned a controller");
                state.password = password.map(str::to_string);
                state.remember_password = remember_password;
                debug!(url, username, "updated controller in place");
                existing
            }
            None => {
                let id = self.insert_controller_node(url, username, password, remember_password);
                debug!(url, username, "added controller");
                id
            }
        };

        if let Some(master) = master {
            self.set_master_endpoint(controller, master);
        }

        self.notify_node_changed(None);
        Some(controller)
    }

    /// Removes the controller matching the composite key
    ///
    /// Returns `None` when no controller matches; nothing is mutated and no
    /// change notification fires in that case.
    pub fn delete_controller(&mut self, url: &str, username: &str) -> Option<RemovedController> {
        let id = self.controller_by_key(url, username)?;
        let state = self.nodes[&id].as_controller().cloned()?;
        let root = self
            .nodes
            .get_mut(&self.root)
            .expect("root node always exists");
        root.children.retain(|c| *c != id);
        self.remove_subtree(id);
        debug!(url, username, "deleted controller");
        self.notify_node_changed(None);
        Some(RemovedController {
            url: state.url,
            username: state.username,
        })
    }

    /// Attaches a master endpoint under the controller's "SQL Servers" folder
    ///
    /// The folder is created lazily and there is at most one per controller.
    pub fn set_master_endpoint(&mut self, controller: Uuid, endpoint: &EndPoint) -> Option<Uuid> {
        self.nodes.get(&controller)?.as_controller()?;
        let folder = self.sql_servers_folder(controller);
        let label = master_label(&endpoint.endpoint, MASTER_USERNAME);
        let master = TreeNode::new(
            label,
            Some(folder),
            NodeKind::SqlMaster {
                endpoint_address: endpoint.endpoint.clone(),
                username: MASTER_USERNAME.to_string(),
            },
        );
        let id = master.id;
        self.nodes.insert(id, master);
        self.nodes
            .get_mut(&folder)
            .expect("folder just resolved")
            .children
            .push(id);
        Some(id)
    }

    /// Applies a fetched endpoint list to a controller
    ///
    /// Existing endpoint children are discarded first; the master endpoint
    /// (if present in the list) lands under the "SQL Servers" folder and the
    /// remaining endpoints become plain leaf children.
    pub fn apply_endpoints(&mut self, controller: Uuid, endpoints: &[EndPoint]) {
        if self
            .nodes
            .get(&controller)
            .and_then(TreeNode::as_controller)
            .is_none()
        {
            return;
        }
        self.clear_children(controller);
        for endpoint in endpoints {
            if endpoint.is_sql_master() {
                self.set_master_endpoint(controller, endpoint);
            } else {
                let label = endpoint_label(&endpoint.name, &endpoint.endpoint);
                let node = TreeNode::new(
                    label,
                    Some(controller),
                    NodeKind::EndPoint {
                        role: endpoint.name.clone(),
                        endpoint_address: endpoint.endpoint.clone(),
                    },
                );
                let id = node.id;
                self.nodes.insert(id, node);
                self.nodes
                    .get_mut(&controller)
                    .expect("controller checked above")
                    .children
                    .push(id);
            }
        }
        self.notify_node_changed(Some(controller));
    }

    /// Pre-checks whether a controller's endpoints may be queried
    ///
    /// With a password in hand the answer is [`CredentialCheck::Ready`].
    /// Without one, each queued suppression absorbs one check before the
    /// caller is told to prompt. The suppression policy is product-defined:
    /// "suppress the Nth next prompt after a blank-password read".
    pub fn credential_check(&mut self, controller: Uuid) -> CredentialCheck {
        let Some(state) = self
            .nodes
            .get_mut(&controller)
            .and_then(TreeNode::as_controller_mut)
        else {
            return CredentialCheck::PromptRequired;
        };
        if !state.password_is_empty() {
            return CredentialCheck::Ready;
        }
        if state.skip_dialog > 0 {
            state.skip_dialog -= 1;
            CredentialCheck::PromptSuppressed
        } else {
            CredentialCheck::PromptRequired
        }
    }

    /// Queues one prompt suppression on a controller with no password
    pub fn suppress_next_prompt(&mut self, controller: Uuid) {
        if let Some(state) = self
            .nodes
            .get_mut(&controller)
            .and_then(TreeNode::as_controller_mut)
        {
            if state.password_is_empty() {
                state.skip_dialog += 1;
            }
        }
    }

    /// Announces a tree change
    ///
    /// `None` means the whole tree changed; that variant also resets every
    /// controller's suppression counter to zero, re-arming the credential
    /// prompt policy. The notification always follows the mutation it
    /// describes.
    pub fn notify_node_changed(&mut self, node: Option<Uuid>) {
        if node.is_none() {
            let controllers: Vec<Uuid> = self.nodes[&self.root].children.clone();
            for id in controllers {
                if let Some(state) = self
                    .nodes
                    .get_mut(&id)
                    .and_then(TreeNode::as_controller_mut)
                {
                    state.skip_dialog = 0;
                }
            }
        }
        // Send fails only when nobody is subscribed.
        let _ = self.changes.send(TreeChange { node });
    }

    /// Builds the connection profile for a SQL master node
    ///
    /// The password is resolved by walking the non-owning parent chain up to
    /// the owning controller.
    #[must_use]
    pub fn master_connection_profile(&self, node: Uuid) -> Option<ConnectionProfile> {
        let master = self.nodes.get(&node)?;
        let NodeKind::SqlMaster {
            endpoint_address,
            username,
        } = &master.kind
        else {
            return None;
        };

        let mut current = master.parent;
        let mut password = String::new();
        while let Some(id) = current {
            let parent = self.nodes.get(&id)?;
            if let Some(state) = parent.as_controller() {
                password = state.password.clone().unwrap_or_default();
                break;
            }
            current = parent.parent;
        }

        let mut profile = ConnectionProfile::new(
            endpoint_address.clone(),
            String::new(),
            username.clone(),
            MSSQL_PROVIDER,
        )
        .with_authentication(AuthenticationType::SqlLogin)
        .with_password(password);
        profile.connection_name = master.label.clone();
        Some(profile)
    }

    // ========== Persistence ==========

    /// Replaces the tree contents with the persisted controller list
    ///
    /// A controller loaded with a password is marked as remembered. Fires a
    /// whole-tree change once everything is applied.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub fn load_saved_controllers(
        &mut self,
        config: &ControllerConfigManager,
    ) -> ConfigResult<()> {
        let entries = config.load_controllers()?;
        let existing: Vec<Uuid> = self.nodes[&self.root].children.clone();
        for id in existing {
            self.remove_subtree(id);
        }
        self.nodes
            .get_mut(&self.root)
            .expect("root node always exists")
            .children
            .clear();
        for entry in entries {
            if entry.url.is_empty() || entry.username.is_empty() {
                continue;
            }
            let remember = entry.password.is_some();
            self.insert_controller_node(
                &entry.url,
                &entry.username,
                entry.password.as_deref(),
                remember,
            );
        }
        self.notify_node_changed(None);
        Ok(())
    }

    /// Persists the controller list
    ///
    /// Only controller nodes are saved; the placeholder and endpoint data
    /// never reach the file. Passwords are written only for controllers
    /// with the remember flag set.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn save_controllers(&self, config: &ControllerConfigManager) -> ConfigResult<()> {
        let entries: Vec<ControllerEntry> = self.nodes[&self.root]
            .children
            .iter()
            .filter_map(|id| self.nodes.get(id).and_then(TreeNode::as_controller))
            .map(|state| ControllerEntry {
                url: state.url.clone(),
                username: state.username.clone(),
                password: if state.remember_password {
                    state.password.clone()
                } else {
                    None
                },
            })
            .collect();
        config.save_controllers(&entries)
    }

    // ========== Internal helpers ==========

    fn insert_controller_node(
        &mut self,
        url: &str,
        username: &str,
        password: Option<&str>,
        remember_password: bool,
    ) -> Uuid {
        let node = TreeNode::new(
            controller_label(url, username),
            Some(self.root),
            NodeKind::Controller(ControllerState {
                url: url.to_string(),
                username: username.to_string(),
                password: password.map(str::to_string),
                remember_password,
                skip_dialog: 0,
            }),
        );
        let id = node.id;
        self.nodes.insert(id, node);
        self.nodes
            .get_mut(&self.root)
            .expect("root node always exists")
            .children
            .push(id);
        id
    }

    fn sql_servers_folder(&mut self, controller: Uuid) -> Uuid {
        let existing = self.nodes[&controller].children.iter().copied().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|n| matches!(n.kind, NodeKind::Folder) && n.label == SQL_SERVERS_FOLDER_LABEL)
        });
        if let Some(folder) = existing {
            return folder;
        }
        let folder = TreeNode::new(SQL_SERVERS_FOLDER_LABEL, Some(controller), NodeKind::Folder);
        let id = folder.id;
        self.nodes.insert(id, folder);
        self.nodes
            .get_mut(&controller)
            .expect("controller exists")
            .children
            .push(id);
        id
    }

    fn clear_children(&mut self, id: Uuid) {
        let children = match self.nodes.get_mut(&id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn remove_subtree(&mut self, id: Uuid) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
