//! Property-based tests for the controller registry
//!
//! Random add/delete sequences are checked against a flat map model keyed
//! by the `(url, username)` composite key, together with the structural
//! invariants of the tree and persistence.

use std::collections::HashMap;

use proptest::prelude::*;
use tempfile::TempDir;

use bdcconn_core::{ControllerConfigManager, ControllerRegistry, NodeKind};

// Small pools so operation sequences actually collide on keys.
const URLS: [&str; 3] = [
    "https://ctrl-a:30080",
    "https://ctrl-b:30080",
    "bdc.local:30080",
];
const USERNAMES: [&str; 2] = ["admin", "root"];

#[derive(Debug, Clone)]
enum Op {
    Add {
        url: &'static str,
        username: &'static str,
        password: Option<String>,
        remember: bool,
    },
    Delete {
        url: &'static str,
        username: &'static str,
    },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (
            0..URLS.len(),
            0..USERNAMES.len(),
            proptest::option::of("[a-z0-9]{1,8}"),
            any::<bool>(),
        )
            .prop_map(|(u, n, password, remember)| Op::Add {
                url: URLS[u],
                username: USERNAMES[n],
                password,
                remember,
            }),
        (0..URLS.len(), 0..USERNAMES.len()).prop_map(|(u, n)| Op::Delete {
            url: URLS[u],
            username: USERNAMES[n],
        }),
    ]
}

proptest! {
    /// The tree's top level behaves like a map keyed by `(url, username)`:
    /// add inserts or overwrites, delete removes, and lookups agree.
    #[test]
    fn registry_top_level_matches_key_map(ops in prop::collection::vec(arb_op(), 0..24)) {
        let mut registry = ControllerRegistry::new();
        let mut model: HashMap<(&str, &str), (Option<String>, bool)> = HashMap::new();

        for op in ops {
            match op {
                Op::Add { url, username, password, remember } => {
                    let id = registry.add_controller(url, username, password.as_deref(), remember, None);
                    prop_assert!(id.is_some());
                    model.insert((url, username), (password, remember));
                }
                Op::Delete { url, username } => {
                    let removed = registry.delete_controller(url, username);
                    let expected = model.remove(&(url, username));
                    prop_assert_eq!(removed.is_some(), expected.is_some());
                }
            }
            prop_assert_eq!(registry.controller_count(), model.len());
        }

        for ((url, username), (password, remember)) in &model {
            let id = registry.controller_by_key(url, username);
            prop_assert!(id.is_some());
            let state = registry.node(id.unwrap()).unwrap().as_controller().unwrap();
            prop_assert_eq!(state.password.as_deref(), password.as_deref());
            prop_assert_eq!(state.remember_password, *remember);
        }
    }

    /// The "add controller" placeholder is served exactly while the tree is
    /// empty, and never alongside real controllers.
    #[test]
    fn placeholder_shown_iff_tree_is_empty(ops in prop::collection::vec(arb_op(), 0..16)) {
        let mut registry = ControllerRegistry::new();
        for op in ops {
            match op {
                Op::Add { url, username, password, remember } => {
                    registry.add_controller(url, username, password.as_deref(), remember, None);
                }
                Op::Delete { url, username } => {
                    registry.delete_controller(url, username);
                }
            }
            let children = registry.get_children(None);
            if registry.controller_count() == 0 {
                prop_assert_eq!(children.len(), 1);
                prop_assert!(matches!(children[0].kind, NodeKind::AddControllerPlaceholder));
            } else {
                prop_assert!(children.iter().all(|n| n.as_controller().is_some()));
            }
        }
    }

    /// Every top-level node carries a parent back-reference and a label
    /// derived from the normalized address.
    #[test]
    fn controller_labels_are_normalized(
        url_idx in 0..URLS.len(),
        username_idx in 0..USERNAMES.len(),
    ) {
        let mut registry = ControllerRegistry::new();
        let url = URLS[url_idx];
        let username = USERNAMES[username_idx];
        registry.add_controller(url, username, None, false, None);

        let children = registry.get_children(None);
        prop_assert_eq!(children.len(), 1);
        prop_assert!(children[0].parent.is_some());
        prop_assert!(!children[0].label.contains("://"));
        let expected_suffix = format!("({})", username);
        prop_assert!(children[0].label.ends_with(&expected_suffix));
    }

    /// Saving and reloading keeps exactly the remembered credentials: a
    /// password survives iff the remember flag was set, and the reloaded
    /// remember flag mirrors whether a password was stored.
    #[test]
    fn persistence_keeps_only_remembered_passwords(
        entries in prop::collection::vec(
            (
                0..URLS.len(),
                0..USERNAMES.len(),
                proptest::option::of("[a-z0-9]{1,8}"),
                any::<bool>(),
            ),
            0..6,
        ),
    ) {
        let temp = TempDir::new().unwrap();
        let config = ControllerConfigManager::with_config_dir(temp.path().to_path_buf());

        let mut registry = ControllerRegistry::new();
        let mut model: HashMap<(&str, &str), Option<String>> = HashMap::new();
        for (u, n, password, remember) in entries {
            let (url, username) = (URLS[u], USERNAMES[n]);
            registry.add_controller(url, username, password.as_deref(), remember, None);
            let persisted = if remember { password } else { None };
            model.insert((url, username), persisted);
        }
        registry.save_controllers(&config).unwrap();

        let mut loaded = ControllerRegistry::new();
        loaded.load_saved_controllers(&config).unwrap();
        prop_assert_eq!(loaded.controller_count(), model.len());
        for ((url, username), password) in &model {
            let id = loaded.controller_by_key(url, username);
            prop_assert!(id.is_some());
            let state = loaded.node(id.unwrap()).unwrap().as_controller().unwrap();
            prop_assert_eq!(state.password.as_deref(), password.as_deref());
            prop_assert_eq!(state.remember_password, password.is_some());
        }
    }
}
