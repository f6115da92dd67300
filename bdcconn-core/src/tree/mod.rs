//! Controller tree model and registry
//!
//! The tree is an arena of nodes keyed by id, with non-owning parent
//! back-references and ordered child vectors. [`ControllerRegistry`] owns
//! the arena and is the only way to mutate it; collaborators observe
//! changes through the broadcast channel it exposes.

mod node;
mod registry;

pub use node::{ControllerState, NodeKind, TreeNode};
pub use registry::{
    ControllerRegistry, CredentialCheck, RemovedController, TreeChange, SQL_SERVERS_FOLDER_LABEL,
};
