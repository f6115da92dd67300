//! Configuration persistence
//!
//! Handles loading and saving the persisted controller list.

mod manager;

pub use manager::ControllerConfigManager;
