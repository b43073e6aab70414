// src/config/mod.rs

//! Configuration loading and validation for relaunch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and reference defaults (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate timing, allow-list and glob sanity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, RawConfigFile, SecuritySection, SupervisorSection, SupervisorSettings,
    WatchSection,
};
pub use validate::validate_config;
