//! Vault-level orchestration shared by the `notecanvas` binary.

pub mod config;
pub mod workspace;

pub use config::AppConfig;
pub use workspace::Workspace;
