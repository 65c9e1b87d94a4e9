//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod pkg_config;
pub mod process;

pub use config::ToolchainConfig;
pub use diagnostic::Diagnostic;
