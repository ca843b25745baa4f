//! Aussie OS kernel host: configuration, service wiring and the REPL.

pub mod bootstrap;
pub mod config;
pub mod repl;

pub use bootstrap::{boot, boot_with_provider, Kernel};
pub use config::{AppConfig, ProviderKind};
