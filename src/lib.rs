//! ledger-console
//!
//! Administrative console for a ledger service. Accounts and assets are
//! created, listed and updated through one generic set of resource actions
//! and a shared form submission lifecycle.

pub mod client;
pub mod config;
pub mod flash;
pub mod form;
pub mod resource;
pub mod router;

/// Version injected at compile time via LEDGER_CONSOLE_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("LEDGER_CONSOLE_VERSION") {
    Some(v) => v,
    None => "dev",
};
