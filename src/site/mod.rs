//! Site installation lifecycle.
//!
//! A site root directory moves through EmptyDir → Scaffolded → Configured →
//! {Single, Multisite}. The transitions that perform first-run side effects
//! run in a worker child process through the execution protocol, because the
//! site bootstrap defines process-wide constants that cannot be redefined in
//! the calling process.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod installation;
pub mod jobs;
pub mod registry;
pub mod scaffold;
pub mod secrets;
pub mod state;
pub mod store;
pub mod version;

pub use config::{CONFIG_FILE, ConfigurationData, MultisiteMode, SiteConfig};
pub use db::{DEFAULT_TABLE_PREFIX, Db};
pub use error::InstallationError;
pub use installation::Installation;
pub use registry::ScaffoldRegistry;
pub use secrets::{KEY_LENGTH, KEY_NAMES, Salts};
pub use state::InstallationState;
pub use version::{SiteVersion, Version, VersionError};
