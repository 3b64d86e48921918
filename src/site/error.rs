//! Installation lifecycle errors.
//!
//! One variant per failure class: environment problems, one state-mismatch
//! variant per lifecycle state, one input-validation variant per install
//! parameter, and `InstallationFail` for an execution that ran and failed.

use std::path::PathBuf;

use thiserror::Error;

use super::config::ConfigError;
use super::state::InstallationState;
use super::version::VersionError;
use crate::process::ProcessError;

#[derive(Error, Debug)]
pub enum InstallationError {
    #[error("root directory not found: {0}")]
    RootDirNotFound(PathBuf),
    #[error("configuration file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("cannot {op}: no site files found in the root directory")]
    StateEmpty { op: String },
    #[error("cannot {op}: the site files are scaffolded but not configured")]
    StateScaffolded { op: String },
    #[error("cannot {op}: the installation is configured")]
    StateConfigured { op: String },
    #[error("cannot {op}: the installation is an installed single site")]
    StateSingle { op: String },
    #[error("cannot {op}: the installation is an installed multisite")]
    StateMultisite { op: String },

    #[error("invalid site URL: {0:?}")]
    InvalidUrl(String),
    #[error("invalid admin username: {0:?}")]
    InvalidAdminUsername(String),
    #[error("the admin password cannot be empty")]
    InvalidAdminPassword,
    #[error("invalid admin email: {0:?}")]
    InvalidAdminEmail(String),
    #[error("the site title cannot be empty")]
    InvalidTitle,

    #[error("installation failed: {0}")]
    InstallationFail(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl InstallationError {
    /// The state-mismatch error naming the actual current state.
    pub fn state_mismatch(state: &InstallationState, op: &str) -> Self {
        let op = op.to_string();
        match state {
            InstallationState::EmptyDir(_) => InstallationError::StateEmpty { op },
            InstallationState::Scaffolded(_) => InstallationError::StateScaffolded { op },
            InstallationState::Configured(_) => InstallationError::StateConfigured { op },
            InstallationState::Single(_) => InstallationError::StateSingle { op },
            InstallationState::Multisite(_) => InstallationError::StateMultisite { op },
        }
    }
}
