//! The installation facade.
//!
//! An [`Installation`] owns a root directory, an optional database
//! descriptor and exactly one current [`InstallationState`]. Lifecycle
//! operations delegate to the state machine and replace the held state with
//! the variant a transition returns; accessors are pure reads against the
//! current variant.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::process::Loop;

use super::config::{ConfigurationData, MultisiteMode};
use super::db::Db;
use super::error::InstallationError;
use super::scaffold::CONTENT_DIR;
use super::secrets::Salts;
use super::state::InstallationState;
use super::version::SiteVersion;

/// Report keys, in output order.
const REPORT_KEYS: [&str; 4] = ["rootDir", "version", "constants", "globals"];

#[derive(Debug)]
pub struct Installation {
    root_dir: PathBuf,
    db: Option<Db>,
    state: InstallationState,
    worker_loop: Loop,
}

impl Installation {
    /// Open a root directory, detecting its current lifecycle state.
    pub fn new(root_dir: impl Into<PathBuf>, db: Option<Db>) -> Result<Self, InstallationError> {
        let root_dir = root_dir.into();
        let state = InstallationState::read(&root_dir, db.as_ref())?;
        Ok(Self {
            root_dir,
            db,
            state,
            worker_loop: Loop::new(),
        })
    }

    /// Scaffold baseline site files into an empty directory and open the
    /// resulting installation. Any other current state is refused with the
    /// error naming that state.
    pub fn scaffold(
        root_dir: impl Into<PathBuf>,
        version: &str,
    ) -> Result<Self, InstallationError> {
        let root_dir = root_dir.into();
        let state = InstallationState::read(&root_dir, None)?;
        let InstallationState::EmptyDir(empty) = state else {
            return Err(InstallationError::state_mismatch(&state, "scaffold"));
        };

        let scaffolded = empty.scaffold(version)?;
        Ok(Self {
            root_dir,
            db: None,
            state: InstallationState::Scaffolded(scaffolded),
            worker_loop: Loop::new(),
        })
    }

    /// Replace the worker loop used for out-of-process operations.
    pub fn with_loop(mut self, worker_loop: Loop) -> Self {
        self.worker_loop = worker_loop;
        self
    }

    /// Scaffolded ⇒ Configured.
    pub fn configure(
        &mut self,
        db: &Db,
        mode: MultisiteMode,
    ) -> Result<&mut Self, InstallationError> {
        self.state = self.state.configure(db, mode, None)?;
        Ok(self)
    }

    /// Scaffolded ⇒ Configured, with caller-supplied configuration data.
    pub fn configure_with_data(
        &mut self,
        db: &Db,
        mode: MultisiteMode,
        data: &ConfigurationData,
    ) -> Result<&mut Self, InstallationError> {
        self.state = self.state.configure(db, mode, Some(data))?;
        Ok(self)
    }

    /// Configured ⇒ Single or Multisite, executed in a worker process.
    pub fn install(
        &mut self,
        url: &str,
        admin_user: &str,
        admin_password: &str,
        admin_email: &str,
        title: &str,
    ) -> Result<&mut Self, InstallationError> {
        self.state = self.state.install(
            &self.worker_loop,
            url,
            admin_user,
            admin_password,
            admin_email,
            title,
        )?;
        Ok(self)
    }

    /// Single ⇒ Multisite, executed in a worker process.
    pub fn convert_to_multisite(&mut self, subdomain: bool) -> Result<&mut Self, InstallationError> {
        self.state = self.state.convert_to_multisite(&self.worker_loop, subdomain)?;
        Ok(self)
    }

    /// Update a stored option, executed in a worker process. Valid on
    /// installed states only.
    pub fn update_option(&self, option: &str, value: Value) -> Result<(), InstallationError> {
        self.state.update_option(&self.worker_loop, option, value)
    }

    pub fn state(&self) -> &InstallationState {
        &self.state
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, InstallationState::EmptyDir(_))
    }

    pub fn is_configured(&self) -> bool {
        self.state.is_configured()
    }

    pub fn is_multisite(&self) -> bool {
        self.state.is_multisite()
    }

    pub fn version(&self) -> Option<&SiteVersion> {
        self.state.version()
    }

    /// The database descriptor: the one given at construction, else the one
    /// recorded in the configuration file.
    pub fn db(&self) -> Option<Db> {
        self.db
            .clone()
            .or_else(|| self.state.config().map(|config| config.db()))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn config_file_path(&self) -> Result<&Path, InstallationError> {
        self.state.config_file().ok_or_else(|| {
            InstallationError::state_mismatch(&self.state, "read the configuration file path")
        })
    }

    pub fn content_dir(&self, path: &str) -> PathBuf {
        join_relative(self.root_dir.join(CONTENT_DIR), path)
    }

    pub fn plugins_dir(&self, path: &str) -> PathBuf {
        join_relative(self.root_dir.join(CONTENT_DIR).join("plugins"), path)
    }

    pub fn themes_dir(&self, path: &str) -> PathBuf {
        join_relative(self.root_dir.join(CONTENT_DIR).join("themes"), path)
    }

    pub fn salts(&self) -> Result<&Salts, InstallationError> {
        self.state.config().map(|config| &config.keys).ok_or_else(|| {
            InstallationError::state_mismatch(&self.state, "read the keys and salts")
        })
    }

    pub fn auth_key(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.auth_key)
    }

    pub fn secure_auth_key(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.secure_auth_key)
    }

    pub fn logged_in_key(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.logged_in_key)
    }

    pub fn nonce_key(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.nonce_key)
    }

    pub fn auth_salt(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.auth_salt)
    }

    pub fn secure_auth_salt(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.secure_auth_salt)
    }

    pub fn logged_in_salt(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.logged_in_salt)
    }

    pub fn nonce_salt(&self) -> Result<&str, InstallationError> {
        Ok(&self.salts()?.nonce_salt)
    }

    /// Report the requested subset of {rootDir, version, constants, globals},
    /// or all four when no subset is given. Only requested entries are
    /// computed.
    pub fn report(
        &self,
        keys: Option<&[&str]>,
    ) -> Result<BTreeMap<String, Value>, InstallationError> {
        let mut report = BTreeMap::new();
        for key in REPORT_KEYS {
            if let Some(keys) = keys {
                if !keys.contains(&key) {
                    continue;
                }
            }
            let value = match key {
                "rootDir" => Value::from(self.root_dir.to_string_lossy().into_owned()),
                "version" => self
                    .version()
                    .ok_or_else(|| {
                        InstallationError::state_mismatch(&self.state, "report the version")
                    })?
                    .to_map(),
                "constants" => self.config_projection(|config| config.constants())?,
                "globals" => self.config_projection(|config| config.globals())?,
                _ => unreachable!(),
            };
            report.insert(key.to_string(), value);
        }
        Ok(report)
    }

    fn config_projection(
        &self,
        project: impl Fn(&super::config::SiteConfig) -> BTreeMap<String, Value>,
    ) -> Result<Value, InstallationError> {
        let config = self.state.config().ok_or_else(|| {
            InstallationError::state_mismatch(&self.state, "report the configuration")
        })?;
        serde_json::to_value(project(config)).map_err(|err| {
            InstallationError::InstallationFail(format!("failed to render the report: {err}"))
        })
    }
}

fn join_relative(base: PathBuf, path: &str) -> PathBuf {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        base
    } else {
        base.join(trimmed)
    }
}
