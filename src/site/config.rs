//! The site configuration file.
//!
//! `configure` renders a `site-config.toml` with the database credentials,
//! the eight keys and salts, the table prefix and the multisite mode; every
//! later lifecycle stage reads it back. The file lives in the site root or,
//! like the target system allows, one directory above it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::db::Db;
use super::secrets::Salts;

/// Configuration file name, relative to the site root (or its parent).
pub const CONFIG_FILE: &str = "site-config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Installation mode fixed at configure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultisiteMode {
    #[default]
    SingleSite,
    MultisiteSubfolder,
    MultisiteSubdomain,
}

impl MultisiteMode {
    pub fn is_multisite(self) -> bool {
        !matches!(self, MultisiteMode::SingleSite)
    }

    pub fn subdomain(self) -> bool {
        matches!(self, MultisiteMode::MultisiteSubdomain)
    }
}

/// Caller-supplied configuration overrides. Keys left unset are generated
/// fresh; provided keys are used verbatim.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationData {
    pub auth_key: Option<String>,
    pub secure_auth_key: Option<String>,
    pub logged_in_key: Option<String>,
    pub nonce_key: Option<String>,
    pub auth_salt: Option<String>,
    pub secure_auth_salt: Option<String>,
    pub logged_in_salt: Option<String>,
    pub nonce_salt: Option<String>,
    /// Extra constants appended to the configuration file.
    pub extra_constants: BTreeMap<String, toml::Value>,
}

impl ConfigurationData {
    /// Merge the provided keys over freshly generated ones.
    fn salts(&self) -> Salts {
        let generated = Salts::generate();
        Salts {
            auth_key: self.auth_key.clone().unwrap_or(generated.auth_key),
            secure_auth_key: self
                .secure_auth_key
                .clone()
                .unwrap_or(generated.secure_auth_key),
            logged_in_key: self.logged_in_key.clone().unwrap_or(generated.logged_in_key),
            nonce_key: self.nonce_key.clone().unwrap_or(generated.nonce_key),
            auth_salt: self.auth_salt.clone().unwrap_or(generated.auth_salt),
            secure_auth_salt: self
                .secure_auth_salt
                .clone()
                .unwrap_or(generated.secure_auth_salt),
            logged_in_salt: self
                .logged_in_salt
                .clone()
                .unwrap_or(generated.logged_in_salt),
            nonce_salt: self.nonce_salt.clone().unwrap_or(generated.nonce_salt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbSection {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSection {
    pub table_prefix: String,
    pub multisite: bool,
    pub subdomain_install: bool,
}

/// Parsed form of `site-config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub db: DbSection,
    pub site: SiteSection,
    pub keys: Salts,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, toml::Value>,
}

impl SiteConfig {
    /// Build the configuration written by `configure`.
    pub fn new(db: &Db, mode: MultisiteMode, data: &ConfigurationData) -> Self {
        Self {
            db: DbSection {
                host: db.host.clone(),
                user: db.user.clone(),
                password: db.password.clone(),
                name: db.name.clone(),
            },
            site: SiteSection {
                table_prefix: db.table_prefix.clone(),
                multisite: mode.is_multisite(),
                subdomain_install: mode.subdomain(),
            },
            keys: data.salts(),
            extra: data.extra_constants.clone(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The database descriptor recorded in this configuration.
    pub fn db(&self) -> Db {
        Db::new(
            self.db.name.clone(),
            self.db.user.clone(),
            self.db.password.clone(),
            self.db.host.clone(),
        )
        .with_table_prefix(self.site.table_prefix.clone())
    }

    /// The configuration's constants: database settings, the eight keys and
    /// salts, the multisite flags and any extra constants.
    pub fn constants(&self) -> BTreeMap<String, Value> {
        let mut constants = BTreeMap::new();
        constants.insert("DB_HOST".to_string(), Value::from(self.db.host.clone()));
        constants.insert("DB_USER".to_string(), Value::from(self.db.user.clone()));
        constants.insert(
            "DB_PASSWORD".to_string(),
            Value::from(self.db.password.clone()),
        );
        constants.insert("DB_NAME".to_string(), Value::from(self.db.name.clone()));
        for (name, value) in self.keys.to_map() {
            constants.insert(name, Value::from(value));
        }
        constants.insert("MULTISITE".to_string(), Value::from(self.site.multisite));
        constants.insert(
            "SUBDOMAIN_INSTALL".to_string(),
            Value::from(self.site.subdomain_install),
        );
        for (name, value) in &self.extra {
            if let Ok(json) = serde_json::to_value(value) {
                constants.insert(name.clone(), json);
            }
        }
        constants
    }

    /// The configuration's globals: the table prefix.
    pub fn globals(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([(
            "table_prefix".to_string(),
            Value::from(self.site.table_prefix.clone()),
        )])
    }
}

/// Locate the configuration file for a site root: the root directory first,
/// then its parent.
pub fn find_config_file(root_dir: &Path) -> Option<PathBuf> {
    let in_root = root_dir.join(CONFIG_FILE);
    if in_root.is_file() {
        return Some(in_root);
    }
    let in_parent = root_dir.parent()?.join(CONFIG_FILE);
    in_parent.is_file().then_some(in_parent)
}
