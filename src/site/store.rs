//! File-backed data store for an installed site.
//!
//! Installation records live under `<root>/data/<dbname>/`: an options
//! table, the admin user and, for multisite installations, the network
//! record. The job handlers write these from inside a worker process; the
//! state detection on the parent side only ever reads the installed flag.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::db::Db;

pub const OPTIONS_FILE: &str = "options.toml";
pub const USERS_FILE: &str = "users.toml";
pub const NETWORK_FILE: &str = "network.toml";

#[derive(Error, Debug)]
pub enum StoreError {
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
    #[error("failed to render {path}: {source}")]
    Render {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("the site is not installed: {0} is missing")]
    NotInstalled(PathBuf),
}

#[derive(Serialize, Deserialize, Default)]
struct OptionsFile {
    options: BTreeMap<String, toml::Value>,
}

#[derive(Serialize, Deserialize)]
struct UsersFile {
    admin: AdminUser,
}

#[derive(Serialize, Deserialize)]
struct AdminUser {
    user_login: String,
    user_email: String,
    password_hash: String,
}

#[derive(Serialize, Deserialize)]
struct NetworkFile {
    network: Network,
}

#[derive(Serialize, Deserialize)]
struct Network {
    domain: String,
    subdomain_install: bool,
}

pub fn read_options(data_dir: &Path) -> Result<BTreeMap<String, toml::Value>, StoreError> {
    let path = data_dir.join(OPTIONS_FILE);
    if !path.is_file() {
        return Err(StoreError::NotInstalled(path));
    }
    let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Read {
        path: path.clone(),
        source,
    })?;
    let file: OptionsFile =
        toml::from_str(&content).map_err(|source| StoreError::Parse { path, source })?;
    Ok(file.options)
}

pub fn write_options(
    data_dir: &Path,
    options: BTreeMap<String, toml::Value>,
) -> Result<(), StoreError> {
    write_file(&data_dir.join(OPTIONS_FILE), &OptionsFile { options })
}

/// Read-modify-write a single option.
pub fn update_option(
    data_dir: &Path,
    name: &str,
    value: toml::Value,
) -> Result<(), StoreError> {
    let mut options = read_options(data_dir)?;
    options.insert(name.to_string(), value);
    write_options(data_dir, options)
}

pub fn write_admin_user(
    data_dir: &Path,
    login: &str,
    email: &str,
    password: &str,
) -> Result<(), StoreError> {
    let file = UsersFile {
        admin: AdminUser {
            user_login: login.to_string(),
            user_email: email.to_string(),
            password_hash: hash_password(password),
        },
    };
    write_file(&data_dir.join(USERS_FILE), &file)
}

pub fn write_network(data_dir: &Path, domain: &str, subdomain_install: bool) -> Result<(), StoreError> {
    let file = NetworkFile {
        network: Network {
            domain: domain.to_string(),
            subdomain_install,
        },
    };
    write_file(&data_dir.join(NETWORK_FILE), &file)
}

/// Whether the database target holds an installed site.
pub fn is_installed(root_dir: &Path, db: &Db) -> bool {
    let data_dir = db.data_dir(root_dir);
    match read_options(&data_dir) {
        Ok(options) => options
            .get("installed")
            .and_then(toml::Value::as_bool)
            .unwrap_or(false),
        Err(_) => false,
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(value).map_err(|source| StoreError::Render {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
