//! Execution environment description for a worker child process.
//!
//! A [`Control`] describes everything a freshly spawned process needs before
//! it can run a job: environment manifests to load, a working directory, the
//! site root, a configuration map exported to the environment, and optional
//! package-manager metadata. Applying a control mutates the current process
//! and therefore may happen at most once per process lifetime; workers are
//! always fresh children, so the guard only trips on misuse.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::parser::ProtocolError;

static APPLIED: AtomicBool = AtomicBool::new(false);

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("a control was already applied in this process")]
    AlreadyApplied,
    #[error("root directory not found: {0}")]
    RootDirNotFound(PathBuf),
    #[error("failed to read environment manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse environment manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to change working directory to {path}: {source}")]
    Chdir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Immutable description of a child process environment.
///
/// Field names follow the wire format: the serialized map uses the keys
/// `autoloadFile`, `requireFiles`, `cwd`, `rootDir`, `config`,
/// `composerAutoloadPath` and `composerBinDir`. `cwd` serializes as `false`
/// when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    /// Primary environment manifest, loaded first. Empty means none.
    #[serde(default)]
    pub autoload_file: String,
    /// Additional manifests, loaded in order after the autoload file.
    #[serde(default)]
    pub require_files: Vec<String>,
    /// Working directory for the job, or unset.
    #[serde(with = "cwd_repr", default)]
    pub cwd: Option<String>,
    /// Site root directory; must exist when the control is applied.
    pub root_dir: String,
    /// Arbitrary configuration, exported to the process environment.
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
    /// Package-manager autoload path, exported when present.
    #[serde(default)]
    pub composer_autoload_path: Option<String>,
    /// Package-manager binary directory, prepended to `PATH` when present.
    #[serde(default)]
    pub composer_bin_dir: Option<String>,
}

impl Control {
    /// A minimal control for jobs rooted at `root_dir`.
    pub fn for_root_dir(root_dir: impl Into<String>) -> Self {
        let root_dir = root_dir.into();
        Self {
            autoload_file: String::new(),
            require_files: Vec::new(),
            cwd: Some(root_dir.clone()),
            root_dir,
            config: BTreeMap::new(),
            composer_autoload_path: None,
            composer_bin_dir: None,
        }
    }

    /// Build a control from its serialized map, validating the shape only.
    /// Filesystem existence is checked by [`Control::apply`], not here.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        serde_json::from_value(value).map_err(ProtocolError::ControlShape)
    }

    /// Serializable projection of this control.
    pub fn to_value(&self) -> Value {
        // A Control always serializes: its fields are strings, lists and maps.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Reconstruct the described environment in the current process.
    ///
    /// Loads the environment manifests, changes the working directory,
    /// asserts the root directory and exports the configuration map.
    /// At most one control may ever be applied per process; a second call
    /// fails with [`ControlError::AlreadyApplied`].
    pub fn apply(&self) -> Result<(), ControlError> {
        if APPLIED.swap(true, Ordering::SeqCst) {
            return Err(ControlError::AlreadyApplied);
        }

        if !self.autoload_file.is_empty() {
            load_manifest(Path::new(&self.autoload_file))?;
        }
        for file in &self.require_files {
            load_manifest(Path::new(file))?;
        }

        let root_dir = Path::new(&self.root_dir);
        if !root_dir.is_dir() {
            return Err(ControlError::RootDirNotFound(root_dir.to_path_buf()));
        }

        if let Some(cwd) = &self.cwd {
            std::env::set_current_dir(cwd).map_err(|source| ControlError::Chdir {
                path: PathBuf::from(cwd),
                source,
            })?;
        }

        for (key, value) in &self.config {
            set_env(key, value);
        }

        if let Some(autoload) = &self.composer_autoload_path {
            unsafe { std::env::set_var("COMPOSER_AUTOLOAD_PATH", autoload) };
        }
        if let Some(bin_dir) = &self.composer_bin_dir {
            let path = std::env::var("PATH").unwrap_or_default();
            let joined = if path.is_empty() {
                bin_dir.clone()
            } else {
                format!("{bin_dir}:{path}")
            };
            unsafe { std::env::set_var("PATH", joined) };
        }

        Ok(())
    }
}

/// Load a TOML manifest of environment variables into the process.
fn load_manifest(path: &Path) -> Result<(), ControlError> {
    let content = std::fs::read_to_string(path).map_err(|source| ControlError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    let table: BTreeMap<String, toml::Value> =
        toml::from_str(&content).map_err(|source| ControlError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
    for (key, value) in table {
        match value {
            toml::Value::String(s) => unsafe { std::env::set_var(&key, s) },
            other => unsafe { std::env::set_var(&key, other.to_string()) },
        }
    }
    Ok(())
}

fn set_env(key: &str, value: &Value) {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    unsafe { std::env::set_var(key, rendered) };
}

/// `cwd` is `false` on the wire when unset, a string otherwise.
mod cwd_repr {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(path) => serializer.serialize_str(path),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        struct CwdVisitor;

        impl<'de> Visitor<'de> for CwdVisitor {
            type Value = Option<String>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a path string or false")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                if v {
                    Err(E::custom("cwd cannot be true"))
                } else {
                    Ok(None)
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Some(v.to_string()))
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }
        }

        deserializer.deserialize_any(CwdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_keys() {
        let control = Control::for_root_dir("/tmp/site");
        let value = control.to_value();
        let map = value.as_object().unwrap();

        for key in [
            "autoloadFile",
            "requireFiles",
            "cwd",
            "rootDir",
            "config",
            "composerAutoloadPath",
            "composerBinDir",
        ] {
            assert!(map.contains_key(key), "missing wire key {key}");
        }
    }

    #[test]
    fn cwd_serializes_as_false_when_unset() {
        let mut control = Control::for_root_dir("/tmp/site");
        control.cwd = None;

        let value = control.to_value();
        assert_eq!(value["cwd"], json!(false));

        let parsed = Control::from_value(value).unwrap();
        assert_eq!(parsed.cwd, None);
    }

    #[test]
    fn from_value_validates_shape() {
        let valid = json!({
            "autoloadFile": "",
            "requireFiles": [],
            "cwd": false,
            "rootDir": "/tmp/site",
            "config": {"SITE_ENV": "test"},
            "composerAutoloadPath": null,
            "composerBinDir": null,
        });
        let control = Control::from_value(valid).unwrap();
        assert_eq!(control.root_dir, "/tmp/site");
        assert_eq!(control.config["SITE_ENV"], json!("test"));

        let invalid = json!({"requireFiles": "not-a-list", "rootDir": "/tmp"});
        assert!(Control::from_value(invalid).is_err());
    }

    #[test]
    fn round_trips_through_value() {
        let mut control = Control::for_root_dir("/var/www/site");
        control.require_files = vec!["/tmp/extra.toml".to_string()];
        control.config.insert("DEBUG".to_string(), json!(true));
        control.composer_bin_dir = Some("/opt/bin".to_string());

        let parsed = Control::from_value(control.to_value()).unwrap();
        assert_eq!(parsed, control);
    }
}
