//! Site version parsing and the scaffolded version file.
//!
//! Scaffolded site files carry a `version.toml` recording the site version
//! (semver-like) and the data-store schema version. Both surface through the
//! installation report.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File recording the scaffolded version, relative to the site root.
pub const VERSION_FILE: &str = "version.toml";

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("invalid version format: {0}")]
    InvalidFormat(String),
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
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render version file: {0}")]
    Render(toml::ser::Error),
}

/// A semantic version with major, minor, patch, and optional prerelease.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionError::InvalidFormat("empty version".to_string()));
        }

        // Split off prerelease (-alpha, -beta, -rc1, etc.)
        let (version_part, prerelease) = if let Some(idx) = s.find('-') {
            (&s[..idx], Some(s[idx + 1..].to_string()))
        } else {
            (s, None)
        };

        let parts: Vec<&str> = version_part.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(VersionError::InvalidFormat(s.to_string()));
        }

        let major = parts[0]
            .parse()
            .map_err(|_| VersionError::InvalidFormat(s.to_string()))?;

        let minor = parts
            .get(1)
            .map(|p| p.parse())
            .transpose()
            .map_err(|_| VersionError::InvalidFormat(s.to_string()))?
            .unwrap_or(0);

        let patch = parts
            .get(2)
            .map(|p| p.parse())
            .transpose()
            .map_err(|_| VersionError::InvalidFormat(s.to_string()))?
            .unwrap_or(0);

        Ok(Version {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.patch.cmp(&other.patch) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // A prerelease sorts before its release.
        match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The scaffolded site's version record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteVersion {
    pub version: Version,
    pub db_version: String,
}

#[derive(Serialize, Deserialize)]
struct VersionFile {
    site: SiteVersion,
}

impl SiteVersion {
    pub fn new(version: Version, db_version: impl Into<String>) -> Self {
        Self {
            version,
            db_version: db_version.into(),
        }
    }

    /// Read the version record from a site root directory.
    pub fn from_root_dir(root_dir: &Path) -> Result<Self, VersionError> {
        let path = root_dir.join(VERSION_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| VersionError::Read {
            path: path.clone(),
            source,
        })?;
        let file: VersionFile =
            toml::from_str(&content).map_err(|source| VersionError::Parse { path, source })?;
        Ok(file.site)
    }

    /// Write the version record under a site root directory.
    pub fn write(&self, root_dir: &Path) -> Result<(), VersionError> {
        let path = root_dir.join(VERSION_FILE);
        let file = VersionFile { site: self.clone() };
        let content = toml::to_string_pretty(&file).map_err(VersionError::Render)?;
        std::fs::write(&path, content).map_err(|source| VersionError::Write { path, source })
    }

    /// Report projection: version and schema version as strings.
    pub fn to_map(&self) -> serde_json::Value {
        serde_json::json!({
            "version": self.version.to_string(),
            "db_version": self.db_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_full_versions() {
        let v: Version = "6.5.3".parse().unwrap();
        assert_eq!(v, Version::new(6, 5, 3));
    }

    #[test]
    fn parses_partial_versions() {
        let v: Version = "6.5".parse().unwrap();
        assert_eq!(v, Version::new(6, 5, 0));
        let v: Version = "6".parse().unwrap();
        assert_eq!(v, Version::new(6, 0, 0));
    }

    #[test]
    fn parses_prereleases() {
        let v: Version = "6.6.0-rc1".parse().unwrap();
        assert_eq!(v.prerelease.as_deref(), Some("rc1"));
        assert!(v < Version::new(6, 6, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("a.b.c".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
    }

    #[test]
    fn displays_round_trip() {
        for s in ["6.5.3", "1.0.0-beta", "10.20.30"] {
            let v: Version = s.parse().unwrap();
            assert_eq!(v.to_string(), s);
        }
    }

    #[test]
    fn version_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let site = SiteVersion::new(Version::new(6, 5, 3), "57155");
        site.write(dir.path()).unwrap();

        let read = SiteVersion::from_root_dir(dir.path()).unwrap();
        assert_eq!(read, site);
        assert_eq!(read.to_map()["version"], "6.5.3");
    }

    #[test]
    fn missing_version_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            SiteVersion::from_root_dir(dir.path()),
            Err(VersionError::Read { .. })
        ));
    }
}
