//! Baseline site files.
//!
//! `scaffold` populates an empty root directory with the files a site needs
//! before configuration: the loader manifest, baseline settings, a
//! configuration sample, the version record and the content directories.
//! Templates are embedded; no network access is involved.

use std::path::Path;

use super::error::InstallationError;
use super::version::{SiteVersion, Version, VersionError};

/// Loader manifest; its presence marks a directory as holding site files.
pub const LOAD_FILE: &str = "site-load.toml";
/// Baseline runtime settings.
pub const SETTINGS_FILE: &str = "site-settings.toml";
/// Configuration sample shipped with the scaffolded files.
pub const SAMPLE_CONFIG_FILE: &str = "site-config-sample.toml";
/// Content directory, relative to the site root.
pub const CONTENT_DIR: &str = "content";

/// Version the `latest` tag resolves to.
pub const DEFAULT_VERSION: &str = "6.5.3";
/// Data-store schema version shipped with [`DEFAULT_VERSION`].
pub const DEFAULT_DB_VERSION: &str = "57155";

const LOAD_TEMPLATE: &str = "\
[loader]
settings = \"site-settings.toml\"
config = \"site-config.toml\"
";

const SETTINGS_TEMPLATE: &str = "\
[settings]
content_dir = \"content\"
plugins_dir = \"content/plugins\"
themes_dir = \"content/themes\"
";

const SAMPLE_CONFIG_TEMPLATE: &str = "\
[db]
host = \"localhost\"
user = \"username_here\"
password = \"password_here\"
name = \"database_name_here\"

[site]
table_prefix = \"site_\"
multisite = false
subdomain_install = false

[keys]
AUTH_KEY = \"put your unique phrase here\"
SECURE_AUTH_KEY = \"put your unique phrase here\"
LOGGED_IN_KEY = \"put your unique phrase here\"
NONCE_KEY = \"put your unique phrase here\"
AUTH_SALT = \"put your unique phrase here\"
SECURE_AUTH_SALT = \"put your unique phrase here\"
LOGGED_IN_SALT = \"put your unique phrase here\"
NONCE_SALT = \"put your unique phrase here\"
";

/// Resolve a version tag: `latest` maps to the pinned default.
pub fn resolve_version(tag: &str) -> Result<SiteVersion, VersionError> {
    let version: Version = if tag == "latest" {
        DEFAULT_VERSION.parse()?
    } else {
        tag.parse()?
    };
    Ok(SiteVersion::new(version, DEFAULT_DB_VERSION))
}

/// Write the baseline site files for `version_tag` into `root_dir`.
pub fn scaffold(root_dir: &Path, version_tag: &str) -> Result<SiteVersion, InstallationError> {
    let version = resolve_version(version_tag)?;

    write(root_dir.join(LOAD_FILE), LOAD_TEMPLATE)?;
    write(root_dir.join(SETTINGS_FILE), SETTINGS_TEMPLATE)?;
    write(root_dir.join(SAMPLE_CONFIG_FILE), SAMPLE_CONFIG_TEMPLATE)?;
    version.write(root_dir)?;

    for dir in ["plugins", "themes"] {
        let path = root_dir.join(CONTENT_DIR).join(dir);
        std::fs::create_dir_all(&path).map_err(|source| InstallationError::Write {
            path: path.clone(),
            source,
        })?;
        write(path.join("index.html"), "")?;
    }

    Ok(version)
}

fn write(path: std::path::PathBuf, content: &str) -> Result<(), InstallationError> {
    std::fs::write(&path, content).map_err(|source| InstallationError::Write { path, source })
}
