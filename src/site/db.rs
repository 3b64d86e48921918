//! Database descriptor for a site installation.
//!
//! The descriptor is pure data: credentials, a database name and a table
//! prefix. The bundled job handlers back it with a file store under the
//! site root, keyed by database name.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The target system's conventional table prefix.
pub const DEFAULT_TABLE_PREFIX: &str = "site_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Db {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub table_prefix: String,
}

impl Db {
    pub fn new(
        name: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            password: password.into(),
            host: host.into(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }

    pub fn with_table_prefix(mut self, table_prefix: impl Into<String>) -> Self {
        self.table_prefix = table_prefix.into();
        self
    }

    /// Connection string form, password omitted.
    pub fn dsn(&self) -> String {
        format!("db://{}@{}/{}", self.user, self.host, self.name)
    }

    /// Directory of this database's file store under a site root.
    pub fn data_dir(&self, root_dir: &Path) -> PathBuf {
        root_dir.join("data").join(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_conventional_table_prefix() {
        let db = Db::new("test", "admin", "secret", "localhost");
        assert_eq!(db.table_prefix, DEFAULT_TABLE_PREFIX);
    }

    #[test]
    fn table_prefix_is_overridable_at_construction() {
        let db = Db::new("test", "admin", "secret", "localhost").with_table_prefix("alt_");
        assert_eq!(db.table_prefix, "alt_");
    }

    #[test]
    fn dsn_omits_the_password() {
        let db = Db::new("test", "admin", "hunter2", "db.local");
        assert_eq!(db.dsn(), "db://admin@db.local/test");
        assert!(!db.dsn().contains("hunter2"));
    }

    #[test]
    fn data_dir_is_keyed_by_database_name() {
        let db = Db::new("fixtures", "admin", "secret", "localhost");
        assert_eq!(
            db.data_dir(Path::new("/srv/site")),
            PathBuf::from("/srv/site/data/fixtures")
        );
    }
}
