//! First-run bootstrap of the site runtime.
//!
//! The target system's bootstrap defines process-wide constants from the
//! configuration file. They cannot be redefined and cannot be unset, which
//! is exactly why the lifecycle operations that trigger the bootstrap run
//! in a freshly spawned worker process rather than in the caller.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::process::JobError;

use super::config::SiteConfig;

static CONSTANTS: OnceLock<BTreeMap<String, String>> = OnceLock::new();

/// Define the site constants for this process, exactly once.
pub fn define_constants(config: &SiteConfig) -> Result<(), JobError> {
    let mut map: BTreeMap<String, String> = config
        .constants()
        .into_iter()
        .map(|(name, value)| {
            let rendered = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            (name, rendered)
        })
        .collect();
    map.insert(
        "table_prefix".to_string(),
        config.site.table_prefix.clone(),
    );

    CONSTANTS
        .set(map)
        .map_err(|_| JobError::with_code("site constants already defined in this process", 2))
}

/// The constants defined by [`define_constants`], if the bootstrap ran.
pub fn constants() -> Option<&'static BTreeMap<String, String>> {
    CONSTANTS.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::config::{ConfigurationData, MultisiteMode};
    use crate::site::db::Db;

    // One test owns the process-wide constants: defining them twice in the
    // same process must fail, so both halves live in a single function.
    #[test]
    fn constants_define_once_per_process() {
        let db = Db::new("fixtures", "admin", "secret", "localhost");
        let config = SiteConfig::new(&db, MultisiteMode::SingleSite, &ConfigurationData::default());

        assert!(constants().is_none());
        define_constants(&config).unwrap();

        let defined = constants().unwrap();
        assert_eq!(defined["DB_NAME"], "fixtures");
        assert_eq!(defined["table_prefix"], "site_");

        let err = define_constants(&config).unwrap_err();
        assert_eq!(err.code, 2);
    }
}
