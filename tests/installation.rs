//! Installation lifecycle, end to end through real worker processes.

mod common;

use serde_json::json;
use sitewright::site::{
    CONFIG_FILE, Installation, InstallationError, MultisiteMode, ScaffoldRegistry, SiteConfig,
};
use tempfile::TempDir;

fn scaffolded(dir: &TempDir) -> Installation {
    Installation::scaffold(dir.path(), "latest")
        .unwrap()
        .with_loop(common::worker_loop())
}

fn install(installation: &mut Installation) -> Result<(), InstallationError> {
    installation
        .install(
            common::URL,
            common::ADMIN_USER,
            common::ADMIN_PASSWORD,
            common::ADMIN_EMAIL,
            common::TITLE,
        )
        .map(|_| ())
}

#[test]
fn installs_a_single_site_end_to_end() {
    let dir = TempDir::new().unwrap();
    let db = common::test_db();

    let mut installation = scaffolded(&dir);
    installation.configure(&db, MultisiteMode::SingleSite).unwrap();
    install(&mut installation).unwrap();

    assert_eq!(installation.state().name(), "single site");
    assert!(!installation.is_multisite());
    assert!(installation.version().is_some());

    // The worker recorded the installation in the data store.
    let data_dir = db.data_dir(dir.path());
    assert!(data_dir.join("options.toml").is_file());
    assert!(data_dir.join("users.toml").is_file());

    // A fresh Installation over the same root detects the installed state.
    let reopened = Installation::new(dir.path(), Some(db)).unwrap();
    assert_eq!(reopened.state().name(), "single site");
    assert!(reopened.is_configured());
}

#[test]
fn installs_a_multisite_end_to_end() {
    let dir = TempDir::new().unwrap();
    let db = common::test_db();

    let mut installation = scaffolded(&dir);
    installation
        .configure(&db, MultisiteMode::MultisiteSubdomain)
        .unwrap();
    install(&mut installation).unwrap();

    assert_eq!(installation.state().name(), "multisite");
    assert!(installation.is_multisite());
    assert!(db.data_dir(dir.path()).join("network.toml").is_file());
}

#[test]
fn converts_an_installed_single_site_to_multisite() {
    let dir = TempDir::new().unwrap();
    let db = common::test_db();

    let mut installation = scaffolded(&dir);
    installation.configure(&db, MultisiteMode::SingleSite).unwrap();
    install(&mut installation).unwrap();
    assert!(!installation.is_multisite());

    installation.convert_to_multisite(true).unwrap();

    assert!(installation.is_multisite());
    assert!(db.data_dir(dir.path()).join("network.toml").is_file());

    // The conversion is recorded in the configuration file.
    let config = SiteConfig::read(&dir.path().join(CONFIG_FILE)).unwrap();
    assert!(config.site.multisite);
    assert!(config.site.subdomain_install);
}

#[test]
fn updates_an_option_through_a_worker() {
    let dir = TempDir::new().unwrap();
    let db = common::test_db();

    let mut installation = scaffolded(&dir);
    installation.configure(&db, MultisiteMode::SingleSite).unwrap();
    install(&mut installation).unwrap();

    installation
        .update_option("blogdescription", json!("Just another site"))
        .unwrap();

    let options = std::fs::read_to_string(db.data_dir(dir.path()).join("options.toml")).unwrap();
    assert!(options.contains("Just another site"));
}

#[test]
fn install_failures_carry_the_worker_evidence() {
    let dir = TempDir::new().unwrap();
    let db = common::test_db();

    let mut installation = scaffolded(&dir);
    installation.configure(&db, MultisiteMode::SingleSite).unwrap();

    // Pull the configuration file out from under the worker: validation
    // passes, the job runs and fails in the child.
    std::fs::remove_file(dir.path().join(CONFIG_FILE)).unwrap();

    let err = install(&mut installation).unwrap_err();
    let InstallationError::InstallationFail(reason) = err else {
        panic!("unexpected error: {err}");
    };
    assert!(reason.contains("not configured"), "reason was: {reason}");
}

#[test]
fn a_registry_tracks_and_cleans_scaffolded_roots() {
    let parent = TempDir::new().unwrap();
    let root = parent.path().join("site");
    std::fs::create_dir_all(&root).unwrap();

    let registry = ScaffoldRegistry::new();
    registry.scaffold(&root, "latest").unwrap();
    assert_eq!(registry.tracked(), vec![root.clone()]);

    registry.cleanup().unwrap();
    assert!(!root.exists());
    assert!(registry.tracked().is_empty());
}
