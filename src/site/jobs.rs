//! Job handlers for the lifecycle operations that must run out of process.
//!
//! Each handler runs inside a freshly spawned worker: it loads the site
//! configuration, performs the first-run bootstrap (defining the
//! process-wide constants) and mutates the file-backed data store. Handlers
//! write nothing on success; any output is treated as a failure by the
//! caller.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::process::{JobError, JobRegistry};

use super::bootstrap;
use super::config::{self, SiteConfig};
use super::store::{self, StoreError};
use super::version::SiteVersion;

pub const INSTALL_JOB: &str = "site.install";
pub const CONVERT_MULTISITE_JOB: &str = "site.convert-multisite";
pub const UPDATE_OPTION_JOB: &str = "site.update-option";
pub const PING_JOB: &str = "site.ping";

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        let code = match err {
            StoreError::NotInstalled(_) => 4,
            _ => 0,
        };
        JobError::with_code(err.to_string(), code)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallJobArgs {
    pub root_dir: String,
    pub url: String,
    pub title: String,
    pub admin_user: String,
    pub admin_password: String,
    pub admin_email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertMultisiteJobArgs {
    pub root_dir: String,
    pub subdomain: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptionJobArgs {
    pub root_dir: String,
    pub option: String,
    pub value: Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingJobArgs {
    #[serde(default)]
    pub sleep_ms: Option<u64>,
}

/// The registry a worker process dispatches against.
pub fn registry() -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry.register(INSTALL_JOB, install);
    registry.register(CONVERT_MULTISITE_JOB, convert_multisite);
    registry.register(UPDATE_OPTION_JOB, update_option);
    registry.register(PING_JOB, ping);
    registry
}

/// Load the configuration for a root directory and run the bootstrap.
fn load_site(root_dir: &Path) -> Result<SiteConfig, JobError> {
    let config_path = config::find_config_file(root_dir)
        .ok_or_else(|| JobError::with_code("the site is not configured", 3))?;
    let config =
        SiteConfig::read(&config_path).map_err(|err| JobError::new(err.to_string()))?;
    bootstrap::define_constants(&config)?;
    Ok(config)
}

fn install(args: &Value) -> Result<(), JobError> {
    let args: InstallJobArgs = serde_json::from_value(args.clone())?;
    let root_dir = Path::new(&args.root_dir);

    let config = load_site(root_dir)?;
    let db = config.db();
    let data_dir = db.data_dir(root_dir);
    let version =
        SiteVersion::from_root_dir(root_dir).map_err(|err| JobError::new(err.to_string()))?;

    let options = BTreeMap::from([
        ("siteurl".to_string(), toml::Value::String(args.url.clone())),
        ("home".to_string(), toml::Value::String(args.url.clone())),
        ("blogname".to_string(), toml::Value::String(args.title)),
        (
            "admin_email".to_string(),
            toml::Value::String(args.admin_email.clone()),
        ),
        (
            "db_version".to_string(),
            toml::Value::String(version.db_version),
        ),
        ("installed".to_string(), toml::Value::Boolean(true)),
    ]);
    store::write_options(&data_dir, options)?;
    store::write_admin_user(
        &data_dir,
        &args.admin_user,
        &args.admin_email,
        &args.admin_password,
    )?;

    if config.site.multisite {
        let domain = host_of(&args.url)?;
        store::write_network(&data_dir, &domain, config.site.subdomain_install)?;
    }

    Ok(())
}

fn convert_multisite(args: &Value) -> Result<(), JobError> {
    let args: ConvertMultisiteJobArgs = serde_json::from_value(args.clone())?;
    let root_dir = Path::new(&args.root_dir);

    let config = load_site(root_dir)?;
    let db = config.db();
    let data_dir = db.data_dir(root_dir);

    let options = store::read_options(&data_dir)?;
    let installed = options
        .get("installed")
        .and_then(toml::Value::as_bool)
        .unwrap_or(false);
    if !installed {
        return Err(JobError::with_code("the site is not installed", 4));
    }

    let siteurl = options
        .get("siteurl")
        .and_then(toml::Value::as_str)
        .ok_or_else(|| JobError::new("the site has no siteurl option"))?;
    let domain = host_of(siteurl)?;
    store::write_network(&data_dir, &domain, args.subdomain)?;

    Ok(())
}

fn update_option(args: &Value) -> Result<(), JobError> {
    let args: UpdateOptionJobArgs = serde_json::from_value(args.clone())?;
    let root_dir = Path::new(&args.root_dir);

    let config = load_site(root_dir)?;
    let db = config.db();
    let value = toml::Value::try_from(&args.value)
        .map_err(|err| JobError::new(format!("unsupported option value: {err}")))?;
    store::update_option(&db.data_dir(root_dir), &args.option, value)?;

    Ok(())
}

/// Liveness probe for worker plumbing; optionally sleeps first.
fn ping(args: &Value) -> Result<(), JobError> {
    let args: PingJobArgs = serde_json::from_value(args.clone())?;
    if let Some(ms) = args.sleep_ms {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
    Ok(())
}

fn host_of(url: &str) -> Result<String, JobError> {
    let parsed =
        url::Url::parse(url).map_err(|err| JobError::new(format!("invalid site URL: {err}")))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| JobError::new(format!("the site URL has no host: {url}")))
}
