//! Installation lifecycle states and their transitions.
//!
//! A root directory is in exactly one state: EmptyDir, Scaffolded,
//! Configured, Single or Multisite. Each variant carries only the data valid
//! for that state and every transition is a pure function from the current
//! variant to a new one; nothing is mutated in place. Operations invalid for
//! the current state fail with an error naming that state.
//!
//! Transitions with first-run side effects (install, multisite conversion,
//! option updates) run their job in a worker child process through a
//! [`Loop`] and interpret the result here.

use std::path::{Path, PathBuf};

use serde_json::Value;
use url::Url;

use crate::process::{Control, Job, Loop, ProcessError, ProtocolError, WorkerResult};

use super::config::{self, CONFIG_FILE, ConfigurationData, MultisiteMode, SiteConfig};
use super::db::Db;
use super::error::InstallationError;
use super::jobs::{
    self, ConvertMultisiteJobArgs, InstallJobArgs, UpdateOptionJobArgs,
};
use super::scaffold::{self, LOAD_FILE};
use super::store;
use super::version::SiteVersion;

/// The lifecycle state of a site root directory.
#[derive(Debug, Clone)]
pub enum InstallationState {
    EmptyDir(EmptyDir),
    Scaffolded(Scaffolded),
    Configured(Configured),
    Single(Single),
    Multisite(Multisite),
}

/// A root directory with no site files.
#[derive(Debug, Clone)]
pub struct EmptyDir {
    root_dir: PathBuf,
}

/// Site files present, no configuration file yet.
#[derive(Debug, Clone)]
pub struct Scaffolded {
    root_dir: PathBuf,
    version: SiteVersion,
}

/// Configuration written, not yet installed.
#[derive(Debug, Clone)]
pub struct Configured {
    root_dir: PathBuf,
    config_file: PathBuf,
    config: SiteConfig,
    version: SiteVersion,
}

/// Installed, single site.
#[derive(Debug, Clone)]
pub struct Single {
    root_dir: PathBuf,
    config_file: PathBuf,
    config: SiteConfig,
    version: SiteVersion,
}

/// Installed multisite.
#[derive(Debug, Clone)]
pub struct Multisite {
    root_dir: PathBuf,
    config_file: PathBuf,
    config: SiteConfig,
    version: SiteVersion,
    subdomain: bool,
}

impl EmptyDir {
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self, InstallationError> {
        let root_dir = root_dir.into();
        if !root_dir.is_dir() {
            return Err(InstallationError::RootDirNotFound(root_dir));
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// EmptyDir ⇒ Scaffolded: populate the baseline site files.
    pub fn scaffold(&self, version_tag: &str) -> Result<Scaffolded, InstallationError> {
        scaffold::scaffold(&self.root_dir, version_tag)?;
        Scaffolded::new(&self.root_dir)
    }
}

impl Scaffolded {
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self, InstallationError> {
        let root_dir = root_dir.into();
        if !root_dir.is_dir() {
            return Err(InstallationError::RootDirNotFound(root_dir));
        }
        if !root_dir.join(LOAD_FILE).is_file() {
            return Err(InstallationError::StateEmpty {
                op: "read the scaffolded site files".to_string(),
            });
        }
        let version = SiteVersion::from_root_dir(&root_dir)?;
        Ok(Self { root_dir, version })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn version(&self) -> &SiteVersion {
        &self.version
    }

    /// Scaffolded ⇒ Configured: write the configuration file.
    pub fn configure(
        &self,
        db: &Db,
        mode: MultisiteMode,
        data: Option<&ConfigurationData>,
    ) -> Result<Configured, InstallationError> {
        if config::find_config_file(&self.root_dir).is_some() {
            return Err(InstallationError::StateConfigured {
                op: "configure".to_string(),
            });
        }

        let defaults = ConfigurationData::default();
        let config = SiteConfig::new(db, mode, data.unwrap_or(&defaults));
        let config_file = self.root_dir.join(CONFIG_FILE);
        config.write(&config_file)?;

        Configured::new(&self.root_dir, &config_file)
    }
}

impl Configured {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        config_file: impl Into<PathBuf>,
    ) -> Result<Self, InstallationError> {
        let root_dir = root_dir.into();
        let config_file = config_file.into();
        if !root_dir.is_dir() {
            return Err(InstallationError::RootDirNotFound(root_dir));
        }
        if !root_dir.join(LOAD_FILE).is_file() {
            return Err(InstallationError::StateEmpty {
                op: "read the configuration".to_string(),
            });
        }
        if !config_file.is_file() || config_file.file_name() != Some(CONFIG_FILE.as_ref()) {
            return Err(InstallationError::ConfigFileNotFound(config_file));
        }
        let config = SiteConfig::read(&config_file)?;
        let version = SiteVersion::from_root_dir(&root_dir)?;
        Ok(Self {
            root_dir,
            config_file,
            config,
            version,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn version(&self) -> &SiteVersion {
        &self.version
    }

    pub fn is_multisite(&self) -> bool {
        self.config.site.multisite
    }

    /// Configured ⇒ Single or Multisite, per the mode fixed at configure
    /// time. Inputs are validated before any subprocess is spawned.
    pub fn install(
        &self,
        worker_loop: &Loop,
        url: &str,
        admin_user: &str,
        admin_password: &str,
        admin_email: &str,
        title: &str,
    ) -> Result<InstallationState, InstallationError> {
        validate_url(url)?;
        validate_admin_user(admin_user)?;
        validate_admin_password(admin_password)?;
        validate_admin_email(admin_email)?;
        validate_title(title)?;

        let args = InstallJobArgs {
            root_dir: self.root_dir.to_string_lossy().into_owned(),
            url: url.to_string(),
            title: title.to_string(),
            admin_user: admin_user.to_string(),
            admin_password: admin_password.to_string(),
            admin_email: admin_email.to_string(),
        };
        let result = run_site_job(worker_loop, jobs::INSTALL_JOB, &args, &self.root_dir)?;
        interpret_result(&result)?;

        if self.config.site.multisite {
            Ok(InstallationState::Multisite(Multisite {
                root_dir: self.root_dir.clone(),
                config_file: self.config_file.clone(),
                config: self.config.clone(),
                version: self.version.clone(),
                subdomain: self.config.site.subdomain_install,
            }))
        } else {
            Ok(InstallationState::Single(Single {
                root_dir: self.root_dir.clone(),
                config_file: self.config_file.clone(),
                config: self.config.clone(),
                version: self.version.clone(),
            }))
        }
    }
}

impl Single {
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn version(&self) -> &SiteVersion {
        &self.version
    }

    /// Single ⇒ Multisite: run the conversion in a worker, then record the
    /// mode in the configuration file.
    pub fn convert_to_multisite(
        &self,
        worker_loop: &Loop,
        subdomain: bool,
    ) -> Result<Multisite, InstallationError> {
        let args = ConvertMultisiteJobArgs {
            root_dir: self.root_dir.to_string_lossy().into_owned(),
            subdomain,
        };
        let result = run_site_job(
            worker_loop,
            jobs::CONVERT_MULTISITE_JOB,
            &args,
            &self.root_dir,
        )?;
        interpret_result(&result)?;

        let mut config = self.config.clone();
        config.site.multisite = true;
        config.site.subdomain_install = subdomain;
        config.write(&self.config_file)?;

        Ok(Multisite {
            root_dir: self.root_dir.clone(),
            config_file: self.config_file.clone(),
            config,
            version: self.version.clone(),
            subdomain,
        })
    }

    pub fn update_option(
        &self,
        worker_loop: &Loop,
        option: &str,
        value: Value,
    ) -> Result<(), InstallationError> {
        run_update_option(worker_loop, &self.root_dir, option, value)
    }
}

impl Multisite {
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn version(&self) -> &SiteVersion {
        &self.version
    }

    pub fn subdomain(&self) -> bool {
        self.subdomain
    }

    pub fn update_option(
        &self,
        worker_loop: &Loop,
        option: &str,
        value: Value,
    ) -> Result<(), InstallationError> {
        run_update_option(worker_loop, &self.root_dir, option, value)
    }
}

impl InstallationState {
    /// Detect the state of a root directory from its files. The installed
    /// check uses the given database descriptor, falling back to the one
    /// recorded in the configuration file.
    pub fn read(root_dir: &Path, db: Option<&Db>) -> Result<Self, InstallationError> {
        if !root_dir.is_dir() {
            return Err(InstallationError::RootDirNotFound(root_dir.to_path_buf()));
        }
        if !root_dir.join(LOAD_FILE).is_file() {
            return Ok(InstallationState::EmptyDir(EmptyDir::new(root_dir)?));
        }
        let Some(config_file) = config::find_config_file(root_dir) else {
            return Ok(InstallationState::Scaffolded(Scaffolded::new(root_dir)?));
        };

        let configured = Configured::new(root_dir, &config_file)?;
        let db = db.cloned().unwrap_or_else(|| configured.config.db());
        if !store::is_installed(root_dir, &db) {
            return Ok(InstallationState::Configured(configured));
        }

        if configured.is_multisite() {
            let subdomain = configured.config.site.subdomain_install;
            Ok(InstallationState::Multisite(Multisite {
                root_dir: configured.root_dir,
                config_file: configured.config_file,
                config: configured.config,
                version: configured.version,
                subdomain,
            }))
        } else {
            Ok(InstallationState::Single(Single {
                root_dir: configured.root_dir,
                config_file: configured.config_file,
                config: configured.config,
                version: configured.version,
            }))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InstallationState::EmptyDir(_) => "empty directory",
            InstallationState::Scaffolded(_) => "scaffolded",
            InstallationState::Configured(_) => "configured",
            InstallationState::Single(_) => "single site",
            InstallationState::Multisite(_) => "multisite",
        }
    }

    pub fn root_dir(&self) -> &Path {
        match self {
            InstallationState::EmptyDir(s) => s.root_dir(),
            InstallationState::Scaffolded(s) => s.root_dir(),
            InstallationState::Configured(s) => s.root_dir(),
            InstallationState::Single(s) => s.root_dir(),
            InstallationState::Multisite(s) => s.root_dir(),
        }
    }

    pub fn version(&self) -> Option<&SiteVersion> {
        match self {
            InstallationState::EmptyDir(_) => None,
            InstallationState::Scaffolded(s) => Some(s.version()),
            InstallationState::Configured(s) => Some(s.version()),
            InstallationState::Single(s) => Some(s.version()),
            InstallationState::Multisite(s) => Some(s.version()),
        }
    }

    pub fn config(&self) -> Option<&SiteConfig> {
        match self {
            InstallationState::EmptyDir(_) | InstallationState::Scaffolded(_) => None,
            InstallationState::Configured(s) => Some(s.config()),
            InstallationState::Single(s) => Some(s.config()),
            InstallationState::Multisite(s) => Some(s.config()),
        }
    }

    pub fn config_file(&self) -> Option<&Path> {
        match self {
            InstallationState::EmptyDir(_) | InstallationState::Scaffolded(_) => None,
            InstallationState::Configured(s) => Some(s.config_file()),
            InstallationState::Single(s) => Some(&s.config_file),
            InstallationState::Multisite(s) => Some(&s.config_file),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config().is_some()
    }

    pub fn is_multisite(&self) -> bool {
        self.config().map(|c| c.site.multisite).unwrap_or(false)
    }

    pub fn configure(
        &self,
        db: &Db,
        mode: MultisiteMode,
        data: Option<&ConfigurationData>,
    ) -> Result<InstallationState, InstallationError> {
        match self {
            InstallationState::Scaffolded(s) => {
                Ok(InstallationState::Configured(s.configure(db, mode, data)?))
            }
            other => Err(InstallationError::state_mismatch(other, "configure")),
        }
    }

    pub fn install(
        &self,
        worker_loop: &Loop,
        url: &str,
        admin_user: &str,
        admin_password: &str,
        admin_email: &str,
        title: &str,
    ) -> Result<InstallationState, InstallationError> {
        match self {
            InstallationState::Configured(s) => s.install(
                worker_loop,
                url,
                admin_user,
                admin_password,
                admin_email,
                title,
            ),
            other => Err(InstallationError::state_mismatch(other, "install")),
        }
    }

    pub fn convert_to_multisite(
        &self,
        worker_loop: &Loop,
        subdomain: bool,
    ) -> Result<InstallationState, InstallationError> {
        match self {
            InstallationState::Single(s) => Ok(InstallationState::Multisite(
                s.convert_to_multisite(worker_loop, subdomain)?,
            )),
            other => Err(InstallationError::state_mismatch(other, "convert to multisite")),
        }
    }

    pub fn update_option(
        &self,
        worker_loop: &Loop,
        option: &str,
        value: Value,
    ) -> Result<(), InstallationError> {
        match self {
            InstallationState::Single(s) => s.update_option(worker_loop, option, value),
            InstallationState::Multisite(s) => s.update_option(worker_loop, option, value),
            other => Err(InstallationError::state_mismatch(other, "update an option")),
        }
    }
}

/// Dispatch a site job to a worker child rooted at `root_dir`.
fn run_site_job<T: serde::Serialize>(
    worker_loop: &Loop,
    name: &str,
    args: &T,
    root_dir: &Path,
) -> Result<WorkerResult, InstallationError> {
    let job = Job::with_args(name, args)
        .map_err(|source| ProcessError::Protocol(ProtocolError::Json { index: 1, source }))?;
    let control = Control::for_root_dir(root_dir.to_string_lossy().into_owned());
    Ok(worker_loop.run_job(job, control)?)
}

fn run_update_option(
    worker_loop: &Loop,
    root_dir: &Path,
    option: &str,
    value: Value,
) -> Result<(), InstallationError> {
    let args = UpdateOptionJobArgs {
        root_dir: root_dir.to_string_lossy().into_owned(),
        option: option.to_string(),
        value,
    };
    let result = run_site_job(worker_loop, jobs::UPDATE_OPTION_JOB, &args, root_dir)?;
    interpret_result(&result)
}

/// Classify a worker result: clean exits with no output succeed, everything
/// else fails with the most specific evidence available, in throwable,
/// stderr, stdout, "unknown reason" order.
pub(crate) fn interpret_result(result: &WorkerResult) -> Result<(), InstallationError> {
    let clean = result.exit_code() == 0
        && result.throwable().is_none()
        && result.stdout().trim().is_empty()
        && result.stderr().trim().is_empty();
    if clean {
        return Ok(());
    }

    let reason = if let Some(throwable) = result.throwable() {
        throwable.message().to_string()
    } else if !result.stderr().trim().is_empty() {
        result.stderr().trim().to_string()
    } else if !result.stdout().trim().is_empty() {
        result.stdout().trim().to_string()
    } else {
        "unknown reason".to_string()
    };
    Err(InstallationError::InstallationFail(reason))
}

fn validate_url(url: &str) -> Result<(), InstallationError> {
    let parsed = Url::parse(url).map_err(|_| InstallationError::InvalidUrl(url.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(InstallationError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

fn validate_admin_user(admin_user: &str) -> Result<(), InstallationError> {
    let bad = admin_user.is_empty()
        || admin_user.contains(['\'', '"'])
        || admin_user.chars().any(char::is_whitespace);
    if bad {
        return Err(InstallationError::InvalidAdminUsername(
            admin_user.to_string(),
        ));
    }
    Ok(())
}

fn validate_admin_password(admin_password: &str) -> Result<(), InstallationError> {
    if admin_password.is_empty() {
        return Err(InstallationError::InvalidAdminPassword);
    }
    Ok(())
}

fn validate_admin_email(admin_email: &str) -> Result<(), InstallationError> {
    let invalid = || InstallationError::InvalidAdminEmail(admin_email.to_string());
    if admin_email.is_empty() || admin_email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let mut parts = admin_email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    if local.is_empty() || domain.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), InstallationError> {
    if title.trim().is_empty() {
        return Err(InstallationError::InvalidTitle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SerializableThrowable;
    use tempfile::TempDir;

    const VALID_URL: &str = "https://site.test";
    const VALID_USER: &str = "admin";
    const VALID_PASSWORD: &str = "secret";
    const VALID_EMAIL: &str = "admin@site.test";
    const VALID_TITLE: &str = "Test Site";

    fn test_db() -> Db {
        Db::new("fixtures", "admin", "secret", "localhost")
    }

    fn configured_state(dir: &TempDir) -> Configured {
        let empty = EmptyDir::new(dir.path()).unwrap();
        let scaffolded = empty.scaffold("latest").unwrap();
        scaffolded
            .configure(&test_db(), MultisiteMode::SingleSite, None)
            .unwrap()
    }

    fn install_with(
        configured: &Configured,
        url: &str,
        user: &str,
        password: &str,
        email: &str,
        title: &str,
    ) -> InstallationError {
        // Every call here carries one invalid field, so validation fails
        // before any worker could be spawned.
        configured
            .install(&Loop::new(), url, user, password, email, title)
            .unwrap_err()
    }

    #[test]
    fn each_invalid_install_input_fails_with_its_own_error() {
        let dir = TempDir::new().unwrap();
        let configured = configured_state(&dir);

        let err = install_with(
            &configured,
            "not a url",
            VALID_USER,
            VALID_PASSWORD,
            VALID_EMAIL,
            VALID_TITLE,
        );
        assert!(matches!(err, InstallationError::InvalidUrl(_)), "{err}");

        let err = install_with(
            &configured,
            VALID_URL,
            "ad min",
            VALID_PASSWORD,
            VALID_EMAIL,
            VALID_TITLE,
        );
        assert!(matches!(err, InstallationError::InvalidAdminUsername(_)), "{err}");

        let err = install_with(
            &configured,
            VALID_URL,
            VALID_USER,
            "",
            VALID_EMAIL,
            VALID_TITLE,
        );
        assert!(matches!(err, InstallationError::InvalidAdminPassword), "{err}");

        let err = install_with(
            &configured,
            VALID_URL,
            VALID_USER,
            VALID_PASSWORD,
            "not-an-email",
            VALID_TITLE,
        );
        assert!(matches!(err, InstallationError::InvalidAdminEmail(_)), "{err}");

        let err = install_with(
            &configured,
            VALID_URL,
            VALID_USER,
            VALID_PASSWORD,
            VALID_EMAIL,
            "",
        );
        assert!(matches!(err, InstallationError::InvalidTitle), "{err}");
    }

    #[test]
    fn admin_username_rejects_quotes() {
        for user in ["ad'min", "ad\"min", "", "ad min"] {
            assert!(validate_admin_user(user).is_err(), "accepted {user:?}");
        }
        assert!(validate_admin_user("admin_user-1").is_ok());
    }

    #[test]
    fn admin_email_needs_local_part_and_domain() {
        for email in ["", "@site.test", "admin@", "admin", "a@b@c", "a b@site.test"] {
            assert!(validate_admin_email(email).is_err(), "accepted {email:?}");
        }
        assert!(validate_admin_email("admin@site.test").is_ok());
    }

    #[test]
    fn url_must_be_absolute_with_a_host() {
        for url in ["", "not a url", "/relative/path", "mailto:admin@site.test"] {
            assert!(validate_url(url).is_err(), "accepted {url:?}");
        }
        assert!(validate_url("http://localhost:8080/site").is_ok());
    }

    #[test]
    fn interpret_prefers_throwable_over_outputs() {
        let job = Job::new(jobs::INSTALL_JOB, Value::Null);
        let throwable = SerializableThrowable::from_job_error(
            &crate::process::JobError::new("Something is amiss"),
            &job,
        );
        let result = WorkerResult::new("install", 1, "stdout text", "stderr text", Some(throwable));

        let err = interpret_result(&result).unwrap_err();
        let InstallationError::InstallationFail(reason) = err else {
            panic!("unexpected error: {err}");
        };
        assert!(reason.contains("Something is amiss"));
    }

    #[test]
    fn interpret_falls_back_to_stderr_then_stdout() {
        let result = WorkerResult::new("install", 1, "stdout text", "errors occurred", None);
        let InstallationError::InstallationFail(reason) =
            interpret_result(&result).unwrap_err()
        else {
            panic!("expected installation failure");
        };
        assert!(reason.contains("errors occurred"));

        let result = WorkerResult::new("install", 1, "stdout only", "", None);
        let InstallationError::InstallationFail(reason) =
            interpret_result(&result).unwrap_err()
        else {
            panic!("expected installation failure");
        };
        assert!(reason.contains("stdout only"));
    }

    #[test]
    fn interpret_reports_unknown_reason_when_nothing_was_captured() {
        let result = WorkerResult::new("install", 1, "", "", None);
        let InstallationError::InstallationFail(reason) =
            interpret_result(&result).unwrap_err()
        else {
            panic!("expected installation failure");
        };
        assert!(reason.contains("unknown reason"));
    }

    #[test]
    fn clean_results_succeed() {
        let result = WorkerResult::new("install", 0, "", "", None);
        assert!(interpret_result(&result).is_ok());
    }

    #[test]
    fn configure_twice_fails_with_state_configured() {
        let dir = TempDir::new().unwrap();
        let configured = configured_state(&dir);
        let state = InstallationState::Configured(configured);

        let err = state
            .configure(&test_db(), MultisiteMode::SingleSite, None)
            .unwrap_err();
        assert!(matches!(err, InstallationError::StateConfigured { .. }), "{err}");
    }

    #[test]
    fn convert_to_multisite_requires_an_installed_single_site() {
        let dir = TempDir::new().unwrap();
        let state = InstallationState::Configured(configured_state(&dir));

        let err = state.convert_to_multisite(&Loop::new(), false).unwrap_err();
        assert!(matches!(err, InstallationError::StateConfigured { .. }), "{err}");
    }

    #[test]
    fn update_option_requires_an_installed_site() {
        let dir = TempDir::new().unwrap();
        let state = InstallationState::Configured(configured_state(&dir));

        let err = state
            .update_option(&Loop::new(), "blogname", Value::from("New"))
            .unwrap_err();
        assert!(matches!(err, InstallationError::StateConfigured { .. }), "{err}");
    }

    #[test]
    fn detects_states_from_the_filesystem() {
        let dir = TempDir::new().unwrap();

        let state = InstallationState::read(dir.path(), None).unwrap();
        assert!(matches!(state, InstallationState::EmptyDir(_)));

        let empty = EmptyDir::new(dir.path()).unwrap();
        let scaffolded = empty.scaffold("latest").unwrap();
        let state = InstallationState::read(dir.path(), None).unwrap();
        assert!(matches!(state, InstallationState::Scaffolded(_)));

        scaffolded
            .configure(&test_db(), MultisiteMode::SingleSite, None)
            .unwrap();
        let state = InstallationState::read(dir.path(), None).unwrap();
        assert!(matches!(state, InstallationState::Configured(_)));
        assert!(state.is_configured());
        assert!(!state.is_multisite());
    }

    #[test]
    fn detects_installed_sites_from_the_data_store() {
        let dir = TempDir::new().unwrap();
        let db = test_db();
        EmptyDir::new(dir.path())
            .unwrap()
            .scaffold("latest")
            .unwrap()
            .configure(&db, MultisiteMode::SingleSite, None)
            .unwrap();
        store::write_options(
            &db.data_dir(dir.path()),
            std::collections::BTreeMap::from([(
                "installed".to_string(),
                toml::Value::Boolean(true),
            )]),
        )
        .unwrap();

        let state = InstallationState::read(dir.path(), Some(&db)).unwrap();
        assert!(matches!(state, InstallationState::Single(_)), "{}", state.name());
    }

    #[test]
    fn missing_root_dir_is_an_error() {
        let err = InstallationState::read(Path::new("/nonexistent/site"), None).unwrap_err();
        assert!(matches!(err, InstallationError::RootDirNotFound(_)));
    }

    #[test]
    fn scaffolded_constructor_rejects_empty_dirs() {
        let dir = TempDir::new().unwrap();
        let err = Scaffolded::new(dir.path()).unwrap_err();
        assert!(matches!(err, InstallationError::StateEmpty { .. }));
    }

    #[test]
    fn configured_constructor_rejects_missing_config_file() {
        let dir = TempDir::new().unwrap();
        EmptyDir::new(dir.path()).unwrap().scaffold("latest").unwrap();

        let err = Configured::new(dir.path(), dir.path().join(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, InstallationError::ConfigFileNotFound(_)));
    }
}
