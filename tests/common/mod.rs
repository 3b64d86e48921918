//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use sitewright::process::Loop;
use sitewright::site::Db;

pub const URL: &str = "https://site.test";
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password";
pub const ADMIN_EMAIL: &str = "admin@site.test";
pub const TITLE: &str = "Test Site";

/// The worker binary built alongside the tests.
pub fn worker_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sitewright"))
}

/// A loop wired to the built worker binary, with a safety timeout so a
/// broken worker fails the test instead of hanging it.
pub fn worker_loop() -> Loop {
    Loop::new()
        .with_program(worker_bin())
        .with_timeout(Duration::from_secs(30))
}

pub fn test_db() -> Db {
    Db::new("fixtures", "admin", "secret", "localhost")
}
