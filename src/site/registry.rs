//! Session-scoped registry of scaffolded installations.
//!
//! The embedding test session owns one registry: directories are tracked as
//! they are scaffolded, forgotten when a test keeps them, and drained (or
//! deleted) at session teardown. This is deliberately the only shared
//! mutable state in the crate, and it is injected, not ambient: callers
//! scaffolding from multiple threads share the registry through its own
//! lock, nothing else is guarded.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::InstallationError;
use super::installation::Installation;

#[derive(Debug, Default)]
pub struct ScaffoldRegistry {
    dirs: Mutex<Vec<PathBuf>>,
}

impl ScaffoldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scaffold an installation and track its root directory.
    pub fn scaffold(
        &self,
        root_dir: impl Into<PathBuf>,
        version: &str,
    ) -> Result<Installation, InstallationError> {
        let root_dir = root_dir.into();
        let installation = Installation::scaffold(&root_dir, version)?;
        self.track(root_dir);
        Ok(installation)
    }

    pub fn track(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        let mut dirs = self.lock();
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    pub fn forget(&self, dir: &Path) {
        self.lock().retain(|tracked| tracked != dir);
    }

    pub fn tracked(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Empty the registry, returning what was tracked.
    pub fn drain(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.lock())
    }

    /// Session teardown: drain the registry and delete every tracked
    /// directory still on disk.
    pub fn cleanup(&self) -> std::io::Result<()> {
        for dir in self.drain() {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PathBuf>> {
        self.dirs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tracks_scaffolded_directories() {
        let dir = TempDir::new().unwrap();
        let registry = ScaffoldRegistry::new();

        registry.scaffold(dir.path(), "latest").unwrap();
        assert_eq!(registry.tracked(), vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn forget_removes_a_single_entry() {
        let registry = ScaffoldRegistry::new();
        registry.track("/tmp/site-a");
        registry.track("/tmp/site-b");

        registry.forget(Path::new("/tmp/site-a"));
        assert_eq!(registry.tracked(), vec![PathBuf::from("/tmp/site-b")]);
    }

    #[test]
    fn drain_empties_the_registry() {
        let registry = ScaffoldRegistry::new();
        registry.track("/tmp/site-a");

        assert_eq!(registry.drain(), vec![PathBuf::from("/tmp/site-a")]);
        assert!(registry.tracked().is_empty());
    }

    #[test]
    fn cleanup_deletes_tracked_directories() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("site");
        std::fs::create_dir_all(&root).unwrap();

        let registry = ScaffoldRegistry::new();
        registry.scaffold(&root, "latest").unwrap();
        registry.cleanup().unwrap();

        assert!(!root.exists());
        assert!(registry.tracked().is_empty());
    }

    #[test]
    fn tracking_is_deduplicated() {
        let registry = ScaffoldRegistry::new();
        registry.track("/tmp/site-a");
        registry.track("/tmp/site-a");
        assert_eq!(registry.tracked().len(), 1);
    }
}
