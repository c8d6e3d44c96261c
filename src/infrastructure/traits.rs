//! I/O boundary traits for testability
//!
//! These traits abstract the filesystem, the clock and the external module
//! backend, allowing the bookmark store to be tested with fake implementations.

use std::io;
use std::path::Path;
use std::time::Instant;

use crate::domain::ModuleInfo;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string. Fails on invalid UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file, replacing any previous content.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Monotonic time source driving the deferred save.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Lookup of installed text modules by name.
///
/// Read-only from the store's point of view.
pub trait ModuleRegistry: Send + Sync {
    fn find_module_by_name(&self, name: &str) -> Option<ModuleInfo>;
}

/// Translation of references between user-facing and canonical form.
///
/// Only consulted for modules addressed by verse keys (Bibles and
/// commentaries); other module kinds keep their keys verbatim.
pub trait KeyNormalizer: Send + Sync {
    /// Convert a user-entered key into its locale-invariant form.
    fn to_canonical(&self, raw_key: &str, module: &ModuleInfo) -> String;

    /// Render a canonical key in the book-name language `locale`.
    fn to_localized(&self, canonical_key: &str, module: &ModuleInfo, locale: &str) -> String;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Key normalizer for installations without a verse-key backend: keys are
/// already canonical and are shown as stored.
#[derive(Debug, Default)]
pub struct IdentityKeyNormalizer;

impl KeyNormalizer for IdentityKeyNormalizer {
    fn to_canonical(&self, raw_key: &str, _module: &ModuleInfo) -> String {
        raw_key.to_string()
    }

    fn to_localized(&self, canonical_key: &str, _module: &ModuleInfo, _locale: &str) -> String {
        canonical_key.to_string()
    }
}
