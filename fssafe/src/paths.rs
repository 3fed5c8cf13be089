//! Sibling paths used by the filesystem backend
//!
//! For an artifact at `P` the backend touches exactly three paths in the
//! same directory: `P`, `P` + staging suffix, `P` + backup suffix. Suffixes
//! are appended to the whole file name, so `state.json` stages into
//! `state.json.new`, not `state.new`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix of the in-progress generation
pub const STAGING_SUFFIX: &str = ".new";
/// Suffix of the previous generation
pub const BACKUP_SUFFIX: &str = ".old";

/// The current, staging and backup paths of one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPaths {
    current: PathBuf,
    staging: PathBuf,
    backup: PathBuf,
}

impl GenerationPaths {
    /// Paths with the default `.new` / `.old` suffixes
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let current = path.into();
        Self {
            staging: append_suffix(&current, STAGING_SUFFIX),
            backup: append_suffix(&current, BACKUP_SUFFIX),
            current,
        }
    }

    /// Paths with custom suffixes.
    ///
    /// Returns `None` if a suffix is empty or both suffixes are equal, since
    /// then two generations would share a path.
    #[must_use]
    pub fn with_suffixes(path: impl Into<PathBuf>, staging: &str, backup: &str) -> Option<Self> {
        if staging.is_empty() || backup.is_empty() || staging == backup {
            return None;
        }
        let current = path.into();
        Some(Self {
            staging: append_suffix(&current, staging),
            backup: append_suffix(&current, backup),
            current,
        })
    }

    /// Path of the committed artifact
    #[must_use]
    pub fn current(&self) -> &Path {
        &self.current
    }

    /// Path a save writes to before it is committed
    #[must_use]
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// Path holding the generation replaced by the last commit
    #[must_use]
    pub fn backup(&self) -> &Path {
        &self.backup
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suffixes() {
        let paths = GenerationPaths::new("/var/lib/app/state.json");
        assert_eq!(paths.current(), Path::new("/var/lib/app/state.json"));
        assert_eq!(paths.staging(), Path::new("/var/lib/app/state.json.new"));
        assert_eq!(paths.backup(), Path::new("/var/lib/app/state.json.old"));
    }

    #[test]
    fn test_suffix_is_appended_not_substituted() {
        let paths = GenerationPaths::new("db.kdbx");
        assert_eq!(paths.staging(), Path::new("db.kdbx.new"));

        let paths = GenerationPaths::new("noext");
        assert_eq!(paths.backup(), Path::new("noext.old"));
    }

    #[test]
    fn test_custom_suffixes() {
        let paths = GenerationPaths::with_suffixes("a", ".tmp", ".bak").unwrap();
        assert_eq!(paths.staging(), Path::new("a.tmp"));
        assert_eq!(paths.backup(), Path::new("a.bak"));
    }

    #[test]
    fn test_rejects_colliding_suffixes() {
        assert!(GenerationPaths::with_suffixes("a", "", ".old").is_none());
        assert!(GenerationPaths::with_suffixes("a", ".new", "").is_none());
        assert!(GenerationPaths::with_suffixes("a", ".x", ".x").is_none());
    }
}
