//! Working directory tracking for a command session

use super::SessionError;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// The session's current working directory.
///
/// Always holds a canonical path to an existing directory. Only a successful
/// `cd` replaces it; a failed one leaves it untouched.
#[derive(Debug)]
pub struct DirectoryState {
    path: RwLock<PathBuf>,
}

impl DirectoryState {
    /// Create a directory state rooted at `path`
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = canonical_dir(path.as_ref())?;
        Ok(Self {
            path: RwLock::new(path),
        })
    }

    /// Create a directory state from the process's working directory
    pub fn from_current_dir() -> Result<Self, SessionError> {
        let cwd = std::env::current_dir()?;
        Self::new(cwd)
    }

    /// Get the current path
    pub fn path(&self) -> PathBuf {
        self.path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve `target` against the current path and move there.
    ///
    /// `/` always means the filesystem root, and an empty target or `~` means
    /// the user's home directory. Anything else is joined onto the current
    /// path, so absolute targets replace it outright.
    pub fn change_to(&self, target: &str) -> Result<PathBuf, SessionError> {
        let mut path = self.path.write().unwrap_or_else(PoisonError::into_inner);

        let resolved = match target {
            "/" => PathBuf::from("/"),
            "" | "~" => dirs::home_dir().ok_or(SessionError::HomeDirNotFound)?,
            _ => path.join(target),
        };

        let canonical = canonical_dir(&resolved)?;
        tracing::debug!("Directory changed: {} -> {}", path.display(), canonical.display());
        *path = canonical.clone();

        Ok(canonical)
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf, SessionError> {
    if !path.is_dir() {
        return Err(SessionError::NoSuchDirectory {
            path: path.to_path_buf(),
        });
    }

    path.canonicalize()
        .map_err(|_| SessionError::NoSuchDirectory {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_start_directory() {
        let result = DirectoryState::new("/definitely/not/a/real/dir");
        assert!(matches!(result, Err(SessionError::NoSuchDirectory { .. })));
    }

    #[test]
    fn test_failed_change_keeps_path() {
        let state = DirectoryState::from_current_dir().unwrap();
        let before = state.path();

        assert!(state.change_to("no-such-child-dir-here").is_err());
        assert_eq!(state.path(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_root_target() {
        let state = DirectoryState::from_current_dir().unwrap();
        let root = state.change_to("/").unwrap();
        assert_eq!(root, Path::new("/").canonicalize().unwrap());
    }
}
