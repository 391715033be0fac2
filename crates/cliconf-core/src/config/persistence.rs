//! Atomic persistence of configuration files.
//!
//! The new content is written to a temporary file in the target's own
//! directory and renamed over the target, so readers never observe a
//! partially written file.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::errors::ConfigError;

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let existing = match fs::metadata(path) {
        Ok(metadata) => Some(metadata),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(ConfigError::Io { source: e }),
    };

    if let Some(metadata) = &existing {
        ensure_writable(path, metadata)?;
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(dir)
        .map_err(|e| persist_error(path, format!("unable to create temporary file ({})", e)))?;

    temp_file
        .write_all(contents.as_bytes())
        .and_then(|()| temp_file.as_file().sync_all())
        .map_err(|e| persist_error(path, format!("unable to write temporary file ({})", e)))?;

    // Keep the mode of the file being replaced
    if let Some(metadata) = &existing
        && let Err(e) = fs::set_permissions(temp_file.path(), metadata.permissions())
    {
        tracing::warn!(
            event = "core.config.permissions_copy_failed",
            path = %path.display(),
            error = %e
        );
    }

    if let Err(e) = temp_file.persist(path) {
        let message = format!("unable to replace file ({})", e.error);
        cleanup_temp_file(e.file, path);
        return Err(persist_error(path, message));
    }

    Ok(())
}

/// Refuse to replace a file the current user could not write in place.
#[cfg(unix)]
fn ensure_writable(path: &Path, _metadata: &fs::Metadata) -> Result<(), ConfigError> {
    use nix::errno::Errno;
    use nix::unistd::{AccessFlags, access};

    match access(path, AccessFlags::W_OK) {
        Ok(()) => Ok(()),
        Err(Errno::EACCES | Errno::EPERM | Errno::EROFS) => Err(ConfigError::ReadOnly {
            path: path.display().to_string(),
        }),
        Err(errno) => Err(ConfigError::Io {
            source: errno.into(),
        }),
    }
}

#[cfg(not(unix))]
fn ensure_writable(path: &Path, metadata: &fs::Metadata) -> Result<(), ConfigError> {
    if metadata.permissions().readonly() {
        return Err(ConfigError::ReadOnly {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

fn cleanup_temp_file(temp_file: NamedTempFile, target: &Path) {
    let temp_path = temp_file.path().to_path_buf();
    if let Err(cleanup_err) = temp_file.close() {
        tracing::warn!(
            event = "core.config.temp_file_cleanup_failed",
            temp_file = %temp_path.display(),
            target = %target.display(),
            cleanup_error = %cleanup_err,
            message = "Failed to clean up temp file after save error"
        );
    }
}

fn persist_error(path: &Path, message: String) -> ConfigError {
    ConfigError::Persist {
        path: path.display().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_creates_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("app.conf");

        write_atomic(&target, "a = 1\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "a = 1\n");
        assert_eq!(entries(temp.path()), vec!["app.conf"]);
    }

    #[test]
    fn test_write_replaces_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("app.conf");
        fs::write(&target, "old = true\n").unwrap();

        write_atomic(&target, "new = true\n").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new = true\n");
        assert_eq!(entries(temp.path()), vec!["app.conf"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_file_follows_write_access() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("app.conf");
        fs::write(&target, "old = true\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o444)).unwrap();

        let result = write_atomic(&target, "new = true\n");

        // Write access is what the OS grants, not the mode bits alone
        if nix::unistd::geteuid().is_root() {
            result.unwrap();
            assert_eq!(fs::read_to_string(&target).unwrap(), "new = true\n");
            let mode = fs::metadata(&target).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o444);
        } else {
            assert!(matches!(result, Err(ConfigError::ReadOnly { .. })));
            assert_eq!(fs::read_to_string(&target).unwrap(), "old = true\n");
        }
        assert_eq!(entries(temp.path()), vec!["app.conf"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_writable_file_passes_access_check() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("app.conf");
        fs::write(&target, "old = true\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).unwrap();

        let metadata = fs::metadata(&target).unwrap();
        ensure_writable(&target, &metadata).unwrap();
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file
        let target = temp.path().join("app.conf");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "").unwrap();

        let err = write_atomic(&target, "a = 1\n").unwrap_err();

        assert!(matches!(err, ConfigError::Persist { .. }));
        assert_eq!(entries(temp.path()), vec!["app.conf"]);
    }
}
