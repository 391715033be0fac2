use std::ffi::OsString;
use std::path::PathBuf;

use crate::errors::ConfigError;

/// Resolve the current user's home directory.
///
/// Uses `$HOME` when it is set and non-empty, otherwise falls back to the
/// platform lookup (the passwd entry of the current user on Unix).
pub fn resolve_home() -> Result<PathBuf, ConfigError> {
    home_from(std::env::var_os("HOME"))
}

fn home_from(env_home: Option<OsString>) -> Result<PathBuf, ConfigError> {
    if let Some(home) = env_home.filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    tracing::debug!(
        event = "core.paths.home_fallback",
        home = %home.display(),
        "HOME not set, using platform home directory"
    );
    Ok(home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_from_env() {
        let home = home_from(Some(OsString::from("/home/someone"))).unwrap();
        assert_eq!(home, PathBuf::from("/home/someone"));
    }

    #[test]
    fn test_empty_env_falls_back() {
        // Whatever the platform reports, an empty HOME must not be returned as-is
        if let Ok(home) = home_from(Some(OsString::new())) {
            assert!(!home.as_os_str().is_empty());
        }
    }
}
