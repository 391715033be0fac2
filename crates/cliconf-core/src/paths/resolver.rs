//! Discovery of the configuration files that contribute to one target file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// The files to read for one target configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Canonical path of the target file. It may not exist yet.
    pub local_file: PathBuf,
    /// Same-named files from other locations, farthest first. Entries may
    /// not exist; the loader skips those.
    pub candidates: Vec<PathBuf>,
}

/// Computes the bubbling search chain for a configuration file.
#[derive(Debug, Clone)]
pub struct PathResolver<'a> {
    home: &'a Path,
    extra_paths: &'a [PathBuf],
}

impl<'a> PathResolver<'a> {
    pub fn new(home: &'a Path, extra_paths: &'a [PathBuf]) -> Self {
        Self { home, extra_paths }
    }

    /// Resolve the local file and its candidate chain.
    ///
    /// With `bubble`, every ancestor of the file's directory up to the home
    /// directory (or the filesystem root) is searched, followed by the extra
    /// paths and the home directory itself. Without it, only the local file
    /// is read.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Path`] if `filepath` is a directory, its
    /// directory does not exist, or it exists but cannot be read.
    pub fn resolve(&self, filepath: &Path, bubble: bool) -> Result<Resolution, ConfigError> {
        let local_file = resolve_local_file(filepath)?;

        if !bubble {
            return Ok(Resolution {
                local_file,
                candidates: Vec::new(),
            });
        }

        let Some(file_name) = local_file.file_name() else {
            return Err(path_error(filepath, "missing file name"));
        };
        let local_dir = local_file.parent().unwrap_or(Path::new("/"));
        let home = canonical_or_self(self.home);

        // Nearest first; reversed at the end so that nearer files merge last
        let mut search_paths = ancestors_until(local_dir, &home);
        search_paths.extend(self.extra_paths.iter().map(|p| canonical_or_self(p)));
        search_paths.push(home);

        let mut candidates: Vec<PathBuf> = Vec::new();
        for path in search_paths {
            let candidate = if path.is_dir() {
                path.join(file_name)
            } else {
                path
            };

            if candidate == local_file || candidates.contains(&candidate) {
                continue;
            }
            candidates.push(candidate);
        }
        candidates.reverse();

        tracing::debug!(
            event = "core.paths.resolve_completed",
            local_file = %local_file.display(),
            candidates = candidates.len()
        );

        Ok(Resolution {
            local_file,
            candidates,
        })
    }
}

fn resolve_local_file(filepath: &Path) -> Result<PathBuf, ConfigError> {
    if filepath.is_dir() {
        return Err(path_error(filepath, "specified path is a directory"));
    }

    let file_name = filepath
        .file_name()
        .ok_or_else(|| path_error(filepath, "missing file name"))?;

    let dir = match filepath.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_dir = fs::canonicalize(dir)
        .map_err(|e| path_error(dir, format!("unable to locate directory ({})", e)))?;
    if !canonical_dir.is_dir() {
        return Err(path_error(dir, "parent is not a directory"));
    }

    let local_file = canonical_dir.join(file_name);
    if local_file.is_file()
        && let Err(e) = fs::File::open(&local_file)
    {
        return Err(path_error(
            &local_file,
            format!("file is not readable ({})", e),
        ));
    }

    Ok(local_file)
}

/// Parents of `dir`, nearest first, stopping after `home` or the root.
fn ancestors_until(dir: &Path, home: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = dir;

    while current != home {
        match current.parent() {
            Some(parent) => {
                paths.push(parent.to_path_buf());
                current = parent;
            }
            None => break,
        }
    }

    paths
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn path_error(path: &Path, message: impl Into<String>) -> ConfigError {
    ConfigError::Path {
        path: path.display().to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir_all(root.join("home/u/proj/app")).unwrap();
        Fixture { _temp: temp, root }
    }

    #[test]
    fn test_bubble_walks_up_to_home() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let resolver = PathResolver::new(&home, &[]);

        let resolution = resolver
            .resolve(&home.join("proj/app/app.conf"), true)
            .unwrap();

        assert_eq!(resolution.local_file, home.join("proj/app/app.conf"));
        assert_eq!(
            resolution.candidates,
            vec![home.join("app.conf"), home.join("proj/app.conf")]
        );
    }

    #[test]
    fn test_no_bubble_has_no_candidates() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let extra = vec![fx.root.join("home")];
        let resolver = PathResolver::new(&home, &extra);

        let resolution = resolver
            .resolve(&home.join("proj/app.conf"), false)
            .unwrap();

        assert!(resolution.candidates.is_empty());
    }

    #[test]
    fn test_extra_paths_rank_farther_than_ancestors() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let etc = fx.root.join("etc");
        fs::create_dir_all(&etc).unwrap();
        let extra = vec![etc.clone()];
        let resolver = PathResolver::new(&home, &extra);

        let resolution = resolver.resolve(&home.join("proj/app.conf"), true).unwrap();

        // home is also an ancestor here, so it ranks nearer than the extra path
        assert_eq!(
            resolution.candidates,
            vec![etc.join("app.conf"), home.join("app.conf")]
        );
    }

    #[test]
    fn test_extra_file_path_is_used_directly() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let global = fx.root.join("global.ini");
        fs::write(&global, "a = 1\n").unwrap();
        let extra = vec![global.clone()];
        let resolver = PathResolver::new(&home, &extra);

        let resolution = resolver.resolve(&home.join("app.conf"), true).unwrap();

        assert_eq!(resolution.candidates, vec![global]);
    }

    #[test]
    fn test_outside_home_walks_to_root() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let elsewhere = fx.root.join("srv/app");
        fs::create_dir_all(&elsewhere).unwrap();
        let resolver = PathResolver::new(&home, &[]);

        let resolution = resolver.resolve(&elsewhere.join("app.conf"), true).unwrap();

        assert_eq!(resolution.candidates.first(), Some(&home.join("app.conf")));
        assert!(resolution.candidates.contains(&PathBuf::from("/app.conf")));
        assert_eq!(
            resolution.candidates.last(),
            Some(&fx.root.join("srv/app.conf"))
        );
    }

    #[test]
    fn test_duplicates_are_removed() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let extra = vec![home.clone(), home.join("proj")];
        let resolver = PathResolver::new(&home, &extra);

        let resolution = resolver
            .resolve(&home.join("proj/app/app.conf"), true)
            .unwrap();

        assert_eq!(
            resolution.candidates,
            vec![home.join("app.conf"), home.join("proj/app.conf")]
        );
    }

    #[test]
    fn test_local_directory_is_never_a_candidate() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let extra = vec![home.join("proj")];
        let resolver = PathResolver::new(&home, &extra);

        let resolution = resolver.resolve(&home.join("proj/app.conf"), true).unwrap();

        assert_eq!(resolution.candidates, vec![home.join("app.conf")]);
    }

    #[test]
    fn test_directory_target_fails() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let resolver = PathResolver::new(&home, &[]);

        let err = resolver.resolve(&home.join("proj"), true).unwrap_err();
        assert!(matches!(err, ConfigError::Path { .. }));
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn test_missing_directory_fails() {
        let fx = fixture();
        let home = fx.root.join("home/u");
        let resolver = PathResolver::new(&home, &[]);

        let err = resolver
            .resolve(&home.join("missing/app.conf"), true)
            .unwrap_err();
        assert!(err.to_string().contains("unable to locate directory"));
    }
}
