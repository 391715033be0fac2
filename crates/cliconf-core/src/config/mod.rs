//! # Layered Configuration
//!
//! A [`LayeredConfig`] resolves one named configuration file against a
//! chain of directories and exposes the merged result as a [`Collection`].
//!
//! ## Configuration Hierarchy
//!
//! Files are merged farthest first, so nearer files override farther ones:
//! 1. **Extra paths** - caller-supplied directories or files
//! 2. **Home** - `~/<name>`
//! 3. **Ancestors** - `<dir>/../<name>` up to the home directory or `/`
//! 4. **Local file** - the file passed to [`LayeredConfig::load`]
//!
//! Sections merge key by key; scalars are replaced. Only the local file is
//! ever written back: [`LayeredConfig::save`] persists the local layer, with
//! any changes made through the collection API.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use cliconf_core::config::LayeredConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = LayeredConfig::new(Vec::new())?;
//!     config.load("/home/u/proj/app.conf", true)?;
//!
//!     let db = config.section("db")?;
//!     db.set("host", "localhost")?;
//!
//!     if config.has_changed() {
//!         config.save()?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod loading;
pub mod merge;
mod persistence;

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::collection::Collection;
use crate::collection::store::Store;
use crate::errors::ConfigError;
use crate::events;
use crate::format::{self, ConfigNode};
use crate::paths::{PathResolver, resolve_home};

pub use loading::parse_file;
pub use merge::{deep_merge, merge_layers};

/// Hierarchical configuration bound to one local file.
///
/// Dereferences to the root [`Collection`] of the effective tree.
pub struct LayeredConfig {
    paths: Vec<PathBuf>,
    home: PathBuf,
    filepath: Option<PathBuf>,
    root: Collection,
}

impl LayeredConfig {
    /// Create an unloaded configuration searching `paths` in addition to
    /// the home directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HomeNotFound`] if no home directory can be
    /// determined.
    pub fn new(paths: Vec<PathBuf>) -> Result<Self, ConfigError> {
        let home = resolve_home()?;
        Ok(Self::with_home(paths, home))
    }

    /// Create an unloaded configuration with an explicit home directory.
    ///
    /// Until [`load`](LayeredConfig::load) succeeds, reads find nothing,
    /// sections may be added, and scalar writes fail with
    /// [`ConfigError::NotLoaded`].
    pub fn with_home(paths: Vec<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            paths,
            home: home.into(),
            filepath: None,
            root: empty_root(),
        }
    }

    /// Load `filepath` and merge every same-named file found along the
    /// search chain.
    ///
    /// Any previous state, including unsaved changes, is discarded.
    /// Candidate files that are unreadable or malformed are skipped; a
    /// malformed local file loads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Path`] if `filepath` is a directory, its
    /// directory does not exist, or the file exists but is unreadable.
    pub fn load(&mut self, filepath: impl AsRef<Path>, bubble: bool) -> Result<(), ConfigError> {
        let filepath = filepath.as_ref();
        tracing::debug!(
            event = "core.config.load_started",
            path = %filepath.display(),
            bubble = bubble
        );

        let resolution = PathResolver::new(&self.home, &self.paths).resolve(filepath, bubble)?;
        let layers = loading::load_layers(&resolution);

        let store = Store::shared();
        let (effective, local, inherited) = {
            let mut store = store.borrow_mut();
            (
                store.import(layers.effective),
                store.import(layers.local),
                store.import(layers.inherited),
            )
        };

        self.root = Collection::layered(store, effective, local, Some(inherited));

        events::log_config_loaded(
            &resolution.local_file,
            resolution.candidates.len(),
            layers.files_read,
        );

        self.filepath = Some(resolution.local_file);
        Ok(())
    }

    /// Write the local layer back to the loaded file.
    ///
    /// Values inherited from other files are never written.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotLoaded`] if nothing was loaded
    /// - [`ConfigError::ReadOnly`] if the file exists and is read-only
    /// - [`ConfigError::Persist`] if the temporary file cannot be written or
    ///   renamed over the target; the target is left untouched
    pub fn save(&self) -> Result<(), ConfigError> {
        let filepath = self.filepath.as_deref().ok_or(ConfigError::NotLoaded)?;
        let local = self.local_data();

        persistence::write_atomic(filepath, &format::serialize(&local))?;
        self.root.clear_dirty();

        events::log_config_saved(filepath, local.len());

        Ok(())
    }

    /// Strictly parse a single file, surfacing errors that [`load`] skips.
    ///
    /// [`load`]: LayeredConfig::load
    pub fn parse_file(path: impl AsRef<Path>) -> Result<ConfigNode, ConfigError> {
        loading::parse_file(path.as_ref())
    }

    /// Whether local values changed since the last load or save.
    pub fn has_changed(&self) -> bool {
        self.root.is_dirty()
    }

    /// Canonical path of the loaded file.
    pub fn filepath(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn root(&self) -> &Collection {
        &self.root
    }

    /// Owned snapshot of the local layer, as [`LayeredConfig::save`] would
    /// write it.
    pub fn local_data(&self) -> ConfigNode {
        self.root.local_node().unwrap_or_default()
    }
}

fn empty_root() -> Collection {
    let store = Store::shared_unloaded();
    let (effective, local) = {
        let mut store = store.borrow_mut();
        (store.alloc(), store.alloc())
    };
    Collection::layered(store, effective, local, None)
}

impl Deref for LayeredConfig {
    type Target = Collection;

    fn deref(&self) -> &Collection {
        &self.root
    }
}

impl fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredConfig")
            .field("filepath", &self.filepath)
            .field("home", &self.home)
            .field("paths", &self.paths)
            .field("data", &self.root)
            .finish()
    }
}
