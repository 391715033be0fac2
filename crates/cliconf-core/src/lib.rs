//! cliconf-core: Layered INI configuration for command-line applications
//!
//! Resolves a named configuration file along a chain of directories,
//! merges every file found into one effective tree, and writes changes
//! back to the closest file only.
//!
//! # Main Entry Points
//!
//! - [`config`] - Load, merge and save layered configuration
//! - [`collection`] - Read/write views over configuration trees
//! - [`format`] - The INI text format
//! - [`paths`] - Search-chain and home-directory resolution

pub mod collection;
pub mod config;
pub mod errors;
pub mod events;
pub mod format;
pub mod logging;
pub mod paths;

// Re-export commonly used types at crate root for convenience
pub use collection::{Collection, Item, ScalarIter};
pub use config::LayeredConfig;
pub use errors::{CliconfError, ConfigError};
pub use format::{ConfigNode, ConfigValue, FormatError, Scalar};

// Re-export logging initialization
pub use logging::init_logging;
