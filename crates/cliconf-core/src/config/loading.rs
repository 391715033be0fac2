//! Reading and merging the files of a configuration chain.
//!
//! Loading is permissive: a candidate that is missing, unreadable or
//! malformed is skipped with a log event, and a malformed local file leaves
//! the local layer empty. No single file can prevent the others from
//! loading.

use std::fs;
use std::path::Path;

use super::merge::merge_layers;
use crate::errors::ConfigError;
use crate::format::{self, ConfigNode};
use crate::paths::Resolution;

/// The three trees produced by one load.
#[derive(Debug, Default)]
pub(crate) struct LoadedLayers {
    /// Content of the local file only.
    pub local: ConfigNode,
    /// Merge of every other candidate.
    pub inherited: ConfigNode,
    /// `inherited` with `local` merged on top.
    pub effective: ConfigNode,
    pub files_read: usize,
}

pub(crate) fn load_layers(resolution: &Resolution) -> LoadedLayers {
    let layers: Vec<ConfigNode> = resolution
        .candidates
        .iter()
        .filter_map(|candidate| {
            let layer = read_layer(candidate)?;
            tracing::debug!(
                event = "core.config.layer_merged",
                path = %candidate.display(),
                keys = layer.len()
            );
            Some(layer)
        })
        .collect();
    let mut files_read = layers.len();
    let inherited = merge_layers(layers);

    let local = match read_layer(&resolution.local_file) {
        Some(local) => {
            files_read += 1;
            local
        }
        None => ConfigNode::new(),
    };

    let effective = merge_layers([inherited.clone(), local.clone()]);

    LoadedLayers {
        local,
        inherited,
        effective,
        files_read,
    }
}

fn read_layer(path: &Path) -> Option<ConfigNode> {
    if !path.is_file() {
        tracing::debug!(
            event = "core.config.layer_missing",
            path = %path.display()
        );
        return None;
    }

    match parse_file(path) {
        Ok(node) => Some(node),
        Err(e) => {
            tracing::warn!(
                event = "core.config.layer_skipped",
                path = %path.display(),
                error = %e,
                "Config file could not be loaded, skipping"
            );
            None
        }
    }
}

/// Read and parse a single configuration file.
///
/// # Errors
///
/// [`ConfigError::Path`] if the file cannot be read, [`ConfigError::Parse`]
/// if its content is malformed.
pub fn parse_file(path: &Path) -> Result<ConfigNode, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Path {
        path: path.display().to_string(),
        message: format!("file is not readable ({})", e),
    })?;

    format::parse(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
