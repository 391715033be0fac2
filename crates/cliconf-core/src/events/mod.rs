use std::path::Path;

use tracing::{error, info};

pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_error(error: &dyn std::error::Error) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_type = std::any::type_name_of_val(error)
    );
}

/// A configuration chain was resolved and merged.
pub fn log_config_loaded(path: &Path, candidates: usize, files_read: usize) {
    info!(
        event = "core.config.load_completed",
        path = %path.display(),
        candidates = candidates,
        files_read = files_read
    );
}

/// The local layer was written back to `path`.
pub fn log_config_saved(path: &Path, keys: usize) {
    info!(
        event = "core.config.save_completed",
        path = %path.display(),
        keys = keys
    );
}
