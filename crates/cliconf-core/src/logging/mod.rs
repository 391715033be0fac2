use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with optional quiet mode.
///
/// When `quiet` is true, only error-level events are emitted.
/// When `quiet` is false, info-level and above events are emitted.
/// `RUST_LOG` directives are honored on top of the default.
pub fn init_logging(quiet: bool) {
    let filter = EnvFilter::from_default_env().add_directive(default_directive(quiet));

    // try_init: a host may already have installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter)
        .try_init();
}

fn default_directive(quiet: bool) -> Directive {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::INFO
    };
    level.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true).to_string().to_lowercase(), "error");
        assert_eq!(default_directive(false).to_string().to_lowercase(), "info");
    }

    #[test]
    fn test_init_logging_twice_does_not_panic() {
        init_logging(true);
        init_logging(false);
    }
}
