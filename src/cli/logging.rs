//! Diagnostic logging setup

use crate::runner::Verbosity;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence; otherwise the level follows the CLI
/// verbosity. Calling this more than once is harmless.
pub fn init_tracing(verbosity: Verbosity) {
    let default_level = match verbosity {
        Verbosity::Silent => LevelFilter::OFF,
        Verbosity::Quiet | Verbosity::Normal => LevelFilter::WARN,
        Verbosity::Verbose => LevelFilter::DEBUG,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
