//! Diagnostic logging to stderr
//!
//! `RUST_LOG` wins when set; otherwise `warn`, or `info` with `--verbose`.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };

    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    // A subscriber may already be installed when embedded; keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
