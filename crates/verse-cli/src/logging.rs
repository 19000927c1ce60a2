//! Log output for the binary

use tracing_subscriber::EnvFilter;

/// Overrides the default level, e.g. `VERSE_IMAGES_LOG=verse_image_gen=trace`
pub const LOG_ENV: &str = "VERSE_IMAGES_LOG";

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
