use tracing_subscriber::{EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the fmt subscriber for binaries hosting vision nodes.
///
/// `RUST_LOG` wins over the defaults. Calling this twice, or after somebody else
/// installed a global subscriber, is a no-op.
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let mut filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // Keep third-party noise down.
    for d in ["hyper=warn", "reqwest=warn", "rustls=warn"] {
        if let Ok(dir) = d.parse() {
            filter = filter.add_directive(dir);
        }
    }

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
