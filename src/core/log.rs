use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Sets up the global subscriber. Logs go to stderr so rendered tables on
/// stdout stay clean; `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(verbose: bool) {
    let (crate_level, fallback) = if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::WARN, "warn")
    };
    let crate_filter = Targets::new()
        .with_target("coinyield", crate_level)
        .with_default(LevelFilter::WARN);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let layer = fmt::layer()
        .pretty()
        .without_time()
        .with_ansi(console::colors_enabled_stderr())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer)
        .with(crate_filter)
        .with(env_filter)
        .init();
}
