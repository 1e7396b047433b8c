use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable read when no `-v` flag is given.
const LOG_ENV: &str = "LCALC_LOG";

/// Level for a `-v` count. Zero defers to `LCALC_LOG`, then `warn`.
pub fn level_for(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for piped output.
pub fn init(verbose: u8) {
    let filter = match level_for(verbose) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), None);
        assert_eq!(level_for(1), Some("debug"));
        assert_eq!(level_for(4), Some("trace"));
    }
}
