use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Environment variable read by `init_env_logger`.
pub const LOG_ENV: &str = "TRIPACK_LOG";

/// Terminal logger restricted to the tripack crates.
///
/// Trace records carry their module path, so packed / fallback decisions
/// can be told apart from kernel records.
pub fn init_simple_logger(l: LevelFilter) -> Result<(), SetLoggerError> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("tripack")
        .set_time_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Trace)
        .build();

    TermLogger::init(l, config, TerminalMode::Stderr, ColorChoice::Auto)
}

/// Level named by `TRIPACK_LOG` (`off`, `error`, ..., `trace`), if set and valid.
pub fn env_level() -> Option<LevelFilter> {
    std::env::var(LOG_ENV).ok()?.trim().parse().ok()
}

/// `init_simple_logger` at the level of `TRIPACK_LOG`, `warn` otherwise.
pub fn init_env_logger() -> Result<(), SetLoggerError> {
    init_simple_logger(env_level().unwrap_or(LevelFilter::Warn))
}
