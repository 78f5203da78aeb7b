use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `--log-level` applies unless `RUST_LOG` holds valid directives, e.g.
/// `RUST_LOG=tickframe_frame=trace` to follow every packet start.
fn log_filter(level: LogLevel, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Install the stderr subscriber. Packet output owns stdout.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(level, directives.as_deref()))
        .with_ansi(false)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        eprintln!("warning: a tracing subscriber is already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_flag_is_the_default_filter() {
        let filter = log_filter(LogLevel::Warn, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn env_directives_override_the_level() {
        let filter = log_filter(LogLevel::Info, Some("tickframe_frame=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn malformed_directives_fall_back_to_level() {
        let filter = log_filter(LogLevel::Error, Some("tickframe=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
