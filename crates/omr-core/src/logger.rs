//! Stderr logger for the CLI and integration tests.
//!
//! Lines look like `   0.123s INFO  omr_sheet::batch: message`. The filter is
//! a default level plus optional per-target overrides, written the way
//! `OMR_LOG` takes them: `warn,omr_markers=debug`.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "OMR_LOG";

/// Default level plus per-target overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    targets: Vec<(String, LevelFilter)>,
}

impl LogFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            targets: Vec::new(),
        }
    }

    /// Parse `level` or `target=level` items separated by commas.
    ///
    /// Items that do not parse are dropped; a bare level replaces `default`.
    pub fn parse(directives: &str, default: LevelFilter) -> Self {
        let mut filter = Self::new(default);
        for item in directives.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match item.split_once('=') {
                Some((target, level)) => {
                    if let Ok(level) = LevelFilter::from_str(level.trim()) {
                        filter.targets.push((target.trim().to_owned(), level));
                    }
                }
                None => {
                    if let Ok(level) = LevelFilter::from_str(item) {
                        filter.default = level;
                    }
                }
            }
        }
        filter
    }

    /// Level for `target`; the longest matching module prefix wins.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .filter(|(prefix, _)| {
                target == prefix.as_str()
                    || target
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(self.default, |&(_, level)| level)
    }

    /// Most verbose level any target may log at.
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|&(_, level)| level)
            .fold(self.default, Ord::max)
    }
}

struct StderrLogger {
    filter: LogFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{:8.3}s {:<5} {}: {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with `filter`.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_filter(filter: LogFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let max = filter.max_level();
        let logger = LOGGER.get_or_init(|| StderrLogger {
            filter,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(max);
    }
    Ok(())
}

/// Install the stderr logger with one level for every target.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_filter(LogFilter::new(level))
}

/// Install the stderr logger with the filter in `OMR_LOG`, on top of
/// `default`.
pub fn init_from_env(default: LevelFilter) -> Result<(), log::SetLoggerError> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) => LogFilter::parse(&directives, default),
        Err(_) => LogFilter::new(default),
    };
    init_with_filter(filter)
}

#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_sets_the_default() {
        let f = LogFilter::parse("debug", LevelFilter::Info);
        assert_eq!(f.level_for("omr_sheet::batch"), LevelFilter::Debug);
        assert_eq!(f.max_level(), LevelFilter::Debug);
    }

    #[test]
    fn target_overrides_use_the_longest_prefix() {
        let f = LogFilter::parse(
            "warn, omr_markers=debug, omr_markers::assign=trace",
            LevelFilter::Info,
        );
        assert_eq!(f.level_for("omr_sheet::reader"), LevelFilter::Warn);
        assert_eq!(f.level_for("omr_markers"), LevelFilter::Debug);
        assert_eq!(f.level_for("omr_markers::candidates"), LevelFilter::Debug);
        assert_eq!(f.level_for("omr_markers::assign"), LevelFilter::Trace);
        assert_eq!(f.max_level(), LevelFilter::Trace);
    }

    #[test]
    fn prefix_must_end_at_a_module_boundary() {
        let f = LogFilter::parse("omr=off", LevelFilter::Info);
        assert_eq!(f.level_for("omr::evaluate"), LevelFilter::Off);
        assert_eq!(f.level_for("omr_sheet"), LevelFilter::Info);
    }

    #[test]
    fn unparsable_items_are_dropped() {
        let f = LogFilter::parse("loud,omr_core=shouting,,", LevelFilter::Warn);
        assert_eq!(f, LogFilter::new(LevelFilter::Warn));
    }
}
