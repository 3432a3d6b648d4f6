//! Stderr logging for the frame loop.
//!
//! Records from the `paperspace*` crates pass at the requested level; records
//! from any other crate pass only at `warn` and above. Each line carries the
//! seconds since installation:
//!
//! ```text
//! [   12.345s  INFO paperspace::space] show paper 3 (portal-in)
//! ```

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

const OWN_TARGET_PREFIX: &str = "paperspace";
const FOREIGN_LEVEL: LevelFilter = LevelFilter::Warn;

struct FrameLogger {
    own: LevelFilter,
    started: Instant,
}

impl FrameLogger {
    fn threshold(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET_PREFIX) {
            self.own
        } else {
            FOREIGN_LEVEL.min(self.own)
        }
    }

    fn format(&self, level: Level, target: &str, args: &std::fmt::Arguments<'_>) -> String {
        format!(
            "[{:9.3}s {:>5} {target}] {args}",
            self.started.elapsed().as_secs_f64(),
            level
        )
    }
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.threshold(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = self.format(record.level(), record.target(), record.args());
            let _ = writeln!(std::io::stderr().lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<FrameLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first logger.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| FrameLogger {
        own: level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over the default
/// `paperspace=info,warn` filter; spans report their duration on close.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{OWN_TARGET_PREFIX}=info,warn")));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(fmt::time::Uptime::default());
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.finish().try_init()
    };
}
