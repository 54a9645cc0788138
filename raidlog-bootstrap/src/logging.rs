use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Target used for the operator-facing audit trail (policy changes, suppressions, wipes).
pub const AUDIT_TARGET: &str = "raidlog::audit";

/// Console output follows `RUST_LOG`; audit lines also go to a daily file under `audit_dir`.
/// Keep the returned guard alive for as long as the process logs.
pub fn init_logging(audit_dir: &str) -> Result<WorkerGuard> {
    let console = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("raidlog-audit")
        .filename_suffix("log")
        .build(audit_dir)
        .with_context(|| format!("cannot open audit log directory {}", audit_dir))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let audit = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(Targets::new().with_target(AUDIT_TARGET, Level::INFO));

    tracing_subscriber::registry()
        .with(console)
        .with(audit)
        .init();
    Ok(guard)
}
