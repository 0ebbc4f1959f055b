use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use streamverse_config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directive for the given flags.
///
/// 0 = configured level, 1 = debug with hyper's connection chatter
/// suppressed, 2+ = trace.
fn filter_directive(verbose_level: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose_level {
        0 => configured.to_string(),
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn".to_string(),
        _ => "trace".to_string(),
    }
}

/// Rotation prefix for a log path: `streamverse.log` rotates as
/// `streamverse.2026-01-17`.
fn rotation_prefix(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    Some(name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name))
}

fn json_requested() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

pub fn init_logging(verbose_level: u8, quiet: bool, config: &LoggingConfig) -> Result<()> {
    let directive = filter_directive(verbose_level, quiet, &config.level);
    let filter = if quiet {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    };

    let json = json_requested();
    let registry = Registry::default().with(filter);

    let Some(log_path) = &config.file else {
        if json {
            let layer = fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr);
            registry.with(layer).init();
        } else {
            let layer = fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr);
            registry.with(layer).init();
        }
        return Ok(());
    };

    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;
    let prefix = rotation_prefix(log_path).ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, prefix);

    if json {
        let layer = fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(appender);
        registry.with(layer).init();
    } else {
        let layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .with_writer(appender);
        registry.with(layer).init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive(0, false, "warn"), "warn");
        assert!(filter_directive(1, false, "info").starts_with("debug,"));
        assert_eq!(filter_directive(3, false, "info"), "trace");
        assert_eq!(filter_directive(2, true, "info"), "error");
    }

    #[test]
    fn test_rotation_prefix() {
        assert_eq!(rotation_prefix(&PathBuf::from("/var/log/streamverse.log")), Some("streamverse"));
        assert_eq!(rotation_prefix(&PathBuf::from("/var/log/streamverse")), Some("streamverse"));
    }
}
