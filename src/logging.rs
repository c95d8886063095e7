use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::LoggingConfig;

/// Parse a level name; unknown names fall back to `warn`.
pub fn level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Warn)
}

/// The log file path with a leading `~` expanded.
pub fn log_path(config: &LoggingConfig) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&config.file).as_ref())
}

/// Install a file logger for the `log` macros.
/// Best-effort: any failure leaves logging off and the shell running.
/// Returns whether a logger was installed.
pub fn init(config: &LoggingConfig) -> bool {
    let level = level(&config.level);
    if level == LevelFilter::Off {
        return false;
    }

    let path = log_path(config);
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return false;
    };

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, log_config, file).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(level("debug"), LevelFilter::Debug);
        assert_eq!(level("OFF"), LevelFilter::Off);
        assert_eq!(level(" trace "), LevelFilter::Trace);
        assert_eq!(level("chatty"), LevelFilter::Warn);
    }

    #[test]
    fn off_installs_nothing() {
        let config = LoggingConfig {
            level: "off".into(),
            file: "/nonexistent/never/created.log".into(),
        };
        assert!(!init(&config));
        assert!(!std::path::Path::new("/nonexistent/never").exists());
    }

    #[test]
    fn tilde_in_path_is_expanded() {
        if std::env::var_os("HOME").is_none() {
            return;
        }
        let config = LoggingConfig {
            level: "warn".into(),
            file: "~/x.log".into(),
        };
        assert!(!log_path(&config).starts_with("~"));
    }

    #[test]
    fn unwritable_path_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let config = LoggingConfig {
            level: "warn".into(),
            file: blocker.join("sub/log").display().to_string(),
        };
        assert!(!init(&config));
    }
}
