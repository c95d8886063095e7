use serde::{Deserialize, Serialize};

use crate::expand::ExpandOptions;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PromptConfig {
    pub primary: String,
    /// Shown for every continuation line.
    pub continuation: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            primary: "$ ".into(),
            continuation: "> ".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// How many recent entries `!N` / `!-N` can reach.
    pub event_window: usize,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            event_window: crate::parse::DEFAULT_EVENT_WINDOW,
            max_entries: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExpansionConfig {
    pub glob: bool,
    pub tilde: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            glob: true,
            tilde: true,
        }
    }
}

impl ExpansionConfig {
    pub fn options(&self) -> ExpandOptions {
        ExpandOptions {
            glob: self.glob,
            tilde: self.tilde,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Log file; a leading `~` is expanded.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            file: "~/.local/share/shellfront/shellfront.log".into(),
        }
    }
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    prompt: PromptOverlay,
    #[serde(default)]
    history: HistoryOverlay,
    #[serde(default)]
    expansion: ExpansionOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct PromptOverlay {
    primary: Option<String>,
    continuation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct HistoryOverlay {
    event_window: Option<usize>,
    max_entries: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ExpansionOverlay {
    glob: Option<bool>,
    tilde: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<String>,
}

// ── Merge logic ──

fn merge<T>(base: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *base = value;
    }
}

impl Config {
    /// Load the default embedded configuration. Falls back to the
    /// compiled-in defaults if the embedded file does not parse.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!("embedded default config does not parse: {e}");
            Self::builtin()
        })
    }

    fn builtin() -> Self {
        Self {
            prompt: PromptConfig::default(),
            history: HistoryConfig::default(),
            expansion: ExpansionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/shellfront/config.toml (if exists)
    ///
    /// Every overlay key is optional; the ones present replace the default.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/shellfront/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/shellfront/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("shellfront: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let p = overlay.prompt;
        merge(&mut self.prompt.primary, p.primary);
        merge(&mut self.prompt.continuation, p.continuation);

        let h = overlay.history;
        merge(&mut self.history.event_window, h.event_window);
        merge(&mut self.history.max_entries, h.max_entries);

        let e = overlay.expansion;
        merge(&mut self.expansion.glob, e.glob);
        merge(&mut self.expansion.tilde, e.tilde);

        let l = overlay.logging;
        merge(&mut self.logging.level, l.level);
        merge(&mut self.logging.file, l.file);
    }

    /// The effective configuration as TOML, for `--dump-config`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
