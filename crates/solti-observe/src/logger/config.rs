use std::io::IsTerminal;

use super::{error::LoggerError, format::LoggerFormat, level::LoggerLevel};

/// Env variable selecting the output backend (`text|json|journald`).
pub const ENV_LOG_FORMAT: &str = "SOLTI_LOG_FORMAT";
/// Env variable holding the filter directive (`info`, `warn,solti_component=debug`, ...).
pub const ENV_LOG_LEVEL: &str = "SOLTI_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: LoggerLevel,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by [`ENV_LOG_FORMAT`] and [`ENV_LOG_LEVEL`].
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LoggerConfig::from_env`], reading variables through `lookup`.
    ///
    /// Unset and blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut cfg = Self::default();
        if let Some(format) = var(ENV_LOG_FORMAT) {
            cfg.format = format.parse()?;
        }
        if let Some(level) = var(ENV_LOG_LEVEL) {
            cfg.level = LoggerLevel::new(&level)?;
        }
        if cfg.format != LoggerFormat::Text {
            cfg.use_color = false;
        }
        Ok(cfg)
    }

    pub fn with_level(mut self, level: LoggerLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LoggerFormat) -> Self {
        self.format = format;
        self
    }
}
