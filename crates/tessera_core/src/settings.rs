//! Settings read from the environment.

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::tracing_plugin::{TracingFormat, TracingPlugin};

/// Stack name used when `TESSERA_STACK` is unset.
pub const DEFAULT_STACK: &str = "dev";

const STACK_VAR: &str = "TESSERA_STACK";
const LOG_VAR: &str = "TESSERA_LOG";
const LOG_FORMAT_VAR: &str = "TESSERA_LOG_FORMAT";

/// Errors raised while reading [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The stack name contains characters that would break URNs.
    #[error("invalid stack name '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidStackName(String),

    /// The log format is not one of `pretty`, `compact` or `json`.
    #[error("invalid log format '{0}': expected pretty, compact or json")]
    InvalidLogFormat(String),
}

/// Process-wide settings.
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | `TESSERA_STACK` | `dev` | stack name, the first URN segment |
/// | `TESSERA_LOG` | `info` | a level or an `EnvFilter` directive string |
/// | `TESSERA_LOG_FORMAT` | `pretty` | `pretty`, `compact` or `json` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stack name.
    pub stack: String,
    /// Log level or filter directives.
    pub log: Option<String>,
    /// Log output format.
    pub log_format: TracingFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stack: DEFAULT_STACK.to_string(),
            log: None,
            log_format: TracingFormat::default(),
        }
    }
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let settings = Self {
            stack: read(STACK_VAR).unwrap_or_else(|| DEFAULT_STACK.to_string()),
            log: read(LOG_VAR),
            log_format: read(LOG_FORMAT_VAR)
                .map(|format| format.parse::<TracingFormat>())
                .transpose()?
                .unwrap_or_default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidStackName`] for an empty stack name or
    /// one with characters outside `[A-Za-z0-9._-]`.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let valid = !self.stack.is_empty()
            && self
                .stack
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(())
        } else {
            Err(SettingsError::InvalidStackName(self.stack.clone()))
        }
    }

    /// Builds the tracing plugin for these settings.
    ///
    /// A `log` value that parses as a level sets the level; anything else is
    /// used as filter directives.
    #[must_use]
    pub fn tracing_plugin(&self) -> TracingPlugin {
        let plugin = TracingPlugin::new().with_format(self.log_format);
        match self.log.as_deref() {
            None => plugin,
            Some(log) => match log.parse::<Level>() {
                Ok(level) => plugin.with_level(level),
                Err(_) => plugin.with_env_filter(log),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.stack, "dev");
        assert_eq!(settings.tracing_plugin().config().level, Level::INFO);
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup(&[
            ("TESSERA_STACK", "prod"),
            ("TESSERA_LOG", "debug"),
            ("TESSERA_LOG_FORMAT", "compact"),
        ]))
        .unwrap();

        assert_eq!(settings.stack, "prod");
        assert_eq!(settings.log.as_deref(), Some("debug"));
        let config = settings.tracing_plugin().config();
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, TracingFormat::Compact);
    }

    #[test]
    fn filter_directives_keep_default_level() {
        let settings = Settings::from_lookup(lookup(&[("TESSERA_LOG", "tessera_redis=debug")])).unwrap();
        assert_eq!(settings.tracing_plugin().config().level, Level::INFO);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(
            Settings::from_lookup(lookup(&[("TESSERA_LOG_FORMAT", "yaml")])).unwrap_err(),
            SettingsError::InvalidLogFormat("yaml".into())
        );
        assert_eq!(
            Settings::from_lookup(lookup(&[("TESSERA_STACK", "my::stack")])).unwrap_err(),
            SettingsError::InvalidStackName("my::stack".into())
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"log_format": "json"}"#).unwrap();
        assert_eq!(settings.stack, "dev");
        assert_eq!(settings.log_format, TracingFormat::Json);
    }
}
