//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`], which installs the global `tracing`
//! subscriber when the stack is built.
//!
//! # Example
//!
//! ```
//! use tessera_core::{TracingFormat, TracingPlugin};
//! use tessera_system::stack::StackBuilder;
//! use tracing::Level;
//!
//! let stack = StackBuilder::new("dev")
//!     .add_plugins(
//!         TracingPlugin::default()
//!             .with_level(Level::DEBUG)
//!             .with_format(TracingFormat::Compact),
//!     )
//!     .build()
//!     .unwrap();
//! # let _ = stack;
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_system::plugin::Plugin;
use tessera_system::stack::{StackBuilder, StackError};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::settings::SettingsError;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

impl TracingFormat {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for TracingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TracingFormat {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(SettingsError::InvalidLogFormat(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The configuration a [`TracingPlugin`] installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// Installs a `tracing_subscriber` registry with an [`EnvFilter`] and a
/// formatting layer. If a global subscriber is already set, for example by
/// a test harness, installation is skipped.
///
/// # Configuration Options
///
/// ```
/// use tessera_core::{TracingFormat, TracingPlugin};
/// use tracing::Level;
///
/// // Development: Pretty colored output with debug level
/// let dev_plugin = TracingPlugin::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON output for log aggregation
/// let prod_plugin = TracingPlugin::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("tessera_system=info,tessera_redis=debug");
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "tessera_system=debug,tessera_providers=warn").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An unparseable filter falls
    /// back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configuration this plugin installs.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the global subscriber. Returns false if one was already set.
    pub fn init(&self) -> bool {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let registry = tracing_subscriber::registry().with(self.env_filter());

        let installed = match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        }
        .is_ok();

        if installed {
            tracing::info!(level = %self.level, format = %self.format, "tracing initialized");
        }
        installed
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, _stack: &mut StackBuilder) -> Result<(), StackError> {
        self.init();
        Ok(())
    }

    fn name(&self) -> &str {
        "tessera::tracing"
    }
}
