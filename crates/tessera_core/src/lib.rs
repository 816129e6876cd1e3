//! Core infrastructure for Tessera.
//!
//! - [`TracingPlugin`] - Logging via the `tracing` crate
//! - [`Settings`] - Stack name and logging options read from the environment
//!
//! # Example
//!
//! ```
//! use tessera_core::{Settings, TracingFormat};
//! use tessera_system::stack::StackBuilder;
//!
//! let settings = Settings::from_lookup(|key| match key {
//!     "TESSERA_STACK" => Some("staging".into()),
//!     "TESSERA_LOG_FORMAT" => Some("json".into()),
//!     _ => None,
//! })
//! .unwrap();
//! assert_eq!(settings.log_format, TracingFormat::Json);
//!
//! let stack = StackBuilder::new(settings.stack.clone())
//!     .add_plugins(settings.tracing_plugin())
//!     .build()
//!     .unwrap();
//! assert_eq!(stack.name(), "staging");
//! ```
//!
//! # Architecture
//!
//! This crate is part of Layer 1 infrastructure:
//!
//! - **Layer 1** (`tessera_system`, `tessera_core`): Core primitives and infrastructure
//! - **Layer 2** (`tessera_providers`): Backend resource primitives
//! - **Layer 3** (`tessera_redis`): Capabilities

mod settings;
mod tracing_plugin;

pub use settings::{Settings, SettingsError};
pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};
