//! # Tessera Internal Library
//!
//! Re-exports the core Tessera crates for convenience.

/// Layer 1: Deferred outputs and the resource graph.
pub use tessera_system;

/// Layer 1: Tracing and settings.
pub use tessera_core;

/// Layer 2: Backend resource primitives.
pub use tessera_providers;

/// Layer 3: The Redis capability.
pub use tessera_redis;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tessera_core::{Settings, TracingFormat, TracingPlugin};
    pub use tessera_redis::{Backend, Redis, RedisArgs, RedisError, RedisSettings};
    pub use tessera_system::prelude::*;
}
