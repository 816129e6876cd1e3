//! Composable infrastructure capabilities in Rust.
//!
//! Ask for a capability such as a Redis, pick a backend in configuration,
//! and wire its deferred `host` into whatever depends on it.

pub use tessera_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tessera_internal::prelude::*;
}
