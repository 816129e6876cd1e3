//! Deferred outputs and the resource graph for Tessera (Layer 1).
//!
//! `tessera_system` provides the primitives every resource constructor is
//! written against:
//!
//! - [`output`] - Deferred values and their combinators
//! - [`resource`] - Resource identity, options and registered outputs
//! - [`provider`] - Type-erased registry of backend APIs
//! - [`plugin`] - Plugin trait for installing providers
//! - [`stack`] - The resource arena and the provisioning run loop
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Tessera architecture:
//!
//! - **Layer 1** (`tessera_system`): outputs, resources, providers (this crate)
//! - **Layer 2** (`tessera_providers`): backend resource primitives
//! - **Layer 3** (`tessera_redis`, `tessera_core`): capabilities and ambient plugins
//!
//! # Example
//!
//! ```
//! use tessera_system::output::Output;
//! use tessera_system::resource::{Outputs, ResourceOptions, ResourceType};
//! use tessera_system::stack::StackBuilder;
//!
//! # futures::executor::block_on(async {
//! let stack = StackBuilder::new("dev").build().unwrap();
//! let id = stack
//!     .register_resource(ResourceType::from_static("demo:index:Cache"), "cache", &ResourceOptions::new())
//!     .unwrap();
//!
//! let address = stack.issue(id, async { Ok(String::from("10.0.0.7")) }).unwrap();
//! let url = address.map(|ip| format!("redis://{ip}:6379"));
//! stack.register_outputs(id, Outputs::new().with("url", &url)).unwrap();
//!
//! stack.run().await;
//! assert_eq!(url.try_get(), Some(Ok("redis://10.0.0.7:6379".to_string())));
//! # });
//! ```

/// Deferred values.
pub mod output;

/// Plugin trait for installing providers.
pub mod plugin;

/// Provider registry.
pub mod provider;

/// Resource identity and registered outputs.
pub mod resource;

/// Resource arena and run loop.
pub mod stack;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::output::*;
    pub use crate::plugin::*;
    pub use crate::provider::*;
    pub use crate::resource::*;
    pub use crate::stack::*;
}
