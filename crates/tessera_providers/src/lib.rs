//! Backend resource primitives for Tessera (Layer 2).
//!
//! Each backend exposes an opaque async API trait that the surrounding
//! runtime implements, a plugin that installs an implementation into a
//! [`StackBuilder`](tessera_system::stack::StackBuilder), and resource
//! constructors that issue calls through the [`Stack`](tessera_system::stack::Stack)
//! and expose their results as Outputs.
//!
//! # Supported Backends
//!
//! | Backend | Package | API trait | Resources |
//! |---------|---------|-----------|-----------|
//! | Docker | `docker` | [`DockerApi`](docker::DockerApi) | `Network`, `RemoteImage`, `Container` |
//! | Kubernetes | `kubernetes` | [`KubernetesApi`](kubernetes::KubernetesApi) | `Deployment`, `Service` |
//! | AWS | `aws` | [`ElastiCacheApi`](aws::elasticache::ElastiCacheApi) | `elasticache::Cluster` |
//!
//! # Feature Flags
//!
//! The `sim` feature adds [`sim`](crate::sim), in-memory implementations of
//! every API trait with scripted behaviour for previews and tests.
//!
//! ```toml
//! tessera_providers = { path = "../tessera_providers", features = ["sim"] }
//! ```

pub mod aws;
pub mod docker;
pub mod kubernetes;

mod error;
mod naming;

pub use error::ApiError;
pub use naming::physical_name;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

use tessera_system::output::OutputError;
use tessera_system::resource::Urn;

/// Converts a failed API call into the Output error of the issuing resource.
pub(crate) fn provisioning_error(urn: &Urn) -> impl FnOnce(ApiError) -> OutputError + '_ {
    move |error| OutputError::provisioning(urn, error.to_string())
}
