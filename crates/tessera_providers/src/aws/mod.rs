//! AWS backend.
//!
//! Only ElastiCache is modelled. Resources are created against the provider
//! selected for the `aws` package, installed with [`AwsPlugin`].

pub mod elasticache;

mod plugin;

pub use plugin::AwsPlugin;

/// Package name used for provider selection.
pub const PACKAGE: &str = "aws";
