//! Backend adapters.
//!
//! Each adapter is a component resource that owns the primitives it creates
//! and exposes a single `host` Output derived from the last of them.

mod amazon;
mod docker;
mod kubernetes;

pub use amazon::{AMAZON_REDIS_TYPE, AmazonRedis};
pub use docker::{DOCKER_REDIS_TYPE, DockerRedis};
pub use kubernetes::{KUBERNETES_REDIS_TYPE, KubernetesRedis};

/// Image every container-based backend runs.
pub const REDIS_IMAGE: &str = "redis:latest";

/// Port Redis listens on.
pub const REDIS_PORT: u16 = 6379;
