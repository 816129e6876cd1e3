//! The Redis capability (Layer 3).
//!
//! A caller asks for "a Redis" and gets back a [`Redis`] exposing one value,
//! its `host`. Which backend provisions it is decided by [`RedisArgs`]:
//!
//! | Backend | Aliases | Provisions | `host` |
//! |---------|---------|------------|--------|
//! | [`Backend::Docker`] | `containerized` | image + container on a network | container name |
//! | [`Backend::Kubernetes`] | `clustered` | Deployment + `LoadBalancer` Service | first ingress address |
//! | [`Backend::Amazon`] | `managed` | ElastiCache cluster | first cache node address |
//!
//! Every sub-resource is parented to the capability, so the ownership tree
//! attributes each provisioning call to the Redis that issued it.
//!
//! # Example
//!
//! ```
//! use tessera_providers::sim::SimBackends;
//! use tessera_redis::{Redis, RedisArgs};
//! use tessera_system::plugin::PluginGroup;
//! use tessera_system::resource::ResourceOptions;
//! use tessera_system::stack::StackBuilder;
//!
//! # futures::executor::block_on(async {
//! let stack = StackBuilder::new("dev")
//!     .add_plugins(SimBackends::new().build())
//!     .build()
//!     .unwrap();
//!
//! let redis = Redis::create(&stack, "cache", RedisArgs::amazon(), &ResourceOptions::new()).unwrap();
//! let env = redis.host().map(|host| format!("REDIS_HOST={host}"));
//!
//! stack.run().await;
//! assert!(env.try_get().unwrap().unwrap().starts_with("REDIS_HOST=cache-ec-"));
//! # });
//! ```

mod adapters;
mod args;
mod capability;
mod error;
mod settings;

pub use adapters::{
    AMAZON_REDIS_TYPE, AmazonRedis, DOCKER_REDIS_TYPE, DockerRedis, KUBERNETES_REDIS_TYPE,
    KubernetesRedis, REDIS_IMAGE, REDIS_PORT,
};
pub use args::{AmazonRedisArgs, Backend, BackendArgs, DockerRedisArgs, KubernetesRedisArgs, RedisArgs};
pub use capability::Redis;
pub use error::RedisError;
pub use settings::{DEFAULT_NETWORK, RedisSettings};
