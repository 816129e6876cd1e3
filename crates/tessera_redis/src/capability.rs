//! The backend-agnostic Redis capability.

use tessera_system::output::Output;
use tessera_system::resource::{ResourceId, ResourceOptions};
use tessera_system::stack::Stack;

use crate::adapters::{AmazonRedis, DockerRedis, KubernetesRedis};
use crate::args::{Backend, BackendArgs, RedisArgs};
use crate::error::RedisError;

/// A Redis instance on some backend.
///
/// Dependents only ever read [`host`](Self::host); which backend produced it
/// does not change how it is consumed.
#[derive(Debug, Clone)]
pub struct Redis {
    id: ResourceId,
    backend: Backend,
    host: Output<String>,
}

impl Redis {
    /// Creates a Redis on the backend selected by `args`.
    ///
    /// Dispatch is a closed match over [`BackendArgs`]: every backend maps to
    /// exactly one adapter.
    ///
    /// Names are unique per parent and component type. A second Redis named
    /// `name` under the same parent is rejected only if it uses the same
    /// backend; a Docker and a Kubernetes Redis may share a name, since their
    /// types (`tessera:docker:Redis`, `tessera:k8s:Redis`) and URNs differ.
    ///
    /// # Errors
    ///
    /// - [`RedisError::UnknownBackend`] if no backend is selected
    /// - [`RedisError::AmbiguousBackend`] if several are
    /// - [`RedisError::Resource`] with
    ///   [`DuplicateName`](tessera_system::resource::ResourceError::DuplicateName)
    ///   if the parent already owns a Redis of this name on the same backend
    /// - any other construction error of the selected adapter
    pub fn create(
        stack: &Stack,
        name: &str,
        args: RedisArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, RedisError> {
        let selected = args.select()?;
        tracing::info!(redis = name, backend = %selected.backend(), "creating redis");

        let redis = match selected {
            BackendArgs::Docker(args) => DockerRedis::new(stack, name, args, opts)?.into(),
            BackendArgs::Kubernetes(args) => KubernetesRedis::new(stack, name, args, opts)?.into(),
            BackendArgs::Amazon(args) => AmazonRedis::new(stack, name, args, opts)?.into(),
        };
        Ok(redis)
    }

    /// Returns the component's resource identifier.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns the backend that provisions this instance.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Returns the address clients connect to.
    #[must_use]
    pub fn host(&self) -> &Output<String> {
        &self.host
    }
}

impl From<DockerRedis> for Redis {
    fn from(redis: DockerRedis) -> Self {
        Self {
            id: redis.id,
            backend: Backend::Docker,
            host: redis.host,
        }
    }
}

impl From<KubernetesRedis> for Redis {
    fn from(redis: KubernetesRedis) -> Self {
        Self {
            id: redis.id,
            backend: Backend::Kubernetes,
            host: redis.host,
        }
    }
}

impl From<AmazonRedis> for Redis {
    fn from(redis: AmazonRedis) -> Self {
        Self {
            id: redis.id,
            backend: Backend::Amazon,
            host: redis.host,
        }
    }
}
