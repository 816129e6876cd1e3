//! Backend selection.
//!
//! [`RedisArgs`] is the open form callers fill in: one optional payload per
//! backend. [`RedisArgs::select`] checks that exactly one is populated and
//! turns it into the closed [`BackendArgs`] union that the factory matches
//! on.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_system::output::Output;

use crate::error::RedisError;

/// A Redis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A container on a Docker engine.
    #[serde(alias = "containerized")]
    Docker,
    /// A Deployment behind a load balancer on Kubernetes.
    #[serde(alias = "clustered")]
    Kubernetes,
    /// A managed ElastiCache cluster.
    #[serde(alias = "managed")]
    Amazon,
}

impl Backend {
    /// Every backend, in dispatch order.
    pub const ALL: [Self; 3] = [Self::Docker, Self::Kubernetes, Self::Amazon];

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Kubernetes => "kubernetes",
            Self::Amazon => "amazon",
        }
    }

    /// Returns the generic name of the deployment style.
    #[must_use]
    pub const fn alias(&self) -> &'static str {
        match self {
            Self::Docker => "containerized",
            Self::Kubernetes => "clustered",
            Self::Amazon => "managed",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = RedisError;

    /// Parses a canonical name or alias, ignoring case and surrounding
    /// whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|backend| {
                wanted.eq_ignore_ascii_case(backend.as_str()) || wanted.eq_ignore_ascii_case(backend.alias())
            })
            .ok_or_else(|| RedisError::UnknownBackend {
                requested: Some(wanted.to_string()),
            })
    }
}

/// Payload for the Docker backend.
#[derive(Debug, Clone, Default)]
pub struct DockerRedisArgs {
    /// Network the container joins. Required.
    pub network: Option<Output<String>>,
}

impl DockerRedisArgs {
    /// Joins the container to `network`.
    #[must_use]
    pub fn on_network(network: Output<String>) -> Self {
        Self {
            network: Some(network),
        }
    }
}

/// Payload for the Kubernetes backend. The cluster comes from the selected
/// provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KubernetesRedisArgs;

/// Payload for the Amazon backend. The account and region come from the
/// selected provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmazonRedisArgs;

/// Backend selection with exactly one payload populated.
#[derive(Debug, Clone)]
pub enum BackendArgs {
    /// Docker payload.
    Docker(DockerRedisArgs),
    /// Kubernetes payload.
    Kubernetes(KubernetesRedisArgs),
    /// Amazon payload.
    Amazon(AmazonRedisArgs),
}

impl BackendArgs {
    /// Returns the selected backend.
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            Self::Docker(_) => Backend::Docker,
            Self::Kubernetes(_) => Backend::Kubernetes,
            Self::Amazon(_) => Backend::Amazon,
        }
    }
}

/// Arguments of [`Redis::create`](crate::Redis::create): one optional
/// payload per backend, exactly one of which must be set.
#[derive(Debug, Clone, Default)]
pub struct RedisArgs {
    /// Run Redis as a Docker container.
    pub docker: Option<DockerRedisArgs>,
    /// Run Redis as a Kubernetes Deployment.
    pub kubernetes: Option<KubernetesRedisArgs>,
    /// Run Redis on ElastiCache.
    pub amazon: Option<AmazonRedisArgs>,
}

impl RedisArgs {
    /// Selects the Docker backend.
    #[must_use]
    pub fn docker(args: DockerRedisArgs) -> Self {
        Self {
            docker: Some(args),
            ..Self::default()
        }
    }

    /// Selects the Kubernetes backend.
    #[must_use]
    pub fn kubernetes() -> Self {
        Self {
            kubernetes: Some(KubernetesRedisArgs),
            ..Self::default()
        }
    }

    /// Selects the Amazon backend.
    #[must_use]
    pub fn amazon() -> Self {
        Self {
            amazon: Some(AmazonRedisArgs),
            ..Self::default()
        }
    }

    /// Selects the containerized backend, an alias for [`docker`](Self::docker).
    #[must_use]
    pub fn containerized(args: DockerRedisArgs) -> Self {
        Self::docker(args)
    }

    /// Selects the clustered backend, an alias for [`kubernetes`](Self::kubernetes).
    #[must_use]
    pub fn clustered() -> Self {
        Self::kubernetes()
    }

    /// Selects the managed backend, an alias for [`amazon`](Self::amazon).
    #[must_use]
    pub fn managed() -> Self {
        Self::amazon()
    }

    /// Returns the backends whose payload is populated, in dispatch order.
    #[must_use]
    pub fn populated(&self) -> Vec<Backend> {
        let mut backends = Vec::new();
        if self.docker.is_some() {
            backends.push(Backend::Docker);
        }
        if self.kubernetes.is_some() {
            backends.push(Backend::Kubernetes);
        }
        if self.amazon.is_some() {
            backends.push(Backend::Amazon);
        }
        backends
    }

    /// Turns the selection into the closed backend union.
    ///
    /// # Errors
    ///
    /// - [`RedisError::UnknownBackend`] if no payload is populated
    /// - [`RedisError::AmbiguousBackend`] if more than one is
    pub fn select(self) -> Result<BackendArgs, RedisError> {
        match self {
            Self {
                docker: Some(docker),
                kubernetes: None,
                amazon: None,
            } => Ok(BackendArgs::Docker(docker)),
            Self {
                docker: None,
                kubernetes: Some(kubernetes),
                amazon: None,
            } => Ok(BackendArgs::Kubernetes(kubernetes)),
            Self {
                docker: None,
                kubernetes: None,
                amazon: Some(amazon),
            } => Ok(BackendArgs::Amazon(amazon)),
            Self {
                docker: None,
                kubernetes: None,
                amazon: None,
            } => Err(RedisError::none_selected()),
            ambiguous => Err(RedisError::AmbiguousBackend(ambiguous.populated())),
        }
    }
}

impl From<BackendArgs> for RedisArgs {
    fn from(args: BackendArgs) -> Self {
        match args {
            BackendArgs::Docker(docker) => Self::docker(docker),
            BackendArgs::Kubernetes(_) => Self::kubernetes(),
            BackendArgs::Amazon(_) => Self::amazon(),
        }
    }
}
