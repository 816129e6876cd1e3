//! In-memory provider APIs.
//!
//! Every simulated backend records the requests it receives and answers
//! from a script: by default each call succeeds with plausible values, and
//! builder methods inject the edge cases dependents must cope with (an empty
//! ingress list, a cluster with no nodes, a failing pull).
//!
//! ```
//! use tessera_providers::sim::{SimBackends, SimKubernetes};
//! use tessera_system::plugin::PluginGroup;
//! use tessera_system::stack::StackBuilder;
//!
//! let backends = SimBackends::new().with_kubernetes(SimKubernetes::new().with_ingress(vec![]));
//! let stack = StackBuilder::new("test")
//!     .add_plugins(backends.clone().build())
//!     .build()
//!     .unwrap();
//! assert_eq!(stack.providers().names().len(), 3);
//! ```

mod docker;
mod elasticache;
mod kubernetes;

pub use docker::SimDocker;
pub use elasticache::SimElastiCache;
pub use kubernetes::SimKubernetes;

use std::sync::Arc;

use tessera_system::plugin::{PluginGroup, PluginGroupBuilder};

use crate::aws::AwsPlugin;
use crate::docker::DockerPlugin;
use crate::kubernetes::KubernetesPlugin;

/// One simulated API per backend, registered as the default providers.
///
/// Clones share the same simulated state, so a test can keep a handle and
/// inspect what was provisioned after the stack has run.
#[derive(Clone, Default)]
pub struct SimBackends {
    /// Simulated Docker engine.
    pub docker: Arc<SimDocker>,
    /// Simulated Kubernetes cluster.
    pub kubernetes: Arc<SimKubernetes>,
    /// Simulated ElastiCache.
    pub elasticache: Arc<SimElastiCache>,
}

impl SimBackends {
    /// Creates backends that succeed on every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the Docker engine.
    #[must_use]
    pub fn with_docker(mut self, docker: SimDocker) -> Self {
        self.docker = Arc::new(docker);
        self
    }

    /// Replaces the Kubernetes cluster.
    #[must_use]
    pub fn with_kubernetes(mut self, kubernetes: SimKubernetes) -> Self {
        self.kubernetes = Arc::new(kubernetes);
        self
    }

    /// Replaces ElastiCache.
    #[must_use]
    pub fn with_elasticache(mut self, elasticache: SimElastiCache) -> Self {
        self.elasticache = Arc::new(elasticache);
        self
    }
}

impl PluginGroup for SimBackends {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(DockerPlugin::new(self.docker))
            .add(KubernetesPlugin::new(self.kubernetes))
            .add(AwsPlugin::new(self.elasticache))
    }
}

fn random_id(prefix: &str) -> String {
    format!("{prefix}{}", nanoid::nanoid!(12, &HEX))
}

const HEX: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];
