//! ElastiCache clusters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tessera_system::output::Output;
use tessera_system::resource::{Outputs, ResourceError, ResourceId, ResourceOptions, ResourceType};
use tessera_system::stack::Stack;

use crate::{ApiError, physical_name, provisioning_error};

/// Type token of [`Cluster`].
pub const CLUSTER_TYPE: ResourceType = ResourceType::from_static("aws:elasticache:Cluster");

/// Request to create a cache cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Cluster identifier.
    pub cluster_id: String,
    /// Cache engine, `redis` or `memcached`.
    pub engine: String,
    /// Node instance type, e.g. `cache.t2.micro`.
    pub node_type: String,
    /// Number of cache nodes.
    pub num_cache_nodes: u32,
}

/// One node of a cache cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheNode {
    /// Node identifier, e.g. `0001`.
    pub id: String,
    /// DNS address of the node.
    pub address: String,
    /// Port the engine listens on.
    pub port: u16,
}

/// A created cache cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    /// Cluster identifier.
    pub cluster_id: String,
    /// Nodes of the cluster. May be empty while nodes are still being created.
    pub cache_nodes: Vec<CacheNode>,
}

/// Trait implemented by ElastiCache clients.
#[async_trait]
pub trait ElastiCacheApi: Send + Sync + 'static {
    /// Creates a cluster and waits until it is available.
    async fn create_cluster(&self, spec: ClusterSpec) -> Result<ClusterInfo, ApiError>;
}

/// Arguments for [`Cluster`].
#[derive(Debug, Clone)]
pub struct ClusterArgs {
    /// Cluster identifier. Generated from the logical name when unset.
    pub cluster_id: Option<String>,
    /// Cache engine.
    pub engine: String,
    /// Node instance type.
    pub node_type: String,
    /// Number of cache nodes.
    pub num_cache_nodes: u32,
}

/// An ElastiCache cluster.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Resource identifier.
    pub id: ResourceId,
    /// Cluster identifier.
    pub cluster_id: Output<String>,
    /// Nodes of the cluster.
    pub cache_nodes: Output<Vec<CacheNode>>,
}

impl Cluster {
    /// Registers the cluster and issues its creation.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the name is taken under the same parent
    /// or no AWS provider is available.
    pub fn new(
        stack: &Stack,
        name: &str,
        args: ClusterArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, ResourceError> {
        let api = stack.resolve_provider::<dyn ElastiCacheApi>(&CLUSTER_TYPE, opts)?;
        let id = stack.register_resource(CLUSTER_TYPE, name, opts)?;
        let urn = stack.urn(id)?;
        let spec = ClusterSpec {
            cluster_id: args.cluster_id.unwrap_or_else(|| physical_name(name)),
            engine: args.engine,
            node_type: args.node_type,
            num_cache_nodes: args.num_cache_nodes,
        };

        tracing::debug!(%urn, cluster = %spec.cluster_id, engine = %spec.engine, "creating cache cluster");
        let info = stack.issue(id, async move {
            api.create_cluster(spec).await.map_err(provisioning_error(&urn))
        })?;

        let cluster = Self {
            id,
            cluster_id: info.map(|info| info.cluster_id),
            cache_nodes: info.map(|info| info.cache_nodes),
        };
        stack.register_outputs(
            id,
            Outputs::new()
                .with("clusterId", &cluster.cluster_id)
                .with("cacheNodes", &cluster.cache_nodes),
        )?;
        Ok(cluster)
    }
}
