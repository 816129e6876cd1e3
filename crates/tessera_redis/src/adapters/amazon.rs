use tessera_providers::aws::elasticache::{CLUSTER_TYPE, Cluster, ClusterArgs, ElastiCacheApi};
use tessera_system::output::{Output, OutputError};
use tessera_system::resource::{Outputs, ResourceId, ResourceOptions, ResourceType};
use tessera_system::stack::Stack;

use crate::args::AmazonRedisArgs;
use crate::error::RedisError;

/// Type token of [`AmazonRedis`].
pub const AMAZON_REDIS_TYPE: ResourceType = ResourceType::from_static("tessera:aws:Redis");

const NODE_TYPE: &str = "cache.t2.micro";

/// Redis on a single-node ElastiCache cluster. `host` is the address of the
/// first cache node.
#[derive(Debug, Clone)]
pub struct AmazonRedis {
    /// Component identifier.
    pub id: ResourceId,
    /// The cache cluster.
    pub cluster: Cluster,
    /// Address of the first cache node.
    pub host: Output<String>,
}

impl AmazonRedis {
    /// Registers the component and issues the cluster creation.
    ///
    /// `host` fails with [`OutputError::AddressUnavailable`] if the cluster
    /// reports no cache nodes.
    ///
    /// # Errors
    ///
    /// Returns [`RedisError::Resource`] if a name is taken or no AWS provider
    /// is available. Nothing is registered in that case.
    pub fn new(
        stack: &Stack,
        name: &str,
        _args: AmazonRedisArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, RedisError> {
        stack.resolve_provider::<dyn ElastiCacheApi>(&CLUSTER_TYPE, opts)?;
        let id = stack.register_resource(AMAZON_REDIS_TYPE, name, opts)?;

        let cluster = Cluster::new(
            stack,
            &format!("{name}-ec"),
            ClusterArgs {
                cluster_id: None,
                engine: "redis".into(),
                node_type: NODE_TYPE.into(),
                num_cache_nodes: 1,
            },
            &opts.for_child(id),
        )?;

        let cluster_name = name.to_string();
        let host = cluster.cache_nodes.try_map(move |nodes| {
            nodes
                .into_iter()
                .next()
                .map(|node| node.address)
                .ok_or_else(|| {
                    OutputError::address_unavailable(format!("cluster {cluster_name}-ec has no cache nodes"))
                })
        });
        stack.register_outputs(id, Outputs::new().with("host", &host))?;
        tracing::debug!(redis = name, "amazon redis declared");

        Ok(Self { id, cluster, host })
    }
}
