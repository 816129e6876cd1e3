//! Simulated ElastiCache.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::ApiError;
use crate::aws::elasticache::{CacheNode, ClusterInfo, ClusterSpec, ElastiCacheApi};

/// In-memory [`ElastiCacheApi`].
///
/// Clusters report one node per requested node unless
/// [`with_node_count`](Self::with_node_count) overrides it.
#[derive(Default)]
pub struct SimElastiCache {
    clusters: Mutex<Vec<ClusterSpec>>,
    node_count: Option<u32>,
    failure: Option<String>,
}

impl SimElastiCache {
    /// Creates an empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `count` nodes for every cluster, regardless of the request.
    #[must_use]
    pub fn with_node_count(mut self, count: u32) -> Self {
        self.node_count = Some(count);
        self
    }

    /// Makes every creation fail with `message`.
    #[must_use]
    pub fn fail_creates(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns the clusters created so far.
    #[must_use]
    pub fn clusters(&self) -> Vec<ClusterSpec> {
        self.clusters.lock().clone()
    }
}

#[async_trait]
impl ElastiCacheApi for SimElastiCache {
    async fn create_cluster(&self, spec: ClusterSpec) -> Result<ClusterInfo, ApiError> {
        if let Some(message) = &self.failure {
            return Err(ApiError::Unavailable(message.clone()));
        }
        let mut clusters = self.clusters.lock();
        if clusters.iter().any(|c| c.cluster_id == spec.cluster_id) {
            return Err(ApiError::Conflict {
                kind: "cache cluster",
                name: spec.cluster_id,
            });
        }

        let port = if spec.engine == "memcached" { 11211 } else { 6379 };
        let cache_nodes = (1..=self.node_count.unwrap_or(spec.num_cache_nodes))
            .map(|n| CacheNode {
                id: format!("{n:04}"),
                address: format!("{}.{n:04}.sim.cache.amazonaws.com", spec.cluster_id),
                port,
            })
            .collect();

        let info = ClusterInfo {
            cluster_id: spec.cluster_id.clone(),
            cache_nodes,
        };
        clusters.push(spec);
        Ok(info)
    }
}
