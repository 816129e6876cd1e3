//! The Kubernetes API consumed by resource constructors.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name.
    pub name: String,
    /// Object labels.
    pub labels: BTreeMap<String, String>,
}

/// Container within a pod template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodContainer {
    /// Container name within the pod.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Ports the container listens on.
    pub container_ports: Vec<u16>,
}

/// Desired state of an `apps/v1` Deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentManifest {
    /// Deployment metadata.
    pub metadata: ObjectMeta,
    /// Desired pod count.
    pub replicas: u32,
    /// Labels selecting the managed pods; also applied to the pod template.
    pub match_labels: BTreeMap<String, String>,
    /// Pod containers.
    pub containers: Vec<PodContainer>,
}

/// An applied Deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    /// Object name.
    pub name: String,
    /// Replicas reported ready.
    pub ready_replicas: u32,
}

/// Service exposure type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    /// Cluster-internal virtual IP.
    #[default]
    #[serde(rename = "ClusterIP")]
    ClusterIp,
    /// Port on every node.
    NodePort,
    /// External load balancer.
    LoadBalancer,
}

/// Port exposed by a Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port the Service listens on.
    pub port: u16,
    /// Port on the selected pods.
    pub target_port: u16,
}

/// Desired state of a `core/v1` Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManifest {
    /// Service metadata.
    pub metadata: ObjectMeta,
    /// Exposure type.
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Labels selecting the backing pods.
    pub selector: BTreeMap<String, String>,
    /// Exposed ports.
    pub ports: Vec<ServicePort>,
}

/// One load-balancer ingress point. At least one field is normally set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerIngress {
    /// IP address of the ingress point.
    pub ip: Option<String>,
    /// DNS name of the ingress point.
    pub hostname: Option<String>,
}

impl LoadBalancerIngress {
    /// Returns the address dependents should connect to, the IP if present,
    /// else the hostname.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.ip.as_deref().or(self.hostname.as_deref())
    }
}

/// Load-balancer status of a Service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerStatus {
    /// Ingress points; empty until the load balancer is provisioned.
    pub ingress: Vec<LoadBalancerIngress>,
}

/// Observed status of a Service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Load-balancer status.
    pub load_balancer: LoadBalancerStatus,
}

/// An applied Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    /// Object name.
    pub name: String,
    /// Cluster-internal IP.
    pub cluster_ip: Option<String>,
    /// Observed status.
    pub status: ServiceStatus,
}

/// Trait implemented by Kubernetes API clients.
#[async_trait]
pub trait KubernetesApi: Send + Sync + 'static {
    /// Applies a Deployment and waits for it to roll out.
    async fn apply_deployment(&self, manifest: DeploymentManifest) -> Result<DeploymentInfo, ApiError>;

    /// Applies a Service and returns its status once settled.
    async fn apply_service(&self, manifest: ServiceManifest) -> Result<ServiceInfo, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingress_prefers_ip() {
        let both = LoadBalancerIngress {
            ip: Some("203.0.113.7".into()),
            hostname: Some("lb.example.com".into()),
        };
        let dns_only = LoadBalancerIngress {
            ip: None,
            hostname: Some("lb.example.com".into()),
        };
        assert_eq!(both.address(), Some("203.0.113.7"));
        assert_eq!(dns_only.address(), Some("lb.example.com"));
        assert_eq!(LoadBalancerIngress::default().address(), None);
    }

    #[test]
    fn service_status_wire_shape() {
        let status: ServiceStatus = serde_json::from_value(serde_json::json!({
            "loadBalancer": { "ingress": [{ "ip": "10.1.2.3", "hostname": null }] }
        }))
        .unwrap();
        assert_eq!(status.load_balancer.ingress[0].address(), Some("10.1.2.3"));
    }
}
