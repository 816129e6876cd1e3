//! Simulated Kubernetes cluster.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::ApiError;
use crate::kubernetes::{
    DeploymentInfo, DeploymentManifest, KubernetesApi, LoadBalancerIngress, LoadBalancerStatus,
    ServiceInfo, ServiceManifest, ServiceStatus, ServiceType,
};

#[derive(Default)]
struct Cluster {
    deployments: Vec<DeploymentManifest>,
    services: Vec<ServiceManifest>,
}

/// In-memory [`KubernetesApi`].
///
/// `LoadBalancer` Services report the scripted ingress list, one public IP
/// unless [`with_ingress`](Self::with_ingress) says otherwise. Applying an
/// object with an existing name replaces it.
pub struct SimKubernetes {
    cluster: Mutex<Cluster>,
    ingress: Vec<LoadBalancerIngress>,
    apply_failure: Option<String>,
}

impl Default for SimKubernetes {
    fn default() -> Self {
        Self {
            cluster: Mutex::new(Cluster::default()),
            ingress: vec![LoadBalancerIngress {
                ip: Some("203.0.113.10".into()),
                hostname: None,
            }],
            apply_failure: None,
        }
    }
}

impl SimKubernetes {
    /// Creates a cluster whose load balancers get one public IP.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ingress list reported for `LoadBalancer` Services.
    #[must_use]
    pub fn with_ingress(mut self, ingress: Vec<LoadBalancerIngress>) -> Self {
        self.ingress = ingress;
        self
    }

    /// Makes every apply fail with `message`.
    #[must_use]
    pub fn fail_applies(mut self, message: impl Into<String>) -> Self {
        self.apply_failure = Some(message.into());
        self
    }

    /// Returns the Deployments applied so far.
    #[must_use]
    pub fn deployments(&self) -> Vec<DeploymentManifest> {
        self.cluster.lock().deployments.clone()
    }

    /// Returns the Services applied so far.
    #[must_use]
    pub fn services(&self) -> Vec<ServiceManifest> {
        self.cluster.lock().services.clone()
    }

    fn check(&self) -> Result<(), ApiError> {
        match &self.apply_failure {
            Some(message) => Err(ApiError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KubernetesApi for SimKubernetes {
    async fn apply_deployment(&self, manifest: DeploymentManifest) -> Result<DeploymentInfo, ApiError> {
        self.check()?;
        let info = DeploymentInfo {
            name: manifest.metadata.name.clone(),
            ready_replicas: manifest.replicas,
        };
        let mut cluster = self.cluster.lock();
        cluster
            .deployments
            .retain(|d| d.metadata.name != manifest.metadata.name);
        cluster.deployments.push(manifest);
        Ok(info)
    }

    async fn apply_service(&self, manifest: ServiceManifest) -> Result<ServiceInfo, ApiError> {
        self.check()?;
        let mut cluster = self.cluster.lock();
        cluster
            .services
            .retain(|s| s.metadata.name != manifest.metadata.name);

        let ingress = match manifest.service_type {
            ServiceType::LoadBalancer => self.ingress.clone(),
            ServiceType::ClusterIp | ServiceType::NodePort => Vec::new(),
        };
        let info = ServiceInfo {
            name: manifest.metadata.name.clone(),
            cluster_ip: Some(format!("10.96.0.{}", cluster.services.len() + 10)),
            status: ServiceStatus {
                load_balancer: LoadBalancerStatus { ingress },
            },
        };
        cluster.services.push(manifest);
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::ObjectMeta;

    fn service(service_type: ServiceType) -> ServiceManifest {
        ServiceManifest {
            metadata: ObjectMeta {
                name: "redis-svc".into(),
                ..ObjectMeta::default()
            },
            service_type,
            selector: Default::default(),
            ports: Vec::new(),
        }
    }

    #[tokio::test]
    async fn only_load_balancers_get_ingress() {
        let k8s = SimKubernetes::new();
        let lb = k8s.apply_service(service(ServiceType::LoadBalancer)).await.unwrap();
        let internal = k8s.apply_service(service(ServiceType::ClusterIp)).await.unwrap();

        assert_eq!(lb.status.load_balancer.ingress.len(), 1);
        assert!(internal.status.load_balancer.ingress.is_empty());
        assert_eq!(k8s.services().len(), 1);
    }

    #[tokio::test]
    async fn scripted_empty_ingress() {
        let k8s = SimKubernetes::new().with_ingress(Vec::new());
        let info = k8s.apply_service(service(ServiceType::LoadBalancer)).await.unwrap();
        assert!(info.status.load_balancer.ingress.is_empty());
    }
}
