use std::collections::BTreeMap;

use tessera_providers::kubernetes::{
    DEPLOYMENT_TYPE, Deployment, DeploymentArgs, KubernetesApi, PodContainer, Service, ServiceArgs,
    ServicePort, ServiceType,
};
use tessera_system::output::{Output, OutputError};
use tessera_system::resource::{Outputs, ResourceId, ResourceOptions, ResourceType};
use tessera_system::stack::Stack;

use super::{REDIS_IMAGE, REDIS_PORT};
use crate::args::KubernetesRedisArgs;
use crate::error::RedisError;

/// Type token of [`KubernetesRedis`].
pub const KUBERNETES_REDIS_TYPE: ResourceType = ResourceType::from_static("tessera:k8s:Redis");

/// Redis running as a single-replica Deployment behind a `LoadBalancer`
/// Service.
///
/// Both objects carry the label `app=<name>`, which the Service selects on.
/// `host` is the first load-balancer ingress address.
#[derive(Debug, Clone)]
pub struct KubernetesRedis {
    /// Component identifier.
    pub id: ResourceId,
    /// The Redis Deployment.
    pub deployment: Deployment,
    /// The Service exposing it.
    pub service: Service,
    /// Externally reachable address of the Service.
    pub host: Output<String>,
}

impl KubernetesRedis {
    /// Registers the component and applies its Deployment and Service.
    ///
    /// `host` fails with [`OutputError::AddressUnavailable`] if the Service
    /// reports no ingress.
    ///
    /// # Errors
    ///
    /// Returns [`RedisError::Resource`] if a name is taken or no Kubernetes
    /// provider is available. Nothing is registered in that case.
    pub fn new(
        stack: &Stack,
        name: &str,
        _args: KubernetesRedisArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, RedisError> {
        stack.resolve_provider::<dyn KubernetesApi>(&DEPLOYMENT_TYPE, opts)?;
        let id = stack.register_resource(KUBERNETES_REDIS_TYPE, name, opts)?;
        let child = opts.for_child(id);
        let labels = BTreeMap::from([("app".to_string(), name.to_string())]);

        let deployment = Deployment::new(
            stack,
            &format!("{name}-deploy"),
            DeploymentArgs {
                name: None,
                labels: labels.clone(),
                replicas: 1,
                containers: vec![PodContainer {
                    name: "redis".into(),
                    image: REDIS_IMAGE.into(),
                    container_ports: vec![REDIS_PORT],
                }],
            },
            &child,
        )?;
        let service = Service::new(
            stack,
            &format!("{name}-svc"),
            ServiceArgs {
                name: None,
                labels: labels.clone(),
                service_type: ServiceType::LoadBalancer,
                selector: labels,
                ports: vec![ServicePort {
                    port: REDIS_PORT,
                    target_port: REDIS_PORT,
                }],
            },
            &child,
        )?;

        let service_name = name.to_string();
        let host = service.status.try_map(move |status| {
            status
                .load_balancer
                .ingress
                .first()
                .and_then(|ingress| ingress.address())
                .map(str::to_string)
                .ok_or_else(|| {
                    OutputError::address_unavailable(format!(
                        "service {service_name}-svc has no load balancer ingress"
                    ))
                })
        });
        stack.register_outputs(id, Outputs::new().with("host", &host))?;
        tracing::debug!(redis = name, "kubernetes redis declared");

        Ok(Self {
            id,
            deployment,
            service,
            host,
        })
    }
}
