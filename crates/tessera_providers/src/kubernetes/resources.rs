//! Kubernetes resources.

use std::collections::BTreeMap;

use tessera_system::output::Output;
use tessera_system::resource::{Outputs, ResourceError, ResourceId, ResourceOptions, ResourceType};
use tessera_system::stack::Stack;

use super::api::{
    DeploymentManifest, KubernetesApi, ObjectMeta, PodContainer, ServiceManifest, ServicePort,
    ServiceStatus, ServiceType,
};
use crate::{physical_name, provisioning_error};

/// Type token of [`Deployment`].
pub const DEPLOYMENT_TYPE: ResourceType = ResourceType::from_static("kubernetes:apps/v1:Deployment");

/// Type token of [`Service`].
pub const SERVICE_TYPE: ResourceType = ResourceType::from_static("kubernetes:core/v1:Service");

/// Arguments for [`Deployment`].
#[derive(Debug, Clone, Default)]
pub struct DeploymentArgs {
    /// Object name. Generated from the logical name when unset.
    pub name: Option<String>,
    /// Labels applied to the Deployment, its selector and its pods.
    pub labels: BTreeMap<String, String>,
    /// Desired pod count.
    pub replicas: u32,
    /// Pod containers.
    pub containers: Vec<PodContainer>,
}

/// An `apps/v1` Deployment.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Resource identifier.
    pub id: ResourceId,
    /// Object name.
    pub name: Output<String>,
    /// Replicas reported ready after rollout.
    pub ready_replicas: Output<u32>,
}

impl Deployment {
    /// Registers the Deployment and issues the apply.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the name is taken under the same parent
    /// or no Kubernetes provider is available.
    pub fn new(
        stack: &Stack,
        name: &str,
        args: DeploymentArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, ResourceError> {
        let api = stack.resolve_provider::<dyn KubernetesApi>(&DEPLOYMENT_TYPE, opts)?;
        let id = stack.register_resource(DEPLOYMENT_TYPE, name, opts)?;
        let urn = stack.urn(id)?;
        let manifest = DeploymentManifest {
            metadata: ObjectMeta {
                name: args.name.unwrap_or_else(|| physical_name(name)),
                labels: args.labels.clone(),
            },
            replicas: args.replicas,
            match_labels: args.labels,
            containers: args.containers,
        };

        tracing::debug!(%urn, deployment = %manifest.metadata.name, "applying deployment");
        let info = stack.issue(id, async move {
            api.apply_deployment(manifest)
                .await
                .map_err(provisioning_error(&urn))
        })?;

        let deployment = Self {
            id,
            name: info.map(|info| info.name),
            ready_replicas: info.map(|info| info.ready_replicas),
        };
        stack.register_outputs(
            id,
            Outputs::new()
                .with("name", &deployment.name)
                .with("readyReplicas", &deployment.ready_replicas),
        )?;
        Ok(deployment)
    }
}

/// Arguments for [`Service`].
#[derive(Debug, Clone, Default)]
pub struct ServiceArgs {
    /// Object name. Generated from the logical name when unset.
    pub name: Option<String>,
    /// Labels applied to the Service.
    pub labels: BTreeMap<String, String>,
    /// Exposure type.
    pub service_type: ServiceType,
    /// Labels selecting the backing pods.
    pub selector: BTreeMap<String, String>,
    /// Exposed ports.
    pub ports: Vec<ServicePort>,
}

/// A `core/v1` Service.
#[derive(Debug, Clone)]
pub struct Service {
    /// Resource identifier.
    pub id: ResourceId,
    /// Object name.
    pub name: Output<String>,
    /// Observed status, including load-balancer ingress points.
    pub status: Output<ServiceStatus>,
}

impl Service {
    /// Registers the Service and issues the apply.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the name is taken under the same parent
    /// or no Kubernetes provider is available.
    pub fn new(
        stack: &Stack,
        name: &str,
        args: ServiceArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, ResourceError> {
        let api = stack.resolve_provider::<dyn KubernetesApi>(&SERVICE_TYPE, opts)?;
        let id = stack.register_resource(SERVICE_TYPE, name, opts)?;
        let urn = stack.urn(id)?;
        let manifest = ServiceManifest {
            metadata: ObjectMeta {
                name: args.name.unwrap_or_else(|| physical_name(name)),
                labels: args.labels,
            },
            service_type: args.service_type,
            selector: args.selector,
            ports: args.ports,
        };

        tracing::debug!(%urn, service = %manifest.metadata.name, "applying service");
        let info = stack.issue(id, async move {
            api.apply_service(manifest).await.map_err(provisioning_error(&urn))
        })?;

        let service = Self {
            id,
            name: info.map(|info| info.name),
            status: info.map(|info| info.status),
        };
        stack.register_outputs(
            id,
            Outputs::new()
                .with("name", &service.name)
                .with("status", &service.status),
        )?;
        Ok(service)
    }
}
