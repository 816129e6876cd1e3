//! Kubernetes backend.
//!
//! Resources are created against the provider selected for the
//! `kubernetes` package, an implementation of [`KubernetesApi`] installed
//! with [`KubernetesPlugin`]. Manifests are applied server-side; the
//! returned object carries the status fields dependents read.

mod api;
mod plugin;
mod resources;

pub use api::{
    DeploymentInfo, DeploymentManifest, KubernetesApi, LoadBalancerIngress, LoadBalancerStatus,
    ObjectMeta, PodContainer, ServiceInfo, ServiceManifest, ServicePort, ServiceStatus, ServiceType,
};
pub use plugin::KubernetesPlugin;
pub use resources::{DEPLOYMENT_TYPE, Deployment, DeploymentArgs, SERVICE_TYPE, Service, ServiceArgs};

/// Package name used for provider selection.
pub const PACKAGE: &str = "kubernetes";
