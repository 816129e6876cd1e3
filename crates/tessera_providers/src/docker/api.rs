//! The Docker API consumed by resource constructors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Request to create a user-defined network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Network name.
    pub name: String,
}

/// A created network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Engine-assigned identifier.
    pub id: String,
    /// Network name.
    pub name: String,
}

/// Request to pull an image from a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Image reference, e.g. `redis:latest`.
    pub name: String,
    /// Keep the image on the host when the resource is deleted.
    pub keep_locally: bool,
}

/// A pulled image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Image reference as requested.
    pub name: String,
    /// Content-addressed image identifier.
    pub image_id: String,
}

/// Port published from a container to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port inside the container.
    pub internal: u16,
    /// Host port. When unset the engine picks one.
    pub external: Option<u16>,
}

impl PortMapping {
    /// Publishes `internal` on host port `external`.
    #[must_use]
    pub const fn new(internal: u16, external: u16) -> Self {
        Self {
            internal,
            external: Some(external),
        }
    }
}

/// Container restart policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Never restart.
    #[default]
    No,
    /// Restart when the process exits non-zero.
    OnFailure,
    /// Always restart.
    Always,
    /// Always restart unless explicitly stopped.
    UnlessStopped,
}

/// Request to create and start a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Networks to attach to, by name.
    pub networks: Vec<String>,
    /// Environment entries in `KEY=value` form.
    pub envs: Vec<String>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Restart policy.
    pub restart: RestartPolicy,
}

/// A running container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Engine-assigned identifier.
    pub id: String,
    /// Container name.
    pub name: String,
    /// Published ports with every host port assigned.
    pub ports: Vec<PortMapping>,
}

/// Trait implemented by Docker engine clients.
#[async_trait]
pub trait DockerApi: Send + Sync + 'static {
    /// Creates a network.
    async fn create_network(&self, spec: NetworkSpec) -> Result<NetworkInfo, ApiError>;

    /// Pulls an image.
    async fn pull_image(&self, spec: ImageSpec) -> Result<ImageInfo, ApiError>;

    /// Creates and starts a container.
    async fn create_container(&self, spec: ContainerSpec) -> Result<ContainerInfo, ApiError>;
}
