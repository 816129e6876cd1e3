//! Simulated Docker engine.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::random_id;
use crate::ApiError;
use crate::docker::{
    ContainerInfo, ContainerSpec, DockerApi, ImageInfo, ImageSpec, NetworkInfo, NetworkSpec,
    PortMapping,
};

/// First host port handed out when a container does not pick one.
const EPHEMERAL_PORT_START: u16 = 32768;

#[derive(Default)]
struct Engine {
    networks: Vec<NetworkSpec>,
    images: Vec<ImageSpec>,
    containers: Vec<ContainerSpec>,
    next_port: u16,
}

/// In-memory [`DockerApi`].
///
/// Networks and container names must be unique. Containers may only attach
/// to networks created through this engine or declared with
/// [`with_network`](Self::with_network).
#[derive(Default)]
pub struct SimDocker {
    engine: Mutex<Engine>,
    failing_pulls: BTreeMap<String, String>,
}

impl SimDocker {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a network that already exists on the engine.
    #[must_use]
    pub fn with_network(self, name: impl Into<String>) -> Self {
        self.engine.lock().networks.push(NetworkSpec { name: name.into() });
        self
    }

    /// Makes pulls of `image` fail with `message`.
    #[must_use]
    pub fn fail_pull(mut self, image: impl Into<String>, message: impl Into<String>) -> Self {
        self.failing_pulls.insert(image.into(), message.into());
        self
    }

    /// Returns the networks created so far, including declared ones.
    #[must_use]
    pub fn networks(&self) -> Vec<NetworkSpec> {
        self.engine.lock().networks.clone()
    }

    /// Returns the images pulled so far.
    #[must_use]
    pub fn images(&self) -> Vec<ImageSpec> {
        self.engine.lock().images.clone()
    }

    /// Returns the containers created so far.
    #[must_use]
    pub fn containers(&self) -> Vec<ContainerSpec> {
        self.engine.lock().containers.clone()
    }
}

#[async_trait]
impl DockerApi for SimDocker {
    async fn create_network(&self, spec: NetworkSpec) -> Result<NetworkInfo, ApiError> {
        let mut engine = self.engine.lock();
        if engine.networks.iter().any(|n| n.name == spec.name) {
            return Err(ApiError::Conflict {
                kind: "network",
                name: spec.name,
            });
        }
        engine.networks.push(spec.clone());
        Ok(NetworkInfo {
            id: random_id(""),
            name: spec.name,
        })
    }

    async fn pull_image(&self, spec: ImageSpec) -> Result<ImageInfo, ApiError> {
        if let Some(message) = self.failing_pulls.get(&spec.name) {
            return Err(ApiError::Rejected(message.clone()));
        }
        self.engine.lock().images.push(spec.clone());
        Ok(ImageInfo {
            name: spec.name,
            image_id: random_id("sha256:"),
        })
    }

    async fn create_container(&self, spec: ContainerSpec) -> Result<ContainerInfo, ApiError> {
        let mut engine = self.engine.lock();
        if engine.containers.iter().any(|c| c.name == spec.name) {
            return Err(ApiError::Conflict {
                kind: "container",
                name: spec.name,
            });
        }
        if let Some(missing) = spec
            .networks
            .iter()
            .find(|name| !engine.networks.iter().any(|n| &n.name == *name))
        {
            return Err(ApiError::NotFound {
                kind: "network",
                name: missing.clone(),
            });
        }

        let mut ports = Vec::with_capacity(spec.ports.len());
        for port in &spec.ports {
            let external = match port.external {
                Some(external) => external,
                None => {
                    let assigned = EPHEMERAL_PORT_START + engine.next_port;
                    engine.next_port += 1;
                    assigned
                }
            };
            ports.push(PortMapping::new(port.internal, external));
        }

        engine.containers.push(spec.clone());
        Ok(ContainerInfo {
            id: random_id(""),
            name: spec.name,
            ports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::RestartPolicy;

    fn container(name: &str, networks: &[&str]) -> ContainerSpec {
        ContainerSpec {
            name: name.into(),
            image: "redis:latest".into(),
            networks: networks.iter().map(ToString::to_string).collect(),
            envs: Vec::new(),
            ports: vec![PortMapping {
                internal: 6379,
                external: None,
            }],
            restart: RestartPolicy::OnFailure,
        }
    }

    #[tokio::test]
    async fn assigns_ephemeral_ports() {
        let docker = SimDocker::new().with_network("net");
        let info = docker.create_container(container("a", &["net"])).await.unwrap();
        assert_eq!(info.ports, vec![PortMapping::new(6379, EPHEMERAL_PORT_START)]);
    }

    #[tokio::test]
    async fn rejects_unknown_network() {
        let docker = SimDocker::new();
        let error = docker.create_container(container("a", &["net"])).await.unwrap_err();
        assert_eq!(
            error,
            ApiError::NotFound {
                kind: "network",
                name: "net".into()
            }
        );
    }

    #[tokio::test]
    async fn rejects_duplicate_container() {
        let docker = SimDocker::new();
        docker.create_container(container("a", &[])).await.unwrap();
        assert!(matches!(
            docker.create_container(container("a", &[])).await,
            Err(ApiError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn scripted_pull_failure() {
        let docker = SimDocker::new().fail_pull("redis:latest", "manifest unknown");
        let spec = ImageSpec {
            name: "redis:latest".into(),
            keep_locally: true,
        };
        assert_eq!(
            docker.pull_image(spec).await,
            Err(ApiError::Rejected("manifest unknown".into()))
        );
        assert!(docker.images().is_empty());
    }
}
