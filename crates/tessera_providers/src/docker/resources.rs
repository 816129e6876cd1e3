//! Docker resources.

use tessera_system::output::{Combine, Output};
use tessera_system::resource::{Outputs, ResourceError, ResourceId, ResourceOptions, ResourceType};
use tessera_system::stack::Stack;

use super::api::{ContainerSpec, DockerApi, ImageSpec, NetworkSpec, PortMapping, RestartPolicy};
use crate::{physical_name, provisioning_error};

/// Type token of [`Network`].
pub const NETWORK_TYPE: ResourceType = ResourceType::from_static("docker:index:Network");

/// Type token of [`RemoteImage`].
pub const REMOTE_IMAGE_TYPE: ResourceType = ResourceType::from_static("docker:index:RemoteImage");

/// Type token of [`Container`].
pub const CONTAINER_TYPE: ResourceType = ResourceType::from_static("docker:index:Container");

// ─────────────────────────────────────────────────────────────────────────────
// Network
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for [`Network`].
#[derive(Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Physical network name. Generated from the logical name when unset.
    pub name: Option<String>,
}

/// A user-defined Docker network.
#[derive(Debug, Clone)]
pub struct Network {
    /// Resource identifier.
    pub id: ResourceId,
    /// Network name, as attached to containers.
    pub name: Output<String>,
    /// Engine-assigned identifier.
    pub network_id: Output<String>,
}

impl Network {
    /// Registers the network and issues its creation.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the name is taken under the same parent
    /// or no Docker provider is available.
    pub fn new(
        stack: &Stack,
        name: &str,
        args: NetworkArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, ResourceError> {
        let api = stack.resolve_provider::<dyn DockerApi>(&NETWORK_TYPE, opts)?;
        let id = stack.register_resource(NETWORK_TYPE, name, opts)?;
        let urn = stack.urn(id)?;
        let spec = NetworkSpec {
            name: args.name.unwrap_or_else(|| physical_name(name)),
        };

        tracing::debug!(%urn, network = %spec.name, "creating network");
        let info = stack.issue(id, async move {
            api.create_network(spec).await.map_err(provisioning_error(&urn))
        })?;

        let network = Self {
            id,
            name: info.map(|info| info.name),
            network_id: info.map(|info| info.id),
        };
        stack.register_outputs(
            id,
            Outputs::new()
                .with("name", &network.name)
                .with("id", &network.network_id),
        )?;
        Ok(network)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RemoteImage
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for [`RemoteImage`].
#[derive(Debug, Clone)]
pub struct RemoteImageArgs {
    /// Image reference, e.g. `redis:latest`.
    pub name: String,
    /// Keep the image on the host when the resource is deleted.
    pub keep_locally: bool,
}

impl RemoteImageArgs {
    /// Pulls `name` and keeps it on the host.
    #[must_use]
    pub fn kept(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keep_locally: true,
        }
    }
}

/// An image pulled from a registry.
#[derive(Debug, Clone)]
pub struct RemoteImage {
    /// Resource identifier.
    pub id: ResourceId,
    /// Image reference, known once the pull completes.
    pub name: Output<String>,
    /// Content-addressed image identifier.
    pub image_id: Output<String>,
}

impl RemoteImage {
    /// Registers the image and issues the pull.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the name is taken under the same parent
    /// or no Docker provider is available.
    pub fn new(
        stack: &Stack,
        name: &str,
        args: RemoteImageArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, ResourceError> {
        let api = stack.resolve_provider::<dyn DockerApi>(&REMOTE_IMAGE_TYPE, opts)?;
        let id = stack.register_resource(REMOTE_IMAGE_TYPE, name, opts)?;
        let urn = stack.urn(id)?;
        let spec = ImageSpec {
            name: args.name,
            keep_locally: args.keep_locally,
        };

        tracing::debug!(%urn, image = %spec.name, "pulling image");
        let info = stack.issue(id, async move {
            api.pull_image(spec).await.map_err(provisioning_error(&urn))
        })?;

        let image = Self {
            id,
            name: info.map(|info| info.name),
            image_id: info.map(|info| info.image_id),
        };
        stack.register_outputs(
            id,
            Outputs::new()
                .with("name", &image.name)
                .with("imageId", &image.image_id),
        )?;
        Ok(image)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for [`Container`].
///
/// Inputs given as Outputs are joined before the container is created, so
/// the creation call only starts once the image, every network and every
/// environment entry are known.
#[derive(Debug, Clone, Default)]
pub struct ContainerArgs {
    /// Physical container name. Generated from the logical name when unset.
    pub name: Option<String>,
    /// Image reference.
    pub image: Output<String>,
    /// Networks to attach to, by name.
    pub networks: Vec<Output<String>>,
    /// Environment entries in `KEY=value` form.
    pub envs: Vec<Output<String>>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Restart policy.
    pub restart: RestartPolicy,
}

/// A running container.
#[derive(Debug, Clone)]
pub struct Container {
    /// Resource identifier.
    pub id: ResourceId,
    /// Container name.
    pub name: Output<String>,
    /// Engine-assigned identifier.
    pub container_id: Output<String>,
    /// Published ports with host ports assigned.
    pub ports: Output<Vec<PortMapping>>,
}

impl Container {
    /// Registers the container and issues its creation once every input is
    /// known.
    ///
    /// If any input fails, creation is skipped and every output of the
    /// container fails with the same error.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the name is taken under the same parent
    /// or no Docker provider is available.
    pub fn new(
        stack: &Stack,
        name: &str,
        args: ContainerArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, ResourceError> {
        let api = stack.resolve_provider::<dyn DockerApi>(&CONTAINER_TYPE, opts)?;
        let id = stack.register_resource(CONTAINER_TYPE, name, opts)?;
        let urn = stack.urn(id)?;
        let container_name = args.name.unwrap_or_else(|| physical_name(name));
        let ports = args.ports;
        let restart = args.restart;

        let inputs = (args.image, Output::all(args.networks), Output::all(args.envs)).combine();
        let info = stack.issue_with(id, &inputs, move |(image, networks, envs)| async move {
            let spec = ContainerSpec {
                name: container_name,
                image,
                networks,
                envs,
                ports,
                restart,
            };
            tracing::debug!(%urn, container = %spec.name, image = %spec.image, "creating container");
            api.create_container(spec).await.map_err(provisioning_error(&urn))
        })?;

        let container = Self {
            id,
            name: info.map(|info| info.name),
            container_id: info.map(|info| info.id),
            ports: info.map(|info| info.ports),
        };
        stack.register_outputs(
            id,
            Outputs::new()
                .with("name", &container.name)
                .with("id", &container.container_id)
                .with("ports", &container.ports),
        )?;
        Ok(container)
    }
}
