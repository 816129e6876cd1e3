use tessera_providers::docker::{
    CONTAINER_TYPE, Container, ContainerArgs, DockerApi, RemoteImage, RemoteImageArgs, RestartPolicy,
};
use tessera_system::output::Output;
use tessera_system::resource::{Outputs, ResourceId, ResourceOptions, ResourceType};
use tessera_system::stack::Stack;

use super::REDIS_IMAGE;
use crate::args::DockerRedisArgs;
use crate::error::RedisError;

/// Type token of [`DockerRedis`].
pub const DOCKER_REDIS_TYPE: ResourceType = ResourceType::from_static("tessera:docker:Redis");

/// Redis running as a container on a Docker network.
///
/// Owns `<name>-image`, a kept pull of [`REDIS_IMAGE`], and
/// `<name>-container`, which runs the pulled image with an on-failure
/// restart policy. `host` is the container's name, which resolves on the
/// network the container joined.
#[derive(Debug, Clone)]
pub struct DockerRedis {
    /// Component identifier.
    pub id: ResourceId,
    /// The pulled image.
    pub image: RemoteImage,
    /// The running container.
    pub container: Container,
    /// Hostname of the container on its network.
    pub host: Output<String>,
}

impl DockerRedis {
    /// Registers the component and issues its image pull and container
    /// creation.
    ///
    /// # Errors
    ///
    /// - [`RedisError::MissingNetwork`] if `args` carries no network
    /// - [`RedisError::Resource`] if a name is taken or no Docker provider is
    ///   available
    ///
    /// Nothing is registered when either check fails.
    pub fn new(
        stack: &Stack,
        name: &str,
        args: DockerRedisArgs,
        opts: &ResourceOptions,
    ) -> Result<Self, RedisError> {
        let Some(network) = args.network else {
            return Err(RedisError::MissingNetwork { name: name.into() });
        };

        // Children inherit `opts`, so their provider can be checked before
        // the component is registered.
        stack.resolve_provider::<dyn DockerApi>(&CONTAINER_TYPE, opts)?;
        let id = stack.register_resource(DOCKER_REDIS_TYPE, name, opts)?;
        let child = opts.for_child(id);

        let image = RemoteImage::new(
            stack,
            &format!("{name}-image"),
            RemoteImageArgs::kept(REDIS_IMAGE),
            &child,
        )?;
        let container = Container::new(
            stack,
            &format!("{name}-container"),
            ContainerArgs {
                image: image.name.clone(),
                networks: vec![network],
                restart: RestartPolicy::OnFailure,
                ..ContainerArgs::default()
            },
            &child,
        )?;

        let host = container.name.clone();
        stack.register_outputs(id, Outputs::new().with("host", &host))?;
        tracing::debug!(redis = name, "docker redis declared");

        Ok(Self {
            id,
            image,
            container,
            host,
        })
    }
}
