//! Example Tessera program: Redis plus a redis-commander UI.
//!
//! The program declares a Docker network, a Redis on whichever backend the
//! settings select, and a redis-commander container pointed at that Redis
//! through `REDIS_HOST`. The commander is always a local container; only the
//! Redis moves between backends.
//!
//! # Resource Graph
//!
//! ```text
//! net (docker:index:Network)
//! redis (tessera:<backend>:Redis)
//! ├── ...backend primitives
//! redis-commander-image (docker:index:RemoteImage)
//! redis-commander (docker:index:Container)
//!     env REDIS_HOST=<redis.host>   ports 8081 -> 3000
//! ```
//!
//! # Exports
//!
//! | Name | Value |
//! |------|-------|
//! | `appName` | name of the redis-commander container |
//! | `host` | `http://localhost:<published port>` |

use tessera_providers::docker::{
    Container, ContainerArgs, Network, NetworkArgs, PortMapping, RemoteImage, RemoteImageArgs,
    RestartPolicy,
};
use tessera_redis::{Redis, RedisError, RedisSettings};
use tessera_system::output::{Output, OutputError};
use tessera_system::resource::{ResourceError, ResourceOptions};
use tessera_system::stack::Stack;

/// Image of the Redis browser.
pub const COMMANDER_IMAGE: &str = "rediscommander/redis-commander:latest";

/// Port redis-commander listens on inside its container.
pub const COMMANDER_PORT: u16 = 8081;

/// Host port redis-commander is published on.
pub const PUBLISHED_PORT: u16 = 3000;

/// Errors raised while declaring the program.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The Redis capability could not be created.
    #[error(transparent)]
    Redis(#[from] RedisError),

    /// A Docker resource could not be registered.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Handles to everything the program declares.
#[derive(Debug, Clone)]
pub struct App {
    /// Network shared by the commander and a Docker-backed Redis.
    pub network: Network,
    /// The Redis capability.
    pub redis: Redis,
    /// The redis-commander image.
    pub commander_image: RemoteImage,
    /// The redis-commander container.
    pub commander: Container,
    /// Name of the commander container, exported as `appName`.
    pub app_name: Output<String>,
    /// URL of the commander UI, exported as `host`.
    pub host: Output<String>,
}

/// Declares the program on `stack` and publishes its exports.
///
/// # Errors
///
/// Returns an [`AppError`] if the Redis backend cannot be selected or any
/// resource fails to register. Provisioning failures surface later, through
/// the exported Outputs.
pub fn build(stack: &Stack, settings: &RedisSettings) -> Result<App, AppError> {
    let opts = ResourceOptions::new();

    let network = Network::new(stack, &settings.network, NetworkArgs::default(), &opts)?;
    let redis = Redis::create(stack, "redis", settings.args(&network.name)?, &opts)?;

    let commander_image = RemoteImage::new(
        stack,
        "redis-commander-image",
        RemoteImageArgs::kept(COMMANDER_IMAGE),
        &opts,
    )?;
    let commander = Container::new(
        stack,
        "redis-commander",
        ContainerArgs {
            image: commander_image.name.clone(),
            networks: vec![network.name.clone()],
            envs: vec![redis.host().map(|host| format!("REDIS_HOST={host}"))],
            ports: vec![PortMapping::new(COMMANDER_PORT, PUBLISHED_PORT)],
            restart: RestartPolicy::OnFailure,
            ..ContainerArgs::default()
        },
        &opts,
    )?;

    let app_name = commander.name.clone();
    let host = commander.ports.try_map(|ports| {
        ports
            .first()
            .and_then(|port| port.external)
            .map(|port| format!("http://localhost:{port}"))
            .ok_or_else(|| OutputError::address_unavailable("redis-commander publishes no host port"))
    });

    stack.export("appName", &app_name);
    stack.export("host", &host);
    tracing::info!(stack = stack.name(), backend = %redis.backend(), "program declared");

    Ok(App {
        network,
        redis,
        commander_image,
        commander,
        app_name,
        host,
    })
}
