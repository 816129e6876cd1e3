//! Docker backend.
//!
//! Resources are created against the provider selected for the `docker`
//! package, an implementation of [`DockerApi`] installed with
//! [`DockerPlugin`].
//!
//! ```
//! # use std::sync::Arc;
//! # use tessera_providers::docker::{DockerApi, DockerPlugin};
//! # use tessera_system::stack::StackBuilder;
//! # fn api() -> Arc<dyn DockerApi> { unimplemented!() }
//! # fn demo() {
//! let stack = StackBuilder::new("dev")
//!     .add_plugins(DockerPlugin::new(api()))
//!     .build()
//!     .unwrap();
//! # }
//! ```

mod api;
mod plugin;
mod resources;

pub use api::{
    ContainerInfo, ContainerSpec, DockerApi, ImageInfo, ImageSpec, NetworkInfo, NetworkSpec,
    PortMapping, RestartPolicy,
};
pub use plugin::DockerPlugin;
pub use resources::{
    CONTAINER_TYPE, Container, ContainerArgs, NETWORK_TYPE, Network, NetworkArgs, REMOTE_IMAGE_TYPE,
    RemoteImage, RemoteImageArgs,
};

/// Package name used for provider selection.
pub const PACKAGE: &str = "docker";
