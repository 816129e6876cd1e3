//! Docker provider plugin.

use std::sync::Arc;

use tessera_system::plugin::Plugin;
use tessera_system::provider::{DEFAULT_PROVIDER, ProviderRef};
use tessera_system::stack::{StackBuilder, StackError};

use super::PACKAGE;
use super::api::DockerApi;

/// Plugin installing a [`DockerApi`] implementation.
///
/// Registers as `docker::default` unless [`named`](Self::named). Several
/// instances may be added, one per engine.
pub struct DockerPlugin {
    name: String,
    api: Arc<dyn DockerApi>,
}

impl DockerPlugin {
    /// Creates a plugin registering `api` as the default Docker provider.
    #[must_use]
    pub fn new(api: Arc<dyn DockerApi>) -> Self {
        Self {
            name: DEFAULT_PROVIDER.to_string(),
            api,
        }
    }

    /// Registers under a different instance name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the reference this plugin registers under.
    #[must_use]
    pub fn provider(&self) -> ProviderRef {
        ProviderRef::new(PACKAGE, self.name.clone())
    }
}

impl Plugin for DockerPlugin {
    fn build(&self, stack: &mut StackBuilder) -> Result<(), StackError> {
        stack.register_provider(self.provider(), Arc::clone(&self.api))
    }

    fn is_unique(&self) -> bool {
        false
    }
}
