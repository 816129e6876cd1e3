//! Provider registry.
//!
//! Providers are the opaque backend APIs that perform provisioning calls
//! (a container runtime, a cluster API, a managed-cache API). The core never
//! interprets them: it stores each one type-erased under a [`ProviderRef`]
//! and hands it back to resource constructors by trait-object type.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

/// Name of the provider instance used when a resource selects none.
pub const DEFAULT_PROVIDER: &str = "default";

/// Reference to a provider instance: `<package>::<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderRef {
    package: String,
    name: String,
}

impl ProviderRef {
    /// Creates a reference to a named provider instance of `package`.
    #[must_use]
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Creates a reference to the default provider of `package`.
    #[must_use]
    pub fn default_for(package: impl Into<String>) -> Self {
        Self::new(package, DEFAULT_PROVIDER)
    }

    /// Returns the package this provider serves.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.package, self.name)
    }
}

/// Errors from provider registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// No provider is registered under the reference.
    #[error("provider not found: {0}")]
    NotFound(ProviderRef),

    /// A provider is already registered under the reference.
    #[error("provider already registered: {0}")]
    AlreadyRegistered(ProviderRef),

    /// The registered provider does not implement the requested API.
    #[error("provider {provider} does not implement {expected}")]
    TypeMismatch {
        /// The provider that was found.
        provider: ProviderRef,
        /// The API type that was requested.
        expected: &'static str,
    },
}

/// Registry of provider implementations.
///
/// Populated by plugins while a [`StackBuilder`](crate::stack::StackBuilder)
/// is being built; read-only once the stack exists.
///
/// ```
/// use std::sync::Arc;
/// use tessera_system::provider::{ProviderRef, ProviderRegistry};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let mut registry = ProviderRegistry::new();
/// let api: Arc<dyn Greeter> = Arc::new(English);
/// registry.register(ProviderRef::default_for("greet"), api).unwrap();
///
/// let greeter = registry.get::<dyn Greeter>(&ProviderRef::default_for("greet")).unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderRef, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider implementation.
    ///
    /// `A` is usually a trait object such as `dyn DockerApi`; lookups must
    /// request the same type.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AlreadyRegistered`] if `provider` is taken.
    pub fn register<A>(&mut self, provider: ProviderRef, api: Arc<A>) -> Result<(), ProviderError>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        if self.providers.contains_key(&provider) {
            return Err(ProviderError::AlreadyRegistered(provider));
        }
        tracing::debug!(%provider, api = core::any::type_name::<A>(), "registered provider");
        self.providers.insert(provider, Box::new(api));
        Ok(())
    }

    /// Returns the provider registered under `provider`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotFound`] if nothing is registered under the reference
    /// - [`ProviderError::TypeMismatch`] if it was registered as another API type
    pub fn get<A>(&self, provider: &ProviderRef) -> Result<Arc<A>, ProviderError>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let entry = self
            .providers
            .get(provider)
            .ok_or_else(|| ProviderError::NotFound(provider.clone()))?;
        entry
            .downcast_ref::<Arc<A>>()
            .cloned()
            .ok_or_else(|| ProviderError::TypeMismatch {
                provider: provider.clone(),
                expected: core::any::type_name::<A>(),
            })
    }

    /// Checks if a provider is registered.
    #[must_use]
    pub fn contains(&self, provider: &ProviderRef) -> bool {
        self.providers.contains_key(provider)
    }

    /// Lists registered providers in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<ProviderRef> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}
