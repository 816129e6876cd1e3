//! Resource identity, options and registered outputs.
//!
//! A resource is a named node in the ownership graph held by a
//! [`Stack`](crate::stack::Stack). This module provides the value types that
//! describe one:
//!
//! - [`ResourceId`] - stable arena key, cheap to copy
//! - [`ResourceType`] - type token such as `docker:index:Container`
//! - [`Urn`] - identity qualified by stack name and lineage
//! - [`ResourceOptions`] - parent and provider selection
//! - [`Outputs`] - the name → Output map a resource registers once constructed
//!
//! # Scoping
//!
//! Names only need to be unique among the children of one parent. Two
//! components may each own a child named `redis-image`; their URNs differ by
//! the scoped name, which is qualified by every ancestor's name.

mod outputs;

pub use outputs::Outputs;

use core::fmt;
use std::borrow::Cow;

use crate::provider::ProviderRef;

/// Stable identifier of a resource within its stack.
///
/// Parent links are stored as `ResourceId`s rather than references, so the
/// ownership tree never forms reference cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    /// Returns the raw arena index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource_{}", self.0)
    }
}

/// Type token of a resource, `<package>:<module>:<kind>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceType(Cow<'static, str>);

impl ResourceType {
    /// Creates a type token from a static string.
    #[must_use]
    pub const fn from_static(token: &'static str) -> Self {
        Self(Cow::Borrowed(token))
    }

    /// Creates a type token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Cow::Owned(token.into()))
    }

    /// Returns the token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the package segment (`docker` for `docker:index:Container`).
    ///
    /// Provider selection is keyed by package.
    #[must_use]
    pub fn package(&self) -> &str {
        self.0.split(':').next().unwrap_or_default()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified resource identity.
///
/// Rendered as `urn:tessera:<stack>::<type chain>::<scoped name>`. The type
/// chain joins the types of every ancestor and the resource itself with `$`;
/// the scoped name joins their logical names with `/`. Because names are
/// unique among the children of one parent, URNs are unique within a stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Urn(String);

impl Urn {
    pub(crate) fn new<'a>(
        stack: &str,
        lineage: impl IntoIterator<Item = (&'a ResourceType, &'a str)>,
    ) -> Self {
        let (types, names): (Vec<&str>, Vec<&str>) = lineage
            .into_iter()
            .map(|(ty, name)| (ty.as_str(), name))
            .unzip();
        Self(format!(
            "urn:tessera:{stack}::{}::{}",
            types.join("$"),
            names.join("/")
        ))
    }

    /// Returns the URN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name qualified by every ancestor's name.
    #[must_use]
    pub fn scoped_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or_default()
    }

    /// Returns the resource's own logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.scoped_name().rsplit('/').next().unwrap_or_default()
    }

    /// Returns the type of the resource itself (the last link of the chain).
    #[must_use]
    pub fn resource_type(&self) -> &str {
        let mut segments = self.0.rsplitn(3, "::");
        segments.next();
        segments
            .next()
            .and_then(|chain| chain.rsplit('$').next())
            .unwrap_or_default()
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options controlling how a resource is attached to the graph.
///
/// Components pass [`for_child()`](Self::for_child) to the resources they
/// create so that every sub-operation is parented to the component and keeps
/// the caller's provider selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Owning resource.
    pub parent: Option<ResourceId>,
    /// Explicit provider selection. When unset the provider is inherited from
    /// the nearest ancestor that selected one for the same package.
    pub provider: Option<ProviderRef>,
}

impl ResourceOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parent.
    #[must_use]
    pub fn with_parent(mut self, parent: ResourceId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets an explicit provider.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderRef) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Returns a copy of these options re-parented to `parent`.
    #[must_use]
    pub fn for_child(&self, parent: ResourceId) -> Self {
        self.clone().with_parent(parent)
    }
}

/// Structural errors raised while building the resource graph.
///
/// These are synchronous: they abort construction at the call that caused
/// them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// A resource with the same type and name already exists under the
    /// same parent.
    #[error("duplicate resource name: {urn}")]
    DuplicateName {
        /// URN shared by both resources.
        urn: Urn,
    },

    /// The parent does not exist in this stack.
    #[error("unknown parent resource: {0}")]
    UnknownParent(ResourceId),

    /// The resource does not exist in this stack.
    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    /// Outputs were registered twice for the same resource.
    #[error("outputs already registered for {urn}")]
    AlreadyRegistered {
        /// URN of the resource.
        urn: Urn,
    },

    /// The provider selected for a resource could not be retrieved.
    #[error(transparent)]
    Provider(#[from] crate::provider::ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_package() {
        let ty = ResourceType::from_static("docker:index:Container");
        assert_eq!(ty.package(), "docker");
        assert_eq!(ty.to_string(), "docker:index:Container");
        assert_eq!(ResourceType::new("").package(), "");
    }

    #[test]
    fn urn_renders_lineage() {
        let component = ResourceType::from_static("tessera:docker:Redis");
        let container = ResourceType::from_static("docker:index:Container");
        let urn = Urn::new(
            "dev",
            [(&component, "redis"), (&container, "redis-container")],
        );

        assert_eq!(
            urn.as_str(),
            "urn:tessera:dev::tessera:docker:Redis$docker:index:Container::redis/redis-container"
        );
        assert_eq!(urn.scoped_name(), "redis/redis-container");
        assert_eq!(urn.name(), "redis-container");
        assert_eq!(urn.resource_type(), "docker:index:Container");
    }

    #[test]
    fn for_child_keeps_provider() {
        let provider = ProviderRef::new("kubernetes", "staging");
        let opts = ResourceOptions::new().with_provider(provider.clone());
        let child = opts.for_child(ResourceId(4));
        assert_eq!(child.parent, Some(ResourceId(4)));
        assert_eq!(child.provider, Some(provider));
    }
}
