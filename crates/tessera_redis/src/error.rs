//! Errors raised while creating a Redis capability.

use tessera_system::resource::ResourceError;

use crate::args::Backend;

/// Construction-time error of [`Redis::create`](crate::Redis::create).
///
/// Provisioning failures are not reported here; they surface through the
/// capability's `host` Output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedisError {
    /// No backend was selected, or the requested one does not exist.
    #[error(
        "unknown Redis backend: {}; expected one of docker, kubernetes, amazon",
        .requested.as_deref().unwrap_or("none selected")
    )]
    UnknownBackend {
        /// The backend name that was requested, if any.
        requested: Option<String>,
    },

    /// More than one backend was populated.
    #[error("ambiguous Redis backend: {} are all set", .0.iter().map(Backend::as_str).collect::<Vec<_>>().join(", "))]
    AmbiguousBackend(Vec<Backend>),

    /// The Docker backend was selected without a network.
    #[error("Docker Redis '{name}' requires a network")]
    MissingNetwork {
        /// Logical name of the capability.
        name: String,
    },

    /// Registering one of the capability's resources failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl RedisError {
    /// Creates [`RedisError::UnknownBackend`] for an unselected backend.
    #[must_use]
    pub fn none_selected() -> Self {
        Self::UnknownBackend { requested: None }
    }
}
