//! Errors returned by backend APIs.

/// Error returned by a backend API call.
///
/// Reported against the resource that issued the call; never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// A referenced object does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind of object, e.g. `network`.
        kind: &'static str,
        /// Name that was looked up.
        name: String,
    },

    /// An object with the same name already exists.
    #[error("{kind} already exists: {name}")]
    Conflict {
        /// Kind of object.
        kind: &'static str,
        /// Conflicting name.
        name: String,
    },

    /// The backend rejected the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
