//! Type-erased view over Outputs, used by tooling and stack exports.

use serde::Serialize;

use super::{Output, OutputError, OutputId, OutputState};
use crate::resource::ResourceId;

/// Point-in-time view of an Output's state with its value rendered as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSnapshot {
    /// Not yet settled.
    Pending,
    /// Resolved; the value rendered through `serde_json`.
    Resolved(serde_json::Value),
    /// Failed with the given error.
    Failed(OutputError),
}

impl OutputSnapshot {
    /// Returns the resolved value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the resolved value as a string slice, if it is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(serde_json::Value::as_str)
    }
}

/// An Output whose value type has been erased.
///
/// Implemented for every `Output<T>` whose value is serializable, so that
/// heterogeneous Outputs can be registered on a resource under one map.
pub trait ErasedOutput: Send + Sync + 'static {
    /// Returns the Output's identifier.
    fn id(&self) -> OutputId;

    /// Returns the current resolution state.
    fn state(&self) -> OutputState;

    /// Returns the resources the Output is derived from, in ascending order.
    fn dependencies(&self) -> Vec<ResourceId>;

    /// Renders the current state.
    fn snapshot(&self) -> OutputSnapshot;

    /// Returns the value type name for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T> ErasedOutput for Output<T>
where
    T: Clone + Send + Serialize + 'static,
{
    fn id(&self) -> OutputId {
        Output::id(self)
    }

    fn state(&self) -> OutputState {
        Output::state(self)
    }

    fn dependencies(&self) -> Vec<ResourceId> {
        Output::dependencies(self).iter().copied().collect()
    }

    fn snapshot(&self) -> OutputSnapshot {
        match self.try_get() {
            None => OutputSnapshot::Pending,
            Some(Ok(value)) => match serde_json::to_value(&value) {
                Ok(json) => OutputSnapshot::Resolved(json),
                Err(error) => OutputSnapshot::Failed(OutputError::Serialization(error.to_string())),
            },
            Some(Err(error)) => OutputSnapshot::Failed(error),
        }
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn snapshot_tracks_state() {
        let output = Output::<String>::pending();
        let erased: Arc<dyn ErasedOutput> = Arc::new(output.clone());
        assert_eq!(erased.snapshot(), OutputSnapshot::Pending);

        output.resolve("redis".into()).unwrap();
        assert_eq!(erased.state(), OutputState::Resolved);
        assert_eq!(erased.snapshot().as_str(), Some("redis"));
    }

    #[test]
    fn snapshot_carries_failure() {
        let output = Output::<u16>::failed(OutputError::Abandoned);
        assert_eq!(
            ErasedOutput::snapshot(&output),
            OutputSnapshot::Failed(OutputError::Abandoned)
        );
    }

    #[test]
    fn erased_type_name() {
        let output = Output::<Vec<u16>>::pending();
        assert!(ErasedOutput::type_name(&output).contains("u16"));
    }
}
