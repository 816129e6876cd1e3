//! The set of Outputs a resource exposes once constructed.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::output::{ErasedOutput, Output, OutputSnapshot};

/// Ordered map from output name to a type-erased Output.
///
/// Passed to [`Stack::register_outputs`](crate::stack::Stack::register_outputs)
/// once a resource has issued all of its sub-operations.
///
/// # Example
///
/// ```
/// use tessera_system::output::Output;
/// use tessera_system::resource::Outputs;
///
/// let host: Output<String> = Output::pending();
/// let outputs = Outputs::new().with("host", &host);
/// assert_eq!(outputs.names().collect::<Vec<_>>(), vec!["host"]);
/// ```
#[derive(Clone, Default)]
pub struct Outputs {
    entries: IndexMap<String, Arc<dyn ErasedOutput>>,
}

impl Outputs {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an Output under `name`, replacing any previous entry.
    #[must_use]
    pub fn with<T>(mut self, name: impl Into<String>, output: &Output<T>) -> Self
    where
        T: Clone + Send + Serialize + 'static,
    {
        self.insert(name, output);
        self
    }

    /// Adds an Output under `name`, replacing any previous entry.
    pub fn insert<T>(&mut self, name: impl Into<String>, output: &Output<T>)
    where
        T: Clone + Send + Serialize + 'static,
    {
        self.entries.insert(name.into(), Arc::new(output.clone()));
    }

    /// Returns the Output registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ErasedOutput>> {
        self.entries.get(name)
    }

    /// Returns the output names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(name, output)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ErasedOutput>)> {
        self.entries.iter().map(|(name, output)| (name.as_str(), output))
    }

    /// Renders every Output's current state.
    #[must_use]
    pub fn snapshot(&self) -> IndexMap<String, OutputSnapshot> {
        self.entries
            .iter()
            .map(|(name, output)| (name.clone(), output.snapshot()))
            .collect()
    }

    /// Returns the number of registered Outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no Outputs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, output)| (name, output.state())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputState;

    #[test]
    fn preserves_registration_order() {
        let outputs = Outputs::new()
            .with("host", &Output::<String>::pending())
            .with("port", &Output::resolved(6379_u16))
            .with("id", &Output::<String>::pending());
        assert_eq!(outputs.names().collect::<Vec<_>>(), ["host", "port", "id"]);
        assert_eq!(outputs.len(), 3);
    }

    #[test]
    fn snapshot_reflects_each_state() {
        let host = Output::<String>::pending();
        let outputs = Outputs::new()
            .with("host", &host)
            .with("port", &Output::resolved(6379_u16));

        let snapshot = outputs.snapshot();
        assert_eq!(snapshot["host"], OutputSnapshot::Pending);
        assert_eq!(snapshot["port"], OutputSnapshot::Resolved(serde_json::json!(6379)));

        host.resolve("redis".into()).unwrap();
        assert_eq!(
            outputs.get("host").map(|o| o.state()),
            Some(OutputState::Resolved)
        );
    }
}
