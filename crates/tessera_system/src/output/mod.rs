//! Deferred values.
//!
//! An [`Output`] is a value that is not necessarily known when it is
//! referenced. It starts out pending and settles exactly once, either with a
//! value or with an [`OutputError`]. Dependent computation is attached as a
//! continuation and runs when the source settles:
//!
//! - [`Output::map`] / [`Output::try_map`] - derive a new Output from one source
//! - [`Output::and_then`] - derive from an Output-producing function
//! - [`Combine`] / [`Output::all`] / [`Output::zip`] - join several Outputs
//!
//! None of these evaluate eagerly and none of them block. Failures travel
//! along the chain untouched: a derived Output fails with the exact error of
//! its source, and the transformation is never invoked.
//!
//! # Example
//!
//! ```
//! use tessera_system::output::{Output, OutputState};
//!
//! let host: Output<String> = Output::pending();
//! let env = host.map(|h| format!("REDIS_HOST={h}"));
//! assert_eq!(env.state(), OutputState::Pending);
//!
//! host.resolve("redis-container-1a2b3c4".into()).unwrap();
//! assert_eq!(env.try_get(), Some(Ok("REDIS_HOST=redis-container-1a2b3c4".into())));
//! ```

mod combine;
mod erased;

pub use combine::Combine;
pub use erased::{ErasedOutput, OutputSnapshot};

use core::fmt;
use core::future::IntoFuture;
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeSet;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::resource::ResourceId;

// ─────────────────────────────────────────────────────────────────────────────
// Identity and errors
// ─────────────────────────────────────────────────────────────────────────────

static NEXT_OUTPUT_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for an [`Output`] within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(u64);

impl OutputId {
    fn next() -> Self {
        Self(NEXT_OUTPUT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output_{}", self.0)
    }
}

/// Terminal error of an [`Output`].
///
/// Errors are cloned into every dependent, so they carry owned strings
/// rather than boxed sources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    /// A backend result lacked the address or identity field a dependent needs.
    #[error("address unavailable: {what}")]
    AddressUnavailable {
        /// Description of the missing field.
        what: String,
    },

    /// A provisioning operation failed.
    #[error("provisioning {resource} failed: {message}")]
    Provisioning {
        /// URN of the resource whose operation failed.
        resource: String,
        /// Error reported by the backend.
        message: String,
    },

    /// A resolved value could not be rendered for tooling.
    #[error("failed to serialize output value: {0}")]
    Serialization(String),

    /// Every producer of the Output was dropped before it settled.
    #[error("output was abandoned before it settled")]
    Abandoned,
}

impl OutputError {
    /// Creates an [`OutputError::AddressUnavailable`].
    #[must_use]
    pub fn address_unavailable(what: impl Into<String>) -> Self {
        Self::AddressUnavailable { what: what.into() }
    }

    /// Creates an [`OutputError::Provisioning`].
    #[must_use]
    pub fn provisioning(resource: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Provisioning {
            resource: resource.to_string(),
            message: message.into(),
        }
    }
}

/// Returned when [`Output::resolve`] or [`Output::fail`] is called on an
/// Output that has already settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{output} is already settled")]
pub struct AlreadyResolved {
    /// The Output that was settled twice.
    pub output: OutputId,
}

/// Resolution state of an [`Output`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Settled with an error.
    Failed,
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

type Continuation<T> = Box<dyn FnOnce(Result<&T, &OutputError>) + Send>;

enum Slot<T> {
    Pending(Vec<Continuation<T>>),
    Resolved(T),
    Failed(OutputError),
}

struct Shared<T> {
    id: OutputId,
    /// Resources this value is derived from.
    dependencies: BTreeSet<ResourceId>,
    slot: Mutex<Slot<T>>,
}

/// A value that resolves asynchronously.
///
/// `Output` is a handle: clones share the same underlying state, so any
/// clone may be used to observe or settle it.
///
/// Every Output records the set of resources it was derived from (see
/// [`dependencies()`](Self::dependencies)). Outputs issued on behalf of a
/// resource depend on that resource, derived Outputs inherit the set of their
/// sources.
pub struct Output<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Output<T> {
    fn default() -> Self {
        Self::pending()
    }
}

impl<T: Clone + Send + 'static> From<T> for Output<T> {
    fn from(value: T) -> Self {
        Self::resolved(value)
    }
}

impl<T: Clone + Send + 'static> Output<T> {
    /// Creates a pending Output with no upstream resources.
    #[must_use]
    pub fn pending() -> Self {
        Self::with_dependencies([])
    }

    /// Creates a pending Output derived from the given resources.
    #[must_use]
    pub fn with_dependencies(dependencies: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: OutputId::next(),
                dependencies: dependencies.into_iter().collect(),
                slot: Mutex::new(Slot::Pending(Vec::new())),
            }),
        }
    }

    /// Creates an Output that is already resolved.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        let output = Self::pending();
        output.settle_once(Ok(value));
        output
    }

    /// Creates an Output that has already failed.
    #[must_use]
    pub fn failed(error: OutputError) -> Self {
        let output = Self::pending();
        output.settle_once(Err(error));
        output
    }

    /// Returns this Output's identifier.
    #[must_use]
    pub fn id(&self) -> OutputId {
        self.shared.id
    }

    /// Returns the resources this Output is derived from.
    #[must_use]
    pub fn dependencies(&self) -> &BTreeSet<ResourceId> {
        &self.shared.dependencies
    }

    /// Returns the current resolution state.
    #[must_use]
    pub fn state(&self) -> OutputState {
        match &*self.shared.slot.lock() {
            Slot::Pending(_) => OutputState::Pending,
            Slot::Resolved(_) => OutputState::Resolved,
            Slot::Failed(_) => OutputState::Failed,
        }
    }

    /// Returns the terminal result, or `None` while pending.
    #[must_use]
    pub fn try_get(&self) -> Option<Result<T, OutputError>> {
        match &*self.shared.slot.lock() {
            Slot::Pending(_) => None,
            Slot::Resolved(value) => Some(Ok(value.clone())),
            Slot::Failed(error) => Some(Err(error.clone())),
        }
    }

    /// Resolves the Output with a value and runs its continuations.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyResolved`] if the Output has already settled.
    pub fn resolve(&self, value: T) -> Result<(), AlreadyResolved> {
        self.settle(Ok(value))
    }

    /// Fails the Output and runs its continuations.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyResolved`] if the Output has already settled.
    pub fn fail(&self, error: OutputError) -> Result<(), AlreadyResolved> {
        self.settle(Err(error))
    }

    /// Settles the Output with a terminal result.
    ///
    /// The state transition happens under the lock; continuations run after
    /// it is released, in registration order, so they may freely settle or
    /// observe other Outputs.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyResolved`] if the Output has already settled.
    pub fn settle(&self, result: Result<T, OutputError>) -> Result<(), AlreadyResolved> {
        let continuations = {
            let mut slot = self.shared.slot.lock();
            let Slot::Pending(continuations) = &mut *slot else {
                return Err(AlreadyResolved { output: self.id() });
            };
            let continuations = core::mem::take(continuations);
            *slot = match &result {
                Ok(value) => Slot::Resolved(value.clone()),
                Err(error) => Slot::Failed(error.clone()),
            };
            continuations
        };

        let view = result.as_ref();
        for continuation in continuations {
            continuation(view);
        }
        Ok(())
    }

    /// Settles an Output that may already have been settled by a racing
    /// writer. Joins use this: the first failure wins, later ones are dropped.
    pub(crate) fn settle_once(&self, result: Result<T, OutputError>) {
        if let Err(error) = self.settle(result) {
            tracing::trace!(%error, "ignoring late settlement");
        }
    }

    /// Registers a continuation to run when the Output settles.
    ///
    /// If the Output has already settled, `f` runs immediately on the
    /// calling thread.
    pub fn on_settle<F>(&self, f: F)
    where
        F: FnOnce(Result<&T, &OutputError>) + Send + 'static,
    {
        let settled = {
            let mut slot = self.shared.slot.lock();
            match &mut *slot {
                Slot::Pending(continuations) => {
                    continuations.push(Box::new(f));
                    return;
                }
                Slot::Resolved(value) => Ok(value.clone()),
                Slot::Failed(error) => Err(error.clone()),
            }
        };
        f(settled.as_ref());
    }

    /// Derives a new Output by transforming this one's value.
    ///
    /// If this Output fails, the derived Output fails with the same error and
    /// `f` is never invoked.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.try_map(move |value| Ok(f(value)))
    }

    /// Derives a new Output with a fallible transformation.
    ///
    /// Used where a value has to be extracted from a nested result that may
    /// be missing, e.g. the first entry of an address list.
    #[must_use]
    pub fn try_map<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, OutputError> + Send + 'static,
    {
        let derived = Output::with_dependencies(self.dependencies().iter().copied());
        let target = derived.clone();
        self.on_settle(move |result| {
            let outcome = match result {
                Ok(value) => f(value.clone()),
                Err(error) => Err(error.clone()),
            };
            target.settle_once(outcome);
        });
        derived
    }

    /// Derives a new Output from a function that itself returns an Output.
    #[must_use]
    pub fn and_then<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Output<U> + Send + 'static,
    {
        let derived = Output::with_dependencies(self.dependencies().iter().copied());
        let target = derived.clone();
        self.on_settle(move |result| match result {
            Ok(value) => {
                f(value.clone()).on_settle(move |inner| target.settle_once(owned(inner)));
            }
            Err(error) => target.settle_once(Err(error.clone())),
        });
        derived
    }

    /// Joins this Output with another.
    #[must_use]
    pub fn zip<U: Clone + Send + 'static>(&self, other: &Output<U>) -> Output<(T, U)> {
        (self.clone(), other.clone()).combine()
    }

    /// Joins any number of Outputs of the same type, preserving order.
    ///
    /// Resolves once every input has resolved; fails as soon as any input
    /// fails. An empty input resolves immediately to an empty `Vec`.
    #[must_use]
    pub fn all<I>(outputs: I) -> Output<Vec<T>>
    where
        I: IntoIterator<Item = Output<T>>,
    {
        combine::join_all(outputs.into_iter().collect())
    }
}

impl<T: fmt::Debug> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Output");
        debug.field("id", &self.shared.id);
        match &*self.shared.slot.lock() {
            Slot::Pending(continuations) => debug
                .field("state", &"pending")
                .field("continuations", &continuations.len()),
            Slot::Resolved(value) => debug.field("value", value),
            Slot::Failed(error) => debug.field("error", error),
        };
        debug.finish()
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Output<T> {
    type Output = Result<T, OutputError>;
    type IntoFuture = BoxFuture<'static, Result<T, OutputError>>;

    /// Waits for the Output to settle without holding a lock.
    ///
    /// If every producer is dropped while the Output is still pending the
    /// future completes with [`OutputError::Abandoned`].
    fn into_future(self) -> Self::IntoFuture {
        let (tx, rx) = oneshot::channel();
        self.on_settle(move |result| {
            // The receiver may have been dropped; nothing to deliver then.
            let _ = tx.send(owned(result));
        });
        drop(self);
        Box::pin(async move { rx.await.unwrap_or(Err(OutputError::Abandoned)) })
    }
}

fn owned<T: Clone>(result: Result<&T, &OutputError>) -> Result<T, OutputError> {
    result.cloned().map_err(OutputError::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn resolve_transitions_once() {
        let output = Output::<i32>::pending();
        assert_eq!(output.state(), OutputState::Pending);

        output.resolve(1).unwrap();
        assert_eq!(output.state(), OutputState::Resolved);

        let err = output.resolve(2).unwrap_err();
        assert_eq!(err.output, output.id());
        assert_eq!(output.try_get(), Some(Ok(1)));
    }

    #[test]
    fn fail_after_resolve_is_rejected() {
        let output = Output::<i32>::pending();
        output.resolve(1).unwrap();
        assert!(output.fail(OutputError::Abandoned).is_err());
        assert_eq!(output.state(), OutputState::Resolved);
    }

    #[test]
    fn continuations_run_in_registration_order() {
        let output = Output::<i32>::pending();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let log = Arc::clone(&log);
            output.on_settle(move |result| log.lock().push((i, *result.unwrap())));
        }
        assert!(log.lock().is_empty());

        output.resolve(7).unwrap();
        assert_eq!(*log.lock(), vec![(0, 7), (1, 7), (2, 7), (3, 7)]);
    }

    #[test]
    fn continuations_run_exactly_once() {
        let output = Output::<i32>::pending();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        output.on_settle(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        output.resolve(1).unwrap();
        let _ = output.resolve(2);
        let _ = output.fail(OutputError::Abandoned);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_continuation_runs_immediately() {
        let output = Output::resolved(5);
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        output.on_settle(move |result| *slot.lock() = Some(*result.unwrap()));
        assert_eq!(*seen.lock(), Some(5));
    }

    #[test]
    fn map_is_lazy_and_derives_value() {
        let source = Output::<i32>::pending();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let doubled = source.map(move |v| {
            counter.fetch_add(1, Ordering::SeqCst);
            v * 2
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(doubled.state(), OutputState::Pending);

        source.resolve(21).unwrap();
        assert_eq!(doubled.try_get(), Some(Ok(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn map_preserves_failure_without_invoking() {
        let source = Output::<i32>::pending();
        let derived = source.map(|_| -> i32 { panic!("transformation must not run") });

        let error = OutputError::provisioning("urn:test", "boom");
        source.fail(error.clone()).unwrap();
        assert_eq!(derived.try_get(), Some(Err(error)));
    }

    #[test]
    fn try_map_surfaces_address_unavailable() {
        let nodes = Output::<Vec<String>>::pending();
        let first = nodes.try_map(|nodes| {
            nodes
                .into_iter()
                .next()
                .ok_or_else(|| OutputError::address_unavailable("node list is empty"))
        });

        nodes.resolve(Vec::new()).unwrap();
        assert!(matches!(
            first.try_get(),
            Some(Err(OutputError::AddressUnavailable { .. }))
        ));
    }

    #[test]
    fn and_then_flattens() {
        let source = Output::<i32>::pending();
        let inner = Output::<String>::pending();
        let inner_handle = inner.clone();
        let flattened = source.and_then(move |_| inner_handle);

        source.resolve(1).unwrap();
        assert_eq!(flattened.state(), OutputState::Pending);

        inner.resolve("ready".into()).unwrap();
        assert_eq!(flattened.try_get(), Some(Ok("ready".to_string())));
    }

    #[test]
    fn derived_outputs_inherit_dependencies() {
        let source = Output::<i32>::with_dependencies([ResourceId(3), ResourceId(1)]);
        let derived = source.map(|v| v + 1);
        let deps: Vec<_> = derived.dependencies().iter().copied().collect();
        assert_eq!(deps, vec![ResourceId(1), ResourceId(3)]);
    }

    #[test]
    fn output_ids_are_unique() {
        let a = Output::<i32>::pending();
        let b = Output::<i32>::pending();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[tokio::test]
    async fn await_resolved_output() {
        let output = Output::<String>::pending();
        let handle = output.clone();
        let waiter = tokio::spawn(async move { handle.await });
        output.resolve("done".into()).unwrap();
        assert_eq!(waiter.await.unwrap(), Ok("done".to_string()));
    }

    #[tokio::test]
    async fn await_abandoned_output() {
        let output = Output::<String>::pending();
        assert_eq!(output.await, Err(OutputError::Abandoned));
    }
}
