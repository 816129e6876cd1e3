//! The resource graph and the provisioning run loop.
//!
//! A [`Stack`] owns every resource registered during one program run. It
//! serves three roles:
//!
//! - **Arena**: resources are stored by [`ResourceId`] with parent links, so
//!   the ownership tree is navigable from both ends without reference cycles.
//! - **Provider lookup**: each resource resolves its provider from its own
//!   options, its nearest ancestor, or the package default.
//! - **Run loop**: provisioning calls are issued as futures against the
//!   stack and driven by [`Stack::run`].
//!
//! Stacks are assembled with a [`StackBuilder`], which builds plugins in
//! dependency order so each one can register the providers it brings.
//!
//! # Lifecycle
//!
//! 1. Build: `StackBuilder::new("dev").add_plugins(...).build()?`
//! 2. Construct resources: every constructor registers itself, issues its
//!    provisioning calls and registers its outputs
//! 3. Drive: `stack.run().await` until no operation remains
//!
//! # Example
//!
//! ```
//! use tessera_system::output::OutputState;
//! use tessera_system::resource::{ResourceOptions, ResourceType};
//! use tessera_system::stack::Stack;
//!
//! # futures::executor::block_on(async {
//! let stack = Stack::new("dev");
//! let id = stack
//!     .register_resource(ResourceType::from_static("demo:index:Thing"), "thing", &ResourceOptions::new())
//!     .unwrap();
//!
//! let name = stack.issue(id, async { Ok(String::from("thing-1")) }).unwrap();
//! assert_eq!(name.state(), OutputState::Pending);
//!
//! let summary = stack.run().await;
//! assert!(summary.is_success());
//! assert_eq!(name.try_get(), Some(Ok("thing-1".to_string())));
//! # });
//! ```

use core::fmt;
use core::fmt::Write as _;
use core::future::Future;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use hashbrown::{HashMap, HashSet};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::output::{Output, OutputError};
use crate::plugin::{BoxedPlugin, PluginId, Plugins};
use crate::provider::{ProviderError, ProviderRef, ProviderRegistry};
use crate::resource::{Outputs, ResourceError, ResourceId, ResourceOptions, ResourceType, Urn};

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while assembling a stack.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    /// A unique plugin was added twice.
    #[error("plugin '{0}' is unique and was already added")]
    DuplicatePlugin(String),

    /// A plugin depends on a plugin that was never added.
    #[error("plugin '{plugin}' requires '{dependency}' which was not added")]
    MissingDependency {
        /// The dependent plugin.
        plugin: String,
        /// Type name of the missing dependency.
        dependency: &'static str,
    },

    /// Plugin dependencies form a cycle.
    #[error("circular dependency detected among plugins: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// A plugin failed to register its provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

// ─────────────────────────────────────────────────────────────────────────────
// StackBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Assembles a [`Stack`] from plugins.
pub struct StackBuilder {
    name: String,
    providers: ProviderRegistry,
    plugins: Vec<BoxedPlugin>,
    plugin_ids: HashSet<PluginId>,
    duplicates: Vec<String>,
}

impl fmt::Debug for StackBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBuilder")
            .field("name", &self.name)
            .field("plugins", &self.plugins.len())
            .field("providers", &self.providers)
            .finish()
    }
}

impl StackBuilder {
    /// Creates a builder for a stack called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: ProviderRegistry::new(),
            plugins: Vec::new(),
            plugin_ids: HashSet::new(),
            duplicates: Vec::new(),
        }
    }

    /// Returns the stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds one or more plugins.
    ///
    /// Accepts a single [`Plugin`](crate::plugin::Plugin) or a
    /// [`PluginGroupBuilder`](crate::plugin::PluginGroupBuilder). Duplicate
    /// unique plugins are reported by [`build()`](Self::build).
    #[must_use]
    pub fn add_plugins<P: Plugins>(mut self, plugins: P) -> Self {
        plugins.add_to_stack(&mut self);
        self
    }

    pub(crate) fn add_plugin_boxed(&mut self, boxed: BoxedPlugin) {
        if boxed.plugin.is_unique() && self.plugin_ids.contains(&boxed.id) {
            self.duplicates.push(boxed.plugin.name().to_string());
            return;
        }
        self.plugin_ids.insert(boxed.id);
        self.plugins.push(boxed);
    }

    /// Returns true if a plugin of the given type has been added.
    #[must_use]
    pub fn contains_plugin(&self, id: PluginId) -> bool {
        self.plugin_ids.contains(&id)
    }

    /// Registers a provider API under `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::Provider`] if the reference is already taken.
    pub fn register_provider<A>(&mut self, provider: ProviderRef, api: Arc<A>) -> Result<(), StackError>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        self.providers.register(provider, api)?;
        Ok(())
    }

    /// Returns the providers registered so far.
    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Builds every plugin in dependency order and returns the stack.
    ///
    /// # Errors
    ///
    /// - [`StackError::DuplicatePlugin`] if a unique plugin was added twice
    /// - [`StackError::MissingDependency`] if a dependency was never added
    /// - [`StackError::DependencyCycle`] if dependencies form a cycle
    /// - any error returned by a plugin's `build`
    pub fn build(mut self) -> Result<Stack, StackError> {
        if let Some(name) = self.duplicates.first() {
            return Err(StackError::DuplicatePlugin(name.clone()));
        }

        let plugins = core::mem::take(&mut self.plugins);
        for index in sort_plugins(&plugins)? {
            let entry = &plugins[index];
            tracing::debug!(plugin = entry.plugin.name(), "building plugin");
            entry.plugin.build(&mut self)?;
        }

        tracing::info!(stack = %self.name, providers = ?self.providers.names(), "stack assembled");
        Ok(Stack::from_parts(self.name, self.providers))
    }
}

/// Orders plugins so that every plugin follows its dependencies.
///
/// Kahn's algorithm over plugin indices. Plugins without mutual constraints
/// keep the order they were added in.
fn sort_plugins(plugins: &[BoxedPlugin]) -> Result<Vec<usize>, StackError> {
    let index_of: HashMap<PluginId, usize> = plugins
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.id, i))
        .collect();

    let n = plugins.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, entry) in plugins.iter().enumerate() {
        for dependency in entry.plugin.dependencies() {
            let Some(&dep_index) = index_of.get(&dependency) else {
                return Err(StackError::MissingDependency {
                    plugin: entry.plugin.name().to_string(),
                    dependency: dependency.type_name(),
                });
            };
            dependents[dep_index].push(i);
            in_degree[i] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(n);

    while let Some(index) = queue.pop_front() {
        sorted.push(index);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if sorted.len() != n {
        let in_cycle = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(i, _)| plugins[i].plugin.name().to_string())
            .collect();
        return Err(StackError::DependencyCycle(in_cycle));
    }

    Ok(sorted)
}

// ─────────────────────────────────────────────────────────────────────────────
// Run results
// ─────────────────────────────────────────────────────────────────────────────

/// A provisioning operation that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    /// Resource the operation belonged to.
    pub urn: Urn,
    /// Terminal error of the operation's Output.
    pub error: OutputError,
    /// True if the operation never ran because one of its inputs failed.
    pub skipped: bool,
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            write!(f, "{} (skipped): {}", self.urn, self.error)
        } else {
            write!(f, "{}: {}", self.urn, self.error)
        }
    }
}

/// Outcome of [`Stack::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    completed: usize,
    failures: Vec<OperationFailure>,
}

impl RunSummary {
    /// Returns the number of operations that ran to completion, successful
    /// or not.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Returns the failures in the order they were observed.
    #[must_use]
    pub fn failures(&self) -> &[OperationFailure] {
        &self.failures
    }

    /// Returns true if no operation failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph storage
// ─────────────────────────────────────────────────────────────────────────────

struct ResourceRecord {
    resource_type: ResourceType,
    name: String,
    urn: Urn,
    parent: Option<ResourceId>,
    children: Vec<ResourceId>,
    /// Provider selection in effect for this resource and its descendants,
    /// keyed by package.
    providers: BTreeMap<String, ProviderRef>,
    outputs: Option<Outputs>,
}

#[derive(PartialEq, Eq, Hash)]
struct NameKey {
    parent: Option<ResourceId>,
    resource_type: ResourceType,
    name: String,
}

#[derive(Default)]
struct ResourceGraph {
    records: Vec<ResourceRecord>,
    names: HashMap<NameKey, ResourceId>,
}

impl ResourceGraph {
    fn record(&self, id: ResourceId) -> Option<&ResourceRecord> {
        self.records.get(id.0)
    }

    /// Returns `id` and its ancestors, root first.
    fn lineage(&self, id: ResourceId) -> Vec<&ResourceRecord> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(record) = self.record(current) else {
                break;
            };
            chain.push(record);
            cursor = record.parent;
        }
        chain.reverse();
        chain
    }

    fn render(&self, id: ResourceId, depth: usize, out: &mut String) {
        let Some(record) = self.record(id) else {
            return;
        };
        let marker = if record.outputs.is_some() { "" } else { " (constructing)" };
        let _ = writeln!(
            out,
            "{:indent$}{} {}{marker}",
            "",
            record.resource_type,
            record.name,
            indent = depth * 2
        );
        for &child in &record.children {
            self.render(child, depth + 1, out);
        }
    }
}

type Operation = BoxFuture<'static, ()>;

// ─────────────────────────────────────────────────────────────────────────────
// Stack
// ─────────────────────────────────────────────────────────────────────────────

struct StackInner {
    name: String,
    providers: ProviderRegistry,
    graph: RwLock<ResourceGraph>,
    queue: Arc<Mutex<Vec<Operation>>>,
    failures: Arc<Mutex<Vec<OperationFailure>>>,
    exports: Mutex<Outputs>,
}

/// The resource graph of one program run.
///
/// Cheap to clone; clones share the same graph.
#[derive(Clone)]
pub struct Stack {
    inner: Arc<StackInner>,
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("name", &self.inner.name)
            .field("resources", &self.len())
            .field("providers", &self.inner.providers)
            .finish()
    }
}

impl Stack {
    /// Creates a stack with no providers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), ProviderRegistry::new())
    }

    fn from_parts(name: String, providers: ProviderRegistry) -> Self {
        Self {
            inner: Arc::new(StackInner {
                name,
                providers,
                graph: RwLock::new(ResourceGraph::default()),
                queue: Arc::new(Mutex::new(Vec::new())),
                failures: Arc::new(Mutex::new(Vec::new())),
                exports: Mutex::new(Outputs::new()),
            }),
        }
    }

    /// Returns the stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the provider registry.
    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.inner.providers
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a resource to the graph.
    ///
    /// The check for an existing sibling with the same type and name and the
    /// insertion happen under one lock, so duplicates are always detected.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::UnknownParent`] if `options.parent` is not in this stack
    /// - [`ResourceError::DuplicateName`] if the parent already owns a
    ///   resource of the same type and name
    pub fn register_resource(
        &self,
        resource_type: ResourceType,
        name: impl Into<String>,
        options: &ResourceOptions,
    ) -> Result<ResourceId, ResourceError> {
        let name = name.into();
        let mut graph = self.inner.graph.write();

        let (urn, mut providers) = {
            let ancestors = match options.parent {
                Some(parent) => {
                    if graph.record(parent).is_none() {
                        return Err(ResourceError::UnknownParent(parent));
                    }
                    graph.lineage(parent)
                }
                None => Vec::new(),
            };
            let urn = Urn::new(
                &self.inner.name,
                ancestors
                    .iter()
                    .map(|record| (&record.resource_type, record.name.as_str()))
                    .chain([(&resource_type, name.as_str())]),
            );
            let providers = ancestors
                .last()
                .map(|parent| parent.providers.clone())
                .unwrap_or_default();
            (urn, providers)
        };

        let key = NameKey {
            parent: options.parent,
            resource_type: resource_type.clone(),
            name: name.clone(),
        };
        if graph.names.contains_key(&key) {
            return Err(ResourceError::DuplicateName { urn });
        }

        if let Some(provider) = &options.provider {
            providers.insert(provider.package().to_string(), provider.clone());
        }

        let id = ResourceId(graph.records.len());
        tracing::debug!(%urn, %id, parent = ?options.parent, "registered resource");
        graph.records.push(ResourceRecord {
            resource_type,
            name,
            urn,
            parent: options.parent,
            children: Vec::new(),
            providers,
            outputs: None,
        });
        graph.names.insert(key, id);
        if let Some(parent) = options.parent {
            graph.records[parent.0].children.push(id);
        }
        Ok(id)
    }

    /// Records the outputs of a constructed resource.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::UnknownResource`] if `id` is not in this stack
    /// - [`ResourceError::AlreadyRegistered`] on a second call for the same resource
    pub fn register_outputs(&self, id: ResourceId, outputs: Outputs) -> Result<(), ResourceError> {
        let mut graph = self.inner.graph.write();
        let record = graph
            .records
            .get_mut(id.0)
            .ok_or(ResourceError::UnknownResource(id))?;
        if record.outputs.is_some() {
            return Err(ResourceError::AlreadyRegistered {
                urn: record.urn.clone(),
            });
        }
        tracing::debug!(urn = %record.urn, outputs = outputs.len(), "registered outputs");
        record.outputs = Some(outputs);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true once the resource has registered its outputs.
    #[must_use]
    pub fn is_ready(&self, id: ResourceId) -> bool {
        self.inner
            .graph
            .read()
            .record(id)
            .is_some_and(|record| record.outputs.is_some())
    }

    /// Returns the outputs a resource registered, if it has.
    #[must_use]
    pub fn outputs(&self, id: ResourceId) -> Option<Outputs> {
        self.inner.graph.read().record(id)?.outputs.clone()
    }

    /// Returns the URN of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownResource`] if `id` is not in this stack.
    pub fn urn(&self, id: ResourceId) -> Result<Urn, ResourceError> {
        self.inner
            .graph
            .read()
            .record(id)
            .map(|record| record.urn.clone())
            .ok_or(ResourceError::UnknownResource(id))
    }

    /// Returns the logical name of a resource.
    #[must_use]
    pub fn resource_name(&self, id: ResourceId) -> Option<String> {
        self.inner.graph.read().record(id).map(|record| record.name.clone())
    }

    /// Returns the type of a resource.
    #[must_use]
    pub fn resource_type(&self, id: ResourceId) -> Option<ResourceType> {
        self.inner
            .graph
            .read()
            .record(id)
            .map(|record| record.resource_type.clone())
    }

    /// Returns the parent of a resource.
    #[must_use]
    pub fn parent(&self, id: ResourceId) -> Option<ResourceId> {
        self.inner.graph.read().record(id)?.parent
    }

    /// Returns the children of a resource in registration order.
    #[must_use]
    pub fn children(&self, id: ResourceId) -> Vec<ResourceId> {
        self.inner
            .graph
            .read()
            .record(id)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    /// Returns the ancestors of a resource, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: ResourceId) -> Vec<ResourceId> {
        let graph = self.inner.graph.read();
        let mut ancestors = Vec::new();
        let mut cursor = graph.record(id).and_then(|record| record.parent);
        while let Some(current) = cursor {
            ancestors.push(current);
            cursor = graph.record(current).and_then(|record| record.parent);
        }
        ancestors
    }

    /// Returns every resource without a parent, in registration order.
    #[must_use]
    pub fn roots(&self) -> Vec<ResourceId> {
        let graph = self.inner.graph.read();
        (0..graph.records.len())
            .map(ResourceId)
            .filter(|&id| graph.records[id.0].parent.is_none())
            .collect()
    }

    /// Finds a resource by URN.
    #[must_use]
    pub fn find(&self, urn: &Urn) -> Option<ResourceId> {
        self.inner
            .graph
            .read()
            .records
            .iter()
            .position(|record| &record.urn == urn)
            .map(ResourceId)
    }

    /// Returns the number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.graph.read().records.len()
    }

    /// Returns true if no resource has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the ownership tree, one resource per line.
    ///
    /// Resources that have not registered outputs yet are marked
    /// `(constructing)`.
    #[must_use]
    pub fn render_tree(&self) -> String {
        let graph = self.inner.graph.read();
        let mut out = String::new();
        for (index, record) in graph.records.iter().enumerate() {
            if record.parent.is_none() {
                graph.render(ResourceId(index), 0, &mut out);
            }
        }
        out
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Providers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the provider selected for a resource.
    ///
    /// The resource's own selection wins, then the nearest ancestor's
    /// selection for the same package, then the package default.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownResource`] if `id` is not in this stack.
    pub fn provider_for(&self, id: ResourceId) -> Result<ProviderRef, ResourceError> {
        let graph = self.inner.graph.read();
        let record = graph.record(id).ok_or(ResourceError::UnknownResource(id))?;
        let package = record.resource_type.package();
        Ok(record
            .providers
            .get(package)
            .cloned()
            .unwrap_or_else(|| ProviderRef::default_for(package)))
    }

    /// Returns the provider API selected for a resource.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::UnknownResource`] if `id` is not in this stack
    /// - [`ResourceError::Provider`] if the selected provider is missing or
    ///   does not implement `A`
    pub fn provider<A>(&self, id: ResourceId) -> Result<Arc<A>, ResourceError>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let provider = self.provider_for(id)?;
        Ok(self.inner.providers.get::<A>(&provider)?)
    }

    /// Returns the provider a resource of `resource_type` would be given if it
    /// were registered with `options`.
    ///
    /// Applies the same rule as [`provider_for`](Self::provider_for), so
    /// constructors can fail on a missing provider before anything is
    /// added to the graph.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownParent`] if `options.parent` is not in
    /// this stack.
    pub fn provider_for_new(
        &self,
        resource_type: &ResourceType,
        options: &ResourceOptions,
    ) -> Result<ProviderRef, ResourceError> {
        let package = resource_type.package();
        if let Some(provider) = options.provider.as_ref().filter(|p| p.package() == package) {
            return Ok(provider.clone());
        }
        let inherited = match options.parent {
            Some(parent) => {
                let graph = self.inner.graph.read();
                let record = graph.record(parent).ok_or(ResourceError::UnknownParent(parent))?;
                record.providers.get(package).cloned()
            }
            None => None,
        };
        Ok(inherited.unwrap_or_else(|| ProviderRef::default_for(package)))
    }

    /// Returns the provider API a resource of `resource_type` would use if it
    /// were registered with `options`.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::UnknownParent`] if `options.parent` is not in this stack
    /// - [`ResourceError::Provider`] if the selected provider is missing or
    ///   does not implement `A`
    pub fn resolve_provider<A>(
        &self,
        resource_type: &ResourceType,
        options: &ResourceOptions,
    ) -> Result<Arc<A>, ResourceError>
    where
        A: ?Sized + Send + Sync + 'static,
    {
        let provider = self.provider_for_new(resource_type, options)?;
        Ok(self.inner.providers.get::<A>(&provider)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Issues a provisioning operation on behalf of `resource`.
    ///
    /// The returned Output depends on `resource` and settles with the
    /// operation's result once [`run()`](Self::run) drives it.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownResource`] if `resource` is not in this
    /// stack.
    pub fn issue<T, Fut>(&self, resource: ResourceId, operation: Fut) -> Result<Output<T>, ResourceError>
    where
        T: Clone + Send + 'static,
        Fut: Future<Output = Result<T, OutputError>> + Send + 'static,
    {
        let urn = self.urn(resource)?;
        let output = Output::with_dependencies([resource]);
        let operation = tracked(urn, &self.inner.failures, output.clone(), operation);
        self.inner.queue.lock().push(operation);
        Ok(output)
    }

    /// Issues an operation that needs the value of `input`.
    ///
    /// The operation is queued once `input` resolves. If `input` fails, the
    /// operation never runs and the returned Output fails with the same
    /// error. Its dependencies are those of `input` plus `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownResource`] if `resource` is not in this
    /// stack.
    pub fn issue_with<I, T, F, Fut>(
        &self,
        resource: ResourceId,
        input: &Output<I>,
        operation: F,
    ) -> Result<Output<T>, ResourceError>
    where
        I: Clone + Send + 'static,
        T: Clone + Send + 'static,
        F: FnOnce(I) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, OutputError>> + Send + 'static,
    {
        let urn = self.urn(resource)?;
        let output = Output::with_dependencies(input.dependencies().iter().copied().chain([resource]));
        let target = output.clone();
        let queue = Arc::clone(&self.inner.queue);
        let failures = Arc::clone(&self.inner.failures);

        input.on_settle(move |result| match result {
            Ok(value) => {
                let operation = tracked(urn, &failures, target, operation(value.clone()));
                queue.lock().push(operation);
            }
            Err(error) => {
                tracing::debug!(%urn, %error, "skipping operation: input failed");
                failures.lock().push(OperationFailure {
                    urn,
                    error: error.clone(),
                    skipped: true,
                });
                target.settle_once(Err(error.clone()));
            }
        });
        Ok(output)
    }

    /// Returns the number of operations waiting to be driven.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Drives queued operations until none remain.
    ///
    /// Operations run concurrently. Operations queued while the loop runs,
    /// such as those released by [`issue_with`](Self::issue_with) when an
    /// input resolves, are picked up as soon as any in-flight operation
    /// completes. Failures are collected rather than aborting the run.
    pub async fn run(&self) -> RunSummary {
        let mut in_flight = FuturesUnordered::new();
        let mut completed = 0;

        loop {
            in_flight.extend(self.inner.queue.lock().drain(..));
            if in_flight.next().await.is_none() {
                break;
            }
            completed += 1;
        }

        let failures = core::mem::take(&mut *self.inner.failures.lock());
        if failures.is_empty() {
            tracing::info!(stack = %self.inner.name, completed, "run finished");
        } else {
            tracing::warn!(stack = %self.inner.name, completed, failed = failures.len(), "run finished with failures");
        }
        RunSummary { completed, failures }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Exports
    // ─────────────────────────────────────────────────────────────────────────

    /// Publishes an Output as a stack-level export, replacing any previous
    /// export of the same name.
    pub fn export<T>(&self, name: impl Into<String>, output: &Output<T>)
    where
        T: Clone + Send + Serialize + 'static,
    {
        self.inner.exports.lock().insert(name, output);
    }

    /// Returns the stack exports in the order they were published.
    #[must_use]
    pub fn exports(&self) -> Outputs {
        self.inner.exports.lock().clone()
    }
}

/// Wraps an operation so that it settles `target` and records its failure.
fn tracked<T, Fut>(
    urn: Urn,
    failures: &Arc<Mutex<Vec<OperationFailure>>>,
    target: Output<T>,
    operation: Fut,
) -> Operation
where
    T: Clone + Send + 'static,
    Fut: Future<Output = Result<T, OutputError>> + Send + 'static,
{
    let failures = Arc::clone(failures);
    Box::pin(async move {
        let result = operation.await;
        if let Err(error) = &result {
            tracing::warn!(%urn, %error, "operation failed");
            failures.lock().push(OperationFailure {
                urn,
                error: error.clone(),
                skipped: false,
            });
        }
        target.settle_once(result);
    })
}
