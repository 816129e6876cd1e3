//! Plugins that install providers and settings into a stack.
//!
//! Backends are delivered as plugins: each one registers its provider API
//! with the [`StackBuilder`] during [`Plugin::build`]. The builder orders
//! plugins by their declared dependencies before building them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tessera_system::plugin::Plugin;
//! use tessera_system::provider::ProviderRef;
//! use tessera_system::stack::{StackBuilder, StackError};
//!
//! trait Clock: Send + Sync {}
//! struct SystemClock;
//! impl Clock for SystemClock {}
//!
//! struct ClockPlugin;
//!
//! impl Plugin for ClockPlugin {
//!     fn build(&self, stack: &mut StackBuilder) -> Result<(), StackError> {
//!         let api: Arc<dyn Clock> = Arc::new(SystemClock);
//!         stack.register_provider(ProviderRef::default_for("clock"), api)?;
//!         Ok(())
//!     }
//! }
//!
//! let stack = StackBuilder::new("dev").add_plugins(ClockPlugin).build().unwrap();
//! assert!(stack.providers().contains(&ProviderRef::default_for("clock")));
//! ```

use core::any::TypeId;

use crate::stack::{StackBuilder, StackError};

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Used for dependency resolution and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of stack configuration.
pub trait Plugin: Send + Sync + 'static {
    /// Configures the stack. Called once, in dependency order.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails, e.g. a provider name is taken.
    fn build(&self, stack: &mut StackBuilder) -> Result<(), StackError>;

    /// Returns the plugin's name for debugging and error messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares plugins that must be built before this one.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if this plugin can only be added once.
    ///
    /// Set to `false` for plugins that can be added multiple times with
    /// different configurations, such as one provider instance per cluster.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait (for add_plugins polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Types that can be added to a [`StackBuilder`]: single plugins and groups.
pub trait Plugins {
    /// Adds these plugins to the builder.
    fn add_to_stack(self, stack: &mut StackBuilder);
}

impl<P: Plugin> Plugins for P {
    fn add_to_stack(self, stack: &mut StackBuilder) {
        stack.add_plugin_boxed(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(self),
        });
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_stack(self, stack: &mut StackBuilder) {
        for boxed in self.plugins {
            stack.add_plugin_boxed(boxed);
        }
    }
}

/// A collection of plugins that can be added together.
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin with its captured [`PluginId`].
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

/// Builder for customizing plugin groups.
#[derive(Default)]
pub struct PluginGroupBuilder {
    plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates a new empty plugin group builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        });
        self
    }

    /// Removes a plugin from the group by type. No-op if absent.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let id = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != id);
        self
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group contains no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
