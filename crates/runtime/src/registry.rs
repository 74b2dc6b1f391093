//! Runtime information about attached modules.

use std::sync::Arc;

use modstack_module::{ModuleState, StackModule};
use parking_lot::RwLock;

use crate::error::{Error, Result};

/// Shared handle to the registry, passed by reference to the components
/// that need it rather than looked up through ambient globals.
pub type SharedRegistry = Arc<RwLock<ModuleRegistry>>;

/// Immutable metadata snapshot describing one registered module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Unique module name.
    pub name: String,

    /// Names of modules that must start before this one.
    pub dependencies: Vec<String>,

    /// Whether the module participates in the boot sequence.
    pub enabled: bool,

    /// Lifecycle state at the time the snapshot was taken.
    pub state: ModuleState,
}

struct ModuleRuntime {
    module: Arc<dyn StackModule>,
    enabled: bool,
    state: ModuleState,
}

impl ModuleRuntime {
    fn describe(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            name: self.module.name().to_string(),
            dependencies: self
                .module
                .dependencies()
                .iter()
                .map(ToString::to_string)
                .collect(),
            enabled: self.enabled,
            state: self.state,
        }
    }
}

/// Owns the live set of registered module instances and their runtime
/// state, in registration order.
pub struct ModuleRegistry {
    modules: Vec<ModuleRuntime>,
    generation: u64,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modules: Vec::new(),
            generation: 0,
        }
    }

    /// Registers a module, enabled, in state `New`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateModule`] if a module with the same name is
    /// already registered; the registry is left unchanged.
    pub fn register(&mut self, module: Arc<dyn StackModule>) -> Result<()> {
        if self
            .modules
            .iter()
            .any(|entry| entry.module.name() == module.name())
        {
            return Err(Error::DuplicateModule {
                name: module.name().to_string(),
            });
        }

        self.modules.push(ModuleRuntime {
            module,
            enabled: true,
            state: ModuleState::New,
        });
        self.generation += 1;

        Ok(())
    }

    /// Enables a module. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModule`] if no module with that name is
    /// registered.
    pub fn enable(&mut self, name: &str) -> Result<()> {
        self.set_enabled(name, true)
    }

    /// Disables a module, excluding it from the next computed boot
    /// sequence without losing its registration. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModule`] if no module with that name is
    /// registered.
    pub fn disable(&mut self, name: &str) -> Result<()> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let entry = self
            .modules
            .iter_mut()
            .find(|entry| entry.module.name() == name)
            .ok_or_else(|| Error::UnknownModule {
                name: name.to_string(),
            })?;

        if entry.enabled != enabled {
            entry.enabled = enabled;
            self.generation += 1;
        }

        Ok(())
    }

    /// Monotonic counter bumped whenever the registered or enabled set
    /// changes; consumed by the boot sequencer's cache.
    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    /// Descriptors of all enabled modules, in registration order.
    #[must_use]
    pub fn enabled_modules(&self) -> Vec<ModuleDescriptor> {
        self.modules
            .iter()
            .filter(|entry| entry.enabled)
            .map(ModuleRuntime::describe)
            .collect()
    }

    /// Descriptors of all disabled modules, in registration order.
    #[must_use]
    pub fn disabled_modules(&self) -> Vec<ModuleDescriptor> {
        self.modules
            .iter()
            .filter(|entry| !entry.enabled)
            .map(ModuleRuntime::describe)
            .collect()
    }

    /// Descriptor of the named module, if registered.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<ModuleDescriptor> {
        self.find(name).map(ModuleRuntime::describe)
    }

    /// Lifecycle state of the named module, if registered.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.find(name).map(|entry| entry.state)
    }

    pub(crate) fn set_state(&mut self, name: &str, state: ModuleState) {
        if let Some(entry) = self
            .modules
            .iter_mut()
            .find(|entry| entry.module.name() == name)
        {
            entry.state = state;
        }
    }

    pub(crate) fn instance(&self, name: &str) -> Option<Arc<dyn StackModule>> {
        self.find(name).map(|entry| Arc::clone(&entry.module))
    }

    fn find(&self, name: &str) -> Option<&ModuleRuntime> {
        self.modules.iter().find(|entry| entry.module.name() == name)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use modstack_module::BoxError;
    use tokio_util::sync::CancellationToken;

    struct Plain {
        name: &'static str,
    }

    #[async_trait]
    impl StackModule for Plain {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self, _cancel: CancellationToken) -> std::result::Result<(), BoxError> {
            Ok(())
        }

        async fn stop(&self, _cancel: CancellationToken) -> std::result::Result<(), BoxError> {
            Ok(())
        }
    }

    fn module(name: &'static str) -> Arc<dyn StackModule> {
        Arc::new(Plain { name })
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("core")).unwrap();

        let err = registry.register(module("core")).unwrap_err();
        assert!(matches!(err, Error::DuplicateModule { name } if name == "core"));
        assert_eq!(registry.enabled_modules().len(), 1);
    }

    #[test]
    fn disable_keeps_registration() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("core")).unwrap();
        registry.register(module("web")).unwrap();

        registry.disable("web").unwrap();

        let enabled: Vec<String> = registry
            .enabled_modules()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(enabled, vec!["core"]);

        let disabled: Vec<String> = registry
            .disabled_modules()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(disabled, vec!["web"]);

        registry.enable("web").unwrap();
        assert_eq!(registry.enabled_modules().len(), 2);
    }

    #[test]
    fn toggles_are_idempotent() {
        let mut registry = ModuleRegistry::new();
        registry.register(module("core")).unwrap();

        let generation = registry.generation();
        registry.enable("core").unwrap();
        assert_eq!(registry.generation(), generation);

        registry.disable("core").unwrap();
        registry.disable("core").unwrap();
        assert_eq!(registry.generation(), generation + 1);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut registry = ModuleRegistry::new();
        let err = registry.disable("ghost").unwrap_err();
        assert!(matches!(err, Error::UnknownModule { name } if name == "ghost"));
    }

    #[test]
    fn views_preserve_registration_order() {
        let mut registry = ModuleRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(module(name)).unwrap();
        }

        let names: Vec<String> = registry
            .enabled_modules()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
