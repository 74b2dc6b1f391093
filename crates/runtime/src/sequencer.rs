//! Boot sequence computation with lazy, generation-keyed caching.

use parking_lot::Mutex;

use crate::error::Result;
use crate::registry::{ModuleDescriptor, SharedRegistry};
use crate::resolver;

/// The dependency-respecting order in which enabled modules boot.
///
/// Derived, not authoritative: recomputed by the sequencer whenever the
/// registry's enabled set changes.
#[derive(Debug, Clone)]
pub struct BootSequence {
    modules: Vec<ModuleDescriptor>,
}

impl BootSequence {
    /// Modules in start order.
    #[must_use]
    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    /// Modules in shutdown order; a derived view, no recomputation.
    pub fn reverse(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter().rev()
    }

    /// Number of modules in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no enabled modules were registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Computes the boot sequence for the registry's enabled modules,
/// caching the result until the enabled set changes.
pub struct BootSequencer {
    registry: SharedRegistry,
    cached: Mutex<Option<(u64, BootSequence)>>,
}

impl BootSequencer {
    /// Creates a sequencer over the given registry handle.
    #[must_use]
    pub const fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            cached: Mutex::new(None),
        }
    }

    /// Returns the current boot sequence, recomputing only when the
    /// registry's enabled set has changed since the last call.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::Error::MissingDependency`] and
    /// [`crate::Error::CyclicDependency`] from resolution.
    pub fn compute(&self) -> Result<BootSequence> {
        let generation = self.registry.read().generation();

        let mut cached = self.cached.lock();
        if let Some((cached_generation, sequence)) = cached.as_ref() {
            if *cached_generation == generation {
                return Ok(sequence.clone());
            }
        }

        let enabled = self.registry.read().enabled_modules();
        let sequence = BootSequence {
            modules: resolver::resolve(&enabled)?,
        };
        *cached = Some((generation, sequence.clone()));

        Ok(sequence)
    }
}
