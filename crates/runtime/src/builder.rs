//! Fluent assembly of a module stack around an external host.

use std::any::Any;
use std::sync::Arc;

use modstack_diagnostics::DiagnosticsCollector;
use modstack_module::StackModule;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, Result};
use crate::host::{DiagnosticsHost, ModuleHost, StackHost, VerboseHost};
use crate::lifecycle::ModuleLifecycleController;
use crate::registry::{ModuleRegistry, SharedRegistry};
use crate::sequencer::BootSequencer;

/// Runtime behavior toggles for the stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeFlags {
    /// Emit a structured diagnostics report around host start/stop.
    pub diagnostics: bool,

    /// Emit debug-level start/stop traces around the host.
    pub verbose: bool,
}

/// Builder wiring modules, diagnostics and the host decorator chain.
pub struct StackBuilder {
    registry: ModuleRegistry,
    flags: RuntimeFlags,
    services: Box<dyn Any + Send>,
}

impl std::fmt::Debug for StackBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackBuilder")
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl StackBuilder {
    /// Creates an empty builder with default flags and a unit service
    /// sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ModuleRegistry::new(),
            flags: RuntimeFlags::default(),
            services: Box::new(()),
        }
    }

    /// Sets the runtime flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Supplies the opaque registration sink handed to every module's
    /// service configuration hook. The runtime never inspects it.
    #[must_use]
    pub fn with_services(mut self, services: Box<dyn Any + Send>) -> Self {
        self.services = services;
        self
    }

    /// Attaches a module, enabled.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DuplicateModule`] if the name is already
    /// attached.
    pub fn attach_module(mut self, module: Arc<dyn StackModule>) -> Result<Self> {
        self.registry.register(module)?;
        Ok(self)
    }

    /// Disables an attached module without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownModule`] if no such module is
    /// attached.
    pub fn disable_module(mut self, name: &str) -> Result<Self> {
        self.registry.disable(name)?;
        Ok(self)
    }

    /// Wires registry, sequencer, lifecycle controller and diagnostics
    /// collector around `host` and composes the decorator chain: modules
    /// innermost, then the verbose and diagnostics decorators when their
    /// flags are set.
    pub fn build<H>(self, host: H) -> Stack
    where
        H: StackHost,
    {
        let registry: SharedRegistry = Arc::new(RwLock::new(self.registry));
        let diagnostics = DiagnosticsCollector::new();
        let sequencer = Arc::new(BootSequencer::new(Arc::clone(&registry)));
        let controller =
            ModuleLifecycleController::new(Arc::clone(&registry), diagnostics.clone());

        let mut chained: Box<dyn StackHost> = Box::new(ModuleHost::new(
            host,
            controller,
            Arc::clone(&sequencer),
            self.services,
        ));
        if self.flags.verbose {
            chained = Box::new(VerboseHost::new(chained));
        }
        if self.flags.diagnostics {
            chained = Box::new(DiagnosticsHost::new(
                chained,
                Arc::clone(&registry),
                sequencer,
                diagnostics.clone(),
                self.flags,
            ));
        }

        Stack {
            host: chained,
            registry,
            diagnostics,
            shutdown_token: CancellationToken::new(),
        }
    }
}

impl Default for StackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully wired module stack around an external host.
pub struct Stack {
    host: Box<dyn StackHost>,
    registry: SharedRegistry,
    diagnostics: DiagnosticsCollector,
    shutdown_token: CancellationToken,
}

impl Stack {
    /// Starts the stack: modules in dependency order, then the host.
    ///
    /// # Errors
    ///
    /// Propagates boot-sequence and lifecycle errors, and the host's own
    /// start error.
    pub async fn start(&self) -> std::result::Result<(), BoxError> {
        self.host.start(self.shutdown_token.clone()).await
    }

    /// Stops the stack: the host, then modules in reverse order.
    ///
    /// # Errors
    ///
    /// Propagates the host's stop error, or the aggregated module stop
    /// failures when the host stopped cleanly.
    pub async fn stop(&self) -> std::result::Result<(), BoxError> {
        self.host.stop(self.shutdown_token.clone()).await
    }

    /// Token observed by every module and host operation; cancelling it
    /// aborts an in-progress boot after best-effort rollback.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Handle to the module registry.
    #[must_use]
    pub const fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Handle to the diagnostics collector.
    #[must_use]
    pub const fn diagnostics(&self) -> &DiagnosticsCollector {
        &self.diagnostics
    }
}
