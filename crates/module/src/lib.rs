//! Abstract interface for stackable application modules.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod state;

pub use state::ModuleState;

use std::any::Any;

use async_trait::async_trait;
use modstack_diagnostics::DiagnosticsCollector;
use tokio_util::sync::CancellationToken;

/// Boxed error type returned by module lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for stackable application modules.
///
/// Modules declare their dependencies as an explicit list of module names;
/// the runtime starts a module only after every dependency is fully
/// started, and stops it before any dependency is stopped.
#[async_trait]
pub trait StackModule
where
    Self: Send + Sync + 'static,
{
    /// Get the unique name of the module.
    fn name(&self) -> &str;

    /// Names of modules that must be fully started before this one.
    fn dependencies(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Called once per module before any service configuration.
    ///
    /// # Errors
    ///
    /// A pre-init failure is fatal to the whole boot; no partial pre-init
    /// state is considered usable.
    fn pre_init(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Contribute service registrations to the opaque sink.
    ///
    /// The sink is passed through to the external service layer unchanged;
    /// the runtime never inspects it. This step must be free of observable
    /// side effects beyond registration (no I/O).
    fn configure_services(&self, _services: &mut (dyn Any + Send)) {}

    /// Start the module. May perform I/O; should observe `cancel`.
    async fn start(&self, cancel: CancellationToken) -> Result<(), BoxError>;

    /// Stop the module. May perform I/O; should observe `cancel`.
    async fn stop(&self, cancel: CancellationToken) -> Result<(), BoxError>;

    /// Contribute module-specific report sections after startup.
    fn diagnose(&self, _diagnostics: &DiagnosticsCollector) {}
}
