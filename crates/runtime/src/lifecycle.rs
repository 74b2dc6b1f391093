//! Drives registered modules through their lifecycle state machine.

use std::any::Any;
use std::sync::Arc;

use modstack_diagnostics::DiagnosticsCollector;
use modstack_module::{ModuleState, StackModule};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::{Error, Result, StopFailure};
use crate::registry::SharedRegistry;
use crate::sequencer::BootSequence;

/// Drives each module in the boot sequence through its lifecycle states,
/// recording one lap time per completed transition.
///
/// Forward transitions run strictly in boot-sequence order, shutdown in
/// reverse, so a module's dependencies are always fully started before it
/// and fully stopped after it. Execution is sequential; module counts are
/// small and ordering matters far more than throughput.
pub struct ModuleLifecycleController {
    registry: SharedRegistry,
    diagnostics: DiagnosticsCollector,
}

impl ModuleLifecycleController {
    /// Creates a controller over the given registry and collector handles.
    #[must_use]
    pub const fn new(registry: SharedRegistry, diagnostics: DiagnosticsCollector) -> Self {
        Self {
            registry,
            diagnostics,
        }
    }

    /// Boots the sequence: pre-init and service configuration for every
    /// module, then start in dependency order.
    ///
    /// Cancellation is observed between transitions; once observed, no new
    /// forward transition is initiated and already-started modules are
    /// rolled back best-effort in reverse order. The token is also passed
    /// into every in-flight module start.
    ///
    /// # Errors
    ///
    /// - [`Error::ModulePreInit`] if a pre-init hook fails; the boot
    ///   aborts before any module starts.
    /// - [`Error::ModuleStart`] if a start hook fails, carrying any
    ///   rollback stop failures.
    /// - [`Error::Cancelled`] if the token was cancelled before every
    ///   module started.
    /// - [`Error::UnknownModule`] if a sequenced module is absent from
    ///   the registry.
    pub async fn start_all(
        &self,
        sequence: &BootSequence,
        services: &mut (dyn Any + Send),
        cancel: &CancellationToken,
    ) -> Result<()> {
        for descriptor in sequence.modules() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    rollback: Vec::new(),
                });
            }

            let module = self.instance(&descriptor.name)?;
            debug!("pre-initializing module {}", descriptor.name);

            if let Err(source) = module.pre_init() {
                self.set_state(&descriptor.name, ModuleState::Failed);
                return Err(Error::ModulePreInit {
                    module: descriptor.name.clone(),
                    source,
                });
            }

            self.set_state(&descriptor.name, ModuleState::PreInited);
            self.diagnostics
                .register_lap_time(format!("{} pre-inited", descriptor.name));
        }

        for descriptor in sequence.modules() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    rollback: Vec::new(),
                });
            }

            let module = self.instance(&descriptor.name)?;
            debug!("configuring services for module {}", descriptor.name);
            module.configure_services(services);

            self.set_state(&descriptor.name, ModuleState::ServicesConfigured);
            self.diagnostics
                .register_lap_time(format!("{} services configured", descriptor.name));
        }

        let mut started: Vec<String> = Vec::new();
        for descriptor in sequence.modules() {
            if cancel.is_cancelled() {
                warn!(
                    "boot cancelled; rolling back {} started module(s)",
                    started.len()
                );
                let rollback = self.stop_started(&started, cancel).await;
                return Err(Error::Cancelled { rollback });
            }

            let module = self.instance(&descriptor.name)?;
            self.set_state(&descriptor.name, ModuleState::Starting);
            debug!("starting module {}", descriptor.name);

            match module.start(cancel.clone()).await {
                Ok(()) => {
                    self.set_state(&descriptor.name, ModuleState::Started);
                    self.diagnostics
                        .register_lap_time(format!("{} started", descriptor.name));
                    started.push(descriptor.name.clone());
                }
                Err(source) => {
                    self.set_state(&descriptor.name, ModuleState::Failed);
                    error!("module {} failed to start: {}", descriptor.name, source);

                    let rollback = self.stop_started(&started, cancel).await;
                    return Err(Error::ModuleStart {
                        module: descriptor.name.clone(),
                        source,
                        rollback,
                    });
                }
            }
        }

        Ok(())
    }

    /// Stops every started module in reverse boot-sequence order.
    ///
    /// Best-effort: a failure stopping one module is recorded and does not
    /// prevent attempting to stop the rest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shutdown`] aggregating every stop failure once all
    /// stops have been attempted.
    pub async fn stop_all(
        &self,
        sequence: &BootSequence,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let names: Vec<String> = sequence
            .modules()
            .iter()
            .map(|descriptor| descriptor.name.clone())
            .collect();

        let failures = self.stop_started(&names, cancel).await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Shutdown { failures })
        }
    }

    /// Reverse-order stop over `names`, skipping modules that never
    /// reached `Started`. Collects failures instead of short-circuiting.
    async fn stop_started(
        &self,
        names: &[String],
        cancel: &CancellationToken,
    ) -> Vec<StopFailure> {
        let mut failures = Vec::new();

        for name in names.iter().rev() {
            if self.registry.read().state(name) != Some(ModuleState::Started) {
                continue;
            }

            let module = match self.instance(name) {
                Ok(module) => module,
                Err(source) => {
                    failures.push(StopFailure {
                        module: name.clone(),
                        source: source.into(),
                    });
                    continue;
                }
            };
            self.set_state(name, ModuleState::Stopping);
            debug!("stopping module {name}");

            match module.stop(cancel.clone()).await {
                Ok(()) => {
                    self.set_state(name, ModuleState::Stopped);
                    self.diagnostics.register_lap_time(format!("{name} stopped"));
                }
                Err(source) => {
                    self.set_state(name, ModuleState::Failed);
                    warn!("module {name} failed to stop: {source}");
                    failures.push(StopFailure {
                        module: name.clone(),
                        source,
                    });
                }
            }
        }

        failures
    }

    fn instance(&self, name: &str) -> Result<Arc<dyn StackModule>> {
        self.registry
            .read()
            .instance(name)
            .ok_or_else(|| Error::UnknownModule {
                name: name.to_string(),
            })
    }

    fn set_state(&self, name: &str, state: ModuleState) {
        self.registry.write().set_state(name, state);
    }
}
