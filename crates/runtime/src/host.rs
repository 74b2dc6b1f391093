//! Host wrapping: the opaque startable/stoppable unit supplied by the
//! embedding application, and the decorators layered around it.
//!
//! Decoration is explicit composition: each wrapper holds the next unit
//! in the chain and fully delegates the start/stop contract, adding no
//! failure modes of its own. Diagnostics rendering errors in particular
//! are logged, never propagated past the decorator boundary.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use modstack_diagnostics::{self as diagnostics, DiagnosticsCollector, DiagnosticsSection};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::builder::RuntimeFlags;
use crate::error::BoxError;
use crate::lifecycle::ModuleLifecycleController;
use crate::registry::SharedRegistry;
use crate::sequencer::{BootSequence, BootSequencer};

const TIMETABLE_SECTION_KEY: &str = "Timetable";

/// An externally supplied startable/stoppable unit.
#[async_trait]
pub trait StackHost
where
    Self: Send + Sync + 'static,
{
    /// Start the host.
    async fn start(&self, cancel: CancellationToken) -> Result<(), BoxError>;

    /// Stop the host.
    async fn stop(&self, cancel: CancellationToken) -> Result<(), BoxError>;
}

#[async_trait]
impl StackHost for Box<dyn StackHost> {
    async fn start(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        (**self).start(cancel).await
    }

    async fn stop(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        (**self).stop(cancel).await
    }
}

/// Innermost decorator: boots the module sequence before delegating start
/// to the wrapped host, and tears the modules down in reverse after
/// delegating stop.
///
/// The sequence is captured at start and reused for teardown, so registry
/// changes made while the stack is running never leak a started module or
/// abort the shutdown.
pub struct ModuleHost<H> {
    inner: H,
    controller: ModuleLifecycleController,
    sequencer: Arc<BootSequencer>,
    services: Mutex<Box<dyn Any + Send>>,
    booted: parking_lot::Mutex<Option<BootSequence>>,
}

impl<H> ModuleHost<H>
where
    H: StackHost,
{
    /// Wraps `inner`, booting modules through `controller` in the order
    /// computed by `sequencer`. `services` is the opaque registration sink
    /// handed to every module's service configuration hook.
    pub fn new(
        inner: H,
        controller: ModuleLifecycleController,
        sequencer: Arc<BootSequencer>,
        services: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            inner,
            controller,
            sequencer,
            services: Mutex::new(services),
            booted: parking_lot::Mutex::new(None),
        }
    }
}

#[async_trait]
impl<H> StackHost for ModuleHost<H>
where
    H: StackHost,
{
    async fn start(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        let sequence = self.sequencer.compute()?;
        *self.booted.lock() = Some(sequence.clone());

        let mut services = self.services.lock().await;
        self.controller
            .start_all(&sequence, services.as_mut(), &cancel)
            .await?;
        drop(services);

        self.inner.start(cancel).await
    }

    async fn stop(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        let host_outcome = self.inner.stop(cancel.clone()).await;

        // Tear down the sequence the stack booted with, not a freshly
        // resolved one; the enabled set may have changed since.
        let booted = self.booted.lock().clone();
        let modules_outcome = match booted {
            Some(sequence) => self.controller.stop_all(&sequence, &cancel).await,
            None => Ok(()),
        };

        // The host's own outcome wins; module stop failures surface only
        // when the host stopped cleanly.
        if host_outcome.is_err() {
            if let Err(e) = modules_outcome {
                warn!("module teardown also failed: {e}");
            }
            return host_outcome;
        }
        modules_outcome.map_err(Into::into)
    }
}

/// Logging decorator: debug-level start/stop traces around the wrapped
/// unit.
pub struct VerboseHost<H> {
    inner: H,
}

impl<H> VerboseHost<H>
where
    H: StackHost,
{
    /// Wraps `inner` with start/stop tracing.
    pub const fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H> StackHost for VerboseHost<H>
where
    H: StackHost,
{
    async fn start(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        debug!("> Host starting");
        self.inner.start(cancel).await?;
        debug!("> Host started");
        Ok(())
    }

    async fn stop(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        debug!("> Host stopping");
        self.inner.stop(cancel).await?;
        debug!("> Host stopped");
        Ok(())
    }
}

/// Diagnostics decorator: registers lap times around the wrapped unit's
/// start/stop and emits a rendered report afterwards.
///
/// The startup report carries the flags, module membership, timetable and
/// per-module sections; the shutdown report renders only the timetable,
/// since a full report is unnecessary noise at teardown.
pub struct DiagnosticsHost<H> {
    inner: H,
    registry: SharedRegistry,
    sequencer: Arc<BootSequencer>,
    diagnostics: DiagnosticsCollector,
    flags: RuntimeFlags,
}

impl<H> DiagnosticsHost<H>
where
    H: StackHost,
{
    /// Wraps `inner` with lap-time registration and report emission.
    pub const fn new(
        inner: H,
        registry: SharedRegistry,
        sequencer: Arc<BootSequencer>,
        diagnostics: DiagnosticsCollector,
        flags: RuntimeFlags,
    ) -> Self {
        Self {
            inner,
            registry,
            sequencer,
            diagnostics,
            flags,
        }
    }

    fn add_flags_section(&self) {
        let mut section = DiagnosticsSection::new("Flags");
        section.push_line(format!("- diagnostics: {}", self.flags.diagnostics));
        section.push_line(format!("- verbose: {}", self.flags.verbose));
        self.diagnostics.add_section("Flags", section);
    }

    fn add_modules_section(&self) {
        let mut section = DiagnosticsSection::new("Modules");

        let (enabled, disabled) = {
            let registry = self.registry.read();
            (registry.enabled_modules(), registry.disabled_modules())
        };

        section.push_line("- Enabled modules");
        for descriptor in &enabled {
            section.push_line(format!("   - {}", descriptor.name));
        }

        section.push_line("- Disabled modules");
        for descriptor in &disabled {
            section.push_line(format!("   - {}", descriptor.name));
        }

        section.push_line("- Boot sequence");
        match self.sequencer.compute() {
            Ok(sequence) => {
                for descriptor in sequence.modules() {
                    section.push_line(format!("   - {}", descriptor.name));
                }
            }
            Err(e) => warn!("failed to compute boot sequence for diagnostics: {e}"),
        }

        self.diagnostics.add_section("Modules", section);
    }

    fn add_timetable_section(&self) {
        let laps = self.diagnostics.clear_timetable();
        self.diagnostics
            .add_section(TIMETABLE_SECTION_KEY, diagnostics::timetable_section(&laps));
    }

    fn add_module_diagnostics(&self) {
        let Ok(sequence) = self.sequencer.compute() else {
            return;
        };

        for descriptor in sequence.modules() {
            let instance = self.registry.read().instance(&descriptor.name);
            if let Some(module) = instance {
                module.diagnose(&self.diagnostics);
            }
        }
    }
}

#[async_trait]
impl<H> StackHost for DiagnosticsHost<H>
where
    H: StackHost,
{
    async fn start(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        self.diagnostics.register_lap_time("Host starting");
        self.inner.start(cancel).await?;
        self.diagnostics.register_lap_time("Host started");

        self.add_flags_section();
        self.add_modules_section();
        self.add_timetable_section();
        self.add_module_diagnostics();

        match diagnostics::render_report("STARTUP DIAGNOSTICS", &self.diagnostics.sections()) {
            Ok(report) => debug!("{report}"),
            Err(e) => warn!("failed to render startup diagnostics: {e}"),
        }

        Ok(())
    }

    async fn stop(&self, cancel: CancellationToken) -> Result<(), BoxError> {
        self.diagnostics.register_lap_time("Host stopping");
        self.inner.stop(cancel).await?;
        self.diagnostics.register_lap_time("Host stopped");

        self.add_timetable_section();

        let sections: Vec<DiagnosticsSection> = self
            .diagnostics
            .get(TIMETABLE_SECTION_KEY)
            .into_iter()
            .collect();
        match diagnostics::render_report("SHUTDOWN DIAGNOSTICS", &sections) {
            Ok(report) => debug!("{report}"),
            Err(e) => warn!("failed to render shutdown diagnostics: {e}"),
        }

        Ok(())
    }
}
