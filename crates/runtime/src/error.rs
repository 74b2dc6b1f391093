//! Error types for the modstack runtime.

use std::fmt;

use thiserror::Error;

/// Boxed error produced by module hooks and wrapped hosts.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure stopping one module during shutdown or rollback.
#[derive(Debug)]
pub struct StopFailure {
    /// Name of the module that failed to stop.
    pub module: String,

    /// The underlying stop error.
    pub source: BoxError,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module, self.source)
    }
}

/// Error type for the modstack runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A module with the same name is already registered.
    #[error("module already registered: {name}")]
    DuplicateModule {
        /// The duplicated module name.
        name: String,
    },

    /// An operation referenced a module name that is not registered.
    #[error("unknown module: {name}")]
    UnknownModule {
        /// The unregistered name.
        name: String,
    },

    /// A declared dependency is absent from the given module set.
    #[error("module {module} depends on {dependency}, which is not in the enabled set")]
    MissingDependency {
        /// The requiring module.
        module: String,
        /// The dependency missing from the set.
        dependency: String,
    },

    /// The dependency graph contains a cycle.
    #[error("cyclic module dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// The ordered cycle path; the first entry closes the cycle.
        cycle: Vec<String>,
    },

    /// A module's pre-init hook failed; the boot was aborted before any
    /// module started.
    #[error("module {module} failed during pre-init: {source}")]
    ModulePreInit {
        /// The failing module.
        module: String,
        /// The underlying pre-init error.
        #[source]
        source: BoxError,
    },

    /// A module's start hook failed; already-started modules were stopped
    /// best-effort in reverse order.
    #[error("module {module} failed to start: {source}")]
    ModuleStart {
        /// The failing module.
        module: String,
        /// The underlying start error.
        #[source]
        source: BoxError,
        /// Rollback stop failures, in the order the stops were attempted.
        rollback: Vec<StopFailure>,
    },

    /// One or more modules failed to stop during shutdown. Every module in
    /// the sequence was still attempted.
    #[error("{} module(s) failed to stop: {}", failures.len(), format_failures(failures))]
    Shutdown {
        /// The collected stop failures, in the order the stops were
        /// attempted.
        failures: Vec<StopFailure>,
    },

    /// The boot was cancelled before every module started.
    #[error("boot cancelled")]
    Cancelled {
        /// Rollback stop failures, in the order the stops were attempted.
        rollback: Vec<StopFailure>,
    },
}

fn format_failures(failures: &[StopFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
