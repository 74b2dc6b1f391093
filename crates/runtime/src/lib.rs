//! Module orchestration runtime: registry, deterministic dependency
//! resolution, boot sequencing, lifecycle control and host decoration for
//! stackable application modules.
//!
//! The runtime decides *when* and *in what order* modules are initialized,
//! started and stopped, and *what is recorded* about that process; what a
//! module does is its own business. Hosting, service containers and
//! transports stay outside: the runtime wraps an opaque
//! [`StackHost`] and passes the service registration sink through
//! untouched.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod builder;
mod error;
mod host;
mod lifecycle;
mod registry;
mod resolver;
mod sequencer;

pub use builder::{RuntimeFlags, Stack, StackBuilder};
pub use error::{BoxError, Error, Result, StopFailure};
pub use host::{DiagnosticsHost, ModuleHost, StackHost, VerboseHost};
pub use lifecycle::ModuleLifecycleController;
pub use registry::{ModuleDescriptor, ModuleRegistry, SharedRegistry};
pub use resolver::resolve;
pub use sequencer::{BootSequence, BootSequencer};
