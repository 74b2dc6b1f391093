use std::fmt;

/// Lifecycle state of a registered module.
///
/// Forward transitions run in boot-sequence order:
///
/// ```text
/// New → PreInited → ServicesConfigured → Starting → Started
/// ```
///
/// Shutdown transitions run in reverse boot-sequence order:
///
/// ```text
/// Started → Stopping → Stopped
/// ```
///
/// `Failed` is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModuleState {
    /// Registered but not yet touched by the lifecycle controller.
    #[default]
    New,

    /// The pre-init hook completed.
    PreInited,

    /// The module contributed its service registrations.
    ServicesConfigured,

    /// The start hook is running.
    Starting,

    /// The start hook completed; the module is live.
    Started,

    /// The stop hook is running.
    Stopping,

    /// The stop hook completed.
    Stopped,

    /// A lifecycle hook failed.
    Failed,
}

impl ModuleState {
    /// Returns `true` if the module is live.
    #[must_use]
    pub const fn is_started(self) -> bool {
        matches!(self, Self::Started)
    }

    /// Returns `true` if the module will make no further transitions.
    ///
    /// Terminal states: `Stopped`, `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::PreInited => write!(f, "pre-inited"),
            Self::ServicesConfigured => write!(f, "services-configured"),
            Self::Starting => write!(f, "starting"),
            Self::Started => write!(f, "started"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
