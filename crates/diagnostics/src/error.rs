use thiserror::Error;

/// Error type for diagnostics report rendering.
///
/// Render failures are always contained by the caller; they are logged at
/// the boundary where rendering happens and never affect the outcome of
/// the operation being diagnosed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Formatting failure while writing report text.
    #[error("failed to write report text: {0}")]
    Format(#[from] std::fmt::Error),
}
