use renderer::{BindingError, GpuError};

/// Ways a render run can fail. Cancellation is an outcome, not an error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid render request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("bind group does not match its layout: {0}")]
    Binding(#[from] BindingError),
    #[error("accumulation run has already been started")]
    AlreadyFinished,
    #[error("failed to spawn render worker: {0}")]
    Spawn(String),
    #[error("render worker panicked")]
    WorkerPanicked,
}
