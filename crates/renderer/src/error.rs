/// Failures surfaced by the GPU facade.
///
/// None of these are retried. The caller decides whether a fresh run is worth
/// starting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpuError {
    #[error("GPU environment unsupported: {0}")]
    Unsupported(String),
    #[error("out of GPU memory while creating {resource}: {message}")]
    ResourceExhausted { resource: String, message: String },
    #[error("GPU validation failed for {label}: {message}")]
    Validation { label: String, message: String },
    #[error("GPU device error: {0}")]
    Device(String),
    #[error("failed to read back {label}: {message}")]
    Readback { label: String, message: String },
}

impl GpuError {
    pub(crate) fn from_scope(label: &str, err: wgpu::Error) -> Self {
        match &err {
            wgpu::Error::OutOfMemory { .. } => GpuError::ResourceExhausted {
                resource: label.to_string(),
                message: err.to_string(),
            },
            wgpu::Error::Validation { description, .. } => GpuError::Validation {
                label: label.to_string(),
                message: description.clone(),
            },
            _ => GpuError::Device(format!("{label}: {err}")),
        }
    }

    /// True for allocation failures, which callers may want to report with
    /// a hint about lowering the resolution.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, GpuError::ResourceExhausted { .. })
    }
}
