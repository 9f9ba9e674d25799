//! GPU side of the progressive path tracer.
//!
//! The scheduler never talks to wgpu directly. It drives the [`GpuFacade`]
//! trait, which [`WgpuBackend`] implements on top of a headless device:
//! - `gpu::context` acquires the adapter/device and turns wgpu error scopes
//!   into [`GpuError`] values.
//! - `gpu::bindings` keeps bind-group layouts and bind groups in lock-step.
//! - `gpu::pipeline` builds the compute and display pipelines.
//! - `gpu::readback` copies the offscreen display target back to the host.
//! - [`shaders`] carries the default WGSL programs.

mod error;
pub mod gpu;
pub mod shaders;
mod types;

pub use error::GpuError;
pub use gpu::{
    BindingError, BindingKind, BindingLayout, BindingResource, BufferUsage, DisplayTarget,
    GpuContext, GpuFacade, GpuOptions, LayoutSlot, ShaderBinding, StorageTexture, WgpuBackend,
    WorkgroupGrid,
};
pub use shaders::{ComputeProgram, DisplayProgram, COMPUTE_WORKGROUP_EXTENT, QUAD_VERTICES};
pub use types::{AdapterProfile, GpuMemoryMode, GpuPowerPreference};
