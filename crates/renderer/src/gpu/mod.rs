//! wgpu plumbing behind the [`GpuFacade`] seam.
//!
//! - `context` owns instance/adapter/device acquisition, error scopes and the
//!   uncaptured-error latch.
//! - `facade` is the trait the scheduler is written against.
//! - `bindings` derives bind-group layouts from binding descriptors and
//!   enforces that every bind group matches its layout.
//! - `pipeline` compiles WGSL into compute and display pipelines.
//! - `readback` copies the offscreen display target into an `RgbaImage`.
//! - `backend` ties them together as [`WgpuBackend`].

mod backend;
mod bindings;
mod context;
mod facade;
mod pipeline;
mod readback;

pub use backend::{DisplayTarget, StorageTexture, WgpuBackend};
pub use bindings::{
    BindingError, BindingKind, BindingLayout, BindingResource, LayoutSlot, ShaderBinding,
};
pub use context::{GpuContext, GpuOptions};
pub use facade::{BufferUsage, GpuFacade, WorkgroupGrid};
