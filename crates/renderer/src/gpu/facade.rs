use image::RgbaImage;

use crate::error::GpuError;
use crate::shaders::{ComputeProgram, DisplayProgram};

use super::bindings::{BindingLayout, ShaderBinding};

/// What a buffer is bound as. Every buffer can also be overwritten in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Storage,
    Uniform,
    Vertex,
}

impl BufferUsage {
    pub(crate) fn to_wgpu(self) -> wgpu::BufferUsages {
        let base = match self {
            BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        };
        base | wgpu::BufferUsages::COPY_DST
    }
}

/// Number of workgroups dispatched along x and y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupGrid {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupGrid {
    /// Smallest grid whose `extent`-sized workgroups cover `width x height`.
    pub fn covering(width: u32, height: u32, extent: u32) -> Self {
        let extent = extent.max(1);
        Self {
            x: width.div_ceil(extent),
            y: height.div_ceil(extent),
        }
    }

    pub fn workgroups(&self) -> u64 {
        u64::from(self.x) * u64::from(self.y)
    }
}

/// Minimal set of device operations the accumulation scheduler needs.
///
/// Handles are associated types so the scheduler never sees backend objects
/// and tests can substitute an in-memory recorder. Only
/// [`wait_for_submitted_work`](GpuFacade::wait_for_submitted_work) and
/// [`read_display_target`](GpuFacade::read_display_target) block.
pub trait GpuFacade {
    type Buffer;
    type Texture;
    type BindGroupLayout;
    type BindGroup;
    type ComputePipeline;
    type DisplayPipeline;
    type DisplayTarget;

    /// Allocates a buffer and uploads `contents` immediately.
    fn create_buffer(
        &self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> Result<Self::Buffer, GpuError>;

    /// Rewrites `buffer` from offset zero without reallocating it, so bind
    /// groups that reference it stay valid.
    fn write_buffer(&self, buffer: &Self::Buffer, contents: &[u8]);

    /// RGBA32F texture usable as a storage binding.
    fn create_storage_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, GpuError>;

    fn create_display_target(&self, width: u32, height: u32)
        -> Result<Self::DisplayTarget, GpuError>;

    fn create_bind_group_layout(
        &self,
        label: &str,
        layout: &BindingLayout,
    ) -> Result<Self::BindGroupLayout, GpuError>;

    fn create_bind_group(
        &self,
        label: &str,
        layout: &Self::BindGroupLayout,
        bindings: &[ShaderBinding<'_, Self::Buffer, Self::Texture>],
    ) -> Result<Self::BindGroup, GpuError>;

    fn create_compute_pipeline(
        &self,
        layout: &Self::BindGroupLayout,
        program: &ComputeProgram,
    ) -> Result<Self::ComputePipeline, GpuError>;

    fn create_display_pipeline(
        &self,
        layout: &Self::BindGroupLayout,
        program: &DisplayProgram,
    ) -> Result<Self::DisplayPipeline, GpuError>;

    /// Encodes and submits one compute dispatch as a single unit of work.
    fn submit_compute(
        &self,
        pipeline: &Self::ComputePipeline,
        group: &Self::BindGroup,
        grid: WorkgroupGrid,
    ) -> Result<(), GpuError>;

    /// Encodes and submits one display pass drawing `vertex_count` vertices.
    fn submit_display(
        &self,
        target: &Self::DisplayTarget,
        pipeline: &Self::DisplayPipeline,
        group: &Self::BindGroup,
        vertices: &Self::Buffer,
        vertex_count: u32,
    ) -> Result<(), GpuError>;

    /// Blocks until everything submitted so far has finished executing.
    fn wait_for_submitted_work(&self) -> Result<(), GpuError>;

    fn read_display_target(&self, target: &Self::DisplayTarget) -> Result<RgbaImage, GpuError>;

    fn max_storage_buffer_binding_size(&self) -> u64;
}
