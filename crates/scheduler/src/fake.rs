//! In-memory `GpuFacade` that records every call instead of touching a device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use image::RgbaImage;
use renderer::{
    BindingLayout, BindingResource, BufferUsage, ComputeProgram, DisplayProgram, GpuError,
    GpuFacade, ShaderBinding, WorkgroupGrid,
};

use crate::cancel::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeBuffer {
    pub label: String,
    pub usage: BufferUsage,
    pub len: usize,
}

/// Binding index -> label of the buffer bound there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeGroup {
    pub label: String,
    pub bindings: Vec<(u32, String)>,
}

impl FakeGroup {
    pub fn buffer_at(&self, index: u32) -> &str {
        self.bindings
            .iter()
            .find(|(binding, _)| *binding == index)
            .map(|(_, label)| label.as_str())
            .unwrap_or_else(|| panic!("{} has no binding {index}", self.label))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    CreateBuffer(FakeBuffer),
    Write { buffer: String, bytes: Vec<u8> },
    Compute { group: FakeGroup, grid: WorkgroupGrid },
    Display { group: FakeGroup, vertex_count: u32 },
    Wait,
    Readback,
}

#[derive(Default)]
pub struct FakeGpu {
    ops: Mutex<Vec<Op>>,
    computes: AtomicUsize,
    cancel_on_compute: Option<(usize, CancellationToken)>,
    fail_buffer: Option<String>,
    compute_delay: Option<Duration>,
    storage_limit: Option<u64>,
}

impl FakeGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels `token` while the `nth` compute dispatch (1-based) is submitted.
    pub fn cancel_on_compute(mut self, nth: usize, token: CancellationToken) -> Self {
        self.cancel_on_compute = Some((nth, token));
        self
    }

    pub fn fail_buffer(mut self, label: &str) -> Self {
        self.fail_buffer = Some(label.to_string());
        self
    }

    pub fn with_compute_delay(mut self, delay: Duration) -> Self {
        self.compute_delay = Some(delay);
        self
    }

    pub fn with_storage_limit(mut self, bytes: u64) -> Self {
        self.storage_limit = Some(bytes);
        self
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }
}

impl GpuFacade for FakeGpu {
    type Buffer = FakeBuffer;
    type Texture = String;
    type BindGroupLayout = BindingLayout;
    type BindGroup = FakeGroup;
    type ComputePipeline = String;
    type DisplayPipeline = String;
    type DisplayTarget = (u32, u32);

    fn create_buffer(
        &self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> Result<Self::Buffer, GpuError> {
        if self.fail_buffer.as_deref() == Some(label) {
            return Err(GpuError::ResourceExhausted {
                resource: label.to_string(),
                message: "fake allocation failure".to_string(),
            });
        }
        let buffer = FakeBuffer {
            label: label.to_string(),
            usage,
            len: contents.len(),
        };
        self.record(Op::CreateBuffer(buffer.clone()));
        Ok(buffer)
    }

    fn write_buffer(&self, buffer: &Self::Buffer, contents: &[u8]) {
        assert_eq!(buffer.len, contents.len(), "write must not resize {}", buffer.label);
        self.record(Op::Write {
            buffer: buffer.label.clone(),
            bytes: contents.to_vec(),
        });
    }

    fn create_storage_texture(
        &self,
        label: &str,
        _width: u32,
        _height: u32,
    ) -> Result<Self::Texture, GpuError> {
        Ok(label.to_string())
    }

    fn create_display_target(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Self::DisplayTarget, GpuError> {
        Ok((width, height))
    }

    fn create_bind_group_layout(
        &self,
        _label: &str,
        layout: &BindingLayout,
    ) -> Result<Self::BindGroupLayout, GpuError> {
        Ok(layout.clone())
    }

    fn create_bind_group(
        &self,
        label: &str,
        layout: &Self::BindGroupLayout,
        bindings: &[ShaderBinding<'_, Self::Buffer, Self::Texture>],
    ) -> Result<Self::BindGroup, GpuError> {
        layout.check(bindings).map_err(|err| GpuError::Validation {
            label: label.to_string(),
            message: err.to_string(),
        })?;
        let mut bound: Vec<(u32, String)> = bindings
            .iter()
            .map(|binding| {
                let name = match binding.resource {
                    BindingResource::Buffer(buffer) => buffer.label.clone(),
                    BindingResource::Texture(texture) => texture.clone(),
                };
                (binding.index, name)
            })
            .collect();
        bound.sort();
        Ok(FakeGroup {
            label: label.to_string(),
            bindings: bound,
        })
    }

    fn create_compute_pipeline(
        &self,
        _layout: &Self::BindGroupLayout,
        program: &ComputeProgram,
    ) -> Result<Self::ComputePipeline, GpuError> {
        Ok(program.label().to_string())
    }

    fn create_display_pipeline(
        &self,
        _layout: &Self::BindGroupLayout,
        program: &DisplayProgram,
    ) -> Result<Self::DisplayPipeline, GpuError> {
        Ok(program.label().to_string())
    }

    fn submit_compute(
        &self,
        _pipeline: &Self::ComputePipeline,
        group: &Self::BindGroup,
        grid: WorkgroupGrid,
    ) -> Result<(), GpuError> {
        self.record(Op::Compute {
            group: group.clone(),
            grid,
        });
        let count = self.computes.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((nth, token)) = &self.cancel_on_compute {
            if *nth == count {
                token.cancel();
            }
        }
        if let Some(delay) = self.compute_delay {
            std::thread::sleep(delay);
        }
        Ok(())
    }

    fn submit_display(
        &self,
        _target: &Self::DisplayTarget,
        _pipeline: &Self::DisplayPipeline,
        group: &Self::BindGroup,
        _vertices: &Self::Buffer,
        vertex_count: u32,
    ) -> Result<(), GpuError> {
        self.record(Op::Display {
            group: group.clone(),
            vertex_count,
        });
        Ok(())
    }

    fn wait_for_submitted_work(&self) -> Result<(), GpuError> {
        self.record(Op::Wait);
        Ok(())
    }

    fn read_display_target(&self, target: &Self::DisplayTarget) -> Result<RgbaImage, GpuError> {
        self.record(Op::Readback);
        Ok(RgbaImage::new(target.0, target.1))
    }

    fn max_storage_buffer_binding_size(&self) -> u64 {
        self.storage_limit.unwrap_or(u64::MAX)
    }
}
