use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::shaders::{ComputeProgram, DisplayProgram};

use super::bindings::{group_entries, BindingLayout, ShaderBinding};
use super::context::{GpuContext, GpuOptions};
use super::facade::{BufferUsage, GpuFacade, WorkgroupGrid};
use super::pipeline::{self, DISPLAY_FORMAT};
use super::readback;

const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

pub struct StorageTexture {
    // Keeps the allocation behind `view` alive.
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

/// Offscreen stand-in for a presentation surface.
pub struct DisplayTarget {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl DisplayTarget {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// [`GpuFacade`] over a real wgpu device.
pub struct WgpuBackend {
    context: GpuContext,
}

impl WgpuBackend {
    pub fn new(options: GpuOptions) -> Result<Self, GpuError> {
        Ok(Self {
            context: GpuContext::new(options)?,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }
}

impl GpuFacade for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Texture = StorageTexture;
    type BindGroupLayout = wgpu::BindGroupLayout;
    type BindGroup = wgpu::BindGroup;
    type ComputePipeline = wgpu::ComputePipeline;
    type DisplayPipeline = wgpu::RenderPipeline;
    type DisplayTarget = DisplayTarget;

    fn create_buffer(
        &self,
        label: &str,
        usage: BufferUsage,
        contents: &[u8],
    ) -> Result<Self::Buffer, GpuError> {
        tracing::trace!(label, ?usage, bytes = contents.len(), "creating buffer");
        self.context.scoped(label, |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usage.to_wgpu(),
            })
        })
    }

    fn write_buffer(&self, buffer: &Self::Buffer, contents: &[u8]) {
        self.context.queue.write_buffer(buffer, 0, contents);
    }

    fn create_storage_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, GpuError> {
        self.context.scoped(label, |device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: ACCUMULATION_FORMAT,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            StorageTexture {
                _texture: texture,
                view,
            }
        })
    }

    fn create_display_target(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Self::DisplayTarget, GpuError> {
        let max_dimension = self.context.limits().max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            return Err(GpuError::Unsupported(format!(
                "GPU max texture dimension is {max_dimension}, requested target is {width}x{height}"
            )));
        }
        self.context.scoped("display target", |device| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("display target"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DISPLAY_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            DisplayTarget {
                texture,
                view,
                width,
                height,
            }
        })
    }

    fn create_bind_group_layout(
        &self,
        label: &str,
        layout: &BindingLayout,
    ) -> Result<Self::BindGroupLayout, GpuError> {
        self.context.scoped(label, |device| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &layout.layout_entries(),
            })
        })
    }

    fn create_bind_group(
        &self,
        label: &str,
        layout: &Self::BindGroupLayout,
        bindings: &[ShaderBinding<'_, Self::Buffer, Self::Texture>],
    ) -> Result<Self::BindGroup, GpuError> {
        self.context.scoped(label, |device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &group_entries(bindings),
            })
        })
    }

    fn create_compute_pipeline(
        &self,
        layout: &Self::BindGroupLayout,
        program: &ComputeProgram,
    ) -> Result<Self::ComputePipeline, GpuError> {
        self.context.scoped(program.label(), |device| {
            pipeline::create_compute_pipeline(device, layout, program)
        })
    }

    fn create_display_pipeline(
        &self,
        layout: &Self::BindGroupLayout,
        program: &DisplayProgram,
    ) -> Result<Self::DisplayPipeline, GpuError> {
        self.context.scoped(program.label(), |device| {
            pipeline::create_display_pipeline(device, layout, program)
        })
    }

    fn submit_compute(
        &self,
        pipeline: &Self::ComputePipeline,
        group: &Self::BindGroup,
        grid: WorkgroupGrid,
    ) -> Result<(), GpuError> {
        self.context.take_device_error()?;
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("compute encoder"),
                });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, group, &[]);
            pass.dispatch_workgroups(grid.x, grid.y, 1);
        }
        self.context.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn submit_display(
        &self,
        target: &Self::DisplayTarget,
        pipeline: &Self::DisplayPipeline,
        group: &Self::BindGroup,
        vertices: &Self::Buffer,
        vertex_count: u32,
    ) -> Result<(), GpuError> {
        self.context.take_device_error()?;
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("display encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("display pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, group, &[]);
            pass.set_vertex_buffer(0, vertices.slice(..));
            pass.draw(0..vertex_count, 0..1);
        }
        self.context.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn wait_for_submitted_work(&self) -> Result<(), GpuError> {
        self.context
            .device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| GpuError::Device(err.to_string()))?;
        self.context.take_device_error()
    }

    fn read_display_target(&self, target: &Self::DisplayTarget) -> Result<RgbaImage, GpuError> {
        readback::read_display_target(&self.context, target)
    }

    fn max_storage_buffer_binding_size(&self) -> u64 {
        u64::from(self.context.limits().max_storage_buffer_binding_size)
    }
}
