use std::time::{Duration, Instant};

use image::RgbaImage;
use renderer::shaders::QUAD_VERTEX_COUNT;
use renderer::{
    BindingLayout, BufferUsage, ComputeProgram, DisplayProgram, GpuError, GpuFacade,
    ShaderBinding, WorkgroupGrid, COMPUTE_WORKGROUP_EXTENT, QUAD_VERTICES,
};
use scene::{RenderCallInfo, Scene};
use wgpu::ShaderStages;

use crate::cancel::CancellationToken;
use crate::error::RenderError;
use crate::pingpong::{PingPong, Slot};
use crate::plan::{PassPlan, RenderRequest};
use crate::progress::{PassReport, ProgressEvent, ProgressSink, RenderSummary};

/// RGBA accumulation, one `f32` per channel.
const ACCUMULATION_BYTES_PER_PIXEL: u64 = 4 * std::mem::size_of::<f32>() as u64;

/// Shader programs a run compiles into its two pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Programs {
    pub compute: ComputeProgram,
    pub display: DisplayProgram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Running { completed_passes: u32 },
    Cancelled { completed_passes: u32 },
    Completed { passes: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RenderSummary),
    Cancelled {
        completed_passes: u32,
        samples_per_pixel: u32,
        compute_time: Duration,
    },
}

impl RunOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunOutcome::Cancelled { .. })
    }
}

struct RunResources<G: GpuFacade> {
    uniform: G::Buffer,
    vertices: G::Buffer,
    target: G::DisplayTarget,
    compute_pipeline: G::ComputePipeline,
    display_pipeline: G::DisplayPipeline,
    compute_groups: PingPong<G::BindGroup>,
    display_groups: PingPong<G::BindGroup>,
    // Referenced by the bind groups; held for the lifetime of the run.
    _scene: G::Buffer,
    _accumulation: PingPong<G::Buffer>,
    _layouts: [G::BindGroupLayout; 2],
}

/// One progressive render, from resource allocation to the last pass.
pub struct AccumulationRun<'g, G: GpuFacade> {
    gpu: &'g G,
    request: RenderRequest,
    plan: PassPlan,
    grid: WorkgroupGrid,
    call_info: RenderCallInfo,
    resources: RunResources<G>,
    state: RunState,
}

impl<'g, G: GpuFacade> AccumulationRun<'g, G> {
    /// Allocates every resource the run needs. Nothing is submitted for
    /// execution, and a failure drops whatever was already created.
    pub fn initialize(
        gpu: &'g G,
        request: RenderRequest,
        scene: &Scene,
        programs: &Programs,
    ) -> Result<Self, RenderError> {
        let plan = request.validate()?;
        if scene.is_empty() {
            return Err(RenderError::InvalidRequest("scene has no spheres".to_string()));
        }

        let accumulation_bytes = request.pixel_count() * ACCUMULATION_BYTES_PER_PIXEL;
        let limit = gpu.max_storage_buffer_binding_size();
        if accumulation_bytes > limit {
            return Err(GpuError::ResourceExhausted {
                resource: "accumulation buffer".to_string(),
                message: format!(
                    "{}x{} needs {accumulation_bytes} bytes, device allows {limit}",
                    request.width, request.height
                ),
            }
            .into());
        }

        let call_info = RenderCallInfo::new(
            request.width,
            request.height,
            request.max_ray_trace_depth,
            plan.samples_per_pass(),
        );
        let scene_bytes = scene.encode();
        let uniform =
            gpu.create_buffer("render call info", BufferUsage::Uniform, &call_info.encode())?;
        let scene_buffer = gpu.create_buffer("scene", BufferUsage::Storage, &scene_bytes)?;

        let zeroed = vec![[0f32; 4]; request.pixel_count() as usize];
        let accumulation = PingPong::try_from_fn(|slot| {
            gpu.create_buffer(
                &format!("accumulation {}", slot.index()),
                BufferUsage::Storage,
                bytemuck::cast_slice(&zeroed),
            )
        })?;
        drop(zeroed);

        let vertices = gpu.create_buffer(
            "display quad",
            BufferUsage::Vertex,
            bytemuck::cast_slice(&QUAD_VERTICES),
        )?;
        let target = gpu.create_display_target(request.width, request.height)?;

        let compute_layout = BindingLayout::from_bindings(&compute_bindings::<G>(
            &uniform,
            &scene_buffer,
            &accumulation,
            Slot::A,
        ))?;
        let compute_layout_handle =
            gpu.create_bind_group_layout("compute bind group layout", &compute_layout)?;
        let compute_groups = PingPong::try_from_fn(|slot| {
            let bindings = compute_bindings::<G>(&uniform, &scene_buffer, &accumulation, slot);
            compute_layout.check(&bindings)?;
            gpu.create_bind_group(
                &format!("compute bind group {slot}"),
                &compute_layout_handle,
                &bindings,
            )
            .map_err(RenderError::from)
        })?;
        let compute_pipeline =
            gpu.create_compute_pipeline(&compute_layout_handle, &programs.compute)?;

        let display_layout =
            BindingLayout::from_bindings(&display_bindings::<G>(&uniform, &accumulation, Slot::A))?;
        let display_layout_handle =
            gpu.create_bind_group_layout("display bind group layout", &display_layout)?;
        let display_groups = PingPong::try_from_fn(|slot| {
            let bindings = display_bindings::<G>(&uniform, &accumulation, slot);
            display_layout.check(&bindings)?;
            gpu.create_bind_group(
                &format!("display bind group {slot}"),
                &display_layout_handle,
                &bindings,
            )
            .map_err(RenderError::from)
        })?;
        let display_pipeline =
            gpu.create_display_pipeline(&display_layout_handle, &programs.display)?;

        tracing::debug!(
            width = request.width,
            height = request.height,
            spheres = scene.len(),
            passes = plan.required_passes(),
            samples_per_pass = plan.samples_per_pass(),
            "initialized accumulation run"
        );

        Ok(Self {
            gpu,
            request,
            plan,
            grid: WorkgroupGrid::covering(request.width, request.height, COMPUTE_WORKGROUP_EXTENT),
            call_info,
            resources: RunResources {
                uniform,
                vertices,
                target,
                compute_pipeline,
                display_pipeline,
                compute_groups,
                display_groups,
                _scene: scene_buffer,
                _accumulation: accumulation,
                _layouts: [compute_layout_handle, display_layout_handle],
            },
            state: RunState::Initializing,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn plan(&self) -> &PassPlan {
        &self.plan
    }

    pub fn call_info(&self) -> &RenderCallInfo {
        &self.call_info
    }

    /// Drives every pass. `cancel` is consulted once per pass, after the
    /// compute dispatch and before the display pass. May only be called once.
    pub fn run(
        &mut self,
        cancel: &CancellationToken,
        sink: &mut dyn ProgressSink,
    ) -> Result<RunOutcome, RenderError> {
        if self.state != RunState::Initializing {
            return Err(RenderError::AlreadyFinished);
        }
        self.state = RunState::Running {
            completed_passes: 0,
        };

        let total_passes = self.plan.required_passes();
        let mut compute_time = Duration::ZERO;

        for pass in 1..=total_passes {
            self.call_info.record_pass();
            self.gpu
                .write_buffer(&self.resources.uniform, &self.call_info.encode());

            let slot = Slot::for_pass(pass);
            let started = Instant::now();
            self.gpu.submit_compute(
                &self.resources.compute_pipeline,
                &self.resources.compute_groups[slot],
                self.grid,
            )?;
            if self.request.measure_pass_time {
                self.gpu.wait_for_submitted_work()?;
            }
            let elapsed = started.elapsed();
            compute_time += elapsed;
            self.state = RunState::Running {
                completed_passes: pass,
            };

            let report = PassReport {
                pass,
                total_passes,
                samples_per_pass: self.plan.samples_per_pass(),
                elapsed,
            };
            tracing::trace!(%slot, %report, "compute pass finished");
            sink.report(ProgressEvent::Pass(report));

            if cancel.is_cancelled() {
                let samples_per_pixel = self.call_info.already_computed_samples();
                self.state = RunState::Cancelled {
                    completed_passes: pass,
                };
                tracing::info!(
                    completed_passes = pass,
                    total_passes,
                    samples_per_pixel,
                    "render cancelled"
                );
                sink.report(ProgressEvent::Cancelled {
                    completed_passes: pass,
                    total_passes,
                    samples_per_pixel,
                });
                return Ok(RunOutcome::Cancelled {
                    completed_passes: pass,
                    samples_per_pixel,
                    compute_time,
                });
            }

            self.gpu.submit_display(
                &self.resources.target,
                &self.resources.display_pipeline,
                &self.resources.display_groups[slot],
                &self.resources.vertices,
                QUAD_VERTEX_COUNT,
            )?;
        }

        self.state = RunState::Completed {
            passes: total_passes,
        };
        let summary = RenderSummary {
            width: self.request.width,
            height: self.request.height,
            passes: total_passes,
            samples_per_pixel: self.call_info.already_computed_samples(),
            compute_time,
        };
        tracing::info!(
            passes = total_passes,
            samples_per_pixel = summary.samples_per_pixel,
            compute_ms = compute_time.as_millis() as u64,
            "render completed"
        );
        sink.report(ProgressEvent::Completed(summary.clone()));
        Ok(RunOutcome::Completed(summary))
    }

    /// Pixels of the most recent display pass.
    pub fn read_output(&self) -> Result<RgbaImage, RenderError> {
        Ok(self.gpu.read_display_target(&self.resources.target)?)
    }
}

fn compute_bindings<'a, G: GpuFacade>(
    uniform: &'a G::Buffer,
    scene: &'a G::Buffer,
    accumulation: &'a PingPong<G::Buffer>,
    slot: Slot,
) -> Vec<ShaderBinding<'a, G::Buffer, G::Texture>> {
    vec![
        ShaderBinding::uniform(0, ShaderStages::COMPUTE, uniform),
        ShaderBinding::read_only_storage(1, ShaderStages::COMPUTE, scene),
        ShaderBinding::read_only_storage(2, ShaderStages::COMPUTE, accumulation.source(slot)),
        ShaderBinding::storage(3, ShaderStages::COMPUTE, accumulation.target(slot)),
    ]
}

fn display_bindings<'a, G: GpuFacade>(
    uniform: &'a G::Buffer,
    accumulation: &'a PingPong<G::Buffer>,
    slot: Slot,
) -> Vec<ShaderBinding<'a, G::Buffer, G::Texture>> {
    vec![
        ShaderBinding::uniform(0, ShaderStages::FRAGMENT, uniform),
        ShaderBinding::read_only_storage(1, ShaderStages::FRAGMENT, accumulation.target(slot)),
    ]
}
