use std::path::PathBuf;

use anyhow::{Context, Result};
use renderconfig::{MemorySetting, PowerSetting, RenderConfig};
use renderer::{ComputeProgram, DisplayProgram, GpuMemoryMode, GpuOptions, GpuPowerPreference};
use scheduler::{Programs, RenderRequest};

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Loads the settings file, if any, and layers the command-line flags on top.
pub fn resolve_config(args: &RunArgs) -> Result<RenderConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => load_default_config()?,
    };
    apply_overrides(&mut config, args);
    config.validate().context("invalid settings")?;
    Ok(config)
}

fn load_default_config() -> Result<RenderConfig> {
    let paths = AppPaths::discover()?;
    let path = paths.config_file();
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no settings file; using defaults");
        return Ok(RenderConfig::default());
    }
    tracing::debug!(path = %path.display(), "loading settings file");
    RenderConfig::load(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

pub fn apply_overrides(config: &mut RenderConfig, args: &RunArgs) {
    if let Some((width, height)) = args.size {
        config.image.width = Some(width);
        config.image.height = Some(height);
        config.image.resolution = None;
    }
    if let Some(resolution) = args.resolution {
        config.image.width = None;
        config.image.height = None;
        config.image.resolution = Some(resolution);
    }
    if let Some(samples) = args.samples {
        config.sampling.samples_per_pixel = samples;
    }
    if let Some(samples) = args.samples_per_pass {
        config.sampling.samples_per_pass = samples;
    }
    if let Some(depth) = args.max_depth {
        config.sampling.max_depth = depth;
    }
    if let Some(seed) = args.seed {
        config.scene.seed = Some(seed);
    }
    if let Some(path) = args.output.as_ref() {
        config.output.path = Some(path.clone());
    }
    if let Some(limit) = args.time_limit {
        config.time_limit = Some(limit);
    }
}

pub fn render_request(config: &RenderConfig, measure_pass_time: bool) -> RenderRequest {
    let (width, height) = config.image_size();
    RenderRequest::new(width, height, config.sampling.samples_per_pixel)
        .with_samples_per_pass(config.sampling.samples_per_pass)
        .with_max_ray_trace_depth(config.sampling.max_depth)
        .with_pass_timing(measure_pass_time)
}

pub fn gpu_options(config: &RenderConfig) -> GpuOptions {
    GpuOptions {
        power: match config.gpu.power {
            PowerSetting::High => GpuPowerPreference::High,
            PowerSetting::Low => GpuPowerPreference::Low,
        },
        memory: match config.gpu.memory {
            MemorySetting::Balanced => GpuMemoryMode::Balanced,
            MemorySetting::Performance => GpuMemoryMode::Performance,
        },
    }
}

pub fn programs(
    compute_shader: Option<&PathBuf>,
    display_shader: Option<&PathBuf>,
) -> Result<Programs> {
    let mut programs = Programs::default();
    if let Some(path) = compute_shader {
        programs.compute = ComputeProgram::load(path)
            .with_context(|| format!("failed to read compute shader {}", path.display()))?;
    }
    if let Some(path) = display_shader {
        programs.display = DisplayProgram::load(path)
            .with_context(|| format!("failed to read display shader {}", path.display()))?;
    }
    Ok(programs)
}
