use crate::error::RenderError;

pub const DEFAULT_SAMPLES_PER_PASS: u32 = 1;
pub const DEFAULT_MAX_RAY_TRACE_DEPTH: u32 = 50;

/// Parameters fixed for the lifetime of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub samples_per_compute_pass: u32,
    pub max_ray_trace_depth: u32,
    /// Wait for each compute pass to finish so its wall-clock time can be
    /// reported. Without it the loop only measures submission time.
    pub measure_pass_time: bool,
}

impl RenderRequest {
    pub fn new(width: u32, height: u32, samples_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            samples_per_pixel,
            samples_per_compute_pass: DEFAULT_SAMPLES_PER_PASS,
            max_ray_trace_depth: DEFAULT_MAX_RAY_TRACE_DEPTH,
            measure_pass_time: true,
        }
    }

    pub fn with_samples_per_pass(mut self, samples: u32) -> Self {
        self.samples_per_compute_pass = samples;
        self
    }

    pub fn with_max_ray_trace_depth(mut self, depth: u32) -> Self {
        self.max_ray_trace_depth = depth;
        self
    }

    pub fn with_pass_timing(mut self, enabled: bool) -> Self {
        self.measure_pass_time = enabled;
        self
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Checks every count and derives the pass plan.
    pub fn validate(&self) -> Result<PassPlan, RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidRequest(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_ray_trace_depth == 0 {
            return Err(RenderError::InvalidRequest(
                "max ray trace depth must be positive".to_string(),
            ));
        }
        PassPlan::new(self.samples_per_pixel, self.samples_per_compute_pass)
    }
}

/// How many passes a run takes and how many samples it ends up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassPlan {
    samples_per_pixel: u32,
    samples_per_pass: u32,
    required_passes: u32,
}

impl PassPlan {
    pub fn new(samples_per_pixel: u32, samples_per_pass: u32) -> Result<Self, RenderError> {
        if samples_per_pixel == 0 {
            return Err(RenderError::InvalidRequest(
                "samples per pixel must be positive".to_string(),
            ));
        }
        if samples_per_pass == 0 {
            return Err(RenderError::InvalidRequest(
                "samples per compute pass must be positive".to_string(),
            ));
        }
        let required_passes = samples_per_pixel.div_ceil(samples_per_pass);
        // The sample counter lives in a u32 uniform.
        if u64::from(required_passes) * u64::from(samples_per_pass) > u64::from(u32::MAX) {
            return Err(RenderError::InvalidRequest(format!(
                "{samples_per_pixel} samples in passes of {samples_per_pass} overflows the sample counter"
            )));
        }
        Ok(Self {
            samples_per_pixel,
            samples_per_pass,
            required_passes,
        })
    }

    pub fn required_passes(&self) -> u32 {
        self.required_passes
    }

    pub fn samples_per_pass(&self) -> u32 {
        self.samples_per_pass
    }

    pub fn requested_samples(&self) -> u32 {
        self.samples_per_pixel
    }

    /// Samples per pixel after the last pass. The last pass is not clipped,
    /// so this can exceed the requested count.
    pub fn final_sample_count(&self) -> u32 {
        self.required_passes * self.samples_per_pass
    }

    pub fn progress_percent(&self, pass: u32) -> f64 {
        f64::from(pass) * 100.0 / f64::from(self.required_passes)
    }
}
