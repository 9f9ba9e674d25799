/// Power profile requested when picking an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

impl GpuPowerPreference {
    pub(crate) fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Allocation strategy hint handed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuMemoryMode {
    #[default]
    Balanced,
    Performance,
}

impl GpuMemoryMode {
    pub(crate) fn to_wgpu(self) -> wgpu::MemoryHints {
        match self {
            GpuMemoryMode::Balanced => wgpu::MemoryHints::MemoryUsage,
            GpuMemoryMode::Performance => wgpu::MemoryHints::Performance,
        }
    }
}

/// Summary of the adapter a context ended up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub driver: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_storage_buffer_binding_size: u32,
    pub supports_compute: bool,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            driver: info.driver.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_storage_buffer_binding_size: limits.max_storage_buffer_binding_size,
            supports_compute: limits_support_compute(limits),
        }
    }

    /// llvmpipe and friends work, but a full-resolution run will crawl.
    pub fn is_software(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        let driver = self.driver.to_ascii_lowercase();
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || ["llvmpipe", "softpipe", "swiftshader"]
                .iter()
                .any(|needle| name.contains(needle) || driver.contains(needle))
    }
}

/// The compute program needs an 8x8 workgroup and three storage buffers.
pub(crate) fn limits_support_compute(limits: &wgpu::Limits) -> bool {
    let extent = crate::shaders::COMPUTE_WORKGROUP_EXTENT;
    limits.max_compute_workgroup_size_x >= extent
        && limits.max_compute_workgroup_size_y >= extent
        && limits.max_compute_invocations_per_workgroup >= extent * extent
        && limits.max_storage_buffers_per_shader_stage >= 3
}
