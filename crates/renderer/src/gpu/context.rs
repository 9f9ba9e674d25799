use std::sync::{Arc, Mutex};

use crate::error::GpuError;
use crate::types::{AdapterProfile, GpuMemoryMode, GpuPowerPreference};

/// Adapter selection knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuOptions {
    pub power: GpuPowerPreference,
    pub memory: GpuMemoryMode,
}

/// Headless device plus the bookkeeping needed to turn wgpu's asynchronous
/// error reporting into `Result`s.
pub struct GpuContext {
    _instance: wgpu::Instance,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    limits: wgpu::Limits,
    adapter_profile: AdapterProfile,
    device_error: Arc<Mutex<Option<String>>>,
}

impl GpuContext {
    pub fn new(options: GpuOptions) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: options.power.to_wgpu(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|err| GpuError::Unsupported(format!("no suitable GPU adapter: {err}")))?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        let adapter_profile = AdapterProfile::from_wgpu(&adapter_info, &limits);
        let is_software = adapter_profile.is_software();
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software,
            "selected GPU adapter"
        );
        if is_software {
            tracing::warn!(
                name = %adapter_profile.name,
                "software rasterizer detected; expect slow passes"
            );
        }

        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
            || !adapter_profile.supports_compute
        {
            return Err(GpuError::Unsupported(format!(
                "adapter {} cannot run the compute path tracer",
                adapter_profile.name
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tracer device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: options.memory.to_wgpu(),
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| GpuError::Unsupported(format!("failed to create GPU device: {err}")))?;

        let device_error = Arc::new(Mutex::new(None));
        let latch = Arc::clone(&device_error);
        device.on_uncaptured_error(Box::new(move |err: wgpu::Error| {
            tracing::error!(error = %err, "uncaptured GPU error");
            if let Ok(mut slot) = latch.lock() {
                if slot.is_none() {
                    *slot = Some(err.to_string());
                }
            }
        }));

        Ok(Self {
            _instance: instance,
            device,
            queue,
            limits,
            adapter_profile,
            device_error,
        })
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.adapter_profile
    }

    pub fn limits(&self) -> &wgpu::Limits {
        &self.limits
    }

    /// Runs `create` inside out-of-memory and validation error scopes.
    pub(crate) fn scoped<T>(
        &self,
        label: &str,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T, GpuError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = create(&self.device);

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = out_of_memory.or(validation) {
            let err = GpuError::from_scope(label, err);
            tracing::warn!(label, error = %err, "GPU resource creation failed");
            return Err(err);
        }
        Ok(value)
    }

    /// Surfaces the first error the device reported outside of a scope.
    pub(crate) fn take_device_error(&self) -> Result<(), GpuError> {
        let latched = match self.device_error.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => Some("device error latch poisoned".to_string()),
        };
        match latched {
            Some(message) => Err(GpuError::Device(message)),
            None => Ok(()),
        }
    }
}
