use crate::device::GpuDevice;
use crate::error::SparseError;

/// Where the alpha/beta operands of a call are expected to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerMode {
    /// Scalars are host values, read at the call boundary.
    #[default]
    Host,
    /// Scalars are device buffers, read by the kernels themselves.
    Device,
}

/// Workgroup sizes of the kernels. Tuning only; results do not depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub ellmvn_workgroup_size: u32,
    pub ellmvt_workgroup_size: u32,
    pub scale_workgroup_size: u32,
    pub gthrz_workgroup_size: u32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            ellmvn_workgroup_size: 256,
            ellmvt_workgroup_size: 256,
            scale_workgroup_size: 256,
            gthrz_workgroup_size: 256,
        }
    }
}

impl LaunchConfig {
    /// The same workgroup size for every kernel.
    pub fn uniform(workgroup_size: u32) -> Self {
        Self {
            ellmvn_workgroup_size: workgroup_size,
            ellmvt_workgroup_size: workgroup_size,
            scale_workgroup_size: workgroup_size,
            gthrz_workgroup_size: workgroup_size,
        }
    }

    /// Checks every size against the largest one-dimensional workgroup the
    /// device runs (see [`GpuDevice::max_workgroup_size`]).
    pub fn validate(&self, max_workgroup_size: u32) -> Result<(), SparseError> {
        let sizes = [
            self.ellmvn_workgroup_size,
            self.ellmvt_workgroup_size,
            self.scale_workgroup_size,
            self.gthrz_workgroup_size,
        ];
        if sizes.iter().any(|&s| s == 0 || s > max_workgroup_size) {
            return Err(SparseError::InvalidValue);
        }
        Ok(())
    }
}

/// Every kernel is one-dimensional, so a workgroup is bounded both by the total
/// invocation count and by the x extent.
pub(crate) fn max_linear_workgroup_size(limits: &wgpu::Limits) -> u32 {
    limits
        .max_compute_invocations_per_workgroup
        .min(limits.max_compute_workgroup_size_x)
}

/// Execution context threaded through every sparse operation.
///
/// Operations borrow the handle immutably, so the pointer mode and launch
/// configuration can only change between calls. Cloning is cheap and shares the
/// underlying device and queue.
#[derive(Debug, Clone)]
pub struct Handle {
    device: GpuDevice,
    pointer_mode: PointerMode,
    launch: LaunchConfig,
}

impl Handle {
    /// Creates a handle on `device` in host pointer mode.
    pub fn new(device: &GpuDevice) -> Self {
        Self {
            device: device.clone(),
            pointer_mode: PointerMode::Host,
            launch: LaunchConfig::default(),
        }
    }

    pub fn device(&self) -> &GpuDevice {
        &self.device
    }

    pub fn pointer_mode(&self) -> PointerMode {
        self.pointer_mode
    }

    pub fn set_pointer_mode(&mut self, mode: PointerMode) {
        self.pointer_mode = mode;
    }

    /// Returns a copy of this handle in the given pointer mode.
    pub fn with_pointer_mode(&self, mode: PointerMode) -> Self {
        Self {
            pointer_mode: mode,
            ..self.clone()
        }
    }

    pub fn launch_config(&self) -> LaunchConfig {
        self.launch
    }

    /// Replaces the launch configuration. Rejects sizes the device cannot run.
    pub fn set_launch_config(&mut self, launch: LaunchConfig) -> Result<(), SparseError> {
        launch.validate(self.device.max_workgroup_size())?;
        self.launch = launch;
        Ok(())
    }

    /// Blocks until all work enqueued through this handle's device has finished.
    pub fn synchronize(&self) -> Result<(), SparseError> {
        self.device.synchronize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_config_validate() {
        assert!(LaunchConfig::default().validate(256).is_ok());
        assert!(LaunchConfig::uniform(64).validate(256).is_ok());
        assert_eq!(
            LaunchConfig::uniform(512).validate(256),
            Err(SparseError::InvalidValue)
        );

        let config = LaunchConfig {
            gthrz_workgroup_size: 0,
            ..LaunchConfig::default()
        };
        assert_eq!(config.validate(1024), Err(SparseError::InvalidValue));
    }

    #[test]
    fn test_max_linear_workgroup_size_takes_tighter_limit() {
        let limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: 1024,
            max_compute_workgroup_size_x: 256,
            ..wgpu::Limits::default()
        };
        assert_eq!(max_linear_workgroup_size(&limits), 256);
        assert_eq!(
            LaunchConfig::uniform(512).validate(max_linear_workgroup_size(&limits)),
            Err(SparseError::InvalidValue)
        );

        let limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: 128,
            max_compute_workgroup_size_x: 256,
            ..wgpu::Limits::default()
        };
        assert_eq!(max_linear_workgroup_size(&limits), 128);
    }

    #[test]
    fn test_pointer_mode_default() {
        assert_eq!(PointerMode::default(), PointerMode::Host);
    }
}
