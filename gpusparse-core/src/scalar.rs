use crate::context::GpuContext;
use crate::error::SparseError;
use crate::handle::PointerMode;
use std::sync::Arc;

/// A single f32 living in device memory, usable as alpha/beta in device pointer mode.
#[derive(Debug)]
pub struct GpuScalar {
    buffer: wgpu::Buffer,
    pub(crate) context: Arc<GpuContext>,
}

impl GpuScalar {
    pub(crate) fn new_internal(buffer: wgpu::Buffer, context: Arc<GpuContext>) -> Self {
        Self { buffer, context }
    }

    pub(crate) fn inner(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Reads the value back to the host. Synchronizes with the device.
    pub async fn read(&self) -> Result<f32, SparseError> {
        let values = self.context.read_back::<f32>(&self.buffer, 1).await?;
        values
            .first()
            .copied()
            .ok_or_else(|| SparseError::DeviceCallFailed("empty scalar readback".to_string()))
    }

    /// Overwrites the value. Ordered before any later submission.
    pub fn write(&self, value: f32) -> Result<(), SparseError> {
        self.context.overwrite_buffer(&self.buffer, &[value])
    }
}

/// An alpha/beta operand: either a host value or a device-resident scalar.
#[derive(Debug, Clone, Copy)]
pub enum Scalar<'a> {
    Host(f32),
    Device(&'a GpuScalar),
}

impl<'a> Scalar<'a> {
    pub fn residency(&self) -> PointerMode {
        match self {
            Scalar::Host(_) => PointerMode::Host,
            Scalar::Device(_) => PointerMode::Device,
        }
    }

    /// Host values belong to every device; device scalars only to the one that
    /// allocated them.
    pub(crate) fn on_device(&self, context: &Arc<GpuContext>) -> bool {
        match self {
            Scalar::Host(_) => true,
            Scalar::Device(scalar) => Arc::ptr_eq(&scalar.context, context),
        }
    }

    /// The host value, if this operand lives on the host. Never reads device memory.
    pub fn host_value(&self) -> Option<f32> {
        match self {
            Scalar::Host(value) => Some(*value),
            Scalar::Device(_) => None,
        }
    }
}

impl From<f32> for Scalar<'_> {
    fn from(value: f32) -> Self {
        Scalar::Host(value)
    }
}

impl<'a> From<&'a GpuScalar> for Scalar<'a> {
    fn from(scalar: &'a GpuScalar) -> Self {
        Scalar::Device(scalar)
    }
}

/// A scalar in the form a kernel launch consumes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ResolvedScalar<'a> {
    /// Travels in the launch uniform; the device scalar binding gets a placeholder.
    Value(f32),
    /// Bound as a storage buffer and loaded by the kernel.
    Buffer(&'a wgpu::Buffer),
}

impl<'a> ResolvedScalar<'a> {
    /// Resolves an operand whose residency has already been checked against the
    /// handle's pointer mode.
    pub(crate) fn resolve(scalar: Scalar<'a>) -> Self {
        match scalar {
            Scalar::Host(value) => ResolvedScalar::Value(value),
            Scalar::Device(device_scalar) => ResolvedScalar::Buffer(device_scalar.inner()),
        }
    }

    /// The host-known value; `None` for device scalars.
    pub(crate) fn known(&self) -> Option<f32> {
        match self {
            ResolvedScalar::Value(value) => Some(*value),
            ResolvedScalar::Buffer(_) => None,
        }
    }

    /// Value for the launch uniform. Unused by the kernel when bound as a buffer.
    pub(crate) fn uniform_value(&self) -> f32 {
        self.known().unwrap_or(0.0)
    }

    /// Buffer for the device scalar binding.
    pub(crate) fn binding<'b>(&self, host_slot: &'b wgpu::Buffer) -> &'b wgpu::Buffer
    where
        'a: 'b,
    {
        match *self {
            ResolvedScalar::Value(_) => host_slot,
            ResolvedScalar::Buffer(buffer) => buffer,
        }
    }
}
