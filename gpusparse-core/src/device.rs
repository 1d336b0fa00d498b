use crate::context::GpuContext;
use crate::ell_matrix::{EllMatrix, EllMatrixGpu};
use crate::error::SparseError;
use crate::handle::max_linear_workgroup_size;
use crate::scalar::GpuScalar;
use crate::traits::Matrix;
use crate::vector::GpuVector;
use bytemuck::Pod;
use std::fmt::Debug;
use std::{mem, sync::Arc};

/// Usage shared by every vector the device hands out.
const VECTOR_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::COPY_DST)
    .union(wgpu::BufferUsages::COPY_SRC);

/// Smallest allocation; zero-sized buffers cannot be bound.
const MIN_BUFFER_BYTES: u64 = 4;

/// Represents a GPU execution device, holding the WGPU context.
///
/// Cloning is cheap: clones share the same device, queue and kernel cache.
#[derive(Debug, Clone)]
pub struct GpuDevice {
    pub(crate) context: Arc<GpuContext>,
}

impl GpuDevice {
    /// Creates a new GpuDevice, initializing the underlying WGPU context asynchronously.
    pub async fn new() -> Result<Self, SparseError> {
        let context = GpuContext::new().await?;
        log::info!("GpuDevice created successfully");
        Ok(Self {
            context: Arc::new(context),
        })
    }

    /// Blocking variant of [`GpuDevice::new`] for native callers without an executor.
    #[cfg(feature = "native")]
    pub fn new_blocking() -> Result<Self, SparseError> {
        pollster::block_on(Self::new())
    }

    // --- Resource Creation ---

    /// Creates a GpuVector initialized with data from a CPU slice.
    pub fn create_vector<T: Pod + Debug + Default>(
        &self,
        label: &str,
        data: &[T],
    ) -> Result<GpuVector<T>, SparseError> {
        if data.is_empty() {
            return Err(SparseError::InvalidSize);
        }
        Ok(self.upload(label, data))
    }

    /// Creates an uninitialized GpuVector holding `size` elements.
    pub fn create_empty_vector<T: Pod + Debug + Default>(
        &self,
        label: &str,
        size: usize,
    ) -> Result<GpuVector<T>, SparseError> {
        if size == 0 {
            return Err(SparseError::InvalidSize);
        }
        let byte_size = size
            .checked_mul(mem::size_of::<T>())
            .ok_or(SparseError::InvalidSize)? as u64;
        let buffer = self
            .context
            .allocate_buffer(label, byte_size.max(MIN_BUFFER_BYTES), VECTOR_USAGE);
        Ok(GpuVector::new_internal(buffer, size, Arc::clone(&self.context)))
    }

    /// Creates a device-resident scalar for use in device pointer mode.
    pub fn create_scalar(&self, value: f32) -> GpuScalar {
        let buffer = self.context.upload_buffer(
            "GPU Scalar",
            bytemuck::bytes_of(&value),
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        );
        GpuScalar::new_internal(buffer, Arc::clone(&self.context))
    }

    /// Uploads a CPU ELL matrix. Matrices without slots are accepted; their
    /// arrays get a placeholder allocation.
    pub fn create_ell_matrix(&self, cpu_matrix: &EllMatrix) -> Result<EllMatrixGpu, SparseError> {
        log::debug!(
            "Uploading ELL matrix {}x{} (width {})",
            cpu_matrix.rows(),
            cpu_matrix.cols(),
            cpu_matrix.ell_width()
        );
        let values = self.upload("GPU ELL Matrix Values Buffer", &cpu_matrix.values);
        let col_indices = self.upload("GPU ELL Matrix Col Indices Buffer", &cpu_matrix.col_indices);
        Ok(EllMatrixGpu::new_internal(cpu_matrix, values, col_indices))
    }

    fn upload<T: Pod + Debug + Default>(&self, label: &str, data: &[T]) -> GpuVector<T> {
        let buffer = if data.is_empty() {
            self.context
                .allocate_buffer(label, MIN_BUFFER_BYTES, VECTOR_USAGE)
        } else {
            self.context
                .upload_buffer(label, bytemuck::cast_slice(data), VECTOR_USAGE)
        };
        GpuVector::new_internal(buffer, data.len(), Arc::clone(&self.context))
    }

    // --- Utility ---

    /// Blocks until every submitted operation has finished.
    pub fn synchronize(&self) -> Result<(), SparseError> {
        self.context.synchronize()
    }

    /// Returns the current GPU transfer statistics (bytes_to_gpu, bytes_from_gpu).
    pub fn get_transfer_stats(&self) -> TransferStats {
        let (bytes_to_gpu, bytes_from_gpu) = self.context.transfers.snapshot();
        TransferStats {
            bytes_to_gpu,
            bytes_from_gpu,
        }
    }

    /// Resets the GPU transfer statistics counters to zero.
    pub fn reset_transfer_stats(&self) {
        self.context.transfers.reset();
    }

    /// Largest one-dimensional workgroup the device accepts, the upper bound for
    /// [`crate::LaunchConfig`].
    pub fn max_workgroup_size(&self) -> u32 {
        max_linear_workgroup_size(&self.context.limits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferStats {
    pub bytes_to_gpu: u64,
    pub bytes_from_gpu: u64,
}
