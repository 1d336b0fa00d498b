use crate::context::GpuContext;
use crate::error::SparseError;
use crate::traits::Vector;
use bytemuck::Pod;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed dense array in device memory: f32 values by default, i32 for index arrays.
///
/// The backing buffer may be larger than `len` elements (empty arrays get a
/// placeholder allocation so they can still be bound).
#[derive(Debug)]
pub struct GpuVector<T = f32> {
    buffer: wgpu::Buffer,
    len: usize,
    pub(crate) context: Arc<GpuContext>,
    _marker: PhantomData<T>,
}

impl<T: Pod + Debug + Default> GpuVector<T> {
    pub(crate) fn new_internal(buffer: wgpu::Buffer, len: usize, context: Arc<GpuContext>) -> Self {
        Self {
            buffer,
            len,
            context,
            _marker: PhantomData,
        }
    }

    pub(crate) fn inner(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Whether the vector was allocated on `context`'s device.
    pub(crate) fn on_device(&self, context: &Arc<GpuContext>) -> bool {
        Arc::ptr_eq(&self.context, context)
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Downloads the elements. Waits for every submitted operation that writes
    /// the vector.
    pub async fn read_contents(&self) -> Result<Vec<T>, SparseError> {
        self.context.read_back(&self.buffer, self.len).await
    }

    /// Replaces the elements with `data`, which must have the same length.
    pub fn write_contents(&self, data: &[T]) -> Result<(), SparseError> {
        if data.len() != self.len {
            return Err(SparseError::InvalidSize);
        }
        self.context.overwrite_buffer(&self.buffer, data)
    }

    /// Device-side copy of `source` into this vector, ordered after earlier
    /// submissions. Both vectors must have the same length and device.
    pub fn copy_from(&mut self, source: &GpuVector<T>) -> Result<(), SparseError> {
        if self.len != source.len {
            return Err(SparseError::InvalidSize);
        }
        if !source.on_device(&self.context) {
            return Err(SparseError::InvalidPointer);
        }
        let bytes = self.byte_len();
        if bytes == 0 {
            return Ok(());
        }

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vector copy"),
            });
        encoder.copy_buffer_to_buffer(&source.buffer, 0, &self.buffer, 0, bytes);
        self.context.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

impl<T: Pod + Debug + Default> Vector for GpuVector<T> {
    type Value = T;

    fn len(&self) -> usize {
        self.len
    }
}
