use crate::error::SparseError;
use crate::kernels::PipelineCache;
use bytemuck::{Pod, Zeroable};
use cfg_if::cfg_if;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};
use wgpu::{util::DeviceExt, PollType};

/// Storage buffers bound by the widest kernel (ellmvn: two scalars, indices,
/// values, x, y).
const MAX_KERNEL_STORAGE_BUFFERS: u32 = 6;

/// Bytes moved between host and device through the context's helpers.
#[derive(Debug, Default)]
pub(crate) struct TransferCounters {
    to_gpu: AtomicU64,
    from_gpu: AtomicU64,
}

impl TransferCounters {
    fn record_upload(&self, bytes: u64) {
        self.to_gpu.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_download(&self, bytes: u64) {
        self.from_gpu.fetch_add(bytes, Ordering::Relaxed);
    }

    /// `(bytes_to_gpu, bytes_from_gpu)`.
    pub(crate) fn snapshot(&self) -> (u64, u64) {
        (
            self.to_gpu.load(Ordering::Relaxed),
            self.from_gpu.load(Ordering::Relaxed),
        )
    }

    pub(crate) fn reset(&self) {
        self.to_gpu.store(0, Ordering::Relaxed);
        self.from_gpu.store(0, Ordering::Relaxed);
        log::info!("GPU transfer counters reset.");
    }
}

/// Device, queue and per-device state shared by every resource and handle.
/// Internal to the crate; callers go through `GpuDevice`.
#[derive(Debug)]
pub(crate) struct GpuContext {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    /// Limits granted at device creation, used to size dispatch grids and to
    /// validate launch configurations.
    pub(crate) limits: wgpu::Limits,
    /// Bound in place of device scalars when a kernel reads its scalars by value.
    pub(crate) host_scalar_slot: wgpu::Buffer,
    pub(crate) pipelines: PipelineCache,
    pub(crate) transfers: TransferCounters,
}

impl GpuContext {
    /// Picks an adapter for the target and opens a compute-only device on it.
    pub(crate) async fn new() -> Result<Self, SparseError> {
        cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                log::info!("Initializing WASM WGPU context");
                let backends = wgpu::Backends::BROWSER_WEBGPU;
            } else {
                log::info!("Initializing native WGPU context");
                let backends = wgpu::Backends::PRIMARY; // Vulkan, Metal, DX12
            }
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| SparseError::DeviceCallFailed("No suitable adapter found".to_string()))?;
        log::info!("Selected Adapter: {:?}", adapter.get_info());

        let (device, queue, limits) = Self::open_device(&adapter).await?;
        let host_scalar_slot = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Host Scalar Slot"),
            contents: bytemuck::bytes_of(&0.0f32),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Ok(Self {
            device,
            queue,
            limits,
            host_scalar_slot,
            pipelines: Mutex::new(HashMap::new()),
            transfers: TransferCounters::default(),
        })
    }

    async fn open_device(
        adapter: &wgpu::Adapter,
    ) -> Result<(wgpu::Device, wgpu::Queue, wgpu::Limits), SparseError> {
        let mut limits = wgpu::Limits::default().using_resolution(adapter.limits());
        if limits.max_storage_buffers_per_shader_stage < MAX_KERNEL_STORAGE_BUFFERS {
            log::warn!(
                "Adapter reports {} storage buffers per stage, requesting {}",
                limits.max_storage_buffers_per_shader_stage,
                MAX_KERNEL_STORAGE_BUFFERS
            );
            limits.max_storage_buffers_per_shader_stage = MAX_KERNEL_STORAGE_BUFFERS;
        }
        log::debug!("Requested limits: {:?}", limits);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("gpusparse device"),
                trace: wgpu::Trace::Off,
                memory_hints: wgpu::MemoryHints::Performance,
                required_features: wgpu::Features::empty(),
                required_limits: limits.clone(),
            })
            .await
            .map_err(|e| SparseError::DeviceCallFailed(format!("Failed to request device: {}", e)))?;
        log::info!("Device and queue obtained successfully");
        Ok((device, queue, limits))
    }

    /// New buffer holding `contents`. Counted as an upload.
    pub(crate) fn upload_buffer(
        &self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        log::debug!("Uploading buffer '{}' ({} bytes)", label, contents.len());
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        self.transfers.record_upload(contents.len() as u64);
        buffer
    }

    /// New uninitialized buffer. Nothing is transferred.
    pub(crate) fn allocate_buffer(
        &self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> wgpu::Buffer {
        log::debug!("Allocating buffer '{}' ({} bytes)", label, size);
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    /// Queues a write of `data` at the start of `buffer`; later submissions see it.
    pub(crate) fn overwrite_buffer<T: Pod>(
        &self,
        buffer: &wgpu::Buffer,
        data: &[T],
    ) -> Result<(), SparseError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.is_empty() {
            return Ok(());
        }
        if buffer.size() < bytes.len() as u64 {
            return Err(SparseError::InvalidSize);
        }
        if !buffer.usage().contains(wgpu::BufferUsages::COPY_DST) {
            return Err(SparseError::InvalidValue);
        }
        self.queue.write_buffer(buffer, 0, bytes);
        self.transfers.record_upload(bytes.len() as u64);
        Ok(())
    }

    /// Blocks until all submitted work has finished. A no-op on the web, where the
    /// browser drives the queue.
    pub(crate) fn synchronize(&self) -> Result<(), SparseError> {
        cfg_if! {
            if #[cfg(not(target_arch = "wasm32"))] {
                self.device
                    .poll(PollType::Wait)
                    .map_err(|e| SparseError::DeviceCallFailed(format!("Device poll failed: {}", e)))?;
            }
        }
        Ok(())
    }

    /// Copies the first `count` elements of `buffer` (which needs `COPY_SRC`) to
    /// the host, after all work submitted so far.
    pub(crate) async fn read_back<T: Pod + Zeroable>(
        &self,
        buffer: &wgpu::Buffer,
        count: usize,
    ) -> Result<Vec<T>, SparseError> {
        let size = count
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(SparseError::InvalidSize)? as u64;
        if size == 0 {
            return Ok(Vec::new());
        }
        if buffer.size() < size {
            return Err(SparseError::InvalidSize);
        }

        let staging = self.allocate_buffer(
            "readback staging",
            size,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        );
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            if sender.send(result).is_err() {
                log::error!("Readback receiver dropped before the buffer was mapped");
            }
        });
        // The browser maps on its own; natively the device must be driven.
        self.synchronize()?;

        match receiver.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("Failed to map readback buffer: {:?}", e);
                return Err(SparseError::DeviceCallFailed(format!(
                    "Buffer mapping failed: {}",
                    e
                )));
            }
            Err(_) => {
                return Err(SparseError::DeviceCallFailed(
                    "Buffer mapping was cancelled".to_string(),
                ));
            }
        }

        let values = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
        staging.unmap();
        self.transfers.record_download(size);
        log::debug!("Read back {} bytes", size);
        Ok(values)
    }
}
