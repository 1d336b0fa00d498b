//! Compiled WGSL kernels, their bind group layouts, and the launch helper every
//! operation goes through.

use crate::context::GpuContext;
use crate::error::SparseError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wgpu::{BindGroupLayoutEntry, BindingType, BufferBindingType, ShaderStages};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Kernel {
    /// `y = alpha * A * x + beta * y`, one invocation per row.
    Ellmvn,
    /// Scatter phase of `y = alpha * A^T * x + beta * y`.
    Ellmvt,
    /// In-place `y = beta * y`, first phase of the transposed product.
    EllmvtScale,
    /// Gather with zeroing.
    Gthrz,
}

impl Kernel {
    fn label(self) -> &'static str {
        match self {
            Kernel::Ellmvn => "ellmvn",
            Kernel::Ellmvt => "ellmvt",
            Kernel::EllmvtScale => "ellmvt_scale",
            Kernel::Gthrz => "gthrz",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Kernel::Ellmvn => include_str!("shaders/ellmvn.wgsl"),
            Kernel::Ellmvt => include_str!("shaders/ellmvt.wgsl"),
            Kernel::EllmvtScale => include_str!("shaders/ellmvt_scale.wgsl"),
            Kernel::Gthrz => include_str!("shaders/gthrz.wgsl"),
        }
    }

    /// Layout entries after the uniform at binding 0, in binding order.
    fn storage_entries(self) -> Vec<BindGroupLayoutEntry> {
        match self {
            // alpha, beta, col_ind, val, x | y
            Kernel::Ellmvn => vec![
                storage_read_entry(1),
                storage_read_entry(2),
                storage_read_entry(3),
                storage_read_entry(4),
                storage_read_entry(5),
                storage_read_write_entry(6),
            ],
            // alpha, col_ind, val, x | y
            Kernel::Ellmvt => vec![
                storage_read_entry(1),
                storage_read_entry(2),
                storage_read_entry(3),
                storage_read_entry(4),
                storage_read_write_entry(5),
            ],
            // beta | y
            Kernel::EllmvtScale => vec![storage_read_entry(1), storage_read_write_entry(2)],
            // x_ind | y, x_val
            Kernel::Gthrz => vec![
                storage_read_entry(1),
                storage_read_write_entry(2),
                storage_read_write_entry(3),
            ],
        }
    }
}

/// One compiled variant of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub(crate) kernel: Kernel,
    /// Scalars are loaded from bound device buffers instead of the launch uniform.
    pub(crate) device_scalars: bool,
    pub(crate) workgroup_size: u32,
}

#[derive(Debug)]
pub(crate) struct KernelPipeline {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

pub(crate) type PipelineCache = Mutex<HashMap<PipelineKey, Arc<KernelPipeline>>>;

fn uniform_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_read_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_read_write_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Prepends the compile-time switches every kernel expects to the WGSL body.
pub(crate) fn compose_source(key: PipelineKey) -> String {
    format!(
        "const WORKGROUP_SIZE: u32 = {}u;\nconst DEVICE_SCALARS: bool = {};\n\n{}",
        key.workgroup_size,
        key.device_scalars,
        key.kernel.source()
    )
}

/// Splits `work_items` invocations into a dispatch grid that respects the
/// per-dimension workgroup limit. Kernels linearize `(x, y)` back into one index.
pub(crate) fn workgroup_grid(work_items: u32, workgroup_size: u32, max_per_dim: u32) -> (u32, u32) {
    let groups = work_items.div_ceil(workgroup_size).max(1);
    if groups <= max_per_dim {
        return (groups, 1);
    }
    let rows = groups.div_ceil(max_per_dim);
    (groups.div_ceil(rows), rows)
}

impl GpuContext {
    /// Returns the cached pipeline for `key`, compiling it on first use.
    fn pipeline(&self, key: PipelineKey) -> Arc<KernelPipeline> {
        let mut cache = self.pipelines.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pipeline) = cache.get(&key) {
            return Arc::clone(pipeline);
        }

        let label = key.kernel.label();
        log::debug!(
            "Compiling kernel '{}' (device scalars: {}, workgroup size: {})",
            label,
            key.device_scalars,
            key.workgroup_size
        );
        let source = compose_source(key);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let mut entries = vec![uniform_entry(0)];
        entries.extend(key.kernel.storage_entries());
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &entries,
            });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        let compiled = Arc::new(KernelPipeline { pipeline, layout });
        cache.insert(key, Arc::clone(&compiled));
        compiled
    }

    /// Enqueues one kernel over `work_items` invocations and returns without waiting
    /// for it to run.
    ///
    /// `params` becomes the uniform at binding 0 and `buffers` fill bindings 1.. in
    /// order. Validation and out-of-memory errors raised while encoding are reported
    /// as `DeviceCallFailed`.
    pub(crate) async fn launch(
        &self,
        key: PipelineKey,
        params: &[u8],
        buffers: &[&wgpu::Buffer],
        work_items: u32,
    ) -> Result<(), SparseError> {
        if work_items == 0 {
            return Ok(());
        }
        let label = key.kernel.label();

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let kernel = self.pipeline(key);
        let params_buffer =
            self.upload_buffer(label, params, wgpu::BufferUsages::UNIFORM);

        let mut entries = Vec::with_capacity(buffers.len() + 1);
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: params_buffer.as_entire_binding(),
        });
        for (i, buffer) in buffers.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: i as u32 + 1,
                resource: buffer.as_entire_binding(),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &kernel.layout,
            entries: &entries,
        });

        let (groups_x, groups_y) = workgroup_grid(
            work_items,
            key.workgroup_size,
            self.limits.max_compute_workgroups_per_dimension,
        );
        log::debug!(
            "Launching '{}' over {} items as {}x{} workgroups of {}",
            label,
            work_items,
            groups_x,
            groups_y,
            key.workgroup_size
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&kernel.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        let validation = self.device.pop_error_scope().await;
        let out_of_memory = self.device.pop_error_scope().await;
        if let Some(err) = validation.or(out_of_memory) {
            log::error!("Kernel '{}' failed: {}", label, err);
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_grid_single_dimension() {
        assert_eq!(workgroup_grid(1, 256, 65535), (1, 1));
        assert_eq!(workgroup_grid(256, 256, 65535), (1, 1));
        assert_eq!(workgroup_grid(257, 256, 65535), (2, 1));
        assert_eq!(workgroup_grid(1000, 64, 65535), (16, 1));
    }

    #[test]
    fn test_workgroup_grid_spills_into_second_dimension() {
        let (x, y) = workgroup_grid(100_000_000, 256, 65535);
        assert!(x <= 65535);
        assert_eq!(y, 6);
        assert!(x as u64 * y as u64 * 256 >= 100_000_000);

        // Tiny limit to check the covering without huge numbers.
        let (x, y) = workgroup_grid(100, 4, 10);
        assert_eq!((x, y), (9, 3));
        assert!(x * y * 4 >= 100);
    }

    #[test]
    fn test_compose_source_prefix() {
        let source = compose_source(PipelineKey {
            kernel: Kernel::Ellmvn,
            device_scalars: true,
            workgroup_size: 128,
        });
        assert!(source.starts_with("const WORKGROUP_SIZE: u32 = 128u;\nconst DEVICE_SCALARS: bool = true;"));
        assert!(source.contains("fn main"));

        let source = compose_source(PipelineKey {
            kernel: Kernel::Gthrz,
            device_scalars: false,
            workgroup_size: 64,
        });
        assert!(source.contains("const DEVICE_SCALARS: bool = false;"));
    }

    #[test]
    fn test_storage_entries_follow_uniform() {
        for kernel in [Kernel::Ellmvn, Kernel::Ellmvt, Kernel::EllmvtScale, Kernel::Gthrz] {
            let entries = kernel.storage_entries();
            for (i, entry) in entries.iter().enumerate() {
                assert_eq!(entry.binding, i as u32 + 1);
            }
        }
        assert_eq!(Kernel::Ellmvn.storage_entries().len(), 6);
    }
}
