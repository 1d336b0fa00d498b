use crate::descr::IndexBase;
use crate::error::SparseError;
use crate::handle::Handle;
use crate::kernels::{Kernel, PipelineKey};
use crate::vector::GpuVector;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GthrzParams {
    nnz: u32,
    idx_base: i32,
    _pad0: u32,
    _pad1: u32,
}

/// Validates [`gthrz`] arguments. Returns `false` for a quick return.
fn check_gthrz(handle_present: bool, nnz: i32, operands_present: bool) -> Result<bool, SparseError> {
    if !handle_present {
        return Err(SparseError::InvalidHandle);
    }
    if nnz < 0 {
        return Err(SparseError::InvalidSize);
    }
    if nnz == 0 {
        return Ok(false);
    }
    if !operands_present {
        return Err(SparseError::InvalidPointer);
    }
    Ok(true)
}

/// Gathers the entries of a dense vector into a sparse one and zeroes them:
/// `x_val[i] = y[x_ind[i]]; y[x_ind[i]] = 0` for `i < nnz`.
///
/// `x_ind` holds `nnz` unique indices in the given base. Pointer mode plays no
/// role here.
pub async fn gthrz(
    handle: Option<&Handle>,
    nnz: i32,
    y: Option<&mut GpuVector<f32>>,
    x_val: Option<&mut GpuVector<f32>>,
    x_ind: Option<&GpuVector<i32>>,
    base: IndexBase,
) -> Result<(), SparseError> {
    log::trace!("gthrz: nnz={} base={:?}", nnz, base);

    let operands_present = y.is_some() && x_val.is_some() && x_ind.is_some();
    if !check_gthrz(handle.is_some(), nnz, operands_present)? {
        return Ok(());
    }
    let (Some(handle), Some(y), Some(x_val), Some(x_ind)) = (handle, y, x_val, x_ind) else {
        return Err(SparseError::InvalidPointer);
    };

    let context = &handle.device().context;
    if !(y.on_device(context) && x_val.on_device(context) && x_ind.on_device(context)) {
        return Err(SparseError::InvalidPointer);
    }

    let count = nnz as usize;
    if x_val.size() < count || x_ind.size() < count || y.size() == 0 {
        return Err(SparseError::InvalidSize);
    }

    let params = GthrzParams {
        nnz: nnz as u32,
        idx_base: base.offset(),
        _pad0: 0,
        _pad1: 0,
    };
    let key = PipelineKey {
        kernel: Kernel::Gthrz,
        device_scalars: false,
        workgroup_size: handle.launch_config().gthrz_workgroup_size,
    };
    context
        .launch(
            key,
            bytemuck::bytes_of(&params),
            &[x_ind.inner(), y.inner(), x_val.inner()],
            params.nnz,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_gthrz_order() {
        assert_eq!(check_gthrz(false, -1, false), Err(SparseError::InvalidHandle));
        assert_eq!(check_gthrz(true, -1, false), Err(SparseError::InvalidSize));
        assert_eq!(check_gthrz(true, 0, false), Ok(false));
        assert_eq!(check_gthrz(true, 5, false), Err(SparseError::InvalidPointer));
        assert_eq!(check_gthrz(true, 5, true), Ok(true));
    }
}
