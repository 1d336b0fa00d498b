use crate::descr::{MatDescr, MatrixType, Operation};
use crate::error::SparseError;
use crate::handle::{Handle, PointerMode};
use crate::kernels::{Kernel, PipelineKey};
use crate::scalar::{ResolvedScalar, Scalar};
use crate::vector::GpuVector;
use bytemuck::{Pod, Zeroable};

/// Launch uniform shared by the no-transpose and scatter kernels.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct EllmvParams {
    m: u32,
    n: u32,
    ell_width: u32,
    idx_base: i32,
    alpha: f32,
    beta: f32,
    _pad0: u32,
    _pad1: u32,
}

/// Launch uniform of the in-place scaling kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ScaleParams {
    size: u32,
    scalar: f32,
    _pad0: u32,
    _pad1: u32,
}

/// Outcome of argument validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    /// Valid arguments, nothing to compute.
    QuickReturn,
    Launch,
}

/// Validates the arguments of [`ellmv`] that do not need device buffers.
///
/// `pointer_mode` is `None` when no handle was passed. `operands_present` tells
/// whether all of `ell_val`, `ell_col_ind`, `x` and `y` were supplied. The first
/// failing check wins, so the order below is part of the contract.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_ellmv(
    pointer_mode: Option<PointerMode>,
    trans: Operation,
    m: i32,
    n: i32,
    alpha: Option<Scalar<'_>>,
    descr: Option<&MatDescr>,
    ell_width: i32,
    beta: Option<Scalar<'_>>,
    operands_present: bool,
) -> Result<Plan, SparseError> {
    let Some(pointer_mode) = pointer_mode else {
        return Err(SparseError::InvalidHandle);
    };
    let Some(descr) = descr else {
        return Err(SparseError::InvalidPointer);
    };
    if !trans.is_valid() {
        return Err(SparseError::InvalidValue);
    }
    if descr.matrix_type() != MatrixType::General {
        return Err(SparseError::NotImplemented);
    }

    if m < 0 || n < 0 || ell_width < 0 {
        return Err(SparseError::InvalidSize);
    }
    if (m == 0 || n == 0) && ell_width != 0 {
        return Err(SparseError::InvalidSize);
    }
    if m == 0 || n == 0 || ell_width == 0 {
        return Ok(Plan::QuickReturn);
    }

    let (Some(alpha), Some(beta)) = (alpha, beta) else {
        return Err(SparseError::InvalidPointer);
    };
    if alpha.residency() != pointer_mode || beta.residency() != pointer_mode {
        return Err(SparseError::InvalidPointer);
    }

    // Device scalars are never read back here; their kernels check the identity.
    if pointer_mode == PointerMode::Host
        && alpha.host_value() == Some(0.0)
        && beta.host_value() == Some(1.0)
    {
        return Ok(Plan::QuickReturn);
    }

    if !operands_present {
        return Err(SparseError::InvalidPointer);
    }
    Ok(Plan::Launch)
}

/// Checks that every operand holds at least as many elements as the call reads
/// or writes. `m`, `n` and `ell_width` are already known to be positive.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_operand_lengths(
    trans: Operation,
    m: usize,
    n: usize,
    ell_width: usize,
    val_len: usize,
    col_ind_len: usize,
    x_len: usize,
    y_len: usize,
) -> Result<(), SparseError> {
    let slots = m.checked_mul(ell_width).ok_or(SparseError::InvalidSize)?;
    let (x_needed, y_needed) = if trans.is_transposed() { (m, n) } else { (n, m) };
    if val_len < slots || col_ind_len < slots || x_len < x_needed || y_len < y_needed {
        return Err(SparseError::InvalidSize);
    }
    Ok(())
}

/// Sparse matrix-vector multiplication with an ELL matrix:
/// `y = alpha * op(A) * x + beta * y`.
///
/// `A` is `m x n` with `ell_width` slots per row, stored row-major in `ell_val`
/// and `ell_col_ind` (index base taken from `descr`). With
/// [`Operation::NONE`] `x` has `n` elements and `y` has `m`; transposed, the
/// lengths swap.
///
/// Arguments are checked in a fixed order and the first failure is returned
/// before anything is enqueued. In host pointer mode `alpha` and `beta` must be
/// [`Scalar::Host`]; in device pointer mode they must be [`Scalar::Device`] and
/// are read by the kernels only. The call returns once the work is submitted;
/// read `y` back (or [`Handle::synchronize`]) to wait for it.
#[allow(clippy::too_many_arguments)]
pub async fn ellmv(
    handle: Option<&Handle>,
    trans: Operation,
    m: i32,
    n: i32,
    alpha: Option<Scalar<'_>>,
    descr: Option<&MatDescr>,
    ell_val: Option<&GpuVector<f32>>,
    ell_col_ind: Option<&GpuVector<i32>>,
    ell_width: i32,
    x: Option<&GpuVector<f32>>,
    beta: Option<Scalar<'_>>,
    y: Option<&mut GpuVector<f32>>,
) -> Result<(), SparseError> {
    log::trace!(
        "ellmv: trans={:?} m={} n={} alpha={:?} ell_width={} beta={:?} mode={:?}",
        trans,
        m,
        n,
        alpha.map(|a| a.host_value()),
        ell_width,
        beta.map(|b| b.host_value()),
        handle.map(|h| h.pointer_mode())
    );

    let operands_present =
        ell_val.is_some() && ell_col_ind.is_some() && x.is_some() && y.is_some();
    let plan = check_ellmv(
        handle.map(|h| h.pointer_mode()),
        trans,
        m,
        n,
        alpha,
        descr,
        ell_width,
        beta,
        operands_present,
    )?;
    if plan == Plan::QuickReturn {
        log::trace!("ellmv: quick return");
        return Ok(());
    }

    let (Some(handle), Some(descr), Some(alpha), Some(beta)) = (handle, descr, alpha, beta) else {
        return Err(SparseError::InvalidPointer);
    };
    let (Some(ell_val), Some(ell_col_ind), Some(x), Some(y)) = (ell_val, ell_col_ind, x, y) else {
        return Err(SparseError::InvalidPointer);
    };

    let context = &handle.device().context;
    let same_device = ell_val.on_device(context)
        && ell_col_ind.on_device(context)
        && x.on_device(context)
        && y.on_device(context)
        && alpha.on_device(context)
        && beta.on_device(context);
    if !same_device {
        return Err(SparseError::InvalidPointer);
    }

    let (m, n, ell_width) = (m as usize, n as usize, ell_width as usize);
    check_operand_lengths(
        trans,
        m,
        n,
        ell_width,
        ell_val.size(),
        ell_col_ind.size(),
        x.size(),
        y.size(),
    )?;
    let work_m = u32::try_from(m).map_err(|_| SparseError::InvalidSize)?;
    let work_n = u32::try_from(n).map_err(|_| SparseError::InvalidSize)?;
    let width = u32::try_from(ell_width).map_err(|_| SparseError::InvalidSize)?;

    let launch = handle.launch_config();
    let device_scalars = handle.pointer_mode() == PointerMode::Device;
    let alpha = ResolvedScalar::resolve(alpha);
    let beta = ResolvedScalar::resolve(beta);
    let host_slot = &context.host_scalar_slot;

    let params = EllmvParams {
        m: work_m,
        n: work_n,
        ell_width: width,
        idx_base: descr.base().offset(),
        alpha: alpha.uniform_value(),
        beta: beta.uniform_value(),
        _pad0: 0,
        _pad1: 0,
    };

    if !trans.is_transposed() {
        let key = PipelineKey {
            kernel: Kernel::Ellmvn,
            device_scalars,
            workgroup_size: launch.ellmvn_workgroup_size,
        };
        return context
            .launch(
                key,
                bytemuck::bytes_of(&params),
                &[
                    alpha.binding(host_slot),
                    beta.binding(host_slot),
                    ell_col_ind.inner(),
                    ell_val.inner(),
                    x.inner(),
                    y.inner(),
                ],
                work_m,
            )
            .await;
    }

    // Transposed: scale y by beta, then scatter the rows into it. Both phases go
    // through the same queue, so the scatter sees the scaled values.
    if beta.known() != Some(1.0) {
        let scale = ScaleParams {
            size: work_n,
            scalar: beta.uniform_value(),
            _pad0: 0,
            _pad1: 0,
        };
        let key = PipelineKey {
            kernel: Kernel::EllmvtScale,
            device_scalars,
            workgroup_size: launch.scale_workgroup_size,
        };
        context
            .launch(
                key,
                bytemuck::bytes_of(&scale),
                &[beta.binding(host_slot), y.inner()],
                work_n,
            )
            .await?;
    }

    if alpha.known() != Some(0.0) {
        let key = PipelineKey {
            kernel: Kernel::Ellmvt,
            device_scalars,
            workgroup_size: launch.ellmvt_workgroup_size,
        };
        context
            .launch(
                key,
                bytemuck::bytes_of(&params),
                &[
                    alpha.binding(host_slot),
                    ell_col_ind.inner(),
                    ell_val.inner(),
                    x.inner(),
                    y.inner(),
                ],
                work_m,
            )
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descr::IndexBase;

    const HOST: Option<PointerMode> = Some(PointerMode::Host);

    fn general() -> MatDescr {
        MatDescr::new()
    }

    #[allow(clippy::too_many_arguments)]
    fn check(
        mode: Option<PointerMode>,
        trans: Operation,
        m: i32,
        n: i32,
        alpha: Option<Scalar<'static>>,
        descr: Option<&MatDescr>,
        ell_width: i32,
        beta: Option<Scalar<'static>>,
        operands_present: bool,
    ) -> Result<Plan, SparseError> {
        check_ellmv(mode, trans, m, n, alpha, descr, ell_width, beta, operands_present)
    }

    fn one() -> Option<Scalar<'static>> {
        Some(Scalar::Host(1.0))
    }

    #[test]
    fn test_check_ellmv_valid_call_launches() {
        let descr = general();
        assert_eq!(
            check(HOST, Operation::NONE, 4, 4, one(), Some(&descr), 2, one(), true),
            Ok(Plan::Launch)
        );
        assert_eq!(
            check(HOST, Operation::TRANSPOSE, 4, 3, one(), Some(&descr), 2, Some(Scalar::Host(0.0)), true),
            Ok(Plan::Launch)
        );
    }

    #[test]
    fn test_check_ellmv_handle_checked_first() {
        let descr = general();
        assert_eq!(
            check(None, Operation::NONE, -1, 4, one(), Some(&descr), 2, one(), true),
            Err(SparseError::InvalidHandle)
        );
        assert_eq!(
            check(None, Operation::from_raw(7), 4, 4, None, None, -3, None, false),
            Err(SparseError::InvalidHandle)
        );
    }

    #[test]
    fn test_check_ellmv_descriptor_then_operation() {
        let descr = general();
        assert_eq!(
            check(HOST, Operation::from_raw(7), 4, 4, one(), None, 2, one(), true),
            Err(SparseError::InvalidPointer)
        );
        assert_eq!(
            check(HOST, Operation::from_raw(7), -1, 4, one(), Some(&descr), 2, one(), true),
            Err(SparseError::InvalidValue)
        );
    }

    #[test]
    fn test_check_ellmv_matrix_type() {
        let mut descr = general();
        descr.set_matrix_type(MatrixType::Symmetric);
        assert_eq!(
            check(HOST, Operation::NONE, -1, 4, one(), Some(&descr), 2, one(), true),
            Err(SparseError::NotImplemented)
        );
    }

    #[test]
    fn test_check_ellmv_sizes() {
        let descr = general();
        for (m, n, w) in [(-1, 4, 2), (4, -1, 2), (4, 4, -1)] {
            assert_eq!(
                check(HOST, Operation::NONE, m, n, None, Some(&descr), w, None, false),
                Err(SparseError::InvalidSize)
            );
        }
        assert_eq!(
            check(HOST, Operation::NONE, 0, 4, None, Some(&descr), 2, None, false),
            Err(SparseError::InvalidSize)
        );
        assert_eq!(
            check(HOST, Operation::NONE, 4, 0, None, Some(&descr), 1, None, false),
            Err(SparseError::InvalidSize)
        );
    }

    #[test]
    fn test_check_ellmv_zero_sizes_return_before_pointer_checks() {
        let descr = general();
        for (m, n, w) in [(0, 0, 0), (0, 4, 0), (100, 100, 0)] {
            assert_eq!(
                check(HOST, Operation::NONE, m, n, None, Some(&descr), w, None, false),
                Ok(Plan::QuickReturn)
            );
        }
    }

    #[test]
    fn test_check_ellmv_scalars() {
        let descr = general();
        assert_eq!(
            check(HOST, Operation::NONE, 4, 4, None, Some(&descr), 2, one(), true),
            Err(SparseError::InvalidPointer)
        );
        assert_eq!(
            check(HOST, Operation::NONE, 4, 4, one(), Some(&descr), 2, None, true),
            Err(SparseError::InvalidPointer)
        );
        // Host values handed to a device-mode handle.
        assert_eq!(
            check(Some(PointerMode::Device), Operation::NONE, 4, 4, one(), Some(&descr), 2, one(), true),
            Err(SparseError::InvalidPointer)
        );
    }

    #[test]
    fn test_check_ellmv_identity_skips_operand_checks() {
        let descr = general();
        let zero = Some(Scalar::Host(0.0));
        assert_eq!(
            check(HOST, Operation::NONE, 4, 4, zero, Some(&descr), 2, one(), false),
            Ok(Plan::QuickReturn)
        );
        assert_eq!(
            check(HOST, Operation::TRANSPOSE, 4, 4, zero, Some(&descr), 2, one(), false),
            Ok(Plan::QuickReturn)
        );
        // Only the exact identity short-circuits.
        assert_eq!(
            check(HOST, Operation::NONE, 4, 4, zero, Some(&descr), 2, Some(Scalar::Host(2.0)), false),
            Err(SparseError::InvalidPointer)
        );
    }

    #[test]
    fn test_check_ellmv_missing_operands() {
        let descr = MatDescr::with_base(IndexBase::One);
        assert_eq!(
            check(HOST, Operation::NONE, 4, 4, one(), Some(&descr), 2, one(), false),
            Err(SparseError::InvalidPointer)
        );
    }

    #[test]
    fn test_check_operand_lengths() {
        assert!(check_operand_lengths(Operation::NONE, 4, 3, 2, 8, 8, 3, 4).is_ok());
        assert!(check_operand_lengths(Operation::TRANSPOSE, 4, 3, 2, 8, 8, 4, 3).is_ok());
        // Longer buffers are fine.
        assert!(check_operand_lengths(Operation::NONE, 4, 3, 2, 16, 16, 30, 40).is_ok());

        assert_eq!(
            check_operand_lengths(Operation::NONE, 4, 3, 2, 7, 8, 3, 4),
            Err(SparseError::InvalidSize)
        );
        assert_eq!(
            check_operand_lengths(Operation::NONE, 4, 3, 2, 8, 7, 3, 4),
            Err(SparseError::InvalidSize)
        );
        assert_eq!(
            check_operand_lengths(Operation::NONE, 4, 3, 2, 8, 8, 2, 4),
            Err(SparseError::InvalidSize)
        );
        // Transposed, x follows the row count.
        assert_eq!(
            check_operand_lengths(Operation::TRANSPOSE, 4, 3, 2, 8, 8, 3, 3),
            Err(SparseError::InvalidSize)
        );
    }

    #[test]
    fn test_params_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<EllmvParams>(), 32);
        assert_eq!(std::mem::size_of::<ScaleParams>(), 16);
    }
}
