//! CPU reference implementations the GPU results are checked against.

use gpusparse_core::{IndexBase, Operation};
use num_traits::Float;

/// Zero-based column stored in an ELL slot, `None` for padding.
fn ell_col(stored: i32, base: IndexBase, n: usize) -> Option<usize> {
    usize::try_from(stored - base.offset())
        .ok()
        .filter(|&col| col < n)
}

/// `y = alpha * op(A) * x + beta * y` for a row-major ELL matrix `A` of size
/// `m x n`. A row ends at its first padding slot.
///
/// Mirrors the device semantics: a zero `beta` overwrites `y` without reading
/// it, and `alpha == 0 && beta == 1` leaves `y` untouched.
#[allow(clippy::too_many_arguments)]
pub fn host_ellmv<T: Float>(
    trans: Operation,
    m: usize,
    n: usize,
    alpha: T,
    ell_val: &[T],
    ell_col_ind: &[i32],
    ell_width: usize,
    x: &[T],
    beta: T,
    y: &mut [T],
    base: IndexBase,
) {
    if alpha == T::zero() && beta == T::one() {
        return;
    }

    if !trans.is_transposed() {
        for (row, yi) in y.iter_mut().enumerate().take(m) {
            let mut sum = T::zero();
            if alpha != T::zero() {
                for idx in row * ell_width..(row + 1) * ell_width {
                    let Some(col) = ell_col(ell_col_ind[idx], base, n) else {
                        break;
                    };
                    sum = ell_val[idx].mul_add(x[col], sum);
                }
            }
            *yi = if beta != T::zero() {
                beta.mul_add(*yi, alpha * sum)
            } else {
                alpha * sum
            };
        }
        return;
    }

    for yi in y.iter_mut().take(n) {
        *yi = if beta == T::zero() { T::zero() } else { beta * *yi };
    }
    if alpha == T::zero() {
        return;
    }
    for row in 0..m {
        let row_val = alpha * x[row];
        for idx in row * ell_width..(row + 1) * ell_width {
            let Some(col) = ell_col(ell_col_ind[idx], base, n) else {
                break;
            };
            y[col] = y[col] + row_val * ell_val[idx];
        }
    }
}

/// `x_val[i] = y[x_ind[i]]; y[x_ind[i]] = 0` for `i < nnz`.
///
/// Like the device kernel, an index outside `y` gathers 0 and leaves `y` alone.
pub fn host_gthrz<T: Float>(
    nnz: usize,
    y: &mut [T],
    x_val: &mut [T],
    x_ind: &[i32],
    base: IndexBase,
) {
    let len = y.len();
    for (val, &ind) in x_val.iter_mut().zip(x_ind).take(nnz) {
        match usize::try_from(ind - base.offset()).ok().filter(|&idx| idx < len) {
            Some(idx) => {
                *val = y[idx];
                y[idx] = T::zero();
            }
            None => *val = T::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // [ 1 2 ]
    // [ 3 0 ]
    // [ 0 4 ]
    const VAL: [f64; 6] = [1.0, 2.0, 3.0, 0.0, 4.0, 0.0];
    const COL: [i32; 6] = [0, 1, 0, -1, 1, -1];

    #[test]
    fn test_host_ellmv_no_transpose() {
        let x = [1.0, 2.0];
        let mut y = [1.0, 1.0, 1.0];
        host_ellmv(Operation::NONE, 3, 2, 2.0, &VAL, &COL, 2, &x, 1.0, &mut y, IndexBase::Zero);
        assert_eq!(y, [11.0, 7.0, 17.0]);

        let mut y = [f64::NAN; 3];
        host_ellmv(Operation::NONE, 3, 2, 1.0, &VAL, &COL, 2, &x, 0.0, &mut y, IndexBase::Zero);
        assert_eq!(y, [5.0, 3.0, 8.0]);
    }

    #[test]
    fn test_host_ellmv_transpose() {
        let x = [1.0f32, 2.0, 3.0];
        let val: Vec<f32> = VAL.iter().map(|&v| v as f32).collect();
        let mut y = [10.0f32, 20.0];
        host_ellmv(Operation::TRANSPOSE, 3, 2, 2.0, &val, &COL, 2, &x, 3.0, &mut y, IndexBase::Zero);
        assert_eq!(y, [44.0, 88.0]);
    }

    #[test]
    fn test_host_ellmv_identity_and_base() {
        let col_one: Vec<i32> = COL.iter().map(|&c| if c < 0 { c } else { c + 1 }).collect();
        let x = [1.0, 2.0];

        let mut y = [f64::NAN, 7.0, 8.0];
        host_ellmv(Operation::NONE, 3, 2, 0.0, &VAL, &col_one, 2, &x, 1.0, &mut y, IndexBase::One);
        assert!(y[0].is_nan());
        assert_eq!(&y[1..], &[7.0, 8.0]);

        let mut y = [0.0; 3];
        host_ellmv(Operation::NONE, 3, 2, 1.0, &VAL, &col_one, 2, &x, 0.0, &mut y, IndexBase::One);
        assert_eq!(y, [5.0, 3.0, 8.0]);
    }

    #[test]
    fn test_host_gthrz() {
        let mut y = [1.0, 2.0, 3.0, 4.0];
        let mut x_val = [0.0; 2];
        host_gthrz(2, &mut y, &mut x_val, &[4, 2], IndexBase::One);
        assert_eq!(x_val, [4.0, 2.0]);
        assert_eq!(y, [1.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_host_gthrz_skips_out_of_range_indices() {
        let mut y = [1.0, 2.0, 3.0];
        let mut x_val = [9.0; 3];
        // 0 is below a one-based range, 4 is past the end.
        host_gthrz(3, &mut y, &mut x_val, &[0, 2, 4], IndexBase::One);
        assert_eq!(x_val, [0.0, 2.0, 0.0]);
        assert_eq!(y, [1.0, 0.0, 3.0]);

        let mut x_val = [9.0];
        host_gthrz(1, &mut y, &mut x_val, &[-3], IndexBase::Zero);
        assert_eq!(x_val, [0.0]);
        assert_eq!(y, [1.0, 0.0, 3.0]);
    }
}
