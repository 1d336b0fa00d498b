//! Random and structured test instances.
//!
//! Values are small integers stored as f32 so that every sum the kernels form
//! is exact and GPU results can be compared bit for bit.

use crate::error::ClientError;
use gpusparse_core::{CsrMatrix, EllMatrix, IndexBase, Triplet};

/// Deterministic generator for a given seed.
pub fn seeded_rng(seed: u64) -> fastrand::Rng {
    fastrand::Rng::with_seed(seed)
}

/// Integer-valued entries in `[1, 10]`.
pub fn random_vector(rng: &mut fastrand::Rng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.i32(1..=10) as f32).collect()
}

/// `nnz` distinct indices from `[0, range)`, sorted, shifted by `base`.
pub fn random_unique_indices(
    rng: &mut fastrand::Rng,
    nnz: usize,
    range: usize,
    base: IndexBase,
) -> Result<Vec<i32>, ClientError> {
    if nnz > range {
        return Err(ClientError::InvalidArgument(format!(
            "cannot draw {} unique indices from {}",
            nnz, range
        )));
    }
    let range = i32::try_from(range)
        .map_err(|_| ClientError::InvalidArgument(format!("index range {} too large", range)))?;

    let mut pool: Vec<i32> = (0..range).collect();
    rng.shuffle(&mut pool);
    pool.truncate(nnz);
    pool.sort_unstable();
    Ok(pool.into_iter().map(|i| i + base.offset()).collect())
}

/// Random `m x n` ELL matrix with up to `ell_width` entries per row.
///
/// Row lengths are drawn uniformly from `[0, ell_width]` so that padding shows
/// up in most rows; column indices within a row are distinct and sorted.
pub fn random_ell_matrix(
    rng: &mut fastrand::Rng,
    m: usize,
    n: usize,
    ell_width: usize,
    base: IndexBase,
) -> Result<EllMatrix, ClientError> {
    let slots = m.checked_mul(ell_width).ok_or_else(|| {
        ClientError::InvalidArgument(format!("{} rows of width {} overflow", m, ell_width))
    })?;
    let width = ell_width.min(n);
    let mut values = vec![0.0f32; slots];
    let mut col_indices = vec![gpusparse_core::ELL_PADDING; slots];

    for row in 0..m {
        let row_nnz = rng.usize(0..=width);
        let cols = random_unique_indices(rng, row_nnz, n, base)?;
        for (p, col) in cols.into_iter().enumerate() {
            let slot = row * ell_width + p;
            values[slot] = rng.i32(1..=10) as f32;
            col_indices[slot] = col;
        }
    }

    Ok(EllMatrix::from_parts(m, n, ell_width, base, values, col_indices)?)
}

/// Banded `n x n` matrix: `diagonal` on the main diagonal and `off[k]` on the
/// diagonals at distance `k + 1` above and below it.
fn banded_matrix(n: usize, diagonal: f32, off: &[f32]) -> Result<CsrMatrix, ClientError> {
    let mut triplets = Vec::new();
    for i in 0..n {
        triplets.push(Triplet::new(i, i, diagonal));
        for (k, &value) in off.iter().enumerate() {
            let d = k + 1;
            if i >= d {
                triplets.push(Triplet::new(i, i - d, value));
            }
            if i + d < n {
                triplets.push(Triplet::new(i, i + d, value));
            }
        }
    }
    Ok(CsrMatrix::from_triplets(n, n, triplets)?)
}

/// Tridiagonal `n x n` matrix with 2 on the diagonal and -1 beside it (width 3).
pub fn tridiagonal_ell(n: usize, base: IndexBase) -> Result<EllMatrix, ClientError> {
    Ok(EllMatrix::from_csr(&banded_matrix(n, 2.0, &[-1.0])?, base)?)
}

/// Pentadiagonal `n x n` matrix: 4 on the diagonal, -1 on the first and -2 on
/// the second off-diagonals (width 5).
pub fn pentadiagonal_ell(n: usize, base: IndexBase) -> Result<EllMatrix, ClientError> {
    Ok(EllMatrix::from_csr(&banded_matrix(n, 4.0, &[-1.0, -2.0])?, base)?)
}
