use crate::csr_matrix::CsrMatrix;
use crate::descr::{IndexBase, MatDescr, Operation};
use crate::error::SparseError;
use crate::handle::Handle;
use crate::level2;
use crate::scalar::Scalar;
use crate::traits::Matrix;
use crate::vector::GpuVector;

/// Column index stored in unused ELL slots.
pub const ELL_PADDING: i32 = -1;

/// A sparse matrix in ELL format on the CPU.
///
/// Every row owns exactly `ell_width` slots; slot `p` of row `i` lives at
/// `i * ell_width + p`. Slots past a row's stored entries hold [`ELL_PADDING`]
/// and a zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct EllMatrix {
    rows: usize,
    cols: usize,
    ell_width: usize,
    base: IndexBase,
    pub(crate) values: Vec<f32>,
    pub(crate) col_indices: Vec<i32>,
}

impl EllMatrix {
    /// Creates an ELL matrix from raw slot arrays, checking lengths and that every
    /// stored index is either padding or a valid column for `base`.
    pub fn from_parts(
        rows: usize,
        cols: usize,
        ell_width: usize,
        base: IndexBase,
        values: Vec<f32>,
        col_indices: Vec<i32>,
    ) -> Result<Self, SparseError> {
        if i32::try_from(rows).is_err()
            || i32::try_from(cols).is_err()
            || i32::try_from(ell_width).is_err()
        {
            return Err(SparseError::InvalidSize);
        }
        let slots = rows.checked_mul(ell_width).ok_or(SparseError::InvalidSize)?;
        if values.len() != slots || col_indices.len() != slots {
            return Err(SparseError::InvalidSize);
        }
        let offset = base.offset() as i64;
        let valid = col_indices.iter().all(|&c| {
            let col = c as i64 - offset;
            c == ELL_PADDING || (0..cols as i64).contains(&col)
        });
        if !valid {
            return Err(SparseError::InvalidValue);
        }

        Ok(Self {
            rows,
            cols,
            ell_width,
            base,
            values,
            col_indices,
        })
    }

    /// Converts a CSR matrix. The width is the longest row; shorter rows are padded.
    pub fn from_csr(csr: &CsrMatrix, base: IndexBase) -> Result<Self, SparseError> {
        let (rows, cols) = csr.dims();
        let ell_width = csr.max_row_nnz();
        let mut values = vec![0.0f32; rows * ell_width];
        let mut col_indices = vec![ELL_PADDING; rows * ell_width];

        for row in 0..rows {
            let start = csr.row_ptr[row];
            let end = csr.row_ptr[row + 1];
            for (p, i) in (start..end).enumerate() {
                let slot = row * ell_width + p;
                values[slot] = csr.values[i];
                col_indices[slot] = i32::try_from(csr.col_indices[i])
                    .map_err(|_| SparseError::InvalidSize)?
                    + base.offset();
            }
        }

        Self::from_parts(rows, cols, ell_width, base, values, col_indices)
    }

    /// Builds an ELL matrix from a rectangular dense representation.
    pub fn from_dense(dense: &[Vec<f32>], base: IndexBase) -> Result<Self, SparseError> {
        Self::from_csr(&CsrMatrix::from_dense(dense)?, base)
    }

    pub fn ell_width(&self) -> usize {
        self.ell_width
    }

    pub fn base(&self) -> IndexBase {
        self.base
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn col_indices(&self) -> &[i32] {
        &self.col_indices
    }

    /// Zero-based column of a slot, `None` for padding.
    fn slot_col(&self, slot: usize) -> Option<usize> {
        let col = self.col_indices[slot] - self.base.offset();
        usize::try_from(col).ok().filter(|&c| c < self.cols)
    }

    /// Stored entries of `row`, up to the first padding slot.
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let start = row * self.ell_width;
        (start..start + self.ell_width)
            .map_while(move |slot| self.slot_col(slot).map(|col| (col, self.values[slot])))
    }

    /// Value at (row, col), `None` when not stored.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows {
            return None;
        }
        self.row_entries(row)
            .find(|&(c, _)| c == col)
            .map(|(_, value)| value)
    }
}

impl Matrix for EllMatrix {
    type Value = f32;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn nnz(&self) -> usize {
        (0..self.rows).map(|row| self.row_entries(row).count()).sum()
    }
}

/// An ELL matrix uploaded to the GPU together with its descriptor.
#[derive(Debug)]
pub struct EllMatrixGpu {
    rows: usize,
    cols: usize,
    ell_width: usize,
    nnz: usize,
    descr: MatDescr,
    values: GpuVector<f32>,
    col_indices: GpuVector<i32>,
}

impl Matrix for EllMatrixGpu {
    type Value = f32;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn nnz(&self) -> usize {
        self.nnz
    }
}

impl EllMatrixGpu {
    /// Internal constructor used by GpuDevice.
    pub(crate) fn new_internal(
        host: &EllMatrix,
        values: GpuVector<f32>,
        col_indices: GpuVector<i32>,
    ) -> Self {
        Self {
            rows: host.rows,
            cols: host.cols,
            ell_width: host.ell_width,
            nnz: host.nnz(),
            descr: MatDescr::with_base(host.base),
            values,
            col_indices,
        }
    }

    pub fn ell_width(&self) -> usize {
        self.ell_width
    }

    pub fn descr(&self) -> &MatDescr {
        &self.descr
    }

    pub fn values(&self) -> &GpuVector<f32> {
        &self.values
    }

    pub fn col_indices(&self) -> &GpuVector<i32> {
        &self.col_indices
    }

    /// `y = alpha * op(self) * x + beta * y`. See [`level2::ellmv`].
    pub async fn ellmv(
        &self,
        handle: &Handle,
        trans: Operation,
        alpha: Scalar<'_>,
        x: &GpuVector<f32>,
        beta: Scalar<'_>,
        y: &mut GpuVector<f32>,
    ) -> Result<(), SparseError> {
        level2::ellmv(
            Some(handle),
            trans,
            self.rows as i32,
            self.cols as i32,
            Some(alpha),
            Some(&self.descr),
            Some(&self.values),
            Some(&self.col_indices),
            self.ell_width as i32,
            Some(x),
            Some(beta),
            Some(y),
        )
        .await
    }
}
