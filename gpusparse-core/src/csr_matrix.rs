use crate::error::SparseError;
use crate::traits::Matrix;

/// A sparse matrix in Compressed Sparse Row (CSR) format on the CPU.
///
/// Used as the host-side assembly format; device kernels consume [`EllMatrix`]
/// data converted from it.
///
/// [`EllMatrix`]: crate::EllMatrix
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// Non-zero values, row by row.
    pub(crate) values: Vec<f32>,
    /// Column index of each value.
    pub(crate) col_indices: Vec<usize>,
    /// `row_ptr[i]..row_ptr[i + 1]` is the range of row `i` in `values`. Length `rows + 1`.
    pub(crate) row_ptr: Vec<usize>,
}

/// One `(row, col, value)` entry used to assemble a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triplet {
    row: usize,
    col: usize,
    value: f32,
}

impl Triplet {
    pub fn new(row: usize, col: usize, value: f32) -> Self {
        Triplet { row, col, value }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

impl CsrMatrix {
    /// Creates an empty matrix (no stored entries) with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        CsrMatrix {
            rows,
            cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptr: vec![0; rows + 1],
        }
    }

    /// Assembles a matrix from unordered triplets. Entries are sorted by (row, col);
    /// duplicates are kept as separate entries.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        mut triplets: Vec<Triplet>,
    ) -> Result<Self, SparseError> {
        triplets.sort_unstable_by_key(|t| (t.row, t.col));

        let mut row_ptr = vec![0usize; rows + 1];
        for t in &triplets {
            if t.row >= rows || t.col >= cols {
                return Err(SparseError::InvalidSize);
            }
            row_ptr[t.row + 1] += 1;
        }
        for i in 1..=rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        let values = triplets.iter().map(|t| t.value).collect();
        let col_indices = triplets.iter().map(|t| t.col).collect();

        Ok(CsrMatrix {
            rows,
            cols,
            values,
            col_indices,
            row_ptr,
        })
    }

    /// Creates a matrix from CSR components, validating their consistency.
    pub fn from_csr(
        rows: usize,
        cols: usize,
        values: Vec<f32>,
        col_indices: Vec<usize>,
        row_ptr: Vec<usize>,
    ) -> Result<Self, SparseError> {
        if row_ptr.len() != rows + 1 || values.len() != col_indices.len() {
            return Err(SparseError::InvalidSize);
        }
        if row_ptr.first() != Some(&0) || row_ptr.last() != Some(&values.len()) {
            return Err(SparseError::InvalidValue);
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(SparseError::InvalidValue);
        }
        if col_indices.iter().any(|&c| c >= cols) {
            return Err(SparseError::InvalidSize);
        }

        Ok(CsrMatrix {
            rows,
            cols,
            values,
            col_indices,
            row_ptr,
        })
    }

    /// Creates a matrix from a rectangular dense representation, keeping non-zeros.
    pub fn from_dense(dense: &[Vec<f32>]) -> Result<Self, SparseError> {
        let rows = dense.len();
        let cols = dense.first().map_or(0, |row| row.len());
        if dense.iter().any(|row| row.len() != cols) {
            return Err(SparseError::InvalidSize);
        }

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptr = vec![0; rows + 1];
        for (r, row) in dense.iter().enumerate() {
            for (c, &val) in row.iter().enumerate() {
                if val != 0.0 {
                    values.push(val);
                    col_indices.push(c);
                }
            }
            row_ptr[r + 1] = values.len();
        }

        CsrMatrix::from_csr(rows, cols, values, col_indices, row_ptr)
    }

    /// Number of stored entries of row `row`.
    pub fn row_nnz(&self, row: usize) -> usize {
        self.row_ptr[row + 1] - self.row_ptr[row]
    }

    /// Longest row, i.e. the ELL width needed to hold this matrix.
    pub fn max_row_nnz(&self) -> usize {
        (0..self.rows).map(|r| self.row_nnz(r)).max().unwrap_or(0)
    }

    /// Value at (row, col), `None` when not stored or out of bounds.
    /// Linear in the row length; meant for tests and debugging.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        self.col_indices[range.clone()]
            .iter()
            .position(|&c| c == col)
            .map(|pos| self.values[range.start + pos])
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Iterates over stored entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Triplet> + '_ {
        (0..self.rows).flat_map(move |row| {
            (self.row_ptr[row]..self.row_ptr[row + 1])
                .map(move |i| Triplet::new(row, self.col_indices[i], self.values[i]))
        })
    }
}

impl Matrix for CsrMatrix {
    type Value = f32;

    fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // [ 1.0, 0.0, 2.0, 0.0 ]
    // [ 0.0, 3.0, 0.0, 4.0 ]
    // [ 0.0, 0.0, 5.0, 0.0 ]
    fn sample() -> CsrMatrix {
        CsrMatrix::from_csr(
            3,
            4,
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![0, 2, 1, 3, 2],
            vec![0, 2, 4, 5],
        )
        .unwrap()
    }

    #[test]
    fn test_csr_matrix_new() {
        let matrix = CsrMatrix::new(3, 4);
        assert_eq!(matrix.dims(), (3, 4));
        assert_eq!(matrix.nnz(), 0);
        assert_eq!(matrix.row_ptr(), &[0, 0, 0, 0]);
        assert_eq!(matrix.max_row_nnz(), 0);
    }

    #[test]
    fn test_csr_matrix_from_csr_invalid() {
        // row_ptr too short
        assert_eq!(
            CsrMatrix::from_csr(3, 4, vec![1.0], vec![0], vec![0, 1]),
            Err(SparseError::InvalidSize)
        );
        // last row_ptr != nnz
        assert_eq!(
            CsrMatrix::from_csr(3, 4, vec![1.0, 2.0], vec![0, 1], vec![0, 1, 1, 1]),
            Err(SparseError::InvalidValue)
        );
        // col index 3 >= cols 3
        assert_eq!(
            CsrMatrix::from_csr(2, 3, vec![1.0, 2.0], vec![0, 3], vec![0, 1, 2]),
            Err(SparseError::InvalidSize)
        );
        // decreasing row_ptr
        assert_eq!(
            CsrMatrix::from_csr(2, 3, vec![1.0, 2.0], vec![0, 1], vec![0, 3, 2]),
            Err(SparseError::InvalidValue)
        );
    }

    #[test]
    fn test_csr_matrix_get() {
        let matrix = sample();
        assert_eq!(matrix.get(0, 0), Some(1.0));
        assert_eq!(matrix.get(0, 2), Some(2.0));
        assert_eq!(matrix.get(1, 3), Some(4.0));
        assert_eq!(matrix.get(2, 2), Some(5.0));
        assert_eq!(matrix.get(0, 1), None);
        assert_eq!(matrix.get(3, 0), None);
        assert_eq!(matrix.get(0, 4), None);
        assert_eq!(matrix.max_row_nnz(), 2);
    }

    #[test]
    fn test_csr_matrix_from_triplets_sorts_rows() {
        let matrix = CsrMatrix::from_triplets(
            3,
            4,
            vec![
                Triplet::new(2, 2, 5.0),
                Triplet::new(0, 2, 2.0),
                Triplet::new(1, 3, 4.0),
                Triplet::new(0, 0, 1.0),
                Triplet::new(1, 1, 3.0),
            ],
        )
        .unwrap();
        assert_eq!(matrix, sample());

        assert_eq!(
            CsrMatrix::from_triplets(2, 2, vec![Triplet::new(2, 0, 1.0)]),
            Err(SparseError::InvalidSize)
        );
    }

    #[test]
    fn test_csr_matrix_from_dense_and_iter() {
        let dense = vec![
            vec![1.0, 0.0, 2.0, 0.0],
            vec![0.0, 3.0, 0.0, 4.0],
            vec![0.0, 0.0, 5.0, 0.0],
        ];
        let matrix = CsrMatrix::from_dense(&dense).unwrap();
        assert_eq!(matrix, sample());

        let entries: Vec<(usize, usize, f32)> =
            matrix.iter().map(|t| (t.row(), t.col(), t.value())).collect();
        assert_eq!(
            entries,
            vec![(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0), (1, 3, 4.0), (2, 2, 5.0)]
        );

        assert_eq!(
            CsrMatrix::from_dense(&[vec![1.0, 2.0], vec![3.0]]),
            Err(SparseError::InvalidSize)
        );
    }
}
