use bytemuck::Pod;
use std::fmt::Debug;

/// Shape and occupancy shared by the host and device sparse formats.
pub trait Matrix: Debug {
    /// Element type of the stored values.
    type Value: Pod + Debug + Default;

    /// `(rows, columns)`.
    fn dims(&self) -> (usize, usize);

    /// Stored entries, padding excluded.
    fn nnz(&self) -> usize;

    fn rows(&self) -> usize {
        self.dims().0
    }

    fn cols(&self) -> usize {
        self.dims().1
    }

    /// Fraction of the dense shape that is stored; 0 for an empty shape.
    fn density(&self) -> f64 {
        let (rows, cols) = self.dims();
        let cells = rows as f64 * cols as f64;
        if cells == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / cells
        }
    }
}

/// A dense array of values or indices.
pub trait Vector: Debug {
    type Value: Pod + Debug + Default;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes occupied by the elements, excluding any placeholder allocation.
    fn byte_len(&self) -> u64 {
        (self.len() * std::mem::size_of::<Self::Value>()) as u64
    }
}
