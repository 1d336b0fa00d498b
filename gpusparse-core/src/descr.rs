/// Operation applied to the sparse matrix.
///
/// Kept as an open integer code so that callers passing through raw values from
/// another layer are validated by the operation itself (`InvalidValue`) instead of
/// failing at conversion time, ahead of the handle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Operation(u32);

impl Operation {
    pub const NONE: Self = Self(111);
    pub const TRANSPOSE: Self = Self(112);
    pub const CONJUGATE_TRANSPOSE: Self = Self(113);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the three recognized operations.
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            Self::NONE | Self::TRANSPOSE | Self::CONJUGATE_TRANSPOSE
        )
    }

    /// Transpose and conjugate transpose coincide for real values.
    pub fn is_transposed(self) -> bool {
        matches!(self, Self::TRANSPOSE | Self::CONJUGATE_TRANSPOSE)
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::NONE
    }
}

/// Offset of every stored row/column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    pub fn offset(self) -> i32 {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatrixType {
    #[default]
    General,
    Symmetric,
    Hermitian,
    Triangular,
}

/// Per-call matrix metadata. Cheap to copy and reused across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatDescr {
    base: IndexBase,
    matrix_type: MatrixType,
}

impl MatDescr {
    /// A general matrix with zero-based indices.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: IndexBase) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn base(&self) -> IndexBase {
        self.base
    }

    pub fn set_base(&mut self, base: IndexBase) {
        self.base = base;
    }

    pub fn matrix_type(&self) -> MatrixType {
        self.matrix_type
    }

    pub fn set_matrix_type(&mut self, matrix_type: MatrixType) {
        self.matrix_type = matrix_type;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_codes() {
        assert!(Operation::NONE.is_valid());
        assert!(Operation::TRANSPOSE.is_valid());
        assert!(Operation::CONJUGATE_TRANSPOSE.is_valid());
        assert!(!Operation::from_raw(0).is_valid());
        assert!(!Operation::from_raw(114).is_valid());

        assert!(!Operation::NONE.is_transposed());
        assert!(Operation::CONJUGATE_TRANSPOSE.is_transposed());
        assert_eq!(Operation::from_raw(112), Operation::TRANSPOSE);
        assert_eq!(Operation::default().as_raw(), 111);
    }

    #[test]
    fn test_mat_descr_defaults() {
        let mut descr = MatDescr::new();
        assert_eq!(descr.base(), IndexBase::Zero);
        assert_eq!(descr.matrix_type(), MatrixType::General);

        descr.set_base(IndexBase::One);
        descr.set_matrix_type(MatrixType::Symmetric);
        assert_eq!(descr.base().offset(), 1);
        assert_eq!(descr.matrix_type(), MatrixType::Symmetric);

        assert_eq!(MatDescr::with_base(IndexBase::One).base(), IndexBase::One);
    }
}
