//! # Sparse GPU Core Library
//!
//! ELL sparse matrix-vector multiplication and sparse gather on the GPU through
//! wgpu compute shaders.
//!
//! Entry points take a [`Handle`] that carries the device, the pointer mode of
//! the alpha/beta scalars and the kernel launch configuration. Every operation
//! validates its arguments before enqueuing anything and reports failures as a
//! [`SparseError`].

// Declare modules
mod context;
pub mod csr_matrix;
pub mod descr;
pub mod device;
pub mod ell_matrix;
pub mod error;
pub mod handle;
mod kernels;
pub mod level1;
pub mod level2;
pub mod scalar;
pub mod traits;
pub mod vector;

// Re-export public types
pub use csr_matrix::{CsrMatrix, Triplet};
pub use descr::{IndexBase, MatDescr, MatrixType, Operation};
pub use device::{GpuDevice, TransferStats};
pub use ell_matrix::{EllMatrix, EllMatrixGpu, ELL_PADDING};
pub use error::{SparseError, Status};
pub use handle::{Handle, LaunchConfig, PointerMode};
pub use scalar::{GpuScalar, Scalar};
pub use vector::GpuVector;

pub use traits::{Matrix, Vector};
