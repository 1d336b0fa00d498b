//! Sparse matrix-vector operations.

mod ellmv;

pub use ellmv::ellmv;
