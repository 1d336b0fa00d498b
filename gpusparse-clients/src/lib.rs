//! `gpusparse-clients`: validation and benchmarking harness for `gpusparse-core`.
//!
//! Each `testing_*` routine checks one operation against a CPU reference in both
//! pointer modes and, on request, times it. The `*_bad_arg` routines drive every
//! argument check with a tiny fixed instance.

pub mod arguments;
pub mod check;
pub mod error;
pub mod host;
pub mod init;
pub mod testing_ellmv;
pub mod testing_gthrz;
pub mod timing;

pub use arguments::Arguments;
pub use error::ClientError;
pub use testing_ellmv::{testing_ellmv, testing_ellmv_bad_arg};
pub use testing_gthrz::{testing_gthrz, testing_gthrz_bad_arg};
pub use timing::Throughput;

// Re-export from gpusparse_core
pub use gpusparse_core::{
    EllMatrix, EllMatrixGpu, GpuDevice, GpuVector, Handle, IndexBase, Operation, PointerMode,
    SparseError, Status,
};
