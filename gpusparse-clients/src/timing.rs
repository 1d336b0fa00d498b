use std::mem::size_of;
use std::time::Duration;

/// Untimed calls issued before a measurement.
pub const WARMUP_CALLS: usize = 2;

/// Result of a timed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    /// Stored matrix or vector entries handled by one call.
    pub elements_processed: u64,
    /// Bytes one call reads and writes.
    pub bytes_moved: u64,
    /// Average wall time per call.
    pub seconds: f64,
    pub iterations: usize,
}

impl Throughput {
    /// Builds the record from the total time of `iterations` calls.
    pub fn from_run(elements_processed: u64, bytes_moved: u64, total: Duration, iterations: usize) -> Self {
        let seconds = total.as_secs_f64() / iterations.max(1) as f64;
        Self {
            elements_processed,
            bytes_moved,
            seconds,
            iterations,
        }
    }

    pub fn gbytes_per_second(&self) -> f64 {
        if self.seconds > 0.0 {
            self.bytes_moved as f64 / self.seconds / 1e9
        } else {
            0.0
        }
    }

    pub fn usec_per_call(&self) -> f64 {
        self.seconds * 1e6
    }
}

/// Bytes moved by one ELL product: the stored entries (values and indices,
/// padding excluded), `x`, `y`, and a second pass over `y` when it is read.
pub fn ellmv_byte_count(nnz: usize, x_len: usize, y_len: usize, beta_nonzero: bool) -> u64 {
    let matrix = nnz * (size_of::<i32>() + size_of::<f32>());
    let vectors = (x_len + y_len + if beta_nonzero { y_len } else { 0 }) * size_of::<f32>();
    (matrix + vectors) as u64
}

/// Bytes moved by one gather-with-zero: the indices, the gathered values, and
/// a read and a write of each touched entry of `y`.
pub fn gthrz_byte_count(nnz: usize) -> u64 {
    (nnz * size_of::<i32>() + 3 * nnz * size_of::<f32>()) as u64
}
