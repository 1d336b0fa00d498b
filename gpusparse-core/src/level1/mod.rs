//! Sparse vector operations.

mod gthrz;

pub use gthrz::gthrz;
