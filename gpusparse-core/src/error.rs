use thiserror::Error;

/// Failure of a sparse operation.
///
/// Every variant maps onto exactly one non-success [`Status`]. Argument errors are
/// always reported before anything is enqueued on the device; `DeviceCallFailed`
/// is only produced after work reached the wgpu queue (or while creating resources).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SparseError {
    #[error("invalid handle")]
    InvalidHandle,

    #[error("invalid pointer")]
    InvalidPointer,

    #[error("invalid value")]
    InvalidValue,

    #[error("invalid size")]
    InvalidSize,

    #[error("not implemented")]
    NotImplemented,

    #[error("device call failed: {0}")]
    DeviceCallFailed(String),
}

impl SparseError {
    /// Returns the status code this error reports.
    pub fn status(&self) -> Status {
        match self {
            SparseError::InvalidHandle => Status::InvalidHandle,
            SparseError::InvalidPointer => Status::InvalidPointer,
            SparseError::InvalidValue => Status::InvalidValue,
            SparseError::InvalidSize => Status::InvalidSize,
            SparseError::NotImplemented => Status::NotImplemented,
            SparseError::DeviceCallFailed(_) => Status::DeviceCallFailed,
        }
    }
}

impl From<wgpu::Error> for SparseError {
    fn from(err: wgpu::Error) -> Self {
        SparseError::DeviceCallFailed(err.to_string())
    }
}

/// Closed set of outcomes of a sparse operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidHandle,
    InvalidPointer,
    InvalidValue,
    InvalidSize,
    NotImplemented,
    DeviceCallFailed,
}

impl<T> From<&Result<T, SparseError>> for Status {
    fn from(result: &Result<T, SparseError>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.status(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Success => "success",
            Status::InvalidHandle => "invalid_handle",
            Status::InvalidPointer => "invalid_pointer",
            Status::InvalidValue => "invalid_value",
            Status::InvalidSize => "invalid_size",
            Status::NotImplemented => "not_implemented",
            Status::DeviceCallFailed => "device_call_failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{SparseError, Status};

    #[test]
    fn test_status_from_result() {
        let ok: Result<(), SparseError> = Ok(());
        assert_eq!(Status::from(&ok), Status::Success);

        let err: Result<(), SparseError> = Err(SparseError::InvalidSize);
        assert_eq!(Status::from(&err), Status::InvalidSize);

        let err: Result<u32, SparseError> =
            Err(SparseError::DeviceCallFailed("lost device".to_string()));
        assert_eq!(Status::from(&err), Status::DeviceCallFailed);
    }

    #[test]
    fn test_device_error_message() {
        let err = SparseError::DeviceCallFailed("out of memory".to_string());
        assert_eq!(err.to_string(), "device call failed: out of memory");
        assert_eq!(Status::InvalidPointer.to_string(), "invalid_pointer");
    }
}
