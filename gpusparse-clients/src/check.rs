use crate::error::ClientError;
use gpusparse_core::{SparseError, Status};

fn check_lengths(expected: &[f32], actual: &[f32]) -> Result<(), ClientError> {
    if expected.len() != actual.len() {
        return Err(ClientError::LengthMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(())
}

/// Exact comparison. Two NaNs count as equal.
pub fn unit_check(expected: &[f32], actual: &[f32]) -> Result<(), ClientError> {
    check_lengths(expected, actual)?;
    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        if e != a && !(e.is_nan() && a.is_nan()) {
            return Err(ClientError::Mismatch {
                index,
                expected: e,
                actual: a,
            });
        }
    }
    Ok(())
}

/// Relative comparison: `|a - e| <= tol * max(1, |e|)`.
pub fn near_check(expected: &[f32], actual: &[f32], tol: f32) -> Result<(), ClientError> {
    check_lengths(expected, actual)?;
    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        let diff = (a - e).abs();
        if diff.is_nan() || diff > tol * e.abs().max(1.0) {
            return Err(ClientError::Mismatch {
                index,
                expected: e,
                actual: a,
            });
        }
    }
    Ok(())
}

/// Checks that a call reported the expected status.
pub fn expect_status<T>(result: &Result<T, SparseError>, expected: Status) -> Result<(), ClientError> {
    let actual = Status::from(result);
    if actual != expected {
        log::error!("Expected status {}, got {}", expected, actual);
        return Err(ClientError::UnexpectedStatus { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_check() {
        assert!(unit_check(&[1.0, 2.0, f32::NAN], &[1.0, 2.0, f32::NAN]).is_ok());
        assert_eq!(
            unit_check(&[1.0, 2.0], &[1.0, 2.5]),
            Err(ClientError::Mismatch {
                index: 1,
                expected: 2.0,
                actual: 2.5
            })
        );
        assert_eq!(
            unit_check(&[1.0], &[1.0, 2.0]),
            Err(ClientError::LengthMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_near_check() {
        assert!(near_check(&[1000.0, 0.0], &[1000.05, 1e-5], 1e-4).is_ok());
        assert!(near_check(&[1000.0], &[1001.0], 1e-4).is_err());
        // NaN never passes a tolerance check.
        assert!(near_check(&[1.0], &[f32::NAN], 1e-1).is_err());
    }

    #[test]
    fn test_expect_status() {
        let ok: Result<(), SparseError> = Ok(());
        assert!(expect_status(&ok, Status::Success).is_ok());

        let err: Result<(), SparseError> = Err(SparseError::InvalidPointer);
        assert_eq!(
            expect_status(&err, Status::InvalidSize),
            Err(ClientError::UnexpectedStatus {
                expected: Status::InvalidSize,
                actual: Status::InvalidPointer
            })
        );
    }
}
