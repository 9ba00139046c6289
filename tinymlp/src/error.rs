use crate::activation::ActivationFn;
use crate::loss::LossFn;
use crate::matrix::Dim2;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure in this crate is a programming or configuration defect of the caller.
/// Operations validate before mutating, so an `Err` leaves all state untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("shape mismatch in {op}: expected {expected}, got {actual}")]
    ShapeMismatch {
        op: &'static str,
        expected: Dim2,
        actual: Dim2,
    },

    #[error("length mismatch in {op}: expected {expected}, got {actual}")]
    LengthMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index ({row}, {col}) out of bounds for size {dims}")]
    IndexOutOfBounds { row: usize, col: usize, dims: Dim2 },

    #[error("cannot broadcast {operand} across {target}")]
    InvalidBroadcast { target: Dim2, operand: Dim2 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("label {label} out of bounds for {num_classes} classes")]
    InvalidLabel { label: usize, num_classes: usize },

    #[error("{loss:?} requires a {required:?} output activation, model uses {actual:?}")]
    IncompatibleLoss {
        loss: LossFn,
        required: ActivationFn,
        actual: ActivationFn,
    },

    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    #[inline]
    pub(crate) fn shape(op: &'static str, expected: Dim2, actual: Dim2) -> Self {
        Error::ShapeMismatch {
            op,
            expected,
            actual,
        }
    }

    #[inline]
    pub(crate) fn length(op: &'static str, expected: usize, actual: usize) -> Self {
        Error::LengthMismatch {
            op,
            expected,
            actual,
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Serialization(value.to_string())
    }
}

/// Fails with a [`Error::ShapeMismatch`] unless `actual == expected`.
#[inline]
pub(crate) fn check_dims(op: &'static str, expected: Dim2, actual: Dim2) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::shape(op, expected, actual))
    }
}

/// Fails with a [`Error::LengthMismatch`] unless `actual == expected`.
#[inline]
pub(crate) fn check_len(op: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::length(op, expected, actual))
    }
}
