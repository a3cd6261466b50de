//! Error type for csrcache

use std::error::Error;
use std::fmt;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[non_exhaustive]
pub enum CsrError {
    /// The requested number of elements could not be allocated
    AllocationFailed { requested: usize },
    /// An index does not fit the target index type
    IndexOverflow,
    /// A value does not fit the target value type
    ValueOverflow,
    /// The device address is not aligned for the texture cache. `offset` is
    /// the misalignment in bytes.
    InvalidAlignment { offset: usize },
    IncompatibleDimensions,
    BadIndptrLength,
    UnsortedIndptr,
    OutOfBoundsIndptr,
    NonSortedIndices,
    OutOfBoundsIndex,
    BadNnzCount,
    DataIndicesMismatch,
}

impl fmt::Display for CsrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "could not allocate {requested} elements")
            }
            Self::IndexOverflow => {
                write!(f, "index does not fit the target index type")
            }
            Self::ValueOverflow => {
                write!(f, "value does not fit the target value type")
            }
            Self::InvalidAlignment { offset } => write!(
                f,
                "memory is not aligned ({offset} bytes off), refusing to use texture cache"
            ),
            Self::IncompatibleDimensions => {
                write!(f, "incompatible dimensions")
            }
            Self::BadIndptrLength => {
                write!(f, "row offsets length does not match the row count")
            }
            Self::UnsortedIndptr => write!(f, "row offsets are not sorted"),
            Self::OutOfBoundsIndptr => {
                write!(f, "row offsets must start at zero and be non-negative")
            }
            Self::NonSortedIndices => {
                write!(f, "column indices are not sorted within a row")
            }
            Self::OutOfBoundsIndex => write!(f, "index out of bounds"),
            Self::BadNnzCount => {
                write!(f, "entry count does not match the last row offset")
            }
            Self::DataIndicesMismatch => {
                write!(f, "values and column indices have different lengths")
            }
        }
    }
}

impl Error for CsrError {}
