//! Abstraction over types of indices
//!
//! Our sparse matrices can use any integer type for their row offsets and
//! column indices among
//! `u8, u16, u32, u64, usize, i8, i16, i32, i64, isize`.
//!
//! By default, matrices use `usize`, but a narrower type such as `i32` halves
//! the memory traffic of the index arrays, which matters for device resident
//! matrices and for FFI with existing GPU libraries.
use std::fmt::Debug;
use std::ops::AddAssign;

use num_traits::int::PrimInt;
use num_traits::NumCast;

use crate::errors::CsrError;

/// A sparse matrix index
///
/// This is a convenience trait to enable using various integer sizes for
/// sparse matrix indices.
pub trait SpIndex:
    Debug + PrimInt + AddAssign<Self> + Default + Send + Sync + 'static
{
    /// Convert to usize
    ///
    /// # Panics
    ///
    /// If the integer cannot be represented as an `usize`, eg negative
    /// numbers. The panic happens in debug builds only.
    fn index(self) -> usize;

    /// Convert to usize, returning `None` for negative values
    fn try_index(self) -> Option<usize> {
        <usize as NumCast>::from(self)
    }

    /// Convert from usize
    ///
    /// # Panics
    ///
    /// If the input overflows the index type. The panic happens in debug
    /// builds only.
    fn from_usize(ind: usize) -> Self;

    /// Convert from usize, reporting an overflow as an error
    fn try_from_usize(ind: usize) -> Result<Self, CsrError> {
        <Self as NumCast>::from(ind).ok_or(CsrError::IndexOverflow)
    }

    /// Convert from another index representation, reporting values that do
    /// not fit as an error
    fn try_cast<I2: SpIndex>(ind: I2) -> Result<Self, CsrError> {
        <Self as NumCast>::from(ind).ok_or(CsrError::IndexOverflow)
    }
}

impl SpIndex for usize {
    #[inline(always)]
    fn index(self) -> usize {
        self
    }

    #[inline(always)]
    fn from_usize(ind: usize) -> Self {
        ind
    }
}

macro_rules! sp_index_signed_impl {
    ($int:ident) => {
        impl SpIndex for $int {
            #[inline(always)]
            fn index(self) -> usize {
                debug_assert!(self >= 0);
                self as usize
            }

            #[inline(always)]
            fn from_usize(ind: usize) -> Self {
                debug_assert!(ind <= $int::MAX as usize);
                ind as $int
            }
        }
    };
}

sp_index_signed_impl!(isize);
sp_index_signed_impl!(i64);
sp_index_signed_impl!(i32);
sp_index_signed_impl!(i16);
sp_index_signed_impl!(i8);

macro_rules! sp_index_unsigned_impl {
    ($int:ident) => {
        impl SpIndex for $int {
            #[inline(always)]
            fn index(self) -> usize {
                self as usize
            }

            #[inline(always)]
            fn from_usize(ind: usize) -> Self {
                debug_assert!(ind <= $int::MAX as usize);
                ind as $int
            }
        }
    };
}

sp_index_unsigned_impl!(u64);
sp_index_unsigned_impl!(u32);
sp_index_unsigned_impl!(u16);
sp_index_unsigned_impl!(u8);
