//! Scalar CSR sparse matrix-vector product on the device, `y = A * x`.
//!
//! One logical thread computes one row. The gathers from `x` optionally go
//! through the texture cache.

#[cfg(feature = "multi_thread")]
use rayon::prelude::*;
use tracing::instrument;

use super::arch::ComputeCapability;
use super::texture::{TexelType, TextureCache};
use crate::errors::CsrError;
use crate::indexing::SpIndex;
use crate::mul_acc::MulAcc;
use crate::sparse::DeviceCsrMatrix;
use crate::storage::{DevicePtr, DeviceVec};

/// Compute `y = a * x` with one logical thread per row.
///
/// With `USE_CACHE`, `x` is bound to `cache` for the duration of the launch
/// and unbound afterwards, whether the launch succeeded or not. The cache
/// does not borrow `x` past the call, so it can be reused for the next
/// launch on another vector. Kernels
/// built for a capability `A` without 64-bit texture fetches produce
/// `f64::INFINITY` rows when caching `f64` vectors.
///
/// # Errors
///
/// `CsrError::IncompatibleDimensions` if `x` or `y` do not match the shape
/// of `a`, in which case `y` is left untouched.
///
/// # Example
///
/// ```rust
/// use csrcache::{CsrMatrix, Device, DeviceVec, Sm13, TextureCache};
/// use csrcache::device::spmv_csr_scalar;
///
/// let a = CsrMatrix::<f32>::try_from_parts(
///     (2, 2),
///     vec![0, 1, 2],
///     vec![1, 0],
///     vec![2., 3.],
/// )
/// .unwrap()
/// .transfer::<Device>()
/// .unwrap();
/// let x = DeviceVec::upload(&[1., 10.]).unwrap();
/// let mut y = DeviceVec::upload(&[0.; 2]).unwrap();
/// let mut cache = TextureCache::new();
/// spmv_csr_scalar::<true, Sm13, _, _>(&a, &x, &mut y, &mut cache).unwrap();
/// assert_eq!(y.download(), vec![20., 3.]);
/// assert!(!cache.is_bound::<f32>());
/// ```
#[instrument(
    level = "debug",
    skip_all,
    fields(rows = a.rows(), nnz = a.nnz(), use_cache = USE_CACHE)
)]
pub fn spmv_csr_scalar<const USE_CACHE: bool, A, N, I>(
    a: &DeviceCsrMatrix<N, I>,
    x: &DeviceVec<N>,
    y: &mut DeviceVec<N>,
    cache: &mut TextureCache<'_>,
) -> Result<(), CsrError>
where
    A: ComputeCapability,
    N: TexelType + MulAcc,
    I: SpIndex,
{
    let x_ptr = x.as_device_ptr();
    if USE_CACHE {
        cache.with_binding(x_ptr, |tex| {
            launch::<USE_CACHE, A, N, I>(a, &x_ptr, y, tex)
        })?
    } else {
        launch::<USE_CACHE, A, N, I>(a, &x_ptr, y, cache)
    }
}

fn launch<const USE_CACHE: bool, A, N, I>(
    a: &DeviceCsrMatrix<N, I>,
    x: &DevicePtr<'_, N>,
    y: &mut [N],
    cache: &TextureCache<'_>,
) -> Result<(), CsrError>
where
    A: ComputeCapability,
    N: TexelType + MulAcc,
    I: SpIndex,
{
    if a.cols() != x.len() || a.rows() != y.len() {
        return Err(CsrError::IncompatibleDimensions);
    }

    let row_kernel = |(row, y_row): (usize, &mut N)| {
        let (indices, values) = a.row(row);
        let mut sum = N::zero();
        for (col, val) in indices.iter().zip(values.iter()) {
            let x_col = cache.fetch::<USE_CACHE, A, N>(col.index(), x);
            sum.mul_acc(val, &x_col);
        }
        *y_row = sum;
    };

    #[cfg(feature = "multi_thread")]
    y.par_iter_mut().enumerate().for_each(row_kernel);
    #[cfg(not(feature = "multi_thread"))]
    y.iter_mut().enumerate().for_each(row_kernel);

    Ok(())
}
