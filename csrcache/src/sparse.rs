use crate::errors::CsrError;
use crate::indexing::SpIndex;
use crate::storage::{Device, Element, Host, MemorySpace};

/// Structure of a sparse matrix in the Compressed Sparse Row format, without
/// its values.
///
/// A pattern is made of two arrays, `row_offsets` and `column_indices`,
/// allocated in the memory space `M` and holding indices of type `I`.
///
/// ## Storage format
///
/// The offsets array has `rows() + 1` elements, starts at zero, ends at
/// `nnz()` and never decreases. The non-zero entries of row `r` occupy the
/// range `row_offsets[r]..row_offsets[r + 1]` of `column_indices`. Inside that
/// range, column indices are sorted in strictly increasing order, which also
/// means a location can only appear once.
///
/// ## Lifecycle
///
/// [`with_shape`] allocates both arrays with their final lengths, but the
/// structure is only meaningful once the owner has filled them through
/// [`row_offsets_mut`] and [`column_indices_mut`]. The lengths of the arrays
/// can only change through [`resize`], which does not preserve contents.
/// [`check_structure`] verifies every invariant at once.
///
/// [`with_shape`]: struct.CsrPattern.html#method.with_shape
/// [`row_offsets_mut`]: struct.CsrPattern.html#method.row_offsets_mut
/// [`column_indices_mut`]: struct.CsrPattern.html#method.column_indices_mut
/// [`resize`]: struct.CsrPattern.html#method.resize
/// [`check_structure`]: struct.CsrPattern.html#method.check_structure
#[derive(Debug, Clone, PartialEq)]
pub struct CsrPattern<I: SpIndex = usize, M: MemorySpace = Host> {
    num_rows: usize,
    num_cols: usize,
    num_entries: usize,
    row_offsets: M::Array<I>,
    column_indices: M::Array<I>,
}

/// Sparse matrix in the Compressed Sparse Row format.
///
/// A `CsrMatrix` is a [`CsrPattern`] plus a `values` array of the same length
/// as the column indices: `values[k]` is the weight of the entry located at
/// column `column_indices[k]`, in the row whose offset range contains `k`.
///
/// The matrix is parameterized by the scalar type `N`, the index type `I` and
/// the memory space `M`. All three arrays are exclusively owned by the matrix,
/// and [`swap`] exchanges them between two matrices without copying.
///
/// For example, the 4 by 3 matrix
///
/// ```text
/// [10  0 20]
/// [ 0  0  0]
/// [ 0  0 30]
/// [40 50 60]
/// ```
///
/// is stored as `row_offsets = [0, 2, 2, 3, 6]`,
/// `column_indices = [0, 2, 2, 0, 1, 2]` and
/// `values = [10, 20, 30, 40, 50, 60]`.
///
/// ```rust
/// use csrcache::CsrMatrix;
///
/// let mut a = CsrMatrix::<f32, i32>::with_shape(4, 3, 6).unwrap();
/// a.row_offsets_mut().copy_from_slice(&[0, 2, 2, 3, 6]);
/// a.column_indices_mut().copy_from_slice(&[0, 2, 2, 0, 1, 2]);
/// a.values_mut()
///     .copy_from_slice(&[10., 20., 30., 40., 50., 60.]);
/// assert!(a.check_structure().is_ok());
/// assert_eq!(a.get(3, 1), Some(&50.));
/// ```
///
/// Matrices can also be built from any [`TripletSource`], for instance a
/// dense `ndarray` matrix, and converted to other index types, value types or
/// memory spaces with [`try_convert_from`].
///
/// [`swap`]: struct.CsrMatrix.html#method.swap
/// [`TripletSource`]: triplets/trait.TripletSource.html
/// [`try_convert_from`]: struct.CsrMatrix.html#method.try_convert_from
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<N: Element, I: SpIndex = usize, M: MemorySpace = Host> {
    pattern: CsrPattern<I, M>,
    values: M::Array<N>,
}

pub type DeviceCsrPattern<I = usize> = CsrPattern<I, Device>;
pub type DeviceCsrMatrix<N, I = usize> = CsrMatrix<N, I, Device>;

pub(crate) mod utils {
    use super::*;

    /// Check the structure of CSR components
    /// This will ensure that:
    /// * row_offsets is of length num_rows + 1
    /// * the index type can represent every column of the matrix
    /// * row_offsets starts at zero, is sorted and ends at column_indices.len()
    /// * column indices are sorted and in bounds for each row
    pub(crate) fn check_structure<I: SpIndex>(
        num_rows: usize,
        num_cols: usize,
        row_offsets: &[I],
        column_indices: &[I],
    ) -> Result<(), CsrError> {
        if num_rows.checked_add(1) != Some(row_offsets.len()) {
            return Err(CsrError::BadIndptrLength);
        }
        I::try_from_usize(num_cols)?;
        if row_offsets.iter().any(|o| o.try_index().is_none()) {
            return Err(CsrError::OutOfBoundsIndptr);
        }
        if column_indices.iter().any(|i| i.try_index().is_none()) {
            return Err(CsrError::OutOfBoundsIndex);
        }
        // Guaranteed to have at least one element
        if row_offsets[0] != I::zero() {
            return Err(CsrError::OutOfBoundsIndptr);
        }
        if !row_offsets.windows(2).all(|w| w[0] <= w[1]) {
            return Err(CsrError::UnsortedIndptr);
        }
        if row_offsets[num_rows].index() != column_indices.len() {
            return Err(CsrError::BadNnzCount);
        }

        for w in row_offsets.windows(2) {
            let row = &column_indices[w[0].index()..w[1].index()];
            if !sorted_indices(row) {
                return Err(CsrError::NonSortedIndices);
            }
            // Last index (which is the largest) must be in bounds
            if let Some(i) = row.last() {
                if i.index() >= num_cols {
                    return Err(CsrError::OutOfBoundsIndex);
                }
            }
        }

        Ok(())
    }

    pub fn sorted_indices<I: SpIndex>(indices: &[I]) -> bool {
        indices.windows(2).all(|w| w[0] < w[1])
    }
}

pub mod csmat;
pub mod pattern;
pub mod prod;
#[cfg(feature = "serde")]
mod serde_traits;
pub mod to_dense;
pub mod triplets;
