//! Construction, conversion and reallocation of CSR patterns

use std::ops::Range;

use tracing::instrument;

use super::utils;
use super::CsrPattern;
use crate::errors::CsrError;
use crate::indexing::SpIndex;
use crate::storage::{MemorySpace, Storage};

/// Allocate an array in `M` holding the elements of `src` converted to `I`.
/// Nothing is returned unless every element fits.
pub(crate) fn cast_indices<I, I2, M>(
    src: &[I2],
) -> Result<M::Array<I>, CsrError>
where
    I: SpIndex,
    I2: SpIndex,
    M: MemorySpace,
{
    let mut dst = <M::Array<I> as Storage<I>>::try_with_len(src.len())?;
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = I::try_cast(s)?;
    }
    Ok(dst)
}

/// Length of the offsets array for `num_rows` rows
fn offsets_len(num_rows: usize) -> Result<usize, CsrError> {
    num_rows
        .checked_add(1)
        .ok_or(CsrError::AllocationFailed { requested: num_rows })
}

impl<I: SpIndex, M: MemorySpace> CsrPattern<I, M> {
    /// An empty pattern, of shape `(0, 0)`
    pub fn new() -> Self {
        Self {
            num_rows: 0,
            num_cols: 0,
            num_entries: 0,
            row_offsets: <M::Array<I> as Storage<I>>::from_vec(vec![I::zero()]),
            column_indices: Default::default(),
        }
    }

    /// Allocate a pattern of the given shape, with room for `num_entries`
    /// non-zero entries.
    ///
    /// The arrays are zero filled: the owner is expected to fill them before
    /// using the pattern.
    pub fn with_shape(
        num_rows: usize,
        num_cols: usize,
        num_entries: usize,
    ) -> Result<Self, CsrError> {
        I::try_from_usize(num_cols)?;
        I::try_from_usize(num_entries)?;
        let row_offsets =
            <M::Array<I> as Storage<I>>::try_with_len(offsets_len(num_rows)?)?;
        let column_indices =
            <M::Array<I> as Storage<I>>::try_with_len(num_entries)?;
        Ok(Self {
            num_rows,
            num_cols,
            num_entries,
            row_offsets,
            column_indices,
        })
    }

    /// Create a pattern from its arrays, checking their validity.
    pub fn try_from_parts(
        shape: (usize, usize),
        row_offsets: Vec<I>,
        column_indices: Vec<I>,
    ) -> Result<Self, CsrError> {
        let (num_rows, num_cols) = shape;
        utils::check_structure(
            num_rows,
            num_cols,
            &row_offsets,
            &column_indices,
        )?;
        Ok(Self::new_trusted(
            shape,
            <M::Array<I> as Storage<I>>::from_vec(row_offsets),
            <M::Array<I> as Storage<I>>::from_vec(column_indices),
        ))
    }

    pub(crate) fn new_trusted(
        shape: (usize, usize),
        row_offsets: M::Array<I>,
        column_indices: M::Array<I>,
    ) -> Self {
        debug_assert_eq!(row_offsets.len(), shape.0 + 1);
        Self {
            num_rows: shape.0,
            num_cols: shape.1,
            num_entries: column_indices.len(),
            row_offsets,
            column_indices,
        }
    }

    /// Build an equivalent pattern using another index type or memory space.
    ///
    /// Fails with `CsrError::IndexOverflow` if an offset, a column index or
    /// the shape cannot be represented with `I`.
    #[instrument(
        level = "debug",
        skip_all,
        fields(
            from = ?M2::KIND,
            to = ?M::KIND,
            rows = other.rows(),
            nnz = other.nnz()
        )
    )]
    pub fn try_convert_from<I2, M2>(
        other: &CsrPattern<I2, M2>,
    ) -> Result<Self, CsrError>
    where
        I2: SpIndex,
        M2: MemorySpace,
    {
        I::try_from_usize(other.num_cols)?;
        Ok(Self {
            num_rows: other.num_rows,
            num_cols: other.num_cols,
            num_entries: other.num_entries,
            row_offsets: cast_indices::<I, I2, M>(&other.row_offsets)?,
            column_indices: cast_indices::<I, I2, M>(&other.column_indices)?,
        })
    }

    /// Reallocate the pattern for a new shape and number of entries.
    ///
    /// The previous contents are discarded, both arrays are zero filled.
    /// On failure the pattern is left untouched.
    pub fn resize(
        &mut self,
        num_rows: usize,
        num_cols: usize,
        num_entries: usize,
    ) -> Result<(), CsrError> {
        let mut fresh = Self::with_shape(num_rows, num_cols, num_entries)?;
        self.swap(&mut fresh);
        Ok(())
    }

    /// Exchange the shapes and the arrays of two patterns, without copying
    /// any element.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// The number of rows of this pattern
    pub fn rows(&self) -> usize {
        self.num_rows
    }

    /// The number of columns of this pattern
    pub fn cols(&self) -> usize {
        self.num_cols
    }

    /// The shape of the pattern, as a `(rows, cols)` tuple
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// The number of stored entries
    pub fn nnz(&self) -> usize {
        self.num_entries
    }

    pub fn row_offsets(&self) -> &[I] {
        &self.row_offsets
    }

    pub fn column_indices(&self) -> &[I] {
        &self.column_indices
    }

    /// Mutable access to the row offsets. Their number cannot change, but
    /// keeping them valid is the caller's responsibility.
    pub fn row_offsets_mut(&mut self) -> &mut [I] {
        &mut self.row_offsets
    }

    /// Mutable access to the column indices. Their number cannot change, but
    /// keeping them valid is the caller's responsibility.
    pub fn column_indices_mut(&mut self) -> &mut [I] {
        &mut self.column_indices
    }

    /// Range of the entries of row `row` in the column indices
    ///
    /// # Panics
    ///
    /// If `row >= self.rows()`
    pub fn row_range(&self, row: usize) -> Range<usize> {
        let offsets = self.row_offsets();
        offsets[row].index()..offsets[row + 1].index()
    }

    /// Column indices of the entries of row `row`
    ///
    /// # Panics
    ///
    /// If `row >= self.rows()`
    pub fn row_indices(&self, row: usize) -> &[I] {
        &self.column_indices()[self.row_range(row)]
    }

    /// Position of the entry at `(row, col)` in the column indices, if stored
    pub fn nnz_index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.num_rows || col >= self.num_cols {
            return None;
        }
        let col = I::try_from_usize(col).ok()?;
        let start = self.row_range(row).start;
        self.row_indices(row)
            .binary_search(&col)
            .ok()
            .map(|pos| start + pos)
    }

    /// Verify every invariant of the compressed structure
    pub fn check_structure(&self) -> Result<(), CsrError> {
        if self.column_indices.len() != self.num_entries {
            return Err(CsrError::BadNnzCount);
        }
        utils::check_structure(
            self.num_rows,
            self.num_cols,
            &self.row_offsets,
            &self.column_indices,
        )
    }
}

impl<I: SpIndex, M: MemorySpace> Default for CsrPattern<I, M> {
    fn default() -> Self {
        Self::new()
    }
}
