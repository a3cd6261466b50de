//! Utilities for sparse-to-dense conversion

use ndarray::{Array2, ArrayViewMut2};
use num_traits::Zero;

use super::CsrMatrix;
use crate::indexing::SpIndex;
use crate::storage::{Element, MemorySpace};

/// Assign a sparse matrix into a dense matrix
///
/// The dense matrix will not be zeroed prior to assignment,
/// so existing values not corresponding to non-zeroes will be preserved.
///
/// # Panics
///
/// If the shapes of both matrices differ.
pub fn assign_to_dense<N, I, M>(
    mut array: ArrayViewMut2<N>,
    spmat: &CsrMatrix<N, I, M>,
) where
    N: Element,
    I: SpIndex,
    M: MemorySpace,
{
    if spmat.shape() != array.dim() {
        panic!("Dimension mismatch");
    }
    for (row, col, &val) in spmat.iter() {
        array[[row, col]] = val;
    }
}

impl<N, I, M> CsrMatrix<N, I, M>
where
    N: Element + Zero,
    I: SpIndex,
    M: MemorySpace,
{
    /// Create a dense copy of this matrix
    pub fn to_dense(&self) -> Array2<N> {
        let mut res = Array2::zeros(self.shape());
        assign_to_dense(res.view_mut(), self);
        res
    }
}
