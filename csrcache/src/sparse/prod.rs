//! Sparse matrix-dense vector product executed on the host

#[cfg(feature = "multi_thread")]
use rayon::prelude::*;
use tracing::instrument;

use super::CsrMatrix;
use crate::indexing::SpIndex;
use crate::mul_acc::MulAcc;
use crate::storage::{Element, MemorySpace};

/// Multiply a sparse CSR matrix with a dense vector and accumulate the result
/// into another dense vector, `res_vec += mat * in_vec`.
///
/// Rows are processed in parallel when the `multi_thread` feature is enabled.
///
/// # Panics
///
/// If the dimensions of the vectors do not match the matrix.
#[instrument(
    level = "debug",
    skip_all,
    fields(rows = mat.rows(), nnz = mat.nnz())
)]
pub fn mul_acc_mat_vec_csr<N, I, M>(
    mat: &CsrMatrix<N, I, M>,
    in_vec: &[N],
    res_vec: &mut [N],
) where
    N: Element + MulAcc,
    I: SpIndex,
    M: MemorySpace,
{
    if mat.cols() != in_vec.len() || mat.rows() != res_vec.len() {
        panic!("Dimension mismatch");
    }

    let row_kernel = |(row, acc): (usize, &mut N)| {
        let (indices, values) = mat.row(row);
        for (col, val) in indices.iter().zip(values.iter()) {
            acc.mul_acc(val, &in_vec[col.index()]);
        }
    };

    #[cfg(feature = "multi_thread")]
    res_vec.par_iter_mut().enumerate().for_each(row_kernel);
    #[cfg(not(feature = "multi_thread"))]
    res_vec.iter_mut().enumerate().for_each(row_kernel);
}

impl<N, I, M> CsrMatrix<N, I, M>
where
    N: Element + MulAcc,
    I: SpIndex,
    M: MemorySpace,
{
    /// Compute `self * x` into a new vector
    ///
    /// # Panics
    ///
    /// If `x.len() != self.cols()`.
    pub fn mul_vec(&self, x: &[N]) -> Vec<N> {
        let mut res = vec![N::default(); self.rows()];
        self.mul_acc_vec(x, &mut res);
        res
    }

    /// Accumulate `self * x` into `y`
    ///
    /// # Panics
    ///
    /// If the dimensions of the vectors do not match the matrix.
    pub fn mul_acc_vec(&self, x: &[N], y: &mut [N]) {
        mul_acc_mat_vec_csr(self, x, y);
    }
}

#[cfg(test)]
mod test {
    use super::mul_acc_mat_vec_csr;
    use crate::test_data::{mat_4x3, mat_5x5};

    #[test]
    fn mul_vec_4x3() {
        let a = mat_4x3();
        let y = a.mul_vec(&[1., 2., 3.]);
        assert_eq!(y, vec![70., 0., 90., 320.]);
    }

    #[test]
    fn mul_acc_accumulates() {
        let a = mat_5x5();
        let x = [1., 1., 1., 1., 1.];
        let mut y = [1.; 5];
        mul_acc_mat_vec_csr(&a, &x, &mut y);
        assert_eq!(y, [8., 8., 6., 9., 8.]);
        a.mul_acc_vec(&x, &mut y);
        assert_eq!(y, [15., 15., 11., 17., 15.]);
    }

    #[test]
    #[should_panic]
    fn dimension_mismatch() {
        let a = mat_4x3();
        let mut y = [0.; 4];
        mul_acc_mat_vec_csr(&a, &[1., 2.], &mut y);
    }
}
