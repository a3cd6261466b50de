//! Some matrices used in tests

use crate::CsrMatrix;

/// The 4 by 3 matrix
///
/// ```text
/// [10  0 20]
/// [ 0  0  0]
/// [ 0  0 30]
/// [40 50 60]
/// ```
pub fn mat_4x3() -> CsrMatrix<f32, i32> {
    let row_offsets = vec![0, 2, 2, 3, 6];
    let column_indices = vec![0, 2, 2, 0, 1, 2];
    let values = vec![10., 20., 30., 40., 50., 60.];
    CsrMatrix::try_from_parts((4, 3), row_offsets, column_indices, values)
        .unwrap()
}

pub fn mat_5x5() -> CsrMatrix<f64> {
    let row_offsets = vec![0, 2, 4, 5, 6, 7];
    let column_indices = vec![2, 3, 3, 4, 2, 1, 3];
    let values = vec![3., 4., 2., 5., 5., 8., 7.];
    CsrMatrix::try_from_parts((5, 5), row_offsets, column_indices, values)
        .unwrap()
}
