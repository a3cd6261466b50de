//! Construction, conversion, assignment and accessors of CSR matrices

use num_traits::{NumCast, ToPrimitive};
use tracing::instrument;

use super::triplets::TripletSource;
use super::{CsrMatrix, CsrPattern};
use crate::errors::CsrError;
use crate::indexing::SpIndex;
use crate::storage::{Element, MemorySpace, Storage};

/// Convert a value to another numeric representation.
///
/// The conversion fails if `NumCast` refuses it, or if a finite value would
/// saturate to an infinity, as happens when narrowing `f64` to `f32`.
pub(crate) fn cast_value<N, N2>(val: N2) -> Result<N, CsrError>
where
    N: NumCast,
    N2: ToPrimitive + Copy,
{
    let res = <N as NumCast>::from(val).ok_or(CsrError::ValueOverflow)?;
    let finite_before = val.to_f64().map_or(true, f64::is_finite);
    let finite_after = res.to_f64().map_or(true, f64::is_finite);
    if finite_before && !finite_after {
        return Err(CsrError::ValueOverflow);
    }
    Ok(res)
}

fn cast_values<N, N2, M>(src: &[N2]) -> Result<M::Array<N>, CsrError>
where
    N: Element + NumCast,
    N2: Element + ToPrimitive,
    M: MemorySpace,
{
    let mut dst = <M::Array<N> as Storage<N>>::try_with_len(src.len())?;
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = cast_value(s)?;
    }
    Ok(dst)
}

fn copy_into<T: Element, M: MemorySpace>(
    src: &[T],
) -> Result<M::Array<T>, CsrError> {
    let mut dst = <M::Array<T> as Storage<T>>::try_with_len(src.len())?;
    dst.copy_from_slice(src);
    Ok(dst)
}

impl<N: Element, I: SpIndex, M: MemorySpace> CsrMatrix<N, I, M> {
    /// An empty matrix, of shape `(0, 0)`
    pub fn new() -> Self {
        Self {
            pattern: CsrPattern::new(),
            values: Default::default(),
        }
    }

    /// Allocate a matrix of the given shape, with room for `num_entries`
    /// non-zero entries.
    ///
    /// The arrays are filled with default values: the owner is expected to
    /// fill them before using the matrix.
    pub fn with_shape(
        num_rows: usize,
        num_cols: usize,
        num_entries: usize,
    ) -> Result<Self, CsrError> {
        let pattern = CsrPattern::with_shape(num_rows, num_cols, num_entries)?;
        let values = <M::Array<N> as Storage<N>>::try_with_len(num_entries)?;
        Ok(Self { pattern, values })
    }

    /// Create a matrix from its arrays, checking their validity.
    pub fn try_from_parts(
        shape: (usize, usize),
        row_offsets: Vec<I>,
        column_indices: Vec<I>,
        values: Vec<N>,
    ) -> Result<Self, CsrError> {
        if values.len() != column_indices.len() {
            return Err(CsrError::DataIndicesMismatch);
        }
        let pattern =
            CsrPattern::try_from_parts(shape, row_offsets, column_indices)?;
        Ok(Self {
            pattern,
            values: <M::Array<N> as Storage<N>>::from_vec(values),
        })
    }

    /// Deep copy of a matrix using other index and value types, or another
    /// memory space.
    ///
    /// Every index and value is converted individually. If one of them does
    /// not fit, `CsrError::IndexOverflow` or `CsrError::ValueOverflow` is
    /// returned and nothing is built.
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
    pub fn try_convert_from<N2, I2, M2>(
        other: &CsrMatrix<N2, I2, M2>,
    ) -> Result<Self, CsrError>
    where
        N: NumCast,
        N2: Element + ToPrimitive,
        I2: SpIndex,
        M2: MemorySpace,
    {
        let pattern = CsrPattern::try_convert_from(&other.pattern)?;
        let values = cast_values::<N, N2, M>(&other.values)?;
        Ok(Self { pattern, values })
    }

    /// Copy this matrix to another memory space, keeping its representation.
    ///
    /// Unlike `try_convert_from`, this works for any element type, including
    /// those without a `NumCast` conversion.
    #[instrument(
        level = "debug",
        skip_all,
        fields(from = ?M::KIND, to = ?M2::KIND, nnz = self.nnz())
    )]
    pub fn transfer<M2: MemorySpace>(
        &self,
    ) -> Result<CsrMatrix<N, I, M2>, CsrError> {
        let pattern = CsrPattern::new_trusted(
            self.shape(),
            copy_into::<I, M2>(self.row_offsets())?,
            copy_into::<I, M2>(self.column_indices())?,
        );
        let values = copy_into::<N, M2>(self.values())?;
        Ok(CsrMatrix { pattern, values })
    }

    /// Build a matrix from any source able to enumerate its non-zero entries
    /// sorted by row, then by column.
    ///
    /// The source contract is verified while consuming it: an unsorted or
    /// duplicated location yields `CsrError::NonSortedIndices`, a location out
    /// of the announced shape yields `CsrError::OutOfBoundsIndex`, and a
    /// number of entries different from `source.nnz()` yields
    /// `CsrError::BadNnzCount`.
    #[instrument(
        level = "debug",
        skip_all,
        fields(shape = ?source.shape(), nnz = source.nnz())
    )]
    pub fn try_from_triplets<S>(source: &S) -> Result<Self, CsrError>
    where
        S: TripletSource<N> + ?Sized,
    {
        let (num_rows, num_cols) = source.shape();
        let nnz = source.nnz();
        let mut mat = Self::with_shape(num_rows, num_cols, nnz)?;
        let mut count = 0;
        let mut prev: Option<(usize, usize)> = None;
        {
            let (offsets, indices, values) = mat.parts_mut();
            for (row, col, val) in source.triplets() {
                if row >= num_rows || col >= num_cols {
                    return Err(CsrError::OutOfBoundsIndex);
                }
                if count >= nnz {
                    return Err(CsrError::BadNnzCount);
                }
                if let Some(prev) = prev {
                    if (row, col) <= prev {
                        return Err(CsrError::NonSortedIndices);
                    }
                }
                offsets[row + 1] += I::one();
                indices[count] = I::from_usize(col);
                values[count] = val;
                count += 1;
                prev = Some((row, col));
            }
            if count != nnz {
                return Err(CsrError::BadNnzCount);
            }
            for row in 0..num_rows {
                let prev_offset = offsets[row];
                offsets[row + 1] += prev_offset;
            }
        }
        debug_assert!(mat.check_structure().is_ok());
        Ok(mat)
    }

    /// Reallocate the matrix for a new shape and number of entries.
    ///
    /// The previous contents are discarded. On failure the matrix is left
    /// untouched.
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

    /// Exchange the contents of two matrices, without copying any element.
    pub fn swap(&mut self, other: &mut Self) {
        self.pattern.swap(&mut other.pattern);
        std::mem::swap(&mut self.values, &mut other.values);
    }

    /// Replace this matrix by a converted copy of `other`.
    ///
    /// The copy is built aside and only swapped in once complete, so on error
    /// `self` is unchanged.
    pub fn assign<N2, I2, M2>(
        &mut self,
        other: &CsrMatrix<N2, I2, M2>,
    ) -> Result<(), CsrError>
    where
        N: NumCast,
        N2: Element + ToPrimitive,
        I2: SpIndex,
        M2: MemorySpace,
    {
        let mut tmp = Self::try_convert_from(other)?;
        self.swap(&mut tmp);
        Ok(())
    }

    /// Replace this matrix by the entries of `source`.
    ///
    /// The matrix is built aside and only swapped in once complete, so on
    /// error `self` is unchanged.
    pub fn assign_from_triplets<S>(
        &mut self,
        source: &S,
    ) -> Result<(), CsrError>
    where
        S: TripletSource<N> + ?Sized,
    {
        let mut tmp = Self::try_from_triplets(source)?;
        self.swap(&mut tmp);
        Ok(())
    }

    /// The structure of this matrix
    pub fn pattern(&self) -> &CsrPattern<I, M> {
        &self.pattern
    }

    /// Split the matrix into its structure and values
    pub fn into_parts(self) -> (CsrPattern<I, M>, M::Array<N>) {
        (self.pattern, self.values)
    }

    pub fn rows(&self) -> usize {
        self.pattern.rows()
    }

    pub fn cols(&self) -> usize {
        self.pattern.cols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.pattern.shape()
    }

    pub fn nnz(&self) -> usize {
        self.pattern.nnz()
    }

    pub fn row_offsets(&self) -> &[I] {
        self.pattern.row_offsets()
    }

    pub fn column_indices(&self) -> &[I] {
        self.pattern.column_indices()
    }

    pub fn values(&self) -> &[N] {
        &self.values
    }

    pub fn row_offsets_mut(&mut self) -> &mut [I] {
        self.pattern.row_offsets_mut()
    }

    pub fn column_indices_mut(&mut self) -> &mut [I] {
        self.pattern.column_indices_mut()
    }

    pub fn values_mut(&mut self) -> &mut [N] {
        &mut self.values
    }

    /// Mutable access to the three arrays at once
    pub fn parts_mut(&mut self) -> (&mut [I], &mut [I], &mut [N]) {
        let CsrPattern {
            row_offsets,
            column_indices,
            ..
        } = &mut self.pattern;
        (&mut **row_offsets, &mut **column_indices, &mut *self.values)
    }

    /// Column indices and values of row `row`
    ///
    /// # Panics
    ///
    /// If `row >= self.rows()`
    pub fn row(&self, row: usize) -> (&[I], &[N]) {
        let range = self.pattern.row_range(row);
        (&self.column_indices()[range.clone()], &self.values()[range])
    }

    /// Access the value at `(row, col)`, if it is stored
    pub fn get(&self, row: usize, col: usize) -> Option<&N> {
        self.pattern.nnz_index(row, col).map(|k| &self.values()[k])
    }

    /// Iterate over the stored entries as `(row, col, &value)`, in row then
    /// column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &N)> + '_ {
        (0..self.rows()).flat_map(move |row| {
            let (indices, values) = self.row(row);
            indices
                .iter()
                .zip(values.iter())
                .map(move |(col, val)| (row, col.index(), val))
        })
    }

    /// Verify every invariant of the compressed structure, including the
    /// length of the values
    pub fn check_structure(&self) -> Result<(), CsrError> {
        if self.values.len() != self.pattern.column_indices().len() {
            return Err(CsrError::DataIndicesMismatch);
        }
        self.pattern.check_structure()
    }
}

impl<N: Element, I: SpIndex, M: MemorySpace> Default for CsrMatrix<N, I, M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::cast_value;
    use crate::errors::CsrError;
    use crate::storage::{Device, Host, MemorySpace, SpaceKind};
    use crate::test_data::{mat_4x3, mat_5x5};
    use crate::{CsrMatrix, DeviceCsrMatrix, TripletList};

    fn space_of<M: MemorySpace>(_: &CsrMatrix<f64, usize, M>) -> SpaceKind {
        M::KIND
    }

    #[test]
    fn empty_matrix() {
        let m: CsrMatrix<f64> = CsrMatrix::new();
        assert_eq!(m.shape(), (0, 0));
        assert_eq!(m.row_offsets(), &[0]);
        assert!(m.column_indices().is_empty());
        assert!(m.values().is_empty());
        assert!(m.check_structure().is_ok());
        assert_eq!(m, CsrMatrix::default());
    }

    #[test]
    fn fill_4x3_by_hand() {
        let mut a = CsrMatrix::<f32, i32>::with_shape(4, 3, 6).unwrap();
        assert_eq!(a.values().len(), 6);
        {
            let (offsets, indices, values) = a.parts_mut();
            offsets.copy_from_slice(&[0, 2, 2, 3, 6]);
            indices.copy_from_slice(&[0, 2, 2, 0, 1, 2]);
            values.copy_from_slice(&[10., 20., 30., 40., 50., 60.]);
        }
        assert!(a.check_structure().is_ok());
        assert_eq!(a, mat_4x3());
        assert_eq!(a.get(0, 2), Some(&20.));
        assert_eq!(a.get(1, 0), None);
        assert_eq!(a.row(3), (&[0, 1, 2][..], &[40., 50., 60.][..]));
    }

    #[test]
    fn try_from_parts_failures() {
        let res = CsrMatrix::<f64, usize>::try_from_parts(
            (2, 2),
            vec![0, 1, 2],
            vec![0, 1],
            vec![1.],
        );
        assert_eq!(res, Err(CsrError::DataIndicesMismatch));
        let res = CsrMatrix::<f64, usize>::try_from_parts(
            (2, 2),
            vec![0, 2, 2],
            vec![1, 0],
            vec![1., 2.],
        );
        assert_eq!(res, Err(CsrError::NonSortedIndices));
    }

    #[test]
    fn iterate_entries() {
        let a = mat_4x3();
        let entries: Vec<_> = a.iter().map(|(r, c, &v)| (r, c, v)).collect();
        assert_eq!(
            entries,
            vec![
                (0, 0, 10.),
                (0, 2, 20.),
                (2, 2, 30.),
                (3, 0, 40.),
                (3, 1, 50.),
                (3, 2, 60.)
            ]
        );
    }

    #[test]
    fn convert_round_trip() {
        let a = mat_4x3();
        let b = CsrMatrix::<f64, u64, Device>::try_convert_from(&a).unwrap();
        assert!(b.check_structure().is_ok());
        assert_eq!(b.values(), &[10., 20., 30., 40., 50., 60.]);
        let c = CsrMatrix::<f32, i32, Host>::try_convert_from(&b).unwrap();
        assert_eq!(c.row_offsets(), a.row_offsets());
        assert_eq!(c.column_indices(), a.column_indices());
        assert_eq!(c.values(), a.values());
    }

    #[test]
    fn convert_value_overflow() {
        let a = CsrMatrix::<f64, usize>::try_from_parts(
            (1, 2),
            vec![0, 2],
            vec![0, 1],
            vec![1., 1e300],
        )
        .unwrap();
        let res = CsrMatrix::<f32, usize>::try_convert_from(&a);
        assert_eq!(res, Err(CsrError::ValueOverflow));

        let a = CsrMatrix::<i32, usize>::try_from_parts(
            (1, 2),
            vec![0, 2],
            vec![0, 1],
            vec![3, 300],
        )
        .unwrap();
        let res = CsrMatrix::<u8, usize>::try_convert_from(&a);
        assert_eq!(res, Err(CsrError::ValueOverflow));
        let res = CsrMatrix::<i16, u8>::try_convert_from(&a).unwrap();
        assert_eq!(res.values(), &[3, 300]);
    }

    #[test]
    fn cast_value_edge_cases() {
        assert_eq!(cast_value::<f32, f64>(f64::INFINITY), Ok(f32::INFINITY));
        assert_eq!(cast_value::<f32, f64>(0.5), Ok(0.5));
        assert_eq!(cast_value::<u32, i64>(-1), Err(CsrError::ValueOverflow));
        assert!(cast_value::<f32, f64>(f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn transfer_between_spaces() {
        let a = mat_5x5();
        let d: DeviceCsrMatrix<f64> = a.transfer().unwrap();
        assert_eq!(d.values(), a.values());
        let back: CsrMatrix<f64> = d.transfer().unwrap();
        assert_eq!(back, a);
        assert_eq!(space_of(&a), SpaceKind::Host);
        assert_eq!(space_of(&d), SpaceKind::Device);
    }

    #[test]
    fn from_triplets() {
        let mut triplets = TripletList::new((4, 3));
        triplets.add_triplet(0, 0, 10.);
        triplets.add_triplet(0, 2, 20.);
        triplets.add_triplet(2, 2, 30.);
        triplets.add_triplet(3, 0, 40.);
        triplets.add_triplet(3, 1, 50.);
        triplets.add_triplet(3, 2, 60.);
        let a = CsrMatrix::<f32, i32>::try_from_triplets(&triplets).unwrap();
        assert_eq!(a, mat_4x3());
    }

    #[test]
    fn from_triplets_contract_violations() {
        let mut unsorted = TripletList::new((2, 2));
        unsorted.add_triplet(1, 0, 1.);
        unsorted.add_triplet(0, 1, 1.);
        let res = CsrMatrix::<f64>::try_from_triplets(&unsorted);
        assert_eq!(res, Err(CsrError::NonSortedIndices));

        let mut duplicated = TripletList::new((2, 2));
        duplicated.add_triplet(0, 1, 1.);
        duplicated.add_triplet(0, 1, 1.);
        let res = CsrMatrix::<f64>::try_from_triplets(&duplicated);
        assert_eq!(res, Err(CsrError::NonSortedIndices));

        let mut out_of_bounds = TripletList::new((2, 2));
        out_of_bounds.add_triplet(0, 2, 1.);
        let res = CsrMatrix::<f64>::try_from_triplets(&out_of_bounds);
        assert_eq!(res, Err(CsrError::OutOfBoundsIndex));
    }

    #[test]
    fn resize_to_empty() {
        let mut a = mat_5x5();
        a.resize(0, 0, 0).unwrap();
        assert_eq!(a.row_offsets(), &[0]);
        assert!(a.column_indices().is_empty());
        assert!(a.values().is_empty());
        assert!(a.check_structure().is_ok());
    }

    #[test]
    fn resize_lengths() {
        let mut a = mat_5x5();
        a.resize(3, 8, 11).unwrap();
        assert_eq!(a.shape(), (3, 8));
        assert_eq!(a.row_offsets().len(), 4);
        assert_eq!(a.column_indices().len(), 11);
        assert_eq!(a.values().len(), 11);
        assert_eq!(a.nnz(), 11);
    }

    #[test]
    fn swap_twice_restores() {
        let mut a = mat_4x3();
        let mut b = CsrMatrix::<f32, i32>::with_shape(2, 2, 1).unwrap();
        let b_orig = b.clone();
        let a_values = a.values().as_ptr();
        let b_values = b.values().as_ptr();

        a.swap(&mut b);
        assert_eq!(a, b_orig);
        assert_eq!(b, mat_4x3());
        assert_eq!(b.values().as_ptr(), a_values);
        assert_eq!(a.values().as_ptr(), b_values);

        a.swap(&mut b);
        assert_eq!(a, mat_4x3());
        assert_eq!(b, b_orig);
        assert_eq!(a.values().as_ptr(), a_values);
    }

    #[test]
    fn assign_other_representation() {
        let mut a = CsrMatrix::<f64, i64>::new();
        a.assign(&mat_4x3()).unwrap();
        assert!(a.check_structure().is_ok());
        assert_eq!(a.row_offsets(), &[0, 2, 2, 3, 6]);
        assert_eq!(a.values(), &[10., 20., 30., 40., 50., 60.]);

        let copy = a.clone();
        a.assign(&copy).unwrap();
        assert_eq!(a, copy);
    }

    #[test]
    fn failed_assign_keeps_matrix() {
        let mut a = CsrMatrix::<u8, u8>::try_convert_from(&mat_4x3()).unwrap();
        let before = a.clone();
        let big = CsrMatrix::<i32, usize>::try_from_parts(
            (1, 1),
            vec![0, 1],
            vec![0],
            vec![1000],
        )
        .unwrap();
        assert_eq!(a.assign(&big), Err(CsrError::ValueOverflow));
        assert_eq!(a, before);
    }

    #[test]
    fn assign_from_triplets() {
        let mut a = mat_5x5();
        let mut t = TripletList::new((1, 3));
        t.add_triplet(0, 1, 2.);
        a.assign_from_triplets(&t).unwrap();
        assert_eq!(a.shape(), (1, 3));
        assert_eq!(a.row_offsets(), &[0, 1]);
        assert_eq!(a.values(), &[2.]);
    }
}
