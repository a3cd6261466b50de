//! Conversion of other matrix representations into CSR.
//!
//! Any matrix type able to enumerate its non-zero entries as `(row, col,
//! value)` triplets, sorted by row and then by column without repetition,
//! can be turned into a [`CsrMatrix`] through [`TripletSource`].

use std::ops::AddAssign;

use ndarray::{ArrayBase, Data, Ix2};
use num_traits::Zero;

use super::CsrMatrix;
use crate::indexing::SpIndex;
use crate::storage::{Element, MemorySpace};

/// A matrix representation exposing its non-zero entries in row-major order.
///
/// Implementors promise that `triplets()` yields exactly `nnz()` entries,
/// inside `shape()`, with strictly increasing `(row, col)` pairs. The CSR
/// constructor reports any breach of that promise as an error.
pub trait TripletSource<N> {
    /// The shape of the matrix, as a `(rows, cols)` tuple
    fn shape(&self) -> (usize, usize);

    /// The number of entries `triplets()` yields
    fn nnz(&self) -> usize;

    /// The entries as `(row, col, value)`, sorted by row then column
    fn triplets<'a>(&'a self) -> impl Iterator<Item = (usize, usize, N)>
    where
        N: 'a;
}

impl<N, S> TripletSource<N> for ArrayBase<S, Ix2>
where
    S: Data<Elem = N>,
    N: Zero + Copy,
{
    fn shape(&self) -> (usize, usize) {
        self.dim()
    }

    fn nnz(&self) -> usize {
        self.iter().filter(|v| !v.is_zero()).count()
    }

    fn triplets<'a>(&'a self) -> impl Iterator<Item = (usize, usize, N)>
    where
        N: 'a,
    {
        self.indexed_iter()
            .filter(|(_, v)| !v.is_zero())
            .map(|((row, col), &v)| (row, col, v))
    }
}

impl<N, I, M> TripletSource<N> for CsrMatrix<N, I, M>
where
    N: Element,
    I: SpIndex,
    M: MemorySpace,
{
    fn shape(&self) -> (usize, usize) {
        CsrMatrix::shape(self)
    }

    fn nnz(&self) -> usize {
        CsrMatrix::nnz(self)
    }

    fn triplets<'a>(&'a self) -> impl Iterator<Item = (usize, usize, N)>
    where
        N: 'a,
    {
        self.iter().map(|(row, col, &v)| (row, col, v))
    }
}

/// A list of triplets, useful to assemble a matrix entry by entry.
///
/// Entries can be added in any order and a location can be repeated. Before
/// converting to CSR, [`sort_and_merge`] orders the entries and sums the
/// repeated ones.
///
/// [`sort_and_merge`]: struct.TripletList.html#method.sort_and_merge
#[derive(Debug, Clone, PartialEq)]
pub struct TripletList<N> {
    rows: usize,
    cols: usize,
    row_inds: Vec<usize>,
    col_inds: Vec<usize>,
    data: Vec<N>,
}

impl<N> TripletList<N> {
    /// Create an empty triplet list for a matrix of the given shape
    pub fn new(shape: (usize, usize)) -> Self {
        Self::with_capacity(shape, 0)
    }

    pub fn with_capacity(shape: (usize, usize), cap: usize) -> Self {
        Self {
            rows: shape.0,
            cols: shape.1,
            row_inds: Vec::with_capacity(cap),
            col_inds: Vec::with_capacity(cap),
            data: Vec::with_capacity(cap),
        }
    }

    /// Append an entry. No check is performed until conversion.
    pub fn add_triplet(&mut self, row: usize, col: usize, val: N) {
        self.row_inds.push(row);
        self.col_inds.push(col);
        self.data.push(val);
    }

    pub fn reserve(&mut self, cap: usize) {
        self.row_inds.reserve(cap);
        self.col_inds.reserve(cap);
        self.data.reserve(cap);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<N: Copy + AddAssign> TripletList<N> {
    /// Sort the entries by row then column, summing entries sharing a
    /// location.
    pub fn sort_and_merge(&mut self) {
        let mut entries: Vec<(usize, usize, N)> = self
            .row_inds
            .iter()
            .zip(self.col_inds.iter())
            .zip(self.data.iter())
            .map(|((&r, &c), &v)| (r, c, v))
            .collect();
        entries.sort_by_key(|&(r, c, _)| (r, c));

        self.row_inds.clear();
        self.col_inds.clear();
        self.data.clear();
        for (r, c, v) in entries {
            let last = self.data.len();
            if last > 0
                && self.row_inds[last - 1] == r
                && self.col_inds[last - 1] == c
            {
                self.data[last - 1] += v;
            } else {
                self.add_triplet(r, c, v);
            }
        }
    }
}

impl<N: Copy> TripletSource<N> for TripletList<N> {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn nnz(&self) -> usize {
        self.data.len()
    }

    fn triplets<'a>(&'a self) -> impl Iterator<Item = (usize, usize, N)>
    where
        N: 'a,
    {
        self.row_inds
            .iter()
            .zip(self.col_inds.iter())
            .zip(self.data.iter())
            .map(|((&r, &c), &v)| (r, c, v))
    }
}
