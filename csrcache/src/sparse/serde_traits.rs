//! Serialization of sparse structures.
//!
//! Structures serialize as their shape followed by their arrays, whatever
//! their memory space. Deserialization goes through shadow types and
//! re-validates the whole structure, so a malformed input is reported as a
//! deserialization error instead of producing a broken matrix.

use std::convert::TryFrom;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::{CsrMatrix, CsrPattern};
use crate::errors::CsrError;
use crate::indexing::SpIndex;
use crate::storage::{Element, MemorySpace};

#[derive(Serialize)]
#[serde(rename = "CsrPattern")]
struct CsrPatternRef<'a, I> {
    num_rows: usize,
    num_cols: usize,
    row_offsets: &'a [I],
    column_indices: &'a [I],
}

#[derive(Deserialize)]
#[serde(rename = "CsrPattern")]
struct CsrPatternShadow<I> {
    num_rows: usize,
    num_cols: usize,
    row_offsets: Vec<I>,
    column_indices: Vec<I>,
}

#[derive(Serialize)]
#[serde(rename = "CsrMatrix")]
struct CsrMatrixRef<'a, N, I> {
    num_rows: usize,
    num_cols: usize,
    row_offsets: &'a [I],
    column_indices: &'a [I],
    values: &'a [N],
}

#[derive(Deserialize)]
#[serde(rename = "CsrMatrix")]
struct CsrMatrixShadow<N, I> {
    num_rows: usize,
    num_cols: usize,
    row_offsets: Vec<I>,
    column_indices: Vec<I>,
    values: Vec<N>,
}

impl<I: SpIndex, M: MemorySpace> TryFrom<CsrPatternShadow<I>>
    for CsrPattern<I, M>
{
    type Error = CsrError;
    fn try_from(val: CsrPatternShadow<I>) -> Result<Self, Self::Error> {
        let CsrPatternShadow {
            num_rows,
            num_cols,
            row_offsets,
            column_indices,
        } = val;
        Self::try_from_parts((num_rows, num_cols), row_offsets, column_indices)
    }
}

impl<N: Element, I: SpIndex, M: MemorySpace> TryFrom<CsrMatrixShadow<N, I>>
    for CsrMatrix<N, I, M>
{
    type Error = CsrError;
    fn try_from(val: CsrMatrixShadow<N, I>) -> Result<Self, Self::Error> {
        let CsrMatrixShadow {
            num_rows,
            num_cols,
            row_offsets,
            column_indices,
            values,
        } = val;
        Self::try_from_parts(
            (num_rows, num_cols),
            row_offsets,
            column_indices,
            values,
        )
    }
}

impl<I, M> Serialize for CsrPattern<I, M>
where
    I: SpIndex + Serialize,
    M: MemorySpace,
{
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        CsrPatternRef {
            num_rows: self.rows(),
            num_cols: self.cols(),
            row_offsets: self.row_offsets(),
            column_indices: self.column_indices(),
        }
        .serialize(serializer)
    }
}

impl<'de, I, M> Deserialize<'de> for CsrPattern<I, M>
where
    I: SpIndex + Deserialize<'de>,
    M: MemorySpace,
{
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let shadow = CsrPatternShadow::<I>::deserialize(deserializer)?;
        Self::try_from(shadow).map_err(de::Error::custom)
    }
}

impl<N, I, M> Serialize for CsrMatrix<N, I, M>
where
    N: Element + Serialize,
    I: SpIndex + Serialize,
    M: MemorySpace,
{
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        CsrMatrixRef {
            num_rows: self.rows(),
            num_cols: self.cols(),
            row_offsets: self.row_offsets(),
            column_indices: self.column_indices(),
            values: self.values(),
        }
        .serialize(serializer)
    }
}

impl<'de, N, I, M> Deserialize<'de> for CsrMatrix<N, I, M>
where
    N: Element + Deserialize<'de>,
    I: SpIndex + Deserialize<'de>,
    M: MemorySpace,
{
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let shadow = CsrMatrixShadow::<N, I>::deserialize(deserializer)?;
        Self::try_from(shadow).map_err(de::Error::custom)
    }
}
