/*!
# csrcache

csrcache provides sparse matrices in the Compressed Sparse Row format, living
either in host memory or in accelerator memory, and a sparse matrix-vector
product whose gathers can be routed through a texture cache.

The main types are [`CsrPattern`], the structure of a sparse matrix, and
[`CsrMatrix`], a pattern with values. Both are generic over their index type
and their memory space, and can be converted between any of those with
checked conversions.

## Examples

Matrix construction from a dense matrix

```rust
use csrcache::CsrMatrix;
use ndarray::arr2;

let dense = arr2(&[
    [10., 0., 20.],
    [0., 0., 0.],
    [0., 0., 30.],
    [40., 50., 60.],
]);
let a = CsrMatrix::<f64, u32>::try_from_triplets(&dense).unwrap();
assert_eq!(a.row_offsets(), &[0, 2, 2, 3, 6]);
assert_eq!(a.column_indices(), &[0, 2, 2, 0, 1, 2]);
assert_eq!(a.to_dense(), dense);
```

Conversion to other index and value types, and to the device

```rust
use csrcache::{CsrError, CsrMatrix, DeviceCsrMatrix};

let a = CsrMatrix::<f64>::try_from_parts(
    (2, 300),
    vec![0, 1, 2],
    vec![0, 299],
    vec![1.5, 1e300],
)
.unwrap();
let d = DeviceCsrMatrix::<f64, u16>::try_convert_from(&a).unwrap();
assert_eq!(d.column_indices(), &[0, 299]);

// 299 does not fit in an i8, and 1e300 does not fit in an f32
assert_eq!(
    CsrMatrix::<f64, i8>::try_convert_from(&a),
    Err(CsrError::IndexOverflow)
);
assert_eq!(
    CsrMatrix::<f32>::try_convert_from(&a),
    Err(CsrError::ValueOverflow)
);
```

Matrix vector multiplication through the texture cache

```rust
use csrcache::{CsrMatrix, DeviceCsrMatrix, DeviceVec, Sm20, TextureCache};
use csrcache::device::spmv_csr_scalar;

let a = CsrMatrix::<f64>::try_from_parts(
    (3, 3),
    vec![0, 1, 2, 3],
    vec![0, 1, 2],
    vec![1., 2., 3.],
)
.unwrap();
let d: DeviceCsrMatrix<f64> = a.transfer().unwrap();
let x = DeviceVec::upload(&[1., 1., 1.]).unwrap();
let mut y = DeviceVec::upload(&[0.; 3]).unwrap();
let mut cache = TextureCache::new();
spmv_csr_scalar::<true, Sm20, _, _>(&d, &x, &mut y, &mut cache).unwrap();
assert_eq!(y.download(), a.mul_vec(&[1., 1., 1.]));
```

## Features

- `multi_thread` (default): rows of matrix-vector products are processed in
  parallel with rayon.
- `serde`: serialization of matrices and patterns, with validation of the
  structure on deserialization.

*/

pub mod device;
pub mod errors;
pub mod indexing;
pub mod mul_acc;
pub mod sparse;
pub mod storage;

pub use crate::device::{
    ComputeCapability, Sm10, Sm11, Sm12, Sm13, Sm20, TextureCache,
};
pub use crate::errors::CsrError;
pub use crate::indexing::SpIndex;
pub use crate::sparse::prod::mul_acc_mat_vec_csr;
pub use crate::sparse::to_dense::assign_to_dense;
pub use crate::sparse::triplets::{TripletList, TripletSource};
pub use crate::sparse::{
    CsrMatrix, CsrPattern, DeviceCsrMatrix, DeviceCsrPattern,
};
pub use crate::storage::{
    Device, DevicePtr, DeviceVec, Host, MemorySpace, Storage, TEXTURE_ALIGNMENT,
};

#[cfg(test)]
mod test_data;
