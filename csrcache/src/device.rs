//! Accelerator side of the crate: hardware generations, the texture cache
//! used to gather the `x` vector of sparse products, and the kernels
//! reading through it.

pub mod arch;
pub mod spmv;
pub mod texture;

pub use self::arch::{ComputeCapability, Sm10, Sm11, Sm12, Sm13, Sm20};
pub use self::spmv::spmv_csr_scalar;
pub use self::texture::{ChannelWidth, TexelType, TextureCache};
