//! Compute capability markers.
//!
//! Kernels are instantiated for one hardware generation at build time. The
//! generation decides which texture fetches are available: reading 64-bit
//! floats through the texture cache needs compute capability 1.3 or greater.

/// A hardware generation a kernel is built for
pub trait ComputeCapability: Send + Sync + 'static {
    const MAJOR: u32;
    const MINOR: u32;

    /// Whether 64-bit floats can be fetched through the texture cache
    const DOUBLE_TEXTURE_FETCH: bool = Self::MAJOR * 10 + Self::MINOR >= 13;
}

macro_rules! compute_capability {
    ($name:ident, $major:expr, $minor:expr) => {
        #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
        pub struct $name;

        impl ComputeCapability for $name {
            const MAJOR: u32 = $major;
            const MINOR: u32 = $minor;
        }
    };
}

compute_capability!(Sm10, 1, 0);
compute_capability!(Sm11, 1, 1);
compute_capability!(Sm12, 1, 2);
compute_capability!(Sm13, 1, 3);
compute_capability!(Sm20, 2, 0);
