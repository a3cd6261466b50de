//! Multiply-accumulate (MAC) trait and implementations
//!
//! Every sparse matrix-vector kernel of this crate, on the host or through
//! the texture cache, reduces a row with this single primitive, so that both
//! paths produce bit identical results.

/// Trait for types that have a multiply-accumulate operation, as required
/// in matrix-vector products.
///
/// This trait is automatically implemented for numeric types that are `Copy`
/// and provide a fused multiply-add.
pub trait MulAcc {
    /// Multiply and accumulate in this variable, formally `*self += a * b`.
    fn mul_acc(&mut self, a: &Self, b: &Self);
}

impl<N> MulAcc for N
where
    N: Copy + num_traits::MulAdd<Output = N>,
{
    fn mul_acc(&mut self, a: &Self, b: &Self) {
        *self = a.mul_add(*b, *self);
    }
}
