//! Read-only texture cache channels for the `x` vector of `y = A * x`.
//!
//! In a sparse matrix-vector product, each element of `x` is gathered by
//! many rows with an irregular reuse distance. Routing those reads through
//! the texture cache saves memory traffic, at the price of a bind / unbind
//! protocol around every kernel launch:
//!
//! 1. `bind` the vector on the host, before the launch;
//! 2. read it from the kernel with `fetch::<true, _, _>`;
//! 3. `unbind` it once the launch has completed.
//!
//! `with_binding` runs all three steps around a closure.
//!
//! There is one channel per element width, so only one `f32` vector and one
//! `f64` vector can be bound at a time. Binding another vector of the same
//! width silently replaces the previous binding. Each channel borrows the
//! vector it is bound to, which keeps the vector alive and unmodified for as
//! long as the binding lasts.
//!
//! `f64` values travel through a channel of paired 32-bit lanes and are
//! reassembled on read. This needs a compute capability of at least 1.3;
//! kernels built for older hardware get `f64::INFINITY` from a cached fetch.

use num_traits::Float;
use tracing::{debug, warn};

use super::arch::ComputeCapability;
use crate::errors::CsrError;
use crate::storage::{DevicePtr, Element};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelWidth {
    /// One 32-bit lane per element
    Float32,
    /// Two 32-bit lanes per element
    Float64,
}

/// Element types that can be read through the texture cache
pub trait TexelType: Element + Float {
    const WIDTH: ChannelWidth;

    /// The value a fetch yields when it cannot be serviced
    const INVALID: Self;

    #[doc(hidden)]
    fn channel<'c, 'a>(
        cache: &'c TextureCache<'a>,
    ) -> &'c Option<DevicePtr<'a, Self>>;

    #[doc(hidden)]
    fn channel_mut<'c, 'a>(
        cache: &'c mut TextureCache<'a>,
    ) -> &'c mut Option<DevicePtr<'a, Self>>;

    #[doc(hidden)]
    fn tex1d_fetch<A: ComputeCapability>(
        texture: &DevicePtr<'_, Self>,
        i: usize,
    ) -> Self;
}

impl TexelType for f32 {
    const WIDTH: ChannelWidth = ChannelWidth::Float32;
    const INVALID: Self = f32::INFINITY;

    fn channel<'c, 'a>(
        cache: &'c TextureCache<'a>,
    ) -> &'c Option<DevicePtr<'a, Self>> {
        &cache.tex_x_float
    }

    fn channel_mut<'c, 'a>(
        cache: &'c mut TextureCache<'a>,
    ) -> &'c mut Option<DevicePtr<'a, Self>> {
        &mut cache.tex_x_float
    }

    #[inline(always)]
    fn tex1d_fetch<A: ComputeCapability>(
        texture: &DevicePtr<'_, Self>,
        i: usize,
    ) -> Self {
        let lane: u32 = texture.read(i).to_bits();
        f32::from_bits(lane)
    }
}

impl TexelType for f64 {
    const WIDTH: ChannelWidth = ChannelWidth::Float64;
    const INVALID: Self = f64::INFINITY;

    fn channel<'c, 'a>(
        cache: &'c TextureCache<'a>,
    ) -> &'c Option<DevicePtr<'a, Self>> {
        &cache.tex_x_double
    }

    fn channel_mut<'c, 'a>(
        cache: &'c mut TextureCache<'a>,
    ) -> &'c mut Option<DevicePtr<'a, Self>> {
        &mut cache.tex_x_double
    }

    #[inline(always)]
    fn tex1d_fetch<A: ComputeCapability>(
        texture: &DevicePtr<'_, Self>,
        i: usize,
    ) -> Self {
        if !A::DOUBLE_TEXTURE_FETCH {
            return Self::INVALID;
        }
        let [lo, hi] = int2_texel(texture.read(i));
        hiloint2double(hi, lo)
    }
}

/// Split a double in the two 32-bit lanes of its texel, low word first
#[inline(always)]
fn int2_texel(val: f64) -> [u32; 2] {
    let bits = val.to_bits();
    [bits as u32, (bits >> 32) as u32]
}

#[inline(always)]
fn hiloint2double(hi: u32, lo: u32) -> f64 {
    f64::from_bits((u64::from(hi) << 32) | u64::from(lo))
}

/// The texture channels used to cache the `x` vector of sparse products.
///
/// A cache cannot outlive a vector bound with [`bind`]. To reuse one cache
/// across launches on vectors with different lifetimes, bind through
/// [`with_binding`], as `spmv_csr_scalar` does.
///
/// [`bind`]: struct.TextureCache.html#method.bind
/// [`with_binding`]: struct.TextureCache.html#method.with_binding
///
/// Binding and unbinding take `&mut self` and happen on the host, between
/// kernel launches. Kernels share `&self` and may fetch from any number of
/// threads concurrently.
#[derive(Debug, Default)]
pub struct TextureCache<'a> {
    tex_x_float: Option<DevicePtr<'a, f32>>,
    tex_x_double: Option<DevicePtr<'a, f64>>,
}

impl<'a> TextureCache<'a> {
    /// A cache with every channel unbound
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the vector starting at `x` to the channel of its element width.
    ///
    /// `x` must be the start of a device allocation, or at least be aligned
    /// on `TEXTURE_ALIGNMENT`. A misaligned address is refused with
    /// `CsrError::InvalidAlignment`, and the channel is left unbound.
    pub fn bind<T: TexelType>(
        &mut self,
        x: DevicePtr<'a, T>,
    ) -> Result<(), CsrError> {
        let channel = T::channel_mut(self);
        *channel = None;
        let offset = x.misalignment();
        if offset != 0 {
            warn!(
                width = ?T::WIDTH,
                offset,
                "memory is not aligned, refusing to use texture cache"
            );
            return Err(CsrError::InvalidAlignment { offset });
        }
        *channel = Some(x);
        debug!(width = ?T::WIDTH, len = x.len(), "bound texture channel");
        Ok(())
    }

    /// Release the channel of `x`'s element width.
    ///
    /// `x` only selects the channel: whatever vector is bound to it is
    /// released. Unbinding a free channel does nothing.
    pub fn unbind<T: TexelType>(&mut self, x: &DevicePtr<'_, T>) {
        let channel = T::channel_mut(self);
        if let Some(bound) = channel.take() {
            if !bound.same_address(x) {
                debug!(
                    width = ?T::WIDTH,
                    "released a binding for another vector"
                );
            }
            debug!(width = ?T::WIDTH, "unbound texture channel");
        }
    }

    /// Bind `x` for the duration of `f`, then release its channel.
    ///
    /// The binding lives in a copy of the cache whose borrows end with `f`,
    /// so `x` only has to outlive the call and `self` can go on serving
    /// shorter lived vectors afterwards. The other channel keeps its
    /// binding. The channel of `T` is unbound on return, whether `bind`
    /// failed or not.
    pub fn with_binding<'x, T, R>(
        &mut self,
        x: DevicePtr<'x, T>,
        f: impl FnOnce(&TextureCache<'x>) -> R,
    ) -> Result<R, CsrError>
    where
        'a: 'x,
        T: TexelType,
    {
        let mut scoped: TextureCache<'x> = TextureCache {
            tex_x_float: self.tex_x_float,
            tex_x_double: self.tex_x_double,
        };
        *T::channel_mut(self) = None;
        scoped.bind(x)?;
        let res = f(&scoped);
        scoped.unbind(&x);
        Ok(res)
    }

    /// Whether a vector is bound to the channel of `T`
    pub fn is_bound<T: TexelType>(&self) -> bool {
        T::channel(self).is_some()
    }

    /// Whether `x` is the vector bound to the channel of `T`
    pub fn is_bound_to<T: TexelType>(&self, x: &DevicePtr<'_, T>) -> bool {
        T::channel(self)
            .as_ref()
            .is_some_and(|bound| bound.same_address(x))
    }

    /// Read element `i` of the vector `x`.
    ///
    /// With `USE_CACHE`, the read goes through the channel of `T`, which must
    /// have been bound to `x`. A free channel, or a 64-bit read on hardware
    /// without 64-bit texture fetches, yields `T::INVALID`. Without
    /// `USE_CACHE`, `x[i]` is read directly and the channels are ignored.
    ///
    /// # Panics
    ///
    /// If `i` is past the end of the vector read.
    #[inline(always)]
    pub fn fetch<const USE_CACHE: bool, A, T>(
        &self,
        i: usize,
        x: &DevicePtr<'_, T>,
    ) -> T
    where
        A: ComputeCapability,
        T: TexelType,
    {
        if USE_CACHE {
            match T::channel(self) {
                Some(texture) => T::tex1d_fetch::<A>(texture, i),
                None => T::INVALID,
            }
        } else {
            x.read(i)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{hiloint2double, int2_texel, TextureCache};
    use crate::device::arch::{Sm10, Sm12, Sm13, Sm20};
    use crate::errors::CsrError;
    use crate::storage::DeviceVec;

    #[test]
    fn texel_lanes_are_lossless() {
        let vals = [
            1. / 3.,
            -0.,
            f64::MIN_POSITIVE / 4.,
            f64::MAX,
            -1.5e-300,
            f64::NEG_INFINITY,
        ];
        for v in vals {
            let [lo, hi] = int2_texel(v);
            assert_eq!(hiloint2double(hi, lo).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn cached_fetch_float() {
        let x = DeviceVec::upload(&[1.5f32, -2., 3.25]).unwrap();
        let ptr = x.as_device_ptr();
        let mut cache = TextureCache::new();
        cache.bind(ptr).unwrap();
        assert!(cache.is_bound::<f32>());
        assert!(cache.is_bound_to(&ptr));
        assert!(!cache.is_bound::<f64>());
        for i in 0..3 {
            assert_eq!(cache.fetch::<true, Sm12, f32>(i, &ptr), x[i]);
        }
        cache.unbind(&ptr);
        assert!(!cache.is_bound::<f32>());
    }

    #[test]
    fn cached_fetch_double() {
        let host = [1. / 3., -7.25, 1e-310, f64::MAX];
        let x = DeviceVec::upload(&host).unwrap();
        let ptr = x.as_device_ptr();
        let mut cache = TextureCache::new();
        cache.bind(ptr).unwrap();
        for (i, v) in host.iter().enumerate() {
            let fetched = cache.fetch::<true, Sm13, f64>(i, &ptr);
            assert_eq!(fetched.to_bits(), v.to_bits());
            assert_eq!(cache.fetch::<true, Sm20, f64>(i, &ptr), *v);
        }
    }

    #[test]
    fn double_fetch_unsupported() {
        let x = DeviceVec::upload(&[2f64, 4.]).unwrap();
        let ptr = x.as_device_ptr();
        let mut cache = TextureCache::new();
        cache.bind(ptr).unwrap();
        assert_eq!(cache.fetch::<true, Sm12, f64>(1, &ptr), f64::INFINITY);
        assert_eq!(cache.fetch::<false, Sm12, f64>(1, &ptr), 4.);
    }

    #[test]
    fn misaligned_bind_always_fails() {
        let x = DeviceVec::upload(&[0f32; 128]).unwrap();
        let ptr = x.as_device_ptr();
        let mut cache = TextureCache::new();
        for _ in 0..100 {
            let res = cache.bind(ptr.add(1));
            assert_eq!(res, Err(CsrError::InvalidAlignment { offset: 4 }));
            assert!(!cache.is_bound::<f32>());
        }

        let y = DeviceVec::upload(&[0f64; 64]).unwrap();
        let res = cache.bind(y.as_device_ptr().add(3));
        assert_eq!(res, Err(CsrError::InvalidAlignment { offset: 24 }));
        assert!(!cache.is_bound::<f64>());
    }

    #[test]
    fn misaligned_bind_releases_previous_binding() {
        let x = DeviceVec::upload(&[1f32; 70]).unwrap();
        let ptr = x.as_device_ptr();
        let mut cache = TextureCache::new();
        cache.bind(ptr).unwrap();
        assert!(cache.bind(ptr.add(2)).is_err());
        assert!(!cache.is_bound::<f32>());
        assert_eq!(cache.fetch::<true, Sm20, f32>(0, &ptr), f32::INFINITY);
    }

    #[test]
    fn aligned_sub_range_binds() {
        let xs: Vec<f32> = (0..128).map(|i| i as f32).collect();
        let x = DeviceVec::upload(&xs).unwrap();
        let half = x.as_device_ptr().add(64);
        let mut cache = TextureCache::new();
        cache.bind(half).unwrap();
        assert_eq!(cache.fetch::<true, Sm10, f32>(0, &half), 64.);
    }

    #[test]
    fn uncached_fetch_ignores_bindings() {
        let x = DeviceVec::upload(&[1f32, 2., 3.]).unwrap();
        let other = DeviceVec::upload(&[10f32, 20., 30.]).unwrap();
        let ptr = x.as_device_ptr();
        let mut cache = TextureCache::new();
        let direct = |cache: &TextureCache| {
            (0..3)
                .map(|i| cache.fetch::<false, Sm13, f32>(i, &ptr))
                .collect::<Vec<_>>()
        };
        assert_eq!(direct(&cache), vec![1., 2., 3.]);
        cache.bind(other.as_device_ptr()).unwrap();
        assert_eq!(direct(&cache), vec![1., 2., 3.]);
        cache.unbind(&ptr);
        assert_eq!(direct(&cache), vec![1., 2., 3.]);
        let _ = cache.bind(ptr.add(1));
        assert_eq!(direct(&cache), vec![1., 2., 3.]);
    }

    #[test]
    fn scoped_binding_outlived_by_cache() {
        let kept = DeviceVec::upload(&[9f64; 4]).unwrap();
        let kept_ptr = kept.as_device_ptr();
        let mut cache = TextureCache::new();
        cache.bind(kept_ptr).unwrap();
        for round in 0..3 {
            let x = DeviceVec::upload(&[round as f32; 8]).unwrap();
            let ptr = x.as_device_ptr();
            let read = cache
                .with_binding(ptr, |tex| {
                    assert!(tex.is_bound_to(&ptr));
                    assert!(tex.is_bound_to(&kept_ptr));
                    tex.fetch::<true, Sm20, f32>(7, &ptr)
                })
                .unwrap();
            assert_eq!(read, round as f32);
            assert!(!cache.is_bound::<f32>());
            assert!(cache.is_bound_to(&kept_ptr));
        }
    }

    #[test]
    fn scoped_binding_misaligned() {
        let x = DeviceVec::upload(&[1f32; 16]).unwrap();
        let ptr = x.as_device_ptr();
        let mut cache = TextureCache::new();
        cache.bind(ptr).unwrap();
        let res: Result<(), _> =
            cache.with_binding(ptr.add(1), |_| unreachable!());
        assert_eq!(res, Err(CsrError::InvalidAlignment { offset: 4 }));
        assert!(!cache.is_bound::<f32>());
    }

    #[test]
    fn one_vector_per_width() {
        let a = DeviceVec::upload(&[1f32, 2.]).unwrap();
        let b = DeviceVec::upload(&[5f32, 6.]).unwrap();
        let c = DeviceVec::upload(&[7f64, 8.]).unwrap();
        let (pa, pb, pc) =
            (a.as_device_ptr(), b.as_device_ptr(), c.as_device_ptr());
        let mut cache = TextureCache::new();
        cache.bind(pa).unwrap();
        cache.bind(pc).unwrap();
        assert!(cache.is_bound_to(&pa));
        assert!(cache.is_bound_to(&pc));

        // a second float binding replaces the first one, and reads alias
        cache.bind(pb).unwrap();
        assert!(!cache.is_bound_to(&pa));
        assert_eq!(cache.fetch::<true, Sm13, f32>(1, &pa), 6.);
        assert_eq!(cache.fetch::<true, Sm13, f64>(1, &pc), 8.);

        cache.unbind(&pb);
        cache.unbind(&pb);
        assert!(!cache.is_bound::<f32>());
        assert!(cache.is_bound::<f64>());
    }
}
