//! Backing arrays for sparse structures, and the memory spaces they live in.
//!
//! A sparse matrix never talks to an allocator directly: it is parameterized
//! by a [`MemorySpace`] tag, which names the array type used for every
//! contiguous buffer of the matrix. Two spaces are available, [`Host`] whose
//! arrays are plain `Vec`s, and [`Device`] whose arrays are [`DeviceVec`]s,
//! modelling accelerator memory with the alignment guarantees of a device
//! allocator.
//!
//! Every array type implements [`Storage`], which is the only capability the
//! sparse containers rely on: length, fallible allocation, fallible
//! reallocation, indexed access through slice deref, and O(1) ownership
//! transfer through `std::mem::swap`.

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

use crate::errors::CsrError;

pub mod device;

pub use self::device::{DevicePtr, DeviceVec, TEXTURE_ALIGNMENT};

/// Types that can be stored in a sparse container's arrays
pub trait Element:
    Copy + Default + Debug + PartialEq + Send + Sync + 'static
{
}

impl<T> Element for T where
    T: Copy + Default + Debug + PartialEq + Send + Sync + 'static
{
}

/// The capability a contiguous array must offer to back a sparse structure.
pub trait Storage<T: Element>:
    Deref<Target = [T]>
    + DerefMut
    + Default
    + Clone
    + Debug
    + PartialEq
    + Send
    + Sync
{
    /// Allocate an array of `len` default-valued elements.
    fn try_with_len(len: usize) -> Result<Self, CsrError>;

    /// Reallocate to hold `len` elements.
    ///
    /// This is not a content preserving resize: every element is reset to its
    /// default value. On failure the array is left untouched.
    fn try_resize(&mut self, len: usize) -> Result<(), CsrError> {
        let mut fresh = Self::try_with_len(len)?;
        std::mem::swap(self, &mut fresh);
        Ok(())
    }

    /// Take ownership of a host vector, transferring it to this space.
    fn from_vec(vec: Vec<T>) -> Self;
}

/// Allocate `len` default elements, reporting allocator refusal as an error
/// instead of aborting.
pub(crate) fn try_alloc<T: Element>(len: usize) -> Result<Vec<T>, CsrError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len)
        .map_err(|_| CsrError::AllocationFailed { requested: len })?;
    vec.resize(len, T::default());
    Ok(vec)
}

impl<T: Element> Storage<T> for Vec<T> {
    fn try_with_len(len: usize) -> Result<Self, CsrError> {
        try_alloc(len)
    }

    fn from_vec(vec: Vec<T>) -> Self {
        vec
    }
}

/// Where a memory space lives, reported in conversion logs
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpaceKind {
    Host,
    Device,
}

/// A tag selecting where the arrays of a sparse container are allocated.
pub trait MemorySpace:
    Debug + Copy + Default + PartialEq + Eq + Send + Sync + 'static
{
    /// The array type used for elements of type `T` in this space
    type Array<T: Element>: Storage<T>;

    /// The kind of memory this tag stands for
    const KIND: SpaceKind;
}

/// Host resident storage
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Host;

/// Accelerator resident storage
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Device;

impl MemorySpace for Host {
    type Array<T: Element> = Vec<T>;

    const KIND: SpaceKind = SpaceKind::Host;
}

impl MemorySpace for Device {
    type Array<T: Element> = DeviceVec<T>;

    const KIND: SpaceKind = SpaceKind::Device;
}
