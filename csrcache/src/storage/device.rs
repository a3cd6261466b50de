//! Accelerator resident arrays and device addresses.
//!
//! Device allocations always start on a `TEXTURE_ALIGNMENT` boundary, as a
//! device allocator guarantees. A [`DevicePtr`] is an address inside such an
//! allocation, expressed as an element offset from its base, so the byte
//! misalignment of any address is known exactly and deterministically.

use std::fmt;
use std::ops::{Deref, DerefMut};

use super::{try_alloc, Element, Storage};
use crate::errors::CsrError;

/// Alignment in bytes required for an address bound to a texture channel,
/// and guaranteed for the base of every device allocation.
pub const TEXTURE_ALIGNMENT: usize = 256;

/// A contiguous array resident in accelerator memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceVec<T> {
    data: Vec<T>,
}

impl<T: Element> DeviceVec<T> {
    /// Copy a host slice to a fresh device allocation
    pub fn upload(host: &[T]) -> Result<Self, CsrError> {
        let mut data = try_alloc(host.len())?;
        data.copy_from_slice(host);
        Ok(Self { data })
    }

    /// Copy the contents back to the host
    pub fn download(&self) -> Vec<T> {
        self.data.clone()
    }

    /// The device address of the first element of this allocation
    pub fn as_device_ptr(&self) -> DevicePtr<'_, T> {
        DevicePtr {
            alloc: &self.data,
            offset: 0,
        }
    }
}

impl<T> Deref for DeviceVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for DeviceVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Element> Storage<T> for DeviceVec<T> {
    fn try_with_len(len: usize) -> Result<Self, CsrError> {
        Ok(Self {
            data: try_alloc(len)?,
        })
    }

    fn from_vec(vec: Vec<T>) -> Self {
        Self { data: vec }
    }
}

/// An address in device memory: an allocation and an element offset into it.
///
/// Offsetting a pointer produces a sub-range address, which is generally not
/// suitable for texture binding.
#[derive(Copy, Clone)]
pub struct DevicePtr<'a, T> {
    alloc: &'a [T],
    offset: usize,
}

impl<'a, T: Copy> DevicePtr<'a, T> {
    /// Address `count` elements further into the same allocation.
    ///
    /// # Panics
    ///
    /// If the resulting address lies past the end of the allocation.
    pub fn add(self, count: usize) -> Self {
        let offset = self.offset + count;
        assert!(offset <= self.alloc.len(), "device pointer out of bounds");
        Self {
            alloc: self.alloc,
            offset,
        }
    }

    /// Byte offset of this address from the previous texture alignment
    /// boundary
    pub fn misalignment(&self) -> usize {
        (self.offset * std::mem::size_of::<T>()) % TEXTURE_ALIGNMENT
    }

    /// Number of elements addressable from this pointer
    pub fn len(&self) -> usize {
        self.alloc.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The elements addressable from this pointer
    pub fn as_slice(&self) -> &'a [T] {
        &self.alloc[self.offset..]
    }

    /// Direct read of element `i`, bypassing any cache
    ///
    /// # Panics
    ///
    /// If `i >= self.len()`
    #[inline(always)]
    pub fn read(&self, i: usize) -> T {
        self.alloc[self.offset + i]
    }

    /// Whether both pointers designate the same address
    pub fn same_address(&self, other: &DevicePtr<'_, T>) -> bool {
        std::ptr::eq(self.alloc.as_ptr(), other.alloc.as_ptr())
            && self.offset == other.offset
    }
}

impl<T> fmt::Debug for DevicePtr<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DevicePtr")
            .field("base", &self.alloc.as_ptr())
            .field("offset", &self.offset)
            .finish()
    }
}
